pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod emotion;
pub mod error;
pub mod events;
pub mod logging;
pub mod reveal;
pub mod session;
pub mod ui;
pub mod voice;
