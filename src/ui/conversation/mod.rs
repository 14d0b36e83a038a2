//! Conversation UI components for the chat screen

pub mod commands;
pub mod composer;
pub mod controller;
pub mod history;

pub use commands::{ParsedCommand, SlashCommand, get_help_text};
pub use composer::{ComposerResult, ConversationComposer};
pub use controller::{ConversationAction, ConversationController, NETWORK_ERROR_PREFIX};
pub use history::{ChatTurn, Transcript};
