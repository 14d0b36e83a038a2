//! Terminal widgets

pub mod conversation;
pub mod dashboard;
pub mod markup;
pub mod suggestion;
