//! tbl-tui: Terminal UI components
//!
//! Widgets and key handling for the exercise chat, built on ratatui and
//! crossterm. Nothing here knows about sessions or the completion service.

pub mod input;
pub mod theme;
pub mod widgets;

pub use input::{Action, event_to_action, key_to_action};
pub use theme::Theme;
