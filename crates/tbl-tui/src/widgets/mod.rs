//! Widgets for the chat screen

pub mod dialog;
pub mod input_box;
pub mod markdown;
pub mod message_list;
pub mod selector;
pub mod spinner;

pub use dialog::ConfirmDialog;
pub use input_box::InputBox;
pub use message_list::{ChatMessage, MessageList, Speaker, calculate_message_height};
pub use selector::{Selector, SelectorItem, SelectorState};
pub use spinner::Spinner;
