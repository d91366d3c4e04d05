//! Custom widgets for the TUI

pub mod dialog;
pub mod input_box;
pub mod message_list;
pub mod side_panel;
pub mod spinner;

pub use dialog::{Dialog, DialogState};
pub use input_box::InputBox;
pub use message_list::MessageList;
pub use side_panel::SidePanel;
pub use spinner::Spinner;
