//! intake-tui: Terminal rendering for the intake client
//!
//! Pure projections from conversation state to view models, plus the
//! ratatui widgets and the `ChatView` adapter that draws them.

pub mod input;
pub mod labels;
pub mod terminal;
pub mod theme;
pub mod transcript;
pub mod tui_view;
pub mod view;
pub mod widgets;

pub use terminal::Tui;
pub use theme::Theme;
pub use transcript::Transcript;
pub use tui_view::TuiView;
