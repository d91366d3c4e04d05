//! intake-session: conversation state and request lifecycle
//!
//! [`ConversationState`] folds stream records into the data the UI shows;
//! [`SessionController`] drives one request at a time against a
//! [`intake_api::ChatBackend`] and reports every visible change through the
//! [`ChatView`] trait.

pub mod controller;
pub mod error;
pub mod state;
pub mod view;

pub use controller::{Phase, SessionConfig, SessionController, RESTART_OFFER_DELAY};
pub use error::{Error, Result};
pub use state::{ConversationState, StateChange};
pub use view::{ChatView, ConfirmControl, MessageId, Role};
