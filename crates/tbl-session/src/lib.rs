//! tbl-session: one student's exercise session
//!
//! This crate holds the session state machine, the catalog of exercise
//! prompts and the transcript export format. It knows nothing about how the
//! session is displayed.

pub mod catalog;
pub mod controller;
pub mod error;
pub mod export;
pub mod state;

pub use catalog::{DEFAULT_PROMPTS_DIR, ExerciseCatalog, ExerciseDefinition};
pub use controller::{
    DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT, ExerciseSelection, Phase, SessionConfig,
    SessionController, SwitchOutcome, TurnOutcome,
};
pub use error::{CatalogError, Result, SessionError};
pub use export::{ConversationExport, EXPORT_MIME_TYPE};
pub use state::SessionState;
