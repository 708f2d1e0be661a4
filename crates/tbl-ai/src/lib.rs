//! tbl-ai: Completion service boundary
//!
//! This crate provides the conversation message types, a common interface for
//! requesting chat completions (with an OpenAI implementation), and the
//! per-model rate table used to turn token counts into dollars.

pub mod error;
pub mod pricing;
pub mod providers;
pub mod types;

pub use error::{Error, Result};
pub use pricing::{CostInfo, CostRateTable};
pub use providers::CompletionClient;
pub use types::*;
