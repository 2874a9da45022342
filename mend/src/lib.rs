//! Edit reconciliation for model-suggested writing corrections.
//!
//! A hosted model proposes short-span corrections for a document the user is
//! still editing. This crate turns the model's loosely formatted replies into
//! [`Suggestion`]s, keeps them in a de-duplicated [`SuggestionStore`], and
//! reconciles them against the live text through a pure [`reducer`]:
//! suggestions are located by content rather than by offset, so they survive
//! edits made while an analysis was in flight.
//!
//! # Layout
//!
//! - [`span`] - whitespace-tolerant span location
//! - [`parse`] - model response parsing (delimited lines and JSON-like arrays)
//! - [`store`] - accumulation, de-duplication and ranking across passes
//! - [`reducer`] - the state machine over [`SessionState`]
//! - [`analysis`] - drives a [`Backend`] through one or more passes
//! - [`session`] - serializes intents and runs analyses in the background

pub mod analysis;
pub mod backend;
pub mod boundary;
pub mod config;
pub mod effects;
pub mod intent;
pub mod parse;
pub mod prompt;
pub mod reducer;
pub mod session;
pub mod span;
pub mod state;
pub mod store;
pub mod suggestion;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analysis::{AnalysisMode, AnalysisOptions, AnalysisReport, Analyzer};
pub use backend::{Backend, BackendError, ChunkStream};
pub use boundary::{BoundaryEvent, BoundaryKind, BoundaryTracker};
pub use config::{BackendConfig, Config};
pub use effects::Effect;
pub use intent::Intent;
pub use parse::{parse, parse_with, LineAccumulator, ResponseFormat};
pub use prompt::Pass;
pub use reducer::{process, reduce};
pub use session::{Session, SnapshotReader};
pub use state::{AppliedEdit, EditId, SessionState, WritingMode};
pub use store::SuggestionStore;
pub use suggestion::{Category, Suggestion, SuggestionKind};
