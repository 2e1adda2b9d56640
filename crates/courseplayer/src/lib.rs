//! Client-side course player engine.
//!
//! Loads a course curriculum and the learner's enrollment from the learning
//! backend, decides where playback resumes, and keeps completion progress in
//! sync with the backend's authoritative enrollment record.

pub mod api;
pub mod config;
pub mod duration;
pub mod error;
pub mod library;
pub mod player;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{CredentialProvider, HttpBackend, LearningBackend, TokenStore};
pub use config::PlayerConfig;
pub use error::{PlayerError, Recovery};
pub use library::{Library, LibraryFilter};
pub use player::{CompletionOutcome, Phase, PlayerView, ProgressTracker};
pub use types::*;
