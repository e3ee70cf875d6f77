//! src/engine/mod.rs
//!
//! Quiz assessment engine: grades submissions, records immutable attempts and
//! rebuilds graded results from the snapshots stored with each answer.
//!
//! Every operation takes the caller's identity as explicit parameters and talks
//! to persistence only through `QuizStore`. The engine keeps no state between
//! calls and knows nothing about HTTP.

use crate::store::StoreError;

pub mod paper;
pub mod reconstructor;
pub mod recorder;

pub use paper::get_paper;
pub use reconstructor::get_result;
pub use recorder::{compute_score, grade, submit_attempt};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The referenced quiz or attempt does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The quiz cannot be graded (no questions, or a malformed question).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The requester may not see this attempt.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A stored record could not be read back.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[source] StoreError),
}

impl EngineError {
    /// Only storage failures are worth retrying; the rest are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StorageFailure(_))
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidRow(msg) => EngineError::DataCorruption(msg),
            other => EngineError::StorageFailure(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
