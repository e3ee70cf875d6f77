//! src/store/mod.rs
//!
//! Persistence port used by the assessment engine, plus its adapters.
//! The engine only ever reads quiz definitions and writes attempts through
//! this trait, so grading logic stays independent of the database.

use async_trait::async_trait;

use crate::models::{
    attempt::{Answer, Attempt, AttemptDraft},
    ids::{AttemptId, QuizId},
    quiz::Quiz,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgQuizStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A stored row holds values outside its domain.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Loads a quiz with its questions and options, in authored order,
    /// as one consistent read.
    async fn load_quiz(&self, quiz_id: QuizId) -> StoreResult<Option<Quiz>>;

    /// Persists a graded attempt and all of its answers as one unit.
    ///
    /// The attempt is created `pending` with score 0, the answers are written,
    /// then the attempt is finalized with `draft.score`. Readers observe either
    /// the whole finalized attempt or nothing.
    async fn record_attempt(&self, draft: AttemptDraft) -> StoreResult<Attempt>;

    /// Loads a finalized attempt.
    async fn load_attempt(&self, attempt_id: AttemptId) -> StoreResult<Option<Attempt>>;

    /// Loads the answers owned by an attempt, in insertion order.
    async fn load_answers(&self, attempt_id: AttemptId) -> StoreResult<Vec<Answer>>;
}
