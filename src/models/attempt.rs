// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ids::{AttemptId, QuestionId, QuizId, UserId};

/// Lifecycle of a row in `quiz_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Pending,
    Finalized,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Finalized => "finalized",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AttemptStatus::Pending),
            "finalized" => Some(AttemptStatus::Finalized),
            _ => None,
        }
    }
}

/// Represents the 'quiz_attempts' table in the database.
/// One graded submission of one user against one quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub user_id: UserId,

    /// Weak reference; the quiz may have been deleted since.
    pub quiz_id: QuizId,

    /// Quiz title at submission time.
    pub quiz_title: String,

    /// Percentage score, 0..=100.
    pub score: u8,

    /// Elapsed time as reported by the caller, in the caller's unit.
    pub time_spent: u32,

    pub status: AttemptStatus,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyFinalized(pub AttemptId);

impl Attempt {
    /// Moves a pending attempt to its final score. Allowed exactly once.
    pub fn finalize(&mut self, score: u8) -> Result<(), AlreadyFinalized> {
        if self.status == AttemptStatus::Finalized {
            return Err(AlreadyFinalized(self.id));
        }
        self.score = score;
        self.status = AttemptStatus::Finalized;
        Ok(())
    }
}

/// Represents the 'user_answers' table. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub attempt_id: AttemptId,
    pub question_id: QuestionId,

    /// `None` when the question was left unanswered.
    pub chosen_index: Option<u32>,
    pub is_correct: bool,

    /// Serialized `QuestionSnapshot`, kept verbatim as written at grading time.
    pub question_snapshot: String,
}

/// Self-contained copy of a question taken at grading time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: usize,
}

/// A graded attempt ready to be persisted.
#[derive(Debug, Clone)]
pub struct AttemptDraft {
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub time_spent: u32,
    pub score: u8,
    pub answers: Vec<AnswerDraft>,
}

#[derive(Debug, Clone)]
pub struct AnswerDraft {
    pub question_id: QuestionId,
    pub chosen_index: Option<u32>,
    pub is_correct: bool,
    pub question_snapshot: String,
}

/// One entry of a submission payload.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmittedAnswerRequest {
    #[validate(range(min = 1, message = "question_id must be positive"))]
    pub question_id: i64,
    /// Checked against the question's options at grading time.
    pub answer_index: u32,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(range(min = 1, message = "quiz_id must be positive"))]
    pub quiz_id: i64,

    #[validate(nested)]
    pub answers: Vec<SubmittedAnswerRequest>,

    /// Time spent on the quiz; any non-negative value in the caller's unit.
    pub time_spent: u32,
}

/// Validated submission handed to the engine.
#[derive(Debug, Clone)]
pub struct Submission {
    pub quiz_id: QuizId,
    pub user_id: UserId,
    pub answers: Vec<SubmittedAnswer>,
    pub time_spent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub chosen_index: u32,
}

impl SubmitAttemptRequest {
    /// Validates the payload and binds it to the submitting user.
    pub fn into_submission(
        self,
        user_id: UserId,
    ) -> Result<Submission, validator::ValidationErrors> {
        self.validate()?;

        Ok(Submission {
            quiz_id: QuizId(self.quiz_id),
            user_id,
            answers: self
                .answers
                .into_iter()
                .map(|a| SubmittedAnswer {
                    question_id: QuestionId(a.question_id),
                    chosen_index: a.answer_index,
                })
                .collect(),
            time_spent: self.time_spent,
        })
    }
}

/// Returned by a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: AttemptId,
    pub score: u8,
}

/// Full graded breakdown of one attempt, rebuilt from the stored snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultView {
    pub attempt_id: AttemptId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub user_id: UserId,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub score: u8,
    pub time_spent: u32,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub questions: Vec<QuestionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub user_answer: Option<u32>,
    pub is_correct: bool,
}
