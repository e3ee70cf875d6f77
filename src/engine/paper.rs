// src/engine/paper.rs

use super::{EngineError, EngineResult};
use crate::{
    models::{ids::QuizId, quiz::QuizPaper},
    store::QuizStore,
};

/// Returns the quiz as presented to a user about to attempt it.
/// Correctness flags are stripped; a quiz that could not be graded is refused.
pub async fn get_paper(store: &dyn QuizStore, quiz_id: QuizId) -> EngineResult<QuizPaper> {
    let quiz = store
        .load_quiz(quiz_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("quiz {}", quiz_id)))?;

    if quiz.questions.is_empty() {
        return Err(EngineError::InvalidState(format!(
            "quiz {} has no questions",
            quiz_id
        )));
    }

    if let Some(question) = quiz.questions.iter().find(|q| q.correct_index().is_err()) {
        return Err(EngineError::InvalidState(format!(
            "question {} does not have exactly one correct option",
            question.id
        )));
    }

    Ok(QuizPaper::from(&quiz))
}
