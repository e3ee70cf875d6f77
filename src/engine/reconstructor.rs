// src/engine/reconstructor.rs

use super::{EngineError, EngineResult, compute_score};
use crate::{
    models::{
        attempt::{Answer, QuestionResult, QuestionSnapshot, ResultView},
        ids::{AttemptId, UserId},
    },
    store::QuizStore,
};

/// Rebuilds the graded breakdown of an attempt from its stored snapshots.
///
/// Only the attempt's owner or an administrator may read it; the check runs
/// before any answer is loaded. Live quiz data is never consulted.
pub async fn get_result(
    store: &dyn QuizStore,
    attempt_id: AttemptId,
    requester_id: UserId,
    requester_is_admin: bool,
) -> EngineResult<ResultView> {
    let attempt = store
        .load_attempt(attempt_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("attempt {}", attempt_id)))?;

    if attempt.user_id != requester_id && !requester_is_admin {
        tracing::warn!(
            attempt_id = %attempt_id,
            requester_id = %requester_id,
            "Result requested by a non-owner"
        );
        return Err(EngineError::Forbidden(format!("attempt {}", attempt_id)));
    }

    let answers = store.load_answers(attempt_id).await?;
    if answers.is_empty() {
        return Err(EngineError::DataCorruption(format!(
            "attempt {} has no answers",
            attempt_id
        )));
    }

    let questions = answers
        .iter()
        .map(question_result)
        .collect::<EngineResult<Vec<_>>>()?;

    let total_questions = questions.len();
    let correct_answers = questions.iter().filter(|q| q.is_correct).count();
    let wrong_answers = total_questions - correct_answers;

    if compute_score(correct_answers, total_questions) != Some(attempt.score) {
        return Err(EngineError::DataCorruption(format!(
            "attempt {} stores score {} but has {}/{} correct answers",
            attempt_id, attempt.score, correct_answers, total_questions
        )));
    }

    Ok(ResultView {
        attempt_id: attempt.id,
        quiz_id: attempt.quiz_id,
        quiz_title: attempt.quiz_title,
        user_id: attempt.user_id,
        total_questions,
        correct_answers,
        wrong_answers,
        score: attempt.score,
        time_spent: attempt.time_spent,
        completed_at: attempt.completed_at,
        questions,
    })
}

fn question_result(answer: &Answer) -> EngineResult<QuestionResult> {
    let snapshot: QuestionSnapshot =
        serde_json::from_str(&answer.question_snapshot).map_err(|e| {
            tracing::error!(answer_id = answer.id, "Unreadable question snapshot: {}", e);
            EngineError::DataCorruption(format!(
                "snapshot of answer {} is unreadable: {}",
                answer.id, e
            ))
        })?;

    Ok(QuestionResult {
        question_id: answer.question_id,
        text: snapshot.text,
        options: snapshot.options,
        correct_answer: snapshot.correct_answer,
        user_answer: answer.chosen_index,
        is_correct: answer.is_correct,
    })
}
