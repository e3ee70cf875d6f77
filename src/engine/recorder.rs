// src/engine/recorder.rs

use std::collections::HashMap;

use super::{EngineError, EngineResult};
use crate::{
    models::{
        attempt::{AnswerDraft, AttemptDraft, AttemptResult, QuestionSnapshot, Submission, SubmittedAnswer},
        ids::QuestionId,
        quiz::Quiz,
    },
    store::QuizStore,
};

/// Outcome of grading one submission against one quiz, before persistence.
#[derive(Debug, Clone)]
pub struct Grading {
    pub correct: usize,
    pub total: usize,
    pub score: u8,
    /// One entry per quiz question, in quiz order.
    pub answers: Vec<AnswerDraft>,
}

/// Percentage of correct answers, rounded to nearest with ties upward.
/// Returns `None` for an empty quiz.
pub fn compute_score(correct: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let correct = correct.min(total);
    // floor(100c/t + 1/2) in integers
    u8::try_from((200 * correct + total) / (2 * total)).ok()
}

/// Grades `answers` against every question of `quiz`.
///
/// Questions without a matching answer are recorded as unanswered and count
/// as wrong. Answers for questions outside the quiz are ignored, and for a
/// question answered more than once the first entry wins.
pub fn grade(quiz: &Quiz, answers: &[SubmittedAnswer]) -> EngineResult<Grading> {
    if quiz.questions.is_empty() {
        return Err(EngineError::InvalidState(format!(
            "quiz {} has no questions",
            quiz.id
        )));
    }

    let mut chosen: HashMap<QuestionId, u32> = HashMap::with_capacity(answers.len());
    for answer in answers {
        chosen.entry(answer.question_id).or_insert(answer.chosen_index);
    }

    let mut drafts = Vec::with_capacity(quiz.questions.len());
    let mut correct = 0;

    for question in &quiz.questions {
        let correct_index = question.correct_index().map_err(|count| {
            EngineError::InvalidState(format!(
                "question {} has {} correct options",
                question.id, count.0
            ))
        })?;

        let chosen_index = chosen.remove(&question.id);
        let is_correct = chosen_index.map(|i| i as usize) == Some(correct_index);
        if is_correct {
            correct += 1;
        }

        let snapshot = QuestionSnapshot {
            text: question.text.clone(),
            options: question.option_texts(),
            correct_answer: correct_index,
        };
        let question_snapshot = serde_json::to_string(&snapshot).map_err(|e| {
            EngineError::DataCorruption(format!(
                "failed to encode snapshot of question {}: {}",
                question.id, e
            ))
        })?;

        drafts.push(AnswerDraft {
            question_id: question.id,
            chosen_index,
            is_correct,
            question_snapshot,
        });
    }

    if !chosen.is_empty() {
        tracing::debug!(
            quiz_id = %quiz.id,
            skipped = chosen.len(),
            "Ignoring answers for questions outside the quiz"
        );
    }

    let total = quiz.questions.len();
    let score = compute_score(correct, total).ok_or_else(|| {
        EngineError::InvalidState(format!("quiz {} has no questions", quiz.id))
    })?;

    Ok(Grading {
        correct,
        total,
        score,
        answers: drafts,
    })
}

/// Grades a submission and records it as one immutable attempt.
///
/// * Loads the quiz with its questions and options.
/// * Grades every question, snapshotting it as it is right now.
/// * Persists the attempt and its answers in a single unit.
pub async fn submit_attempt(
    store: &dyn QuizStore,
    submission: Submission,
) -> EngineResult<AttemptResult> {
    let quiz = store
        .load_quiz(submission.quiz_id)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("quiz {}", submission.quiz_id)))?;

    let grading = grade(&quiz, &submission.answers)?;

    let draft = AttemptDraft {
        user_id: submission.user_id,
        quiz_id: quiz.id,
        quiz_title: quiz.title,
        time_spent: submission.time_spent,
        score: grading.score,
        answers: grading.answers,
    };

    let attempt = store.record_attempt(draft).await.map_err(|e| {
        tracing::error!(quiz_id = %submission.quiz_id, "Failed to record attempt: {:?}", e);
        EngineError::from(e)
    })?;

    tracing::info!(
        attempt_id = %attempt.id,
        quiz_id = %attempt.quiz_id,
        user_id = %attempt.user_id,
        correct = grading.correct,
        total = grading.total,
        score = attempt.score,
        "Attempt recorded"
    );

    Ok(AttemptResult {
        attempt_id: attempt.id,
        score: attempt.score,
    })
}
