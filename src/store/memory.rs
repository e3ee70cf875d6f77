//! src/store/memory.rs
//!
//! In-process `QuizStore`. Used when no database is configured and by the
//! test suites. A submission is staged completely before it is published
//! under the write lock, so readers never see a partial attempt.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{QuizStore, StoreError, StoreResult};
use crate::models::{
    attempt::{Answer, Attempt, AttemptDraft, AttemptStatus},
    ids::{AttemptId, OptionId, QuestionId, QuizId, UserId},
    quiz::{Question, Quiz, QuizOption},
};

/// Definition of a quiz to seed, mirroring the authoring payload:
/// each question lists its option texts and the index of the correct one.
#[derive(Debug, Clone)]
pub struct QuizSeed {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub questions: Vec<QuestionSeed>,
}

#[derive(Debug, Clone)]
pub struct QuestionSeed {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl QuestionSeed {
    pub fn new(text: &str, options: &[&str], correct_index: usize) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_index,
        }
    }
}

#[derive(Default)]
struct Inner {
    quizzes: BTreeMap<QuizId, Quiz>,
    attempts: BTreeMap<AttemptId, Attempt>,
    answers: BTreeMap<AttemptId, Vec<Answer>>,
    next_id: i64,
    fail_next_write: bool,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a quiz owned by `owner` and returns it with assigned ids.
    pub async fn add_quiz(&self, owner: UserId, seed: QuizSeed) -> Quiz {
        let mut inner = self.inner.write().await;
        let quiz_id = QuizId(inner.next_id());

        let mut questions = Vec::with_capacity(seed.questions.len());
        for q in seed.questions {
            let question_id = QuestionId(inner.next_id());
            let mut options = Vec::with_capacity(q.options.len());
            for (index, text) in q.options.into_iter().enumerate() {
                options.push(QuizOption {
                    id: OptionId(inner.next_id()),
                    question_id,
                    text,
                    is_correct: index == q.correct_index,
                });
            }
            questions.push(Question {
                id: question_id,
                quiz_id,
                text: q.text,
                options,
            });
        }

        let quiz = Quiz {
            id: quiz_id,
            title: seed.title,
            description: seed.description,
            category_id: seed.category_id,
            user_id: owner,
            questions,
        };
        inner.quizzes.insert(quiz_id, quiz.clone());
        quiz
    }

    /// Rewrites a question's text and its option texts in place.
    /// Returns false when the question does not exist.
    pub async fn edit_question(
        &self,
        question_id: QuestionId,
        text: &str,
        option_texts: &[&str],
    ) -> bool {
        let mut inner = self.inner.write().await;
        let question = inner
            .quizzes
            .values_mut()
            .flat_map(|quiz| quiz.questions.iter_mut())
            .find(|q| q.id == question_id);

        match question {
            Some(question) => {
                question.text = text.to_string();
                for (option, new_text) in question.options.iter_mut().zip(option_texts) {
                    option.text = new_text.to_string();
                }
                true
            }
            None => false,
        }
    }

    /// Appends a question to an existing quiz.
    pub async fn add_question(&self, quiz_id: QuizId, seed: QuestionSeed) -> Option<QuestionId> {
        let mut inner = self.inner.write().await;
        if !inner.quizzes.contains_key(&quiz_id) {
            return None;
        }
        let question_id = QuestionId(inner.next_id());
        let mut options = Vec::with_capacity(seed.options.len());
        for (index, text) in seed.options.into_iter().enumerate() {
            options.push(QuizOption {
                id: OptionId(inner.next_id()),
                question_id,
                text,
                is_correct: index == seed.correct_index,
            });
        }
        let quiz = inner.quizzes.get_mut(&quiz_id)?;
        quiz.questions.push(Question {
            id: question_id,
            quiz_id,
            text: seed.text,
            options,
        });
        Some(question_id)
    }

    pub async fn delete_quiz(&self, quiz_id: QuizId) -> bool {
        self.inner.write().await.quizzes.remove(&quiz_id).is_some()
    }

    /// Deleting an attempt takes its answers with it.
    pub async fn delete_attempt(&self, attempt_id: AttemptId) -> bool {
        let mut inner = self.inner.write().await;
        inner.answers.remove(&attempt_id);
        inner.attempts.remove(&attempt_id).is_some()
    }

    /// Makes the next `record_attempt` fail after its answers were staged.
    pub async fn fail_next_write(&self) {
        self.inner.write().await.fail_next_write = true;
    }

    pub async fn attempt_count(&self) -> usize {
        self.inner.read().await.attempts.len()
    }

    pub async fn answer_count(&self) -> usize {
        self.inner.read().await.answers.values().map(Vec::len).sum()
    }

    /// Overwrites the stored snapshot of one answer. Test hook for corrupted rows.
    pub async fn overwrite_snapshot(&self, attempt_id: AttemptId, position: usize, raw: &str) -> bool {
        let mut inner = self.inner.write().await;
        match inner
            .answers
            .get_mut(&attempt_id)
            .and_then(|answers| answers.get_mut(position))
        {
            Some(answer) => {
                answer.question_snapshot = raw.to_string();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn load_quiz(&self, quiz_id: QuizId) -> StoreResult<Option<Quiz>> {
        Ok(self.inner.read().await.quizzes.get(&quiz_id).cloned())
    }

    async fn record_attempt(&self, draft: AttemptDraft) -> StoreResult<Attempt> {
        let mut inner = self.inner.write().await;

        let mut attempt = Attempt {
            id: AttemptId(inner.next_id()),
            user_id: draft.user_id,
            quiz_id: draft.quiz_id,
            quiz_title: draft.quiz_title,
            score: 0,
            time_spent: draft.time_spent,
            status: AttemptStatus::Pending,
            completed_at: chrono::Utc::now(),
        };

        let mut staged = Vec::with_capacity(draft.answers.len());
        for a in draft.answers {
            staged.push(Answer {
                id: inner.next_id(),
                attempt_id: attempt.id,
                question_id: a.question_id,
                chosen_index: a.chosen_index,
                is_correct: a.is_correct,
                question_snapshot: a.question_snapshot,
            });
        }

        if std::mem::take(&mut inner.fail_next_write) {
            return Err(StoreError::Unavailable(format!(
                "write of attempt {} rejected",
                attempt.id
            )));
        }

        attempt
            .finalize(draft.score)
            .map_err(|e| StoreError::Unavailable(format!("attempt {} already finalized", e.0)))?;

        inner.answers.insert(attempt.id, staged);
        inner.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn load_attempt(&self, attempt_id: AttemptId) -> StoreResult<Option<Attempt>> {
        Ok(self
            .inner
            .read()
            .await
            .attempts
            .get(&attempt_id)
            .filter(|a| a.status == AttemptStatus::Finalized)
            .cloned())
    }

    async fn load_answers(&self, attempt_id: AttemptId) -> StoreResult<Vec<Answer>> {
        Ok(self
            .inner
            .read()
            .await
            .answers
            .get(&attempt_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::AnswerDraft;

    fn seed() -> QuizSeed {
        QuizSeed {
            title: "Capitals".to_string(),
            description: String::new(),
            category_id: None,
            questions: vec![
                QuestionSeed::new("France?", &["Paris", "Lyon"], 0),
                QuestionSeed::new("Spain?", &["Seville", "Madrid"], 1),
            ],
        }
    }

    fn draft(quiz: &Quiz) -> AttemptDraft {
        AttemptDraft {
            user_id: UserId(2),
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            time_spent: 30,
            score: 50,
            answers: quiz
                .questions
                .iter()
                .map(|q| AnswerDraft {
                    question_id: q.id,
                    chosen_index: Some(0),
                    is_correct: q.options[0].is_correct,
                    question_snapshot: "{}".to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_add_quiz_marks_correct_option() {
        let store = MemoryStore::new();
        let quiz = store.add_quiz(UserId(1), seed()).await;

        let loaded = store.load_quiz(quiz.id).await.unwrap().unwrap();
        assert_eq!(loaded.questions.len(), 2);
        assert_eq!(loaded.questions[0].correct_index(), Ok(0));
        assert_eq!(loaded.questions[1].correct_index(), Ok(1));
    }

    #[tokio::test]
    async fn test_record_attempt_is_finalized() {
        let store = MemoryStore::new();
        let quiz = store.add_quiz(UserId(1), seed()).await;

        let attempt = store.record_attempt(draft(&quiz)).await.unwrap();
        assert_eq!(attempt.status, AttemptStatus::Finalized);
        assert_eq!(attempt.score, 50);

        let answers = store.load_answers(attempt.id).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_id, quiz.questions[0].id);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_behind() {
        let store = MemoryStore::new();
        let quiz = store.add_quiz(UserId(1), seed()).await;
        store.fail_next_write().await;

        assert!(store.record_attempt(draft(&quiz)).await.is_err());
        assert_eq!(store.attempt_count().await, 0);
        assert_eq!(store.answer_count().await, 0);

        // The failure is one-shot.
        assert!(store.record_attempt(draft(&quiz)).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_attempt_cascades() {
        let store = MemoryStore::new();
        let quiz = store.add_quiz(UserId(1), seed()).await;
        let attempt = store.record_attempt(draft(&quiz)).await.unwrap();

        assert!(store.delete_attempt(attempt.id).await);
        assert!(store.load_attempt(attempt.id).await.unwrap().is_none());
        assert!(store.load_answers(attempt.id).await.unwrap().is_empty());
    }
}
