//! src/store/postgres.rs
//!
//! PostgreSQL implementation of `QuizStore` using `sqlx`.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::{QuizStore, StoreError, StoreResult};
use crate::models::{
    attempt::{Answer, Attempt, AttemptDraft, AttemptStatus},
    ids::{AttemptId, OptionId, QuestionId, QuizId, UserId},
    quiz::{Question, Quiz, QuizOption},
};

#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the embedded migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// One row of the quiz/question/option join.
#[derive(FromRow)]
struct QuizRow {
    quiz_id: QuizId,
    title: String,
    description: String,
    category_id: Option<i64>,
    user_id: UserId,
    question_id: Option<QuestionId>,
    question_text: Option<String>,
    option_id: Option<OptionId>,
    option_text: Option<String>,
    is_correct: Option<bool>,
}

#[derive(FromRow)]
struct AttemptRecord {
    id: AttemptId,
    user_id: UserId,
    quiz_id: QuizId,
    quiz_title: String,
    score: i16,
    time_spent: i64,
    status: String,
    completed_at: chrono::DateTime<chrono::Utc>,
}

impl AttemptRecord {
    fn to_domain(self) -> StoreResult<Attempt> {
        let score = u8::try_from(self.score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| {
                StoreError::InvalidRow(format!("attempt {} has score {}", self.id, self.score))
            })?;
        let time_spent = u32::try_from(self.time_spent).map_err(|_| {
            StoreError::InvalidRow(format!(
                "attempt {} has time_spent {}",
                self.id, self.time_spent
            ))
        })?;
        let status = AttemptStatus::parse(&self.status).ok_or_else(|| {
            StoreError::InvalidRow(format!("attempt {} has status {:?}", self.id, self.status))
        })?;

        Ok(Attempt {
            id: self.id,
            user_id: self.user_id,
            quiz_id: self.quiz_id,
            quiz_title: self.quiz_title,
            score,
            time_spent,
            status,
            completed_at: self.completed_at,
        })
    }
}

#[derive(FromRow)]
struct AnswerRecord {
    id: i64,
    attempt_id: AttemptId,
    question_id: QuestionId,
    answer_index: Option<i64>,
    is_correct: bool,
    question_snapshot: String,
}

impl AnswerRecord {
    fn to_domain(self) -> StoreResult<Answer> {
        let chosen_index = self
            .answer_index
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                StoreError::InvalidRow(format!("answer {} has a negative index", self.id))
            })?;

        Ok(Answer {
            id: self.id,
            attempt_id: self.attempt_id,
            question_id: self.question_id,
            chosen_index,
            is_correct: self.is_correct,
            question_snapshot: self.question_snapshot,
        })
    }
}

/// Folds the ordered join rows back into one quiz.
fn assemble_quiz(rows: Vec<QuizRow>) -> Option<Quiz> {
    let first = rows.first()?;
    let mut quiz = Quiz {
        id: first.quiz_id,
        title: first.title.clone(),
        description: first.description.clone(),
        category_id: first.category_id,
        user_id: first.user_id,
        questions: Vec::new(),
    };

    for row in rows {
        let (Some(question_id), Some(question_text)) = (row.question_id, row.question_text) else {
            continue;
        };

        if quiz.questions.last().map(|q| q.id) != Some(question_id) {
            quiz.questions.push(Question {
                id: question_id,
                quiz_id: quiz.id,
                text: question_text,
                options: Vec::new(),
            });
        }

        if let (Some(option_id), Some(option_text), Some(question)) =
            (row.option_id, row.option_text, quiz.questions.last_mut())
        {
            question.options.push(QuizOption {
                id: option_id,
                question_id,
                text: option_text,
                is_correct: row.is_correct.unwrap_or(false),
            });
        }
    }

    Some(quiz)
}

const ATTEMPT_COLUMNS: &str =
    "id, user_id, quiz_id, quiz_title, score, time_spent, status, completed_at";

#[async_trait]
impl QuizStore for PgQuizStore {
    async fn load_quiz(&self, quiz_id: QuizId) -> StoreResult<Option<Quiz>> {
        // A single statement keeps questions and options consistent with each other.
        let rows: Vec<QuizRow> = sqlx::query_as(
            r#"
            SELECT
                qz.id AS quiz_id,
                qz.title,
                qz.description,
                qz.category_id,
                qz.user_id,
                q.id AS question_id,
                q.question_text,
                o.id AS option_id,
                o.option_text,
                o.is_correct
            FROM quizzes qz
            LEFT JOIN questions q ON q.quiz_id = qz.id
            LEFT JOIN options o ON o.question_id = q.id
            WHERE qz.id = $1
            ORDER BY q.position, q.id, o.position, o.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble_quiz(rows))
    }

    async fn record_attempt(&self, draft: AttemptDraft) -> StoreResult<Attempt> {
        let mut tx = self.pool.begin().await?;

        let pending: AttemptRecord = sqlx::query_as(&format!(
            r#"
            INSERT INTO quiz_attempts (user_id, quiz_id, quiz_title, score, time_spent, status)
            VALUES ($1, $2, $3, 0, $4, 'pending')
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(draft.user_id)
        .bind(draft.quiz_id)
        .bind(&draft.quiz_title)
        .bind(i64::from(draft.time_spent))
        .fetch_one(&mut *tx)
        .await?;

        for (position, answer) in draft.answers.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO user_answers
                    (attempt_id, question_id, answer_index, is_correct, question_snapshot, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(pending.id)
            .bind(answer.question_id)
            .bind(answer.chosen_index.map(i64::from))
            .bind(answer.is_correct)
            .bind(&answer.question_snapshot)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        let finalized: Option<AttemptRecord> = sqlx::query_as(&format!(
            r#"
            UPDATE quiz_attempts
            SET score = $2, status = 'finalized', completed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(pending.id)
        .bind(i16::from(draft.score))
        .fetch_optional(&mut *tx)
        .await?;

        let finalized = finalized.ok_or_else(|| {
            StoreError::Unavailable(format!("attempt {} was not pending", pending.id))
        })?;

        tx.commit().await?;

        tracing::debug!(
            attempt_id = %finalized.id,
            answers = draft.answers.len(),
            "Attempt committed"
        );

        finalized.to_domain()
    }

    async fn load_attempt(&self, attempt_id: AttemptId) -> StoreResult<Option<Attempt>> {
        let record: Option<AttemptRecord> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1 AND status = 'finalized'"
        ))
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(AttemptRecord::to_domain).transpose()
    }

    async fn load_answers(&self, attempt_id: AttemptId) -> StoreResult<Vec<Answer>> {
        let records: Vec<AnswerRecord> = sqlx::query_as(
            r#"
            SELECT id, attempt_id, question_id, answer_index, is_correct, question_snapshot
            FROM user_answers
            WHERE attempt_id = $1
            ORDER BY position, id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(AnswerRecord::to_domain).collect()
    }
}
