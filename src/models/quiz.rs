// src/models/quiz.rs

use serde::{Deserialize, Serialize};

use super::ids::{OptionId, QuestionId, QuizId, UserId};

/// A quiz as stored in the definition tables.
/// Questions are kept in their authored order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub user_id: UserId,
    pub questions: Vec<Question>,
}

/// Represents the 'questions' table, with its options attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,

    /// The text content of the question.
    pub text: String,

    /// Options in their original order. Exactly one is flagged correct.
    pub options: Vec<QuizOption>,
}

/// Represents the 'options' table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub text: String,
    pub is_correct: bool,
}

/// Reported when a question does not carry exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectOptionCount(pub usize);

impl Question {
    /// Index of the single option flagged as correct.
    pub fn correct_index(&self) -> Result<usize, CorrectOptionCount> {
        let mut flagged = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_correct)
            .map(|(i, _)| i);

        match (flagged.next(), flagged.next()) {
            (Some(index), None) => Ok(index),
            (None, _) => Err(CorrectOptionCount(0)),
            (Some(_), Some(_)) => Err(CorrectOptionCount(
                self.options.iter().filter(|o| o.is_correct).count(),
            )),
        }
    }

    pub fn option_texts(&self) -> Vec<String> {
        self.options.iter().map(|o| o.text.clone()).collect()
    }
}

/// DTO for sending a quiz to the user about to attempt it (no correctness flags).
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizPaper {
    pub id: QuizId,
    pub title: String,
    pub description: String,
    pub questions: Vec<PaperQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaperQuestion {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
}

impl From<&Quiz> for QuizPaper {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz
                .questions
                .iter()
                .map(|q| PaperQuestion {
                    id: q.id,
                    text: q.text.clone(),
                    options: q.option_texts(),
                })
                .collect(),
        }
    }
}
