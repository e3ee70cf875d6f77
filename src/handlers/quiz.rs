// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{engine, error::AppError, models::ids::QuizId, store::QuizStore};

/// Returns the quiz paper for an attempt: questions and options without answers.
pub async fn get_paper(
    State(store): State<Arc<dyn QuizStore>>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let paper = engine::get_paper(store.as_ref(), QuizId(quiz_id)).await?;

    Ok(Json(paper))
}
