// src/handlers/attempt.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    engine,
    error::AppError,
    models::{attempt::SubmitAttemptRequest, ids::AttemptId},
    store::QuizStore,
    utils::jwt::Claims,
};

/// Submits a user's answers to a quiz and records the graded attempt.
///
/// * The submitting user is taken from the token, never from the payload.
/// * The payload is validated before grading; malformed JSON is a 400.
/// * Responds with `201 Created` and the attempt id and score.
pub async fn submit_attempt(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SubmitAttemptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let submission = req.into_submission(claims.user_id()?)?;

    let result = engine::submit_attempt(store.as_ref(), submission).await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// Returns the graded breakdown of an attempt.
/// Visible to the attempt's owner and to administrators.
pub async fn get_result(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = engine::get_result(
        store.as_ref(),
        AttemptId(attempt_id),
        claims.user_id()?,
        claims.is_admin(),
    )
    .await?;

    Ok(Json(view))
}
