use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use sqlx::SqlitePool;

use crate::{
    quiz::{self, QuizRequest, QuizResponse},
    server::app::AppState,
};

use super::{success, ApiResponse};

async fn play_quiz(
    State(pool): State<SqlitePool>,
    body: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResponse<QuizResponse> {
    let Json(request) = body?;
    Ok(success(quiz::play(&pool, request).await?))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(play_quiz))
        .with_state(state)
}
