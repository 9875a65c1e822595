use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    catalog::{self, Created, Deleted, QuestionDraft, QuestionsPage, SearchResults},
    server::{
        app::{AppState, PageSize},
        deserializers::deserialize_lenient_i64,
    },
};

use super::{success, ApiResponse};

#[derive(Deserialize)]
struct Pagination {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    page: Option<i64>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm", default)]
    search_term: Option<String>,
}

async fn get_questions(
    State(pool): State<SqlitePool>,
    State(PageSize(page_size)): State<PageSize>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> ApiResponse<QuestionsPage> {
    let Query(pagination) = query?;
    let page = pagination.page.unwrap_or(1);
    Ok(success(catalog::get_questions(&pool, page, page_size).await?))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    body: Result<Json<QuestionDraft>, JsonRejection>,
) -> ApiResponse<Created> {
    let Json(draft) = body?;
    Ok(success(catalog::create_question(&pool, draft).await?))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Deleted> {
    let Path(id) = id?;
    Ok(success(catalog::delete_question(&pool, id).await?))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResponse<SearchResults> {
    let Json(body) = body?;
    let term = body.search_term.unwrap_or_default();
    Ok(success(catalog::search_questions(&pool, &term).await?))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(get_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{question_id}", delete(delete_question))
        .with_state(state)
}
