use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    catalog::{self, Categories, CategoryQuestions, Created, Deleted},
    db::CategoryId,
    server::app::AppState,
};

use super::{success, ApiResponse};

#[derive(Deserialize)]
struct NewCategory {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<Categories> {
    Ok(success(catalog::get_categories(&pool).await?))
}

async fn create_category(
    State(pool): State<SqlitePool>,
    body: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResponse<Created> {
    let Json(new_category) = body?;
    let kind = new_category.kind.unwrap_or_default();
    Ok(success(catalog::create_category(&pool, &kind).await?))
}

async fn delete_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Deleted> {
    let Path(id) = id?;
    Ok(success(catalog::delete_category(&pool, CategoryId(id)).await?))
}

async fn category_questions(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<CategoryQuestions> {
    let Path(id) = id?;
    Ok(success(
        catalog::get_questions_by_category(&pool, CategoryId(id)).await?,
    ))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories).post(create_category))
        .route("/categories/{category_id}", delete(delete_category))
        .route(
            "/categories/{category_id}/questions",
            get(category_questions),
        )
        .with_state(state)
}
