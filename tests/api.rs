use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use trivia_api::catalog::QUESTIONS_PER_PAGE;
use trivia_api::db::queries::{categories::create_category, questions::create_question};
use trivia_api::db::{self, CategoryId};
use trivia_api::server::app::{router, AppState};

async fn app() -> (Router, SqlitePool) {
    let pool = db::init_in_memory().await.unwrap();
    (router(AppState::new(pool.clone(), QUESTIONS_PER_PAGE)), pool)
}

/// Categories {1: Science, 2: Art} with one question in each.
async fn seeded_app() -> (Router, SqlitePool) {
    let (app, pool) = app().await;
    let science = create_category(&pool, "Science").await.unwrap().id;
    let art = create_category(&pool, "Art").await.unwrap().id;
    create_question(&pool, "What is the capital of France?", "Paris", 1, science)
        .await
        .unwrap();
    create_question(&pool, "Who painted the Mona Lisa?", "Leonardo", 2, art)
        .await
        .unwrap();
    (app, pool)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn assert_error(status: StatusCode, body: &Value, code: u16, message: &str) {
    assert_eq!(status.as_u16(), code);
    assert_eq!(
        body,
        &json!({"success": false, "error": code, "message": message})
    );
}

#[tokio::test]
async fn get_categories() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::GET, "/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "categories": {"1": "Science", "2": "Art"}})
    );
}

#[tokio::test]
async fn get_categories_empty_is_404() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/categories", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn get_questions_first_page() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::GET, "/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_questions"], 2);
    assert_eq!(body["current_category"], Value::Null);
    assert_eq!(body["categories"]["1"], "Science");
    assert_eq!(
        body["questions"][0],
        json!({
            "id": 1,
            "question": "What is the capital of France?",
            "answer": "Paris",
            "category": 1,
            "difficulty": 1
        })
    );
}

#[tokio::test]
async fn get_questions_paginates_by_ten() {
    let (app, pool) = seeded_app().await;
    for n in 0..10 {
        create_question(&pool, &format!("Filler {n}?"), "Yes", 1, CategoryId(1))
            .await
            .unwrap();
    }
    let (_, first) = send(&app, Method::GET, "/questions?page=1", None).await;
    let (status, second) = send(&app, Method::GET, "/questions?page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["questions"].as_array().unwrap().len(), 10);
    assert_eq!(second["questions"].as_array().unwrap().len(), 2);
    assert_eq!(second["total_questions"], 12);
    assert_eq!(second["questions"][0]["id"], 11);
}

#[tokio::test]
async fn get_questions_beyond_valid_page_is_404() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::GET, "/questions?page=1000", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn get_questions_on_empty_store_is_404() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/questions", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn unparseable_page_falls_back_to_first() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::GET, "/questions?page=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_question() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::DELETE, "/questions/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "deleted": 1}));

    let (status, body) = send(&app, Method::DELETE, "/questions/1", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn delete_question_with_non_numeric_id_is_404() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::DELETE, "/questions/first", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn add_question() {
    let (app, _) = seeded_app().await;
    let new_question = json!({
        "question": "What is the capital of Germany?",
        "answer": "Berlin",
        "difficulty": 1,
        "category": "1"
    });
    let (status, body) = send(&app, Method::POST, "/questions", Some(new_question)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "created": 3}));

    let (_, found) = send(
        &app,
        Method::POST,
        "/questions/search",
        Some(json!({"searchTerm": "Germany"})),
    )
    .await;
    assert_eq!(found["total_questions"], 1);
    assert_eq!(found["questions"][0]["category"], 1);
}

#[tokio::test]
async fn add_question_with_empty_fields_is_422() {
    let (app, _) = seeded_app().await;
    let new_question = json!({
        "question": "",
        "answer": "",
        "difficulty": 1,
        "category": "1"
    });
    let (status, body) = send(&app, Method::POST, "/questions", Some(new_question)).await;
    assert_error(status, &body, 422, "Unprocessable entity");
}

#[tokio::test]
async fn add_question_with_zero_difficulty_is_422() {
    let (app, _) = seeded_app().await;
    let new_question = json!({
        "question": "Q?",
        "answer": "A",
        "difficulty": 0,
        "category": 1
    });
    let (status, body) = send(&app, Method::POST, "/questions", Some(new_question)).await;
    assert_error(status, &body, 422, "Unprocessable entity");
}

#[tokio::test]
async fn add_question_with_empty_difficulty_is_422() {
    let (app, _) = seeded_app().await;
    for difficulty in [json!(""), json!("0"), json!(null)] {
        let new_question = json!({
            "question": "Q?",
            "answer": "A",
            "difficulty": difficulty,
            "category": "1"
        });
        let (status, body) = send(&app, Method::POST, "/questions", Some(new_question)).await;
        assert_error(status, &body, 422, "Unprocessable entity");
    }
}

#[tokio::test]
async fn add_question_with_string_difficulty() {
    let (app, _) = seeded_app().await;
    let new_question = json!({
        "question": "What is the capital of Spain?",
        "answer": "Madrid",
        "difficulty": "2",
        "category": "1"
    });
    let (status, body) = send(&app, Method::POST, "/questions", Some(new_question)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "created": 3}));

    let (_, found) = send(
        &app,
        Method::POST,
        "/questions/search",
        Some(json!({"searchTerm": "Spain"})),
    )
    .await;
    assert_eq!(found["questions"][0]["difficulty"], 2);
}

#[tokio::test]
async fn add_question_with_malformed_json_is_400() {
    let (app, _) = seeded_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/questions")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_error(status, &body, 400, "Bad request");
}

#[tokio::test]
async fn search_questions() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/questions/search",
        Some(json!({"searchTerm": "CAPITAL"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_questions"], 1);
    assert_eq!(body["current_category"], Value::Null);
    assert_eq!(body["questions"][0]["answer"], "Paris");
}

#[tokio::test]
async fn search_without_matches_is_empty_success() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/questions/search",
        Some(json!({"searchTerm": "zebra"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "questions": [], "total_questions": 0, "current_category": null})
    );
}

#[tokio::test]
async fn search_with_empty_term_is_422() {
    let (app, _) = seeded_app().await;
    for payload in [json!({"searchTerm": ""}), json!({})] {
        let (status, body) = send(&app, Method::POST, "/questions/search", Some(payload)).await;
        assert_error(status, &body, 422, "Unprocessable entity");
    }
}

#[tokio::test]
async fn get_questions_by_category() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(&app, Method::GET, "/categories/1/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_questions"], 1);
    assert_eq!(body["current_category"], 1);
    assert_eq!(body["questions"][0]["id"], 1);

    let (status, body) = send(&app, Method::GET, "/categories/9/questions", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn play_quiz() {
    let (app, _) = seeded_app().await;
    let quiz = json!({
        "previous_questions": [],
        "quiz_category": {"id": 1, "type": "Science"}
    });
    let (status, body) = send(&app, Method::POST, "/quizzes", Some(quiz)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["question"]["id"], 1);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn play_quiz_exhausted_category() {
    let (app, _) = seeded_app().await;
    let quiz = json!({
        "previous_questions": [1],
        "quiz_category": {"id": 1, "type": "Science"}
    });
    let (status, body) = send(&app, Method::POST, "/quizzes", Some(quiz)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "question": null, "message": "No more questions available"})
    );
}

#[tokio::test]
async fn play_quiz_all_categories_skips_previous() {
    let (app, _) = seeded_app().await;
    let quiz = json!({
        "previous_questions": [2],
        "quiz_category": {"id": 0, "type": "click"}
    });
    for _ in 0..5 {
        let (_, body) = send(&app, Method::POST, "/quizzes", Some(quiz.clone())).await;
        assert_eq!(body["question"]["id"], 1);
    }
    let (_, body) = send(&app, Method::POST, "/quizzes", Some(json!({}))).await;
    assert!(body["question"].is_object());
}

#[tokio::test]
async fn create_and_delete_category() {
    let (app, _) = seeded_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/categories",
        Some(json!({"type": "History"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "created": 3}));

    let (status, body) = send(&app, Method::POST, "/categories", Some(json!({"type": ""}))).await;
    assert_error(status, &body, 422, "Unprocessable entity");

    let (status, body) = send(&app, Method::DELETE, "/categories/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "deleted": 1}));

    let (_, body) = send(&app, Method::GET, "/questions", None).await;
    assert_eq!(body["total_questions"], 1);
    assert_eq!(body["questions"][0]["id"], 2);
    let (status, body) = send(&app, Method::GET, "/categories/1/questions", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/nope", None).await;
    assert_error(status, &body, 404, "Resource not found");
}

#[tokio::test]
async fn cors_headers_are_present() {
    let (app, _) = seeded_app().await;
    let request = Request::builder()
        .method(Method::GET)
        .uri("/categories")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

fn header_items(response: &axum::response::Response, name: &str) -> Vec<String> {
    response.headers()[name]
        .to_str()
        .unwrap()
        .split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .collect()
}

#[tokio::test]
async fn cors_preflight_lists_methods_and_headers() {
    let (app, _) = seeded_app().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/questions")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());

    let methods = header_items(&response, "access-control-allow-methods");
    for method in ["get", "post", "patch", "delete", "options"] {
        assert!(methods.iter().any(|m| m == method), "missing {method} in {methods:?}");
    }
    let headers = header_items(&response, "access-control-allow-headers");
    for header in ["content-type", "authorization"] {
        assert!(headers.iter().any(|h| h == header), "missing {header} in {headers:?}");
    }
}

#[tokio::test]
async fn metrics_are_exposed() {
    let (app, _) = seeded_app().await;
    send(&app, Method::POST, "/quizzes", Some(json!({}))).await;
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("quiz_questions_served_total"));
}
