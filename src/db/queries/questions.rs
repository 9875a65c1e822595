use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{CatalogError, Result};

use super::categories::{category_exists, last_issued_id, CategoryId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: CategoryId,
    pub difficulty: i64,
}

/// A difficulty as clients send it: either a JSON number or its string form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DifficultyRef {
    Int(i64),
    Text(String),
}

impl DifficultyRef {
    /// `None` when the text form is not an integer, which includes the empty string.
    pub fn normalize(&self) -> Option<i64> {
        match self {
            DifficultyRef::Int(value) => Some(*value),
            DifficultyRef::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Presence check for question fields: the zero or empty value of a type
/// counts as missing, exactly like an absent field.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for CategoryId {
    fn is_truthy(&self) -> bool {
        self.0.is_truthy()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

fn check_fields(question: &str, answer: &str, difficulty: i64, category: CategoryId) -> Result<()> {
    let missing: Vec<&str> = [
        ("question", question.is_truthy()),
        ("answer", answer.is_truthy()),
        ("difficulty", difficulty.is_truthy()),
        ("category", category.is_truthy()),
    ]
    .into_iter()
    .filter_map(|(name, present)| (!present).then_some(name))
    .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "missing fields: {}",
            missing.join(", ")
        )))
    }
}

async fn check_category(pool: &SqlitePool, category: CategoryId) -> Result<()> {
    if category_exists(pool, category).await? {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "category {category} does not exist"
        )))
    }
}

pub async fn get_all_questions(pool: &SqlitePool) -> Result<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

pub async fn get_question(pool: &SqlitePool, id: i64) -> Result<Question> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| CatalogError::not_found(format!("question {id}")))
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: CategoryId,
) -> Result<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty
        FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

/// Case-insensitive substring match on the question text. The answer is not searched.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> Result<Vec<Question>> {
    let needle = term.to_lowercase();
    let questions = get_all_questions(pool)
        .await?
        .into_iter()
        .filter(|q| q.question.to_lowercase().contains(&needle))
        .collect();
    Ok(questions)
}

pub async fn create_question(
    pool: &SqlitePool,
    question: &str,
    answer: &str,
    difficulty: i64,
    category: CategoryId,
) -> Result<Question> {
    check_fields(question, answer, difficulty, category)?;

    let mut tx = pool.begin().await?;
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
        .bind(category)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(CatalogError::validation(format!(
            "category {category} does not exist"
        )));
    }
    let created = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (question, answer, difficulty, category) VALUES (?1, ?2, ?3, ?4)
        RETURNING id, question, answer, category, difficulty
        "#,
    )
    .bind(question)
    .bind(answer)
    .bind(difficulty)
    .bind(category)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!("Created question {} in category {}", created.id, category);
    Ok(created)
}

pub async fn update_question(pool: &SqlitePool, question: &Question) -> Result<()> {
    check_fields(
        &question.question,
        &question.answer,
        question.difficulty,
        question.category,
    )?;
    check_category(pool, question.category).await?;

    let updated = sqlx::query(
        r#"
        UPDATE questions SET question = ?1, answer = ?2, difficulty = ?3, category = ?4
        WHERE questions.id = ?5
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.difficulty)
    .bind(question.category)
    .bind(question.id)
    .execute(pool)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(CatalogError::not_found(format!("question {}", question.id)));
    }
    Ok(())
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> Result<()> {
    let deleted = sqlx::query("DELETE FROM questions WHERE questions.id = ?1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(CatalogError::not_found(format!("question {id}")));
    }
    tracing::info!("Deleted question {id}");
    Ok(())
}

/// Makes the stored questions match `questions`, keyed by id. Categories must
/// be imported first since every question has to reference an existing one.
/// New rows may not take an id that was already issued and deleted.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> Result<()> {
    for q in &questions {
        check_fields(&q.question, &q.answer, q.difficulty, q.category)?;
        check_category(pool, q.category).await?;
    }
    let existing_ids: HashSet<i64> = get_all_questions(pool)
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();
    let last_id = last_issued_id(pool, "questions").await?;
    if let Some(reused) = questions
        .iter()
        .find(|q| !existing_ids.contains(&q.id) && q.id <= last_id)
    {
        return Err(CatalogError::validation(format!(
            "question id {} was already used",
            reused.id
        )));
    }
    let new_ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();

    let mut tx = pool.begin().await?;
    for id in existing_ids.difference(&new_ids) {
        sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    for q in &questions {
        let sql = if existing_ids.contains(&q.id) {
            r#"
            UPDATE questions SET question = ?2, answer = ?3, difficulty = ?4, category = ?5
            WHERE id = ?1
            "#
        } else {
            r#"
            INSERT INTO questions (id, question, answer, difficulty, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#
        };
        sqlx::query(sql)
            .bind(q.id)
            .bind(&q.question)
            .bind(&q.answer)
            .bind(q.difficulty)
            .bind(q.category)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!("Imported {} questions", questions.len());
    Ok(())
}
