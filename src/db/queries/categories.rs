use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{CatalogError, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct CategoryId(pub i64);

impl CategoryId {
    /// Reserved id meaning "every category". No stored category ever has it.
    pub const ALL: CategoryId = CategoryId(0);

    pub fn is_all(self) -> bool {
        self == Self::ALL
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A category id as clients send it: either a JSON number or its string form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Int(i64),
    Text(String),
}

impl CategoryRef {
    /// `None` when the text form is not an integer; such a reference names no category.
    pub fn normalize(&self) -> Option<CategoryId> {
        match self {
            CategoryRef::Int(id) => Some(CategoryId(*id)),
            CategoryRef::Text(text) => text.trim().parse().ok().map(CategoryId),
        }
    }
}

impl From<i64> for CategoryRef {
    fn from(value: i64) -> Self {
        CategoryRef::Int(value)
    }
}

impl From<&str> for CategoryRef {
    fn from(value: &str) -> Self {
        CategoryRef::Text(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

pub async fn get_all_categories(pool: &SqlitePool) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, "type" FROM categories ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn get_category(pool: &SqlitePool, id: CategoryId) -> Result<Category> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, "type" FROM categories WHERE categories.id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| CatalogError::not_found(format!("category {id}")))
}

/// Highest id the table has ever handed out, deleted rows included.
pub(crate) async fn last_issued_id(pool: &SqlitePool, table: &str) -> Result<i64> {
    let seq: Option<i64> = sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = ?1")
        .bind(table)
        .fetch_optional(pool)
        .await?;
    Ok(seq.unwrap_or(0))
}

pub async fn category_exists(pool: &SqlitePool, id: CategoryId) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn create_category(pool: &SqlitePool, kind: &str) -> Result<Category> {
    if kind.is_empty() {
        return Err(CatalogError::validation("category type is empty"));
    }
    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories ("type") VALUES (?1) RETURNING id, "type"
        "#,
    )
    .bind(kind)
    .fetch_one(pool)
    .await?;
    tracing::info!("Created category {} ({})", category.id, category.kind);
    Ok(category)
}

pub async fn update_category(pool: &SqlitePool, category: &Category) -> Result<()> {
    if category.kind.is_empty() {
        return Err(CatalogError::validation("category type is empty"));
    }
    let updated = sqlx::query(
        r#"
        UPDATE categories SET "type" = ?1 WHERE categories.id = ?2
        "#,
    )
    .bind(&category.kind)
    .bind(category.id)
    .execute(pool)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(CatalogError::not_found(format!("category {}", category.id)));
    }
    Ok(())
}

/// Deletes the category together with every question filed under it.
/// Returns how many questions went with it.
pub async fn delete_category(pool: &SqlitePool, id: CategoryId) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let questions = sqlx::query("DELETE FROM questions WHERE category = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let deleted = sqlx::query("DELETE FROM categories WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        // dropping the transaction rolls it back
        return Err(CatalogError::not_found(format!("category {id}")));
    }
    tx.commit().await?;

    tracing::info!("Deleted category {id} and {questions} question(s)");
    Ok(questions)
}

/// Makes the stored categories match `categories`: unknown ids are inserted,
/// known ids updated and ids absent from the input deleted with their questions.
/// New rows may not take an id that was already issued and deleted.
pub async fn import_categories(pool: &SqlitePool, categories: Vec<Category>) -> Result<()> {
    if let Some(empty) = categories.iter().find(|c| c.kind.is_empty()) {
        return Err(CatalogError::validation(format!(
            "category {} has an empty type",
            empty.id
        )));
    }
    let existing_ids: HashSet<CategoryId> = get_all_categories(pool)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let last_id = last_issued_id(pool, "categories").await?;
    if let Some(reused) = categories
        .iter()
        .find(|c| !existing_ids.contains(&c.id) && c.id.0 <= last_id)
    {
        return Err(CatalogError::validation(format!(
            "category id {} was already used",
            reused.id
        )));
    }
    let new_ids: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();

    let mut tx = pool.begin().await?;
    for id in existing_ids.difference(&new_ids) {
        sqlx::query("DELETE FROM questions WHERE category = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    for category in &categories {
        let sql = if existing_ids.contains(&category.id) {
            r#"UPDATE categories SET "type" = ?2 WHERE id = ?1"#
        } else {
            r#"INSERT INTO categories (id, "type") VALUES (?1, ?2)"#
        };
        sqlx::query(sql)
            .bind(category.id)
            .bind(&category.kind)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!("Imported {} categories", categories.len());
    Ok(())
}
