//! Catalog operations behind the HTTP routes, including the policies that turn
//! empty results into `NotFound`.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::queries::questions::{DifficultyRef, Truthy};
use crate::db::queries::{categories, questions};
use crate::db::{CategoryId, CategoryRef, Question};
use crate::error::{CatalogError, Result};

pub const QUESTIONS_PER_PAGE: usize = 10;

pub type CategoryMap = BTreeMap<CategoryId, String>;

#[derive(Debug, Serialize)]
pub struct Categories {
    pub categories: CategoryMap,
}

#[derive(Debug, Serialize)]
pub struct QuestionsPage {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub categories: CategoryMap,
    pub current_category: Option<CategoryId>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub current_category: Option<CategoryId>,
}

#[derive(Debug, Serialize)]
pub struct CategoryQuestions {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub current_category: CategoryId,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Created {
    pub created: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Deleted {
    pub deleted: i64,
}

/// A question as submitted by a client; any field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionDraft {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub difficulty: Option<DifficultyRef>,
    pub category: Option<CategoryRef>,
}

fn category_map(categories: Vec<categories::Category>) -> CategoryMap {
    categories.into_iter().map(|c| (c.id, c.kind)).collect()
}

/// Index range of `page` (1-based), or `None` when the page starts past the end.
pub fn page_bounds(page: i64, page_size: usize, total: usize) -> Option<Range<usize>> {
    let index = usize::try_from(page.checked_sub(1)?).ok()?;
    let start = index.checked_mul(page_size)?;
    if start >= total {
        return None;
    }
    Some(start..total.min(start + page_size))
}

pub async fn get_categories(pool: &SqlitePool) -> Result<Categories> {
    let categories = categories::get_all_categories(pool).await?;
    if categories.is_empty() {
        tracing::debug!("No categories stored");
        return Err(CatalogError::not_found("no categories"));
    }
    Ok(Categories {
        categories: category_map(categories),
    })
}

pub async fn get_questions(pool: &SqlitePool, page: i64, page_size: usize) -> Result<QuestionsPage> {
    let mut questions = questions::get_all_questions(pool).await?;
    let total_questions = questions.len();
    let Some(range) = page_bounds(page, page_size, total_questions) else {
        tracing::debug!("Page {page} is out of range for {total_questions} questions");
        return Err(CatalogError::not_found(format!("page {page}")));
    };
    let categories = categories::get_all_categories(pool).await?;

    questions.truncate(range.end);
    questions.drain(..range.start);
    Ok(QuestionsPage {
        questions,
        total_questions,
        categories: category_map(categories),
        current_category: None,
    })
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> Result<Deleted> {
    questions::delete_question(pool, id).await?;
    Ok(Deleted { deleted: id })
}

pub async fn create_question(pool: &SqlitePool, draft: QuestionDraft) -> Result<Created> {
    let difficulty = draft.difficulty.as_ref().and_then(DifficultyRef::normalize);
    let category = draft.category.as_ref().and_then(CategoryRef::normalize);
    let present = draft.question.is_truthy()
        && draft.answer.is_truthy()
        && difficulty.is_truthy()
        && category.is_truthy();
    let (true, Some(question), Some(answer), Some(difficulty), Some(category)) =
        (present, draft.question, draft.answer, difficulty, category)
    else {
        return Err(CatalogError::validation("question fields are missing"));
    };
    let created =
        questions::create_question(pool, &question, &answer, difficulty, category).await?;
    Ok(Created {
        created: created.id,
    })
}

pub async fn search_questions(pool: &SqlitePool, term: &str) -> Result<SearchResults> {
    if term.is_empty() {
        return Err(CatalogError::validation("search term is empty"));
    }
    let questions = questions::search_questions(pool, term).await?;
    Ok(SearchResults {
        total_questions: questions.len(),
        questions,
        current_category: None,
    })
}

pub async fn get_questions_by_category(
    pool: &SqlitePool,
    category: CategoryId,
) -> Result<CategoryQuestions> {
    let questions = questions::get_questions_for_category(pool, category).await?;
    if questions.is_empty() {
        return Err(CatalogError::not_found(format!(
            "no questions in category {category}"
        )));
    }
    Ok(CategoryQuestions {
        total_questions: questions.len(),
        questions,
        current_category: category,
    })
}

pub async fn create_category(pool: &SqlitePool, kind: &str) -> Result<Created> {
    let category = categories::create_category(pool, kind).await?;
    Ok(Created {
        created: category.id.0,
    })
}

pub async fn delete_category(pool: &SqlitePool, id: CategoryId) -> Result<Deleted> {
    categories::delete_category(pool, id).await?;
    Ok(Deleted { deleted: id.0 })
}
