use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::queries::questions::{get_all_questions, get_questions_for_category};
use crate::db::{CategoryId, CategoryRef, Question};
use crate::error::Result;
use crate::telemetry::{QUIZ_EXHAUSTED_CNTR, QUIZ_SERVED_CNTR};

pub const NO_MORE_QUESTIONS: &str = "No more questions available";

#[derive(Debug, Clone, Deserialize)]
pub struct QuizCategory {
    #[serde(default)]
    pub id: Option<CategoryRef>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub previous_questions: Vec<i64>,
    #[serde(default)]
    pub quiz_category: Option<QuizCategory>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub question: Option<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Which questions a quiz draws from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scope {
    All,
    /// `None` is an id that cannot name any category, so nothing matches it.
    Category(Option<CategoryId>),
}

impl Scope {
    pub fn from_quiz_category(quiz_category: Option<&QuizCategory>) -> Self {
        match quiz_category.and_then(|c| c.id.as_ref()) {
            None => Scope::All,
            Some(id) => match id.normalize() {
                Some(id) if id.is_all() => Scope::All,
                normalized => Scope::Category(normalized),
            },
        }
    }

    pub fn admits(&self, question: &Question) -> bool {
        match self {
            Scope::All => true,
            Scope::Category(id) => *id == Some(question.category),
        }
    }

    /// Metric label for this scope. A category id is only used once it is known to
    /// hold questions, so clients can not mint new series with made-up ids.
    fn label(&self, has_questions: bool) -> String {
        match self {
            Scope::All => "all".to_owned(),
            Scope::Category(Some(id)) if has_questions => id.to_string(),
            Scope::Category(_) => "unknown".to_owned(),
        }
    }
}

/// Picks uniformly among `questions` that are in `scope` and not in `previous`.
pub fn pick_next<'a, R: Rng + ?Sized>(
    questions: &'a [Question],
    previous: &HashSet<i64>,
    scope: Scope,
    rng: &mut R,
) -> Option<&'a Question> {
    let candidates: Vec<&Question> = questions
        .iter()
        .filter(|q| !previous.contains(&q.id) && scope.admits(q))
        .collect();
    candidates.choose(rng).copied()
}

pub async fn play(pool: &SqlitePool, request: QuizRequest) -> Result<QuizResponse> {
    let scope = Scope::from_quiz_category(request.quiz_category.as_ref());
    let questions = match scope {
        Scope::All => get_all_questions(pool).await?,
        Scope::Category(Some(id)) => get_questions_for_category(pool, id).await?,
        Scope::Category(None) => Vec::new(),
    };
    let previous: HashSet<i64> = request.previous_questions.into_iter().collect();

    let picked = pick_next(&questions, &previous, scope, &mut rand::thread_rng()).cloned();
    let label = scope.label(!questions.is_empty());
    match picked {
        Some(question) => {
            QUIZ_SERVED_CNTR.with_label_values(&[label.as_str()]).inc();
            tracing::debug!("Quiz in scope {scope:?} got question {}", question.id);
            Ok(QuizResponse {
                question: Some(question),
                message: None,
            })
        }
        None => {
            QUIZ_EXHAUSTED_CNTR.with_label_values(&[label.as_str()]).inc();
            tracing::debug!(
                "Quiz in scope {scope:?} exhausted after {} question(s)",
                previous.len()
            );
            Ok(QuizResponse {
                question: None,
                message: Some(NO_MORE_QUESTIONS),
            })
        }
    }
}
