use thiserror::Error;

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or falsy input, surfaced as 422.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request framing (bad JSON, bad query string), surfaced as 400.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Internal(#[from] sqlx::Error),
}

impl CatalogError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CatalogError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CatalogError::NotFound(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::BadRequest(_) => 400,
            CatalogError::NotFound(_) => 404,
            CatalogError::Validation(_) => 422,
            CatalogError::Internal(_) => 500,
        }
    }

    /// The fixed text clients see; details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            CatalogError::BadRequest(_) => "Bad request",
            CatalogError::NotFound(_) => "Resource not found",
            CatalogError::Validation(_) => "Unprocessable entity",
            CatalogError::Internal(_) => "Internal server error",
        }
    }
}
