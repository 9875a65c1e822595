use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::catalog::QUESTIONS_PER_PAGE;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub bind_addr: String,
    pub questions_per_page: usize,
}

impl Settings {
    /// Defaults overlaid by `DB_PATH`, `BIND_ADDR` and `QUESTIONS_PER_PAGE`
    /// from the environment (`.env` included).
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_env(Environment::default())
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("db_path", "trivia.db")?
            .set_default("bind_addr", "0.0.0.0:8080")?
            .set_default("questions_per_page", QUESTIONS_PER_PAGE as u64)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        if settings.questions_per_page == 0 {
            return Err(ConfigError::Message(
                "QUESTIONS_PER_PAGE must be positive".to_owned(),
            ));
        }
        Ok(settings)
    }
}
