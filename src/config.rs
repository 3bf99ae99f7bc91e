//! Runtime configuration read from the environment.
use crate::models::QueueConfig;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "db.sqlite3";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub queue: QueueConfig,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Missing or unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = QueueConfig::default();

        let db_path = lookup("VOCAB_REVIEW_DB")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let max_new_per_session = lookup("VOCAB_REVIEW_MAX_NEW")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_new_per_session);

        let max_review_per_session = lookup("VOCAB_REVIEW_MAX_REVIEW")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_review_per_session);

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Self {
            db_path,
            queue: QueueConfig {
                max_new_per_session,
                max_review_per_session,
            },
            log_level,
        }
    }
}
