use std::env;
use std::path::PathBuf;

use crate::error::AppError;
use crate::report::ScoreRangeScope;

/// Smallest label width that still leaves room for the ` [...]` marker.
pub const MIN_LABEL_WIDTH: usize = 7;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Tree file storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub tree_dir: PathBuf,
}

/// Tree report configuration
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub label_width: usize,
    pub score_scope: ScoreRangeScope,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let storage = StorageConfig {
            tree_dir: PathBuf::from(
                env::var("TREE_DIR").unwrap_or_else(|_| "./trees".to_string()),
            ),
        };

        let label_width = env::var("LABEL_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);
        if label_width < MIN_LABEL_WIDTH {
            return Err(AppError::Config {
                message: format!("LABEL_WIDTH must be at least {}", MIN_LABEL_WIDTH),
            });
        }

        let score_scope = match env::var("SCORE_RANGE_INCLUDE_ROOT")
            .unwrap_or_else(|_| "true".to_string())
            .to_lowercase()
            .as_str()
        {
            "false" | "0" | "no" => ScoreRangeScope::ExcludeRoot,
            _ => ScoreRangeScope::IncludeRoot,
        };

        Ok(Config {
            logging,
            storage,
            report: ReportConfig {
                label_width,
                score_scope,
            },
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tree_dir: PathBuf::from("./trees"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            label_width: 100,
            score_scope: ScoreRangeScope::IncludeRoot,
        }
    }
}
