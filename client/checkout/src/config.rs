//! Configuration loaded from environment variables.

use std::path::PathBuf;

use crate::errors::{CheckoutError, Result};

/// The viewer settings the view models read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// ISO country code used to pick the default shipping rule.
    pub country_code: String,
    pub currency: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            country_code: "US".to_string(),
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding a project fragment to replay the flow against
    pub project_fixture: PathBuf,
    pub viewer: ViewerConfig,
    /// Optional JSON file holding a comment connection to page through
    pub comments_fixture: Option<PathBuf>,
    /// Whether the replayed viewer starts logged in
    pub logged_in: bool,
    /// Comments requested per page
    pub comments_page_size: u32,
    /// Capacity of the session's intent queue
    pub session_queue_depth: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            project_fixture: env_var("PROJECT_FIXTURE")
                .map(PathBuf::from)
                .map_err(|_| {
                    CheckoutError::Config(
                        "PROJECT_FIXTURE environment variable is required".to_string(),
                    )
                })?,
            comments_fixture: env_var("COMMENTS_FIXTURE").ok().map(PathBuf::from),
            viewer: ViewerConfig {
                country_code: env_var("VIEWER_COUNTRY")
                    .unwrap_or_else(|_| "US".to_string())
                    .to_ascii_uppercase(),
                currency: env_var("VIEWER_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
            },
            logged_in: env_var("VIEWER_LOGGED_IN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|_| CheckoutError::Config("Invalid VIEWER_LOGGED_IN".to_string()))?,
            comments_page_size: env_var("COMMENTS_PAGE_SIZE")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .map_err(|_| CheckoutError::Config("Invalid COMMENTS_PAGE_SIZE".to_string()))?,
            session_queue_depth: env_var("SESSION_QUEUE_DEPTH")
                .unwrap_or_else(|_| "64".to_string())
                .parse::<usize>()
                .ok()
                .filter(|depth| *depth > 0)
                .ok_or_else(|| CheckoutError::Config("Invalid SESSION_QUEUE_DEPTH".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| CheckoutError::Config(format!("Missing env var: {key}")))
}
