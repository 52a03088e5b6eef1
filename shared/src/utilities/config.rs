use std::{path::Path, str::FromStr};

use tokio::fs;
use tracing::Level;
use url::Url;
use validator::Validate;

use crate::utilities::errors::AppError;

#[derive(Clone, Debug, Validate)]
pub struct Config {
    pub api_base_url: Url,
    pub frontend_endpoint: Url,

    pub tracing_level: Level,

    // SEARCH
    #[validate(range(min = 1, max = 10_000))]
    pub debounce_ms: u64,
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,
    #[validate(range(min = 100))]
    pub request_timeout_ms: u64,

    // SUGGESTIONS
    #[validate(range(min = 1))]
    pub suggestion_min_chars: usize,
    #[validate(range(min = 1, max = 20))]
    pub suggestion_limit: u32,

    // HISTORY
    pub recent_search_limit: usize,
}

impl Config {
    pub async fn init() -> Result<Self, AppError> {
        let api_base_url =
            get_config_value("SEARCH_API_URL", Url::parse("http://localhost:8001/api/v1")?).await?;
        let frontend_endpoint =
            get_config_value("FRONTEND_ENDPOINT", Url::parse("http://localhost:5173")?).await?;
        let tracing_level = get_config_value("TRACING_LEVEL", Level::DEBUG).await?;

        let debounce_ms = get_config_value("SEARCH_DEBOUNCE_MS", 600).await?;
        let page_size = get_config_value("SEARCH_PAGE_SIZE", 12).await?;
        let request_timeout_ms = get_config_value("SEARCH_TIMEOUT_MS", 10_000).await?;

        let suggestion_min_chars = get_config_value("SUGGESTION_MIN_CHARS", 2).await?;
        let suggestion_limit = get_config_value("SUGGESTION_LIMIT", 5).await?;

        let recent_search_limit = get_config_value("RECENT_SEARCH_LIMIT", 5).await?;

        let config = Config {
            api_base_url,
            frontend_endpoint,
            tracing_level,
            debounce_ms,
            page_size,
            request_timeout_ms,
            suggestion_min_chars,
            suggestion_limit,
            recent_search_limit,
        };

        config.validate()?;

        Ok(config)
    }
}

/// Resolve `key` from the Docker secret `/run/secrets/<key>`, then the
/// environment variable `<key>`, then `default`.
pub async fn get_config_value<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    resolve_config_value(Path::new("/run/secrets"), key, default).await
}

/// A value that is present but does not parse is an error rather than a
/// silent fallback to `default`.
async fn resolve_config_value<T: FromStr>(
    secrets_dir: &Path,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    let docker_secret = secrets_dir.join(key);
    let raw = if docker_secret.exists() {
        let content = fs::read_to_string(&docker_secret).await.map_err(|e| {
            AppError::FileReadError(format!(
                "Failed to read docker secret at {}, {}",
                docker_secret.display(),
                e
            ))
        })?;
        Some(content)
    } else {
        std::env::var(key).ok()
    };

    match raw {
        Some(value) => T::from_str(value.trim())
            .map_err(|_| AppError::InvalidConfigValueError(key.to_string())),
        None => Ok(default),
    }
}
