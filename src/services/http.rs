use std::time::Duration;

use reqwest::Client;
use shared::utilities::{config::Config, errors::AppError};
use tracing::info;

pub fn build_http_client(config: &Config) -> Result<Client, AppError> {
    let client = Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    info!(
        "Search API client ready: {} (timeout {}ms)",
        config.api_base_url, config.request_timeout_ms
    );

    Ok(client)
}
