use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    schemas::ApiResponse,
    utilities::{
        config::Config,
        errors::{AppError, SearchError},
    },
};
use tracing::debug;
use url::Url;

use crate::features::listings::schemas::ListingsPayload;
use crate::features::search::{
    client::SearchClient,
    models::{ResultPage, SearchQuery, Suggestion},
};
use crate::services::http::build_http_client;

/// Talks to the listing search backend.
#[derive(Clone, Debug)]
pub struct HttpSearchClient {
    base_url: Url,
    client: Client,
}

impl HttpSearchClient {
    pub fn new(mut base_url: Url, client: Client) -> Self {
        // Relative joins would otherwise replace the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { base_url, client }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = build_http_client(config)?;
        Ok(Self::new(config.api_base_url.clone(), client))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        self.base_url
            .join(path)
            .map_err(|e| SearchError::NetworkError(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, SearchError> {
        debug!("GET {}", url);
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let body = read_body(res).await?;

        if !status.is_success() {
            return Err(server_error(status, &body));
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(SearchError::ServerError {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            });
        }

        envelope
            .data
            .ok_or_else(|| SearchError::DecodeError("Response has no data".to_string()))
    }
}

async fn read_body(res: Response) -> Result<Vec<u8>, SearchError> {
    Ok(res.bytes().await?.to_vec())
}

/// Prefers the backend's own message over the bare status text.
fn server_error(status: StatusCode, body: &[u8]) -> SearchError {
    let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    SearchError::ServerError {
        status: status.as_u16(),
        message,
    }
}

impl SearchClient for HttpSearchClient {
    async fn search_listings(&self, query: &SearchQuery) -> Result<ResultPage, SearchError> {
        let mut url = self.endpoint("search/listings")?;
        url.query_pairs_mut().extend_pairs(query.api_params());

        let payload: ListingsPayload = self.get(url).await?;
        debug!(
            "Search page {} returned {} of {} listings",
            query.page,
            payload.listings.len(),
            payload.total
        );

        Ok(ResultPage {
            items: payload.listings,
            total: payload.total,
            page: query.page,
        })
    }

    async fn suggestions(&self, text: &str, limit: u32) -> Result<Vec<Suggestion>, SearchError> {
        let mut url = self.endpoint("search/suggestions")?;
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("limit", &limit.to_string());

        self.get(url).await
    }
}
