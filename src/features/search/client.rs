use std::future::Future;

use shared::utilities::errors::SearchError;

use crate::features::search::models::{ResultPage, SearchQuery, Suggestion};

/// The two backend calls the controller needs. Implemented over HTTP by
/// [`crate::features::listings::repository::HttpSearchClient`]; tests plug in
/// scripted clients.
pub trait SearchClient: Send + Sync + 'static {
    fn search_listings(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<ResultPage, SearchError>> + Send;

    fn suggestions(
        &self,
        text: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Suggestion>, SearchError>> + Send;
}
