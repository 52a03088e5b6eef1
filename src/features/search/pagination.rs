//! Result merging for fresh searches and load-more continuations.
//!
//! ```text
//! Idle -> Searching   -> Idle   (fresh search: replaces results)
//! Idle -> LoadingMore -> Idle   (load more: appends results)
//! ```
//!
//! A failed fresh search clears the list; a failed load-more keeps it and
//! rolls the page counter back.

use shared::utilities::errors::SearchError;

use crate::features::search::models::{Phase, ResultPage, SearchQuery, SearchState};

impl SearchState {
    pub fn begin_fresh(&mut self, query: SearchQuery) {
        let query = query.with_page(1);
        self.last_signature = Some(query.signature());
        self.query = query;
        self.page = 1;
        self.results.clear();
        self.total = 0;
        self.has_more = false;
        self.loading = true;
        self.phase = Phase::Searching;
        self.error = None;
    }

    pub fn apply_fresh(&mut self, page: ResultPage) {
        self.has_more = self.is_full_page(&page);
        self.results = page.items;
        self.total = page.total;
        self.settle();
    }

    pub fn fail_fresh(&mut self, error: SearchError) {
        self.results.clear();
        self.total = 0;
        self.has_more = false;
        self.error = Some(error);
        self.settle();
    }

    /// Returns the query for the next page, or `None` when there is nothing
    /// more to load or a request is already running.
    pub fn begin_load_more(&mut self) -> Option<SearchQuery> {
        if !self.has_more || self.loading {
            return None;
        }

        self.page += 1;
        self.loading = true;
        self.phase = Phase::LoadingMore;
        self.error = None;
        Some(self.query.with_page(self.page))
    }

    pub fn apply_load_more(&mut self, page: ResultPage) {
        self.has_more = self.is_full_page(&page);
        self.results.extend(page.items);
        self.total = page.total;
        self.settle();
    }

    /// Keeps what was already loaded so "load more" can simply be retried.
    pub fn fail_load_more(&mut self, error: SearchError) {
        self.page = self.page.saturating_sub(1).max(1);
        self.error = Some(error);
        self.settle();
    }

    fn is_full_page(&self, page: &ResultPage) -> bool {
        page.items.len() == self.query.page_size as usize
    }

    fn settle(&mut self) {
        self.loading = false;
        self.phase = Phase::Idle;
    }
}
