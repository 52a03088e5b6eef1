use shared::utilities::errors::SearchError;
use tracing::{debug, warn};

use crate::features::search::{
    guard::{RequestGuard, RequestKind, RequestTicket},
    models::{QuerySignature, Suggestion},
};

/// What the controller should do with the suggestion dropdown after the
/// debounced text settled.
#[derive(Debug)]
pub enum SuggestionPlan {
    /// Text too short: empty the dropdown.
    Clear,
    /// Same text as the latest lookup: nothing to do.
    Skip,
    Fetch {
        ticket: RequestTicket,
        text: String,
        limit: u32,
    },
}

/// Autocomplete lookups, independent of the main pagination state.
///
/// Failures never surface; they become an empty list.
#[derive(Debug)]
pub struct SuggestionFetcher {
    min_chars: usize,
    limit: u32,
    guard: RequestGuard,
}

impl SuggestionFetcher {
    pub fn new(min_chars: usize, limit: u32) -> Self {
        Self {
            min_chars,
            limit,
            guard: RequestGuard::new(),
        }
    }

    pub fn should_fetch(&self, text: &str) -> bool {
        text.trim().chars().count() >= self.min_chars
    }

    pub fn plan(&mut self, text: &str) -> SuggestionPlan {
        if !self.should_fetch(text) {
            self.guard.abandon();
            return SuggestionPlan::Clear;
        }

        let text = text.trim().to_string();
        let signature = QuerySignature::from(text.as_str());
        if self.guard.is_duplicate(&signature) {
            return SuggestionPlan::Skip;
        }

        SuggestionPlan::Fetch {
            ticket: self.guard.issue(RequestKind::Fresh, signature),
            text,
            limit: self.limit,
        }
    }

    /// `None` when the response is stale and must not touch the dropdown.
    pub fn resolve(
        &mut self,
        seq: u64,
        result: Result<Vec<Suggestion>, SearchError>,
    ) -> Option<Vec<Suggestion>> {
        if !self.guard.accept(seq) {
            debug!(seq, "discarding stale suggestions");
            return None;
        }

        match result {
            Ok(mut suggestions) => {
                suggestions.truncate(self.limit as usize);
                Some(suggestions)
            }
            Err(SearchError::Cancelled) => None,
            Err(e) => {
                warn!(error = %e, "suggestion lookup failed");
                self.guard.forget_signature();
                Some(Vec::new())
            }
        }
    }

    pub fn cancel(&mut self) {
        self.guard.abandon();
    }
}
