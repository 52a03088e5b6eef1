use shared::{services::kv::KvStore, utilities::errors::AppError};
use tracing::debug;

const RECENT_SEARCHES_KEY: &str = "recent_searches";

/// Texts of recent successful searches, most recent first.
#[derive(Debug)]
pub struct RecentSearches<S: KvStore> {
    store: S,
    limit: usize,
}

impl<S: KvStore> RecentSearches<S> {
    pub fn new(store: S, limit: usize) -> Self {
        Self { store, limit }
    }

    pub fn list(&self) -> Result<Vec<String>, AppError> {
        match self.store.get(RECENT_SEARCHES_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Moves `text` to the front. Repeats are matched case-insensitively and
    /// blank text is ignored.
    pub fn record(&self, text: &str) -> Result<Vec<String>, AppError> {
        let text = text.trim();
        let mut recent = self.list()?;
        if text.is_empty() || self.limit == 0 {
            return Ok(recent);
        }

        let lowered = text.to_lowercase();
        recent.retain(|existing| existing.to_lowercase() != lowered);
        recent.insert(0, text.to_string());
        recent.truncate(self.limit);

        debug!("Recording recent search '{}'", text);
        self.store
            .set(RECENT_SEARCHES_KEY, &serde_json::to_string(&recent)?)?;
        Ok(recent)
    }

    pub fn clear(&self) -> Result<(), AppError> {
        self.store.delete(RECENT_SEARCHES_KEY)
    }
}
