//! The search controller actor.
//!
//! One task owns [`SearchState`] and is the only place it is mutated. UI
//! events come in through a [`SearchHandle`], request tasks report back on an
//! internal channel, and every change is published on a `watch` channel for
//! the rendering layer.

use std::sync::Arc;
use std::time::Duration;

use shared::{
    services::kv::KvStore,
    utilities::{
        config::Config,
        errors::{AppError, SearchError},
    },
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::features::search::{
    client::SearchClient,
    debouncer::Debouncer,
    guard::{RequestGuard, RequestKind, RequestTicket},
    history::RecentSearches,
    models::{
        DEFAULT_PAGE_SIZE, ResultPage, SearchFilters, SearchInput, SearchQuery, SearchState,
        Suggestion,
    },
    query_builder,
    suggestions::{SuggestionFetcher, SuggestionPlan},
    url_sync::{AddressBar, UrlSync},
};

#[derive(Clone, Debug)]
pub struct SearchSettings {
    pub debounce: Duration,
    pub page_size: u32,
    pub suggestion_min_chars: usize,
    pub suggestion_limit: u32,
    pub recent_search_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(600),
            page_size: DEFAULT_PAGE_SIZE,
            suggestion_min_chars: 2,
            suggestion_limit: 5,
            recent_search_limit: 5,
        }
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            page_size: config.page_size,
            suggestion_min_chars: config.suggestion_min_chars,
            suggestion_limit: config.suggestion_limit,
            recent_search_limit: config.recent_search_limit,
        }
    }
}

#[derive(Clone, Debug)]
pub enum SearchEvent {
    TextChanged(String),
    FiltersChanged(SearchFilters),
    LoadMoreRequested,
    RetryRequested,
    Shutdown,
}

#[derive(Debug)]
enum Settled {
    Search {
        seq: u64,
        kind: RequestKind,
        result: Result<ResultPage, SearchError>,
    },
    Suggestions {
        seq: u64,
        result: Result<Vec<Suggestion>, SearchError>,
    },
}

enum Step {
    Settled(Settled),
    Event(SearchEvent),
    Debounced(SearchInput),
    Stop,
}

/// Cheap to clone; every clone talks to the same controller.
#[derive(Clone, Debug)]
pub struct SearchHandle {
    events: mpsc::UnboundedSender<SearchEvent>,
    state: watch::Receiver<SearchState>,
    suggestions: watch::Receiver<Vec<Suggestion>>,
}

impl SearchHandle {
    fn send(&self, event: SearchEvent) -> Result<(), AppError> {
        self.events
            .send(event)
            .map_err(|_| AppError::ControllerStoppedError)
    }

    pub fn text_changed(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.send(SearchEvent::TextChanged(text.into()))
    }

    pub fn filters_changed(&self, filters: SearchFilters) -> Result<(), AppError> {
        self.send(SearchEvent::FiltersChanged(filters))
    }

    pub fn load_more(&self) -> Result<(), AppError> {
        self.send(SearchEvent::LoadMoreRequested)
    }

    pub fn retry(&self) -> Result<(), AppError> {
        self.send(SearchEvent::RetryRequested)
    }

    pub fn shutdown(&self) -> Result<(), AppError> {
        self.send(SearchEvent::Shutdown)
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.suggestions.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<Vec<Suggestion>> {
        self.suggestions.clone()
    }

    /// Waits until the published state satisfies `predicate`, checking the
    /// current value first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SearchState) -> bool,
    ) -> Result<SearchState, AppError> {
        let mut state = self.state.clone();
        let matched = state
            .wait_for(predicate)
            .await
            .map_err(|_| AppError::ControllerStoppedError)?;
        Ok(matched.clone())
    }

    pub async fn wait_for_suggestions(
        &self,
        predicate: impl FnMut(&Vec<Suggestion>) -> bool,
    ) -> Result<Vec<Suggestion>, AppError> {
        let mut suggestions = self.suggestions.clone();
        let matched = suggestions
            .wait_for(predicate)
            .await
            .map_err(|_| AppError::ControllerStoppedError)?;
        Ok(matched.clone())
    }
}

pub struct SearchController<C, A: AddressBar, S: KvStore> {
    client: Arc<C>,
    settings: SearchSettings,
    state: SearchState,
    input: SearchInput,
    debouncer: Debouncer<SearchInput>,
    guard: RequestGuard,
    failed: Option<RequestKind>,
    suggestions: SuggestionFetcher,
    url_sync: UrlSync<A>,
    recent: RecentSearches<S>,
    events: mpsc::UnboundedReceiver<SearchEvent>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    settled_rx: mpsc::UnboundedReceiver<Settled>,
    state_tx: watch::Sender<SearchState>,
    suggestions_tx: watch::Sender<Vec<Suggestion>>,
}

impl<C, A, S> SearchController<C, A, S>
where
    C: SearchClient,
    A: AddressBar + 'static,
    S: KvStore + 'static,
{
    /// The initial input is read from the address bar; nothing is requested
    /// until [`run`](Self::run) starts.
    pub fn new(
        client: Arc<C>,
        settings: SearchSettings,
        address_bar: A,
        store: S,
    ) -> (Self, SearchHandle) {
        let input = UrlSync::<A>::seed(address_bar.current());
        let state = SearchState::new(settings.page_size);

        let (events_tx, events) = mpsc::unbounded_channel();
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (suggestions_tx, suggestions_rx) = watch::channel(Vec::new());

        let controller = Self {
            client,
            debouncer: Debouncer::new(settings.debounce),
            guard: RequestGuard::new(),
            failed: None,
            suggestions: SuggestionFetcher::new(
                settings.suggestion_min_chars,
                settings.suggestion_limit,
            ),
            url_sync: UrlSync::new(address_bar),
            recent: RecentSearches::new(store, settings.recent_search_limit),
            settings,
            state,
            input,
            events,
            settled_tx,
            settled_rx,
            state_tx,
            suggestions_tx,
        };

        let handle = SearchHandle {
            events: events_tx,
            state: state_rx,
            suggestions: suggestions_rx,
        };

        (controller, handle)
    }

    pub fn spawn(
        client: Arc<C>,
        settings: SearchSettings,
        address_bar: A,
        store: S,
    ) -> (SearchHandle, JoinHandle<A>) {
        let (controller, handle) = Self::new(client, settings, address_bar, store);
        (handle, tokio::spawn(controller.run()))
    }

    /// Runs until shutdown or until every handle is dropped, then hands the
    /// address bar back.
    pub async fn run(mut self) -> A {
        info!("Search controller started");

        // The seeded search is not debounced.
        let seeded = self.input.clone();
        self.fresh_search(&seeded);

        loop {
            let step = tokio::select! {
                biased;
                Some(settled) = self.settled_rx.recv() => Step::Settled(settled),
                event = self.events.recv() => match event {
                    Some(event) => Step::Event(event),
                    None => Step::Stop,
                },
                input = self.debouncer.ready() => Step::Debounced(input),
            };

            match step {
                Step::Settled(settled) => self.on_settled(settled),
                Step::Event(SearchEvent::Shutdown) | Step::Stop => break,
                Step::Event(event) => self.on_event(event),
                Step::Debounced(input) => {
                    self.fresh_search(&input);
                    self.refresh_suggestions(&input.text);
                }
            }
        }

        self.debouncer.cancel();
        self.guard.abandon();
        self.suggestions.cancel();
        info!("Search controller stopped");

        self.url_sync.into_address_bar()
    }

    fn on_event(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::TextChanged(text) => {
                self.input.text = text;
                self.debouncer.push(self.input.clone());
            }
            SearchEvent::FiltersChanged(filters) => {
                self.input.filters = filters;
                self.debouncer.push(self.input.clone());
            }
            SearchEvent::LoadMoreRequested => self.load_more(),
            SearchEvent::RetryRequested => self.retry(),
            SearchEvent::Shutdown => {}
        }
    }

    fn fresh_search(&mut self, input: &SearchInput) {
        let query = query_builder::build(&input.text, &input.filters, 1, self.settings.page_size);
        if self.guard.is_duplicate(&query.signature()) {
            debug!("Skipping duplicate search '{}'", query.signature());
            return;
        }
        self.start_fresh(query);
    }

    /// Issues a fresh search without the duplicate check.
    fn start_fresh(&mut self, query: SearchQuery) {
        self.failed = None;
        self.state.begin_fresh(query);
        self.url_sync.observe(&self.state.query);

        let ticket = self
            .guard
            .issue(RequestKind::Fresh, self.state.query.signature());
        debug!(
            "Fresh search #{} for '{}'",
            ticket.seq,
            self.state.query.signature()
        );
        self.dispatch_search(ticket, self.state.query.clone());
        self.publish();
    }

    fn load_more(&mut self) {
        let Some(query) = self.state.begin_load_more() else {
            debug!("Load more ignored: nothing more to load or a request is running");
            return;
        };

        self.failed = None;
        let ticket = self.guard.issue(RequestKind::LoadMore, query.signature());
        debug!("Loading page {} as request #{}", query.page, ticket.seq);
        self.dispatch_search(ticket, query);
        self.publish();
    }

    fn retry(&mut self) {
        match self.failed.take() {
            Some(RequestKind::LoadMore) => self.load_more(),
            Some(RequestKind::Fresh) => self.start_fresh(self.state.query.clone()),
            None => debug!("Retry ignored: nothing has failed"),
        }
    }

    fn dispatch_search(&self, ticket: RequestTicket, query: SearchQuery) {
        let RequestTicket { seq, kind, token } = ticket;
        let client = Arc::clone(&self.client);
        let settled = self.settled_tx.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => Err(SearchError::Cancelled),
                result = client.search_listings(&query) => result,
            };
            if settled.send(Settled::Search { seq, kind, result }).is_err() {
                debug!("Controller gone, dropping response #{}", seq);
            }
        });
    }

    fn refresh_suggestions(&mut self, text: &str) {
        match self.suggestions.plan(text) {
            SuggestionPlan::Clear => {
                self.suggestions_tx.send_if_modified(|current| {
                    let modified = !current.is_empty();
                    current.clear();
                    modified
                });
            }
            SuggestionPlan::Skip => {}
            SuggestionPlan::Fetch {
                ticket,
                text,
                limit,
            } => {
                let RequestTicket { seq, token, .. } = ticket;
                let client = Arc::clone(&self.client);
                let settled = self.settled_tx.clone();

                tokio::spawn(async move {
                    let result = tokio::select! {
                        _ = token.cancelled() => Err(SearchError::Cancelled),
                        result = client.suggestions(&text, limit) => result,
                    };
                    if settled.send(Settled::Suggestions { seq, result }).is_err() {
                        debug!("Controller gone, dropping suggestions #{}", seq);
                    }
                });
            }
        }
    }

    fn on_settled(&mut self, settled: Settled) {
        match settled {
            Settled::Search { seq, kind, result } => self.on_search_settled(seq, kind, result),
            Settled::Suggestions { seq, result } => {
                if let Some(suggestions) = self.suggestions.resolve(seq, result) {
                    self.suggestions_tx.send_replace(suggestions);
                }
            }
        }
    }

    fn on_search_settled(
        &mut self,
        seq: u64,
        kind: RequestKind,
        result: Result<ResultPage, SearchError>,
    ) {
        if !self.guard.accept(seq) {
            debug!("Discarding stale response #{}", seq);
            return;
        }

        match (kind, result) {
            (_, Err(SearchError::Cancelled)) => return,
            (RequestKind::Fresh, Ok(page)) => {
                debug!("Search #{} returned {} listings", seq, page.items.len());
                self.state.apply_fresh(page);
                self.remember_search();
            }
            (RequestKind::LoadMore, Ok(page)) => {
                debug!("Page {} returned {} listings", page.page, page.items.len());
                self.state.apply_load_more(page);
            }
            (RequestKind::Fresh, Err(e)) => {
                warn!("Search #{} failed: {}", seq, e);
                self.failed = Some(RequestKind::Fresh);
                self.guard.forget_signature();
                self.state.fail_fresh(e);
            }
            (RequestKind::LoadMore, Err(e)) => {
                warn!("Loading page {} failed: {}", self.state.page, e);
                self.failed = Some(RequestKind::LoadMore);
                self.state.fail_load_more(e);
            }
        }

        self.publish();
    }

    fn remember_search(&self) {
        let Some(text) = self.state.query.text.as_deref() else {
            return;
        };
        if let Err(e) = self.recent.record(text) {
            warn!("Failed to record recent search: {}", e);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_config_defaults() {
        let settings = SearchSettings::default();
        assert_eq!(settings.debounce, Duration::from_millis(600));
        assert_eq!(settings.page_size, 12);
        assert_eq!(settings.suggestion_min_chars, 2);
        assert_eq!(settings.suggestion_limit, 5);
        assert_eq!(settings.recent_search_limit, 5);
    }
}
