//! Mirrors the current search into the address bar so searches can be shared
//! and bookmarked.
//!
//! Writing is one-directional: `UrlSync` has no way to send events back to
//! the controller, so a URL write can never start another search. The URL is
//! read exactly once, at mount, through [`UrlSync::seed`].

use tracing::debug;
use url::Url;

use crate::features::search::models::{SearchInput, SearchQuery};

/// Where the shareable URL lives. Only history-replacing writes are offered so
/// back-navigation does not step through every keystroke.
pub trait AddressBar: Send {
    fn current(&self) -> &Url;

    fn replace(&mut self, url: Url);
}

/// Address bar kept in memory; tracks how often it was replaced.
#[derive(Clone, Debug)]
pub struct MemoryAddressBar {
    url: Url,
    replaced: usize,
}

impl MemoryAddressBar {
    pub fn new(url: Url) -> Self {
        Self { url, replaced: 0 }
    }

    pub fn replace_count(&self) -> usize {
        self.replaced
    }
}

impl AddressBar for MemoryAddressBar {
    fn current(&self) -> &Url {
        &self.url
    }

    fn replace(&mut self, url: Url) {
        self.url = url;
        self.replaced += 1;
    }
}

#[derive(Debug)]
pub struct UrlSync<A: AddressBar> {
    address_bar: A,
}

impl<A: AddressBar> UrlSync<A> {
    pub fn new(address_bar: A) -> Self {
        Self { address_bar }
    }

    #[cfg(test)]
    pub fn address_bar(&self) -> &A {
        &self.address_bar
    }

    pub fn into_address_bar(self) -> A {
        self.address_bar
    }

    /// Initial search input from the URL the page was opened with.
    pub fn seed(url: &Url) -> SearchInput {
        let mut input = SearchInput::default();
        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "q" => input.text = value,
                "category" => input.filters.category = Some(value),
                "minPrice" => input.filters.min_price = Some(value),
                "maxPrice" => input.filters.max_price = Some(value),
                "location" => input.filters.location = Some(value),
                "checkIn" => input.filters.check_in = Some(value),
                "checkOut" => input.filters.check_out = Some(value),
                "guests" => input.filters.guests = Some(value),
                "features" => input
                    .filters
                    .features
                    .extend(value.split(',').map(str::to_string)),
                "sort" => input.filters.sort_by = value.parse().unwrap_or_default(),
                _ => {}
            }
        }
        input
    }

    /// Write the query into the address bar. Returns whether the URL changed.
    pub fn observe(&mut self, query: &SearchQuery) -> bool {
        let mut url = self.address_bar.current().clone();
        url.set_query(None);

        let params = url_params(query);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        if url == *self.address_bar.current() {
            return false;
        }

        debug!(url = %url, "replacing address bar url");
        self.address_bar.replace(url);
        true
    }
}

/// Address-bar parameters for the non-default parts of a query. Transient
/// state such as `page` is never written.
pub fn url_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(text) = &query.text {
        params.push(("q", text.clone()));
    }
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }
    if let Some(min_price) = &query.min_price {
        params.push(("minPrice", min_price.to_plain_string()));
    }
    if let Some(max_price) = &query.max_price {
        params.push(("maxPrice", max_price.to_plain_string()));
    }
    if let Some(location) = &query.location {
        params.push(("location", location.clone()));
    }
    if let Some(range) = &query.date_range {
        params.push(("checkIn", range.check_in.to_string()));
        params.push(("checkOut", range.check_out.to_string()));
    }
    if let Some(guests) = query.guests {
        params.push(("guests", guests.to_string()));
    }
    if !query.features.is_empty() {
        let features: Vec<&str> = query.features.iter().map(String::as_str).collect();
        params.push(("features", features.join(",")));
    }
    if !query.sort_by.is_default() {
        params.push(("sort", query.sort_by.to_string()));
    }
    params
}
