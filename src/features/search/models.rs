use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{schemas::Pagination, utilities::errors::SearchError};

pub use crate::features::listings::{
    models::ListingSummary,
    schemas::{Suggestion, SuggestionKind},
};

pub const DEFAULT_PAGE_SIZE: u32 = 12;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Rating => "rating",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::Relevance
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "relevance" => Ok(Self::Relevance),
            "newest" => Ok(Self::Newest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::Rating),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter values exactly as the user entered them. Normalization happens in
/// the query builder.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub location: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<String>,
    pub features: Vec<String>,
    pub sort_by: SortBy,
}

/// Everything the debouncer carries: the search box plus the filter panel.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct SearchInput {
    pub text: String,
    pub filters: SearchFilters,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DateRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Canonical, normalized search request. A new request is a new value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub location: Option<String>,
    pub date_range: Option<DateRange>,
    pub guests: Option<u32>,
    pub features: BTreeSet<String>,
    pub sort_by: SortBy,
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            category: None,
            min_price: None,
            max_price: None,
            location: None,
            date_range: None,
            guests: None,
            features: BTreeSet::new(),
            sort_by: SortBy::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.page_size,
        }
    }

    /// Parameters for `GET /search/listings`, in wire order.
    pub fn api_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(text) = &self.text {
            params.push(("search", text.clone()));
        }
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(min_price) = &self.min_price {
            params.push(("minPrice", min_price.to_plain_string()));
        }
        if let Some(max_price) = &self.max_price {
            params.push(("maxPrice", max_price.to_plain_string()));
        }
        if let Some(location) = &self.location {
            params.push(("location", location.clone()));
        }
        if let Some(range) = &self.date_range {
            params.push(("checkIn", range.check_in.to_string()));
            params.push(("checkOut", range.check_out.to_string()));
        }
        if let Some(guests) = self.guests {
            params.push(("guests", guests.to_string()));
        }
        for feature in &self.features {
            params.push(("features[]", feature.clone()));
        }
        let pagination = self.pagination();
        params.push(("page", pagination.page.to_string()));
        params.push(("limit", pagination.limit.to_string()));
        if !self.sort_by.is_default() {
            params.push(("sortBy", self.sort_by.to_string()));
        }
        params
    }

    /// Equality key for de-duplication. Excludes `page`: a load-more
    /// continuation belongs to the same search as its first page.
    pub fn signature(&self) -> QuerySignature {
        let mut fields = BTreeMap::new();
        for (key, value) in self.api_params() {
            match key {
                "page" => {}
                "features[]" => {}
                _ => {
                    fields.insert(key, value);
                }
            }
        }
        if !self.features.is_empty() {
            let features: Vec<&str> = self.features.iter().map(String::as_str).collect();
            fields.insert("features", features.join(","));
        }

        let canonical = fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        QuerySignature(canonical)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QuerySignature(String);

impl QuerySignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuerySignature {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for QuerySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ResultPage {
    pub items: Vec<ListingSummary>,
    pub total: u64,
    pub page: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    LoadingMore,
}

/// Owned by the controller and mutated only there. The rendering layer
/// receives clones.
#[derive(Clone, PartialEq, Debug)]
pub struct SearchState {
    pub query: SearchQuery,
    pub results: Vec<ListingSummary>,
    pub total: u64,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub phase: Phase,
    pub error: Option<SearchError>,
    pub last_signature: Option<QuerySignature>,
}

impl SearchState {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: SearchQuery {
                page_size,
                ..SearchQuery::default()
            },
            results: Vec::new(),
            total: 0,
            page: 1,
            has_more: false,
            loading: false,
            phase: Phase::Idle,
            error: None,
            last_signature: None,
        }
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_query() -> SearchQuery {
        SearchQuery {
            text: Some("camera".to_string()),
            category: Some("electronics".to_string()),
            features: ["wifi", "parking"].iter().map(|f| f.to_string()).collect(),
            ..SearchQuery::default()
        }
    }

    #[test]
    fn api_params_omit_defaults_and_repeat_features() {
        let params = camera_query().api_params();
        assert_eq!(
            params,
            vec![
                ("search", "camera".to_string()),
                ("category", "electronics".to_string()),
                ("features[]", "parking".to_string()),
                ("features[]", "wifi".to_string()),
                ("page", "1".to_string()),
                ("limit", "12".to_string()),
            ]
        );
    }

    #[test]
    fn signature_is_sorted_and_ignores_page() {
        let query = camera_query();
        assert_eq!(
            query.signature().as_str(),
            "category=electronics&features=parking,wifi&limit=12&search=camera"
        );
        assert_eq!(query.signature(), query.with_page(3).signature());
    }

    #[test]
    fn signature_changes_with_sort() {
        let mut sorted = camera_query();
        sorted.sort_by = SortBy::PriceAsc;
        assert_ne!(sorted.signature(), camera_query().signature());
        assert!(sorted.signature().as_str().contains("sortBy=price_asc"));
    }

    #[test]
    fn with_page_never_goes_below_one() {
        assert_eq!(camera_query().with_page(0).page, 1);
    }

    #[test]
    fn sort_by_round_trips_through_str() {
        for sort in [
            SortBy::Relevance,
            SortBy::Newest,
            SortBy::PriceAsc,
            SortBy::PriceDesc,
            SortBy::Rating,
        ] {
            assert_eq!(sort.as_str().parse::<SortBy>(), Ok(sort));
        }
        assert!("cheapest".parse::<SortBy>().is_err());
    }
}
