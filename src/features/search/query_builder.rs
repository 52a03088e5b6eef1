//! Turns raw search-box and filter-panel input into a canonical [`SearchQuery`].
//!
//! Empty strings, unparseable numbers and incomplete date ranges are dropped
//! rather than rejected, so the same input always yields the same query.

use std::collections::BTreeSet;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::features::search::models::{
    DEFAULT_PAGE_SIZE, DateRange, SearchFilters, SearchQuery,
};

pub fn build(text: &str, filters: &SearchFilters, page: u32, page_size: u32) -> SearchQuery {
    let (min_price, max_price) = match (
        parse_price(filters.min_price.as_deref()),
        parse_price(filters.max_price.as_deref()),
    ) {
        (Some(min), Some(max)) if min > max => (Some(max), Some(min)),
        prices => prices,
    };

    SearchQuery {
        text: non_empty(Some(text)),
        category: non_empty(filters.category.as_deref()),
        min_price,
        max_price,
        location: non_empty(filters.location.as_deref()),
        date_range: parse_date_range(filters.check_in.as_deref(), filters.check_out.as_deref()),
        guests: parse_guests(filters.guests.as_deref()),
        features: normalize_features(&filters.features),
        sort_by: filters.sort_by,
        page: page.max(1),
        page_size: if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Plain non-negative decimal (`120`, `99.5`). Signs and exponent notation
/// are dropped, so `100.00` and `100` end up as the same value.
fn parse_price(value: Option<&str>) -> Option<BigDecimal> {
    let value = non_empty(value)?;
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value.as_str(), None),
    };
    let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !fraction.is_none_or(is_digits) {
        return None;
    }

    BigDecimal::from_str(&value).ok().map(|price| price.normalized())
}

fn parse_guests(value: Option<&str>) -> Option<u32> {
    non_empty(value)?.parse::<u32>().ok().filter(|guests| *guests > 0)
}

fn parse_date_range(check_in: Option<&str>, check_out: Option<&str>) -> Option<DateRange> {
    let check_in = NaiveDate::parse_from_str(&non_empty(check_in)?, "%Y-%m-%d").ok()?;
    let check_out = NaiveDate::parse_from_str(&non_empty(check_out)?, "%Y-%m-%d").ok()?;
    (check_out > check_in).then_some(DateRange {
        check_in,
        check_out,
    })
}

/// Commas separate features in the shareable URL, so `"wifi,parking"` is two
/// features here as well.
fn normalize_features(features: &[String]) -> BTreeSet<String> {
    features
        .iter()
        .flat_map(|feature| feature.split(','))
        .map(|feature| feature.trim().to_lowercase())
        .filter(|feature| !feature.is_empty())
        .collect()
}
