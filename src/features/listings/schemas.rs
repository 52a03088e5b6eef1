use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::features::listings::models::ListingSummary;

// -- =====================
// -- OUT (from backend)
// -- =====================
#[serde_as]
#[derive(Deserialize, Serialize, Default, Debug)]
pub struct ListingsPayload {
    #[serde(default)]
    pub listings: Vec<ListingSummary>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub total: u64,
}

#[derive(Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Listing,
    Location,
    Category,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: SuggestionKind,
    #[serde(default)]
    pub subtitle: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::schemas::ApiResponse;

    #[test]
    fn parses_listing_payload_with_string_total() {
        let body: ApiResponse<ListingsPayload> = serde_json::from_str(
            r#"{"success":true,"data":{"listings":[{"id":"a"},{"id":"b"}],"total":"40"}}"#,
        )
        .unwrap();

        let payload = body.data.unwrap();
        assert_eq!(payload.listings.len(), 2);
        assert_eq!(payload.total, 40);
    }

    #[test]
    fn parses_suggestions_with_unknown_type() {
        let body: ApiResponse<Vec<Suggestion>> = serde_json::from_str(
            r#"{"success":true,"data":[
                {"text":"camera","type":"category"},
                {"text":"Canon R6","type":"listing","subtitle":"Electronics"},
                {"text":"cam","type":"brand"}
            ]}"#,
        )
        .unwrap();

        let suggestions = body.data.unwrap();
        assert_eq!(suggestions[0].kind, SuggestionKind::Category);
        assert_eq!(suggestions[1].subtitle.as_deref(), Some("Electronics"));
        assert_eq!(suggestions[2].kind, SuggestionKind::Other);
    }
}
