//! Listing query endpoint: the filter grammar over the listing repository.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{Map as JsonMap, Value as JsonValue};

use forge_core::{defaults, ListingQuery};
use forge_filter::{compile_filter, compile_sort, JoinedSort, PageRequest, Paginated, SortOptions};

use crate::error::ApiError;
use crate::state::AppState;

/// Fields hidden from callers whose budget tier lacks entitlement.
const REDACTED_FIELDS: &[&str] = &["businessName", "contactEmail", "phone"];

/// Sort behaviors registered for the listing resource.
fn listing_sort_options() -> SortOptions {
    SortOptions::new()
        .case_insensitive("businessName")
        .case_insensitive("city")
        .joined(
            "budgetTier",
            JoinedSort {
                collection: "budget_tiers".into(),
                local_field: "budget_tier_id".into(),
                foreign_field: "id".into(),
                sort_key: "rank".into(),
            },
        )
}

/// `GET /listings`: filtered, sorted, paginated listing query.
///
/// Query parameters follow the filter grammar (`budget=gte:1000`,
/// `city=in:Austin,Dallas`, `or:status=active`, ...) with `page`, `limit`,
/// and `sort` reserved. Budget-tier redaction runs after sort/pagination
/// against unredacted data, so ordering and totals are unaffected by the
/// caller's entitlement.
pub async fn list_listings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Paginated<JsonValue>>, ApiError> {
    let raw: JsonMap<String, JsonValue> = params
        .iter()
        .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
        .collect();

    let page = PageRequest::from_params(
        params.get("page").and_then(|v| v.parse().ok()),
        params.get("limit").and_then(|v| v.parse().ok()),
    );
    let sort = compile_sort(params.get("sort").map(String::as_str), &listing_sort_options());
    let filter = compile_filter(&raw, &[])?;

    let query = ListingQuery {
        filter: (!filter.is_empty()).then(|| filter.to_document()),
        sort_field: Some(sort.field.clone()),
        sort_descending: sort.descending,
        sort_case_insensitive: sort.case_insensitive,
        skip: page.skip(),
        limit: Some(page.limit),
    };
    let (listings, total) = state.listings.query(&query).await?;

    let entitled = headers
        .get("x-budget-tier")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tier| tier.eq_ignore_ascii_case("premium"));

    let data: Vec<JsonValue> = listings
        .into_iter()
        .map(|listing| {
            let mut doc = listing.document;
            if !entitled {
                redact(&mut doc);
            }
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("id".to_string(), JsonValue::String(listing.id));
            }
            doc
        })
        .collect();

    Ok(Json(page.paginate(data, total)))
}

fn redact(doc: &mut JsonValue) {
    let Some(obj) = doc.as_object_mut() else {
        return;
    };
    for field in REDACTED_FIELDS {
        if obj.contains_key(*field) {
            obj.insert(
                field.to_string(),
                JsonValue::String(defaults::REDACTED_PLACEHOLDER.to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redact_replaces_entitled_fields_only() {
        let mut doc = json!({
            "businessName": "Acme",
            "city": "Austin",
            "phone": "555-0100",
        });
        redact(&mut doc);
        assert_eq!(doc["businessName"], defaults::REDACTED_PLACEHOLDER);
        assert_eq!(doc["phone"], defaults::REDACTED_PLACEHOLDER);
        assert_eq!(doc["city"], "Austin");
    }

    #[test]
    fn test_redact_skips_absent_fields() {
        let mut doc = json!({"city": "Austin"});
        redact(&mut doc);
        assert!(doc.get("businessName").is_none());
    }

    #[test]
    fn test_listing_sort_registry() {
        let opts = listing_sort_options();
        let spec = compile_sort(Some("businessName"), &opts);
        assert!(spec.case_insensitive);
        let spec = compile_sort(Some("-budgetTier"), &opts);
        assert!(spec.join.is_some());
    }
}
