//! In-memory listing repository.
//!
//! Evaluates compiled filter documents directly against listing documents;
//! the single-instance/testing analog of the database-backed repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use forge_core::{Listing, ListingQuery, ListingRepository, Result};
use forge_filter::{compare_by_field, matches_document};

/// In-process implementation of [`ListingRepository`].
#[derive(Default)]
pub struct MemoryListingRepository {
    listings: RwLock<Vec<Listing>>,
}

impl MemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(listings: Vec<Listing>) -> Self {
        Self {
            listings: RwLock::new(listings),
        }
    }

    pub async fn insert(&self, listing: Listing) {
        self.listings.write().await.push(listing);
    }
}

#[async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn query(&self, query: &ListingQuery) -> Result<(Vec<Listing>, i64)> {
        let all = self.listings.read().await;

        let mut matched: Vec<Listing> = all
            .iter()
            .filter(|l| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|f| matches_document(f, &l.document))
            })
            .cloned()
            .collect();
        let total = matched.len() as i64;

        let (field, descending, case_insensitive) = match &query.sort_field {
            Some(field) => (field.as_str(), query.sort_descending, query.sort_case_insensitive),
            // Repository default: most-recent-first
            None => ("createdAt", true, false),
        };
        matched.sort_by(|a, b| {
            let ord = compare_by_field(&a.document, &b.document, field, case_insensitive);
            let ord = if descending { ord.reverse() } else { ord };
            // Stable paging: ties break on id ascending
            ord.then_with(|| a.id.cmp(&b.id))
        });

        let skip = query.skip.max(0) as usize;
        let page: Vec<Listing> = match query.limit {
            Some(limit) => matched.into_iter().skip(skip).take(limit.max(0) as usize).collect(),
            None => matched.into_iter().skip(skip).collect(),
        };

        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing(id: &str, doc: serde_json::Value) -> Listing {
        Listing {
            id: id.to_string(),
            document: doc,
            embedding: None,
            exclusive: false,
        }
    }

    fn repo() -> MemoryListingRepository {
        MemoryListingRepository::seeded(vec![
            listing("a", json!({"city": "Austin", "budget": 100, "createdAt": "2026-01-01"})),
            listing("b", json!({"city": "Dallas", "budget": 300, "createdAt": "2026-01-03"})),
            listing("c", json!({"city": "Austin", "budget": 200, "createdAt": "2026-01-02"})),
        ])
    }

    #[tokio::test]
    async fn test_unfiltered_query_returns_all_most_recent_first() {
        let repo = repo();
        let (page, total) = repo.query(&ListingQuery::default()).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<&str> = page.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_filter_narrows_results_and_total() {
        let repo = repo();
        let query = ListingQuery {
            filter: Some(json!({"city": "Austin"})),
            ..Default::default()
        };
        let (page, total) = repo.query(&query).await.unwrap();
        assert_eq!(total, 2);
        assert!(page.iter().all(|l| l.document["city"] == "Austin"));
    }

    #[tokio::test]
    async fn test_sort_ascending_with_skip_and_limit() {
        let repo = repo();
        let query = ListingQuery {
            sort_field: Some("budget".into()),
            sort_descending: false,
            skip: 1,
            limit: Some(1),
            ..Default::default()
        };
        let (page, total) = repo.query(&query).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "c");
    }

    #[tokio::test]
    async fn test_equal_sort_values_tie_break_on_id() {
        let repo = MemoryListingRepository::seeded(vec![
            listing("z", json!({"budget": 100})),
            listing("a", json!({"budget": 100})),
        ]);
        let query = ListingQuery {
            sort_field: Some("budget".into()),
            sort_descending: false,
            ..Default::default()
        };
        let (page, _) = repo.query(&query).await.unwrap();
        assert_eq!(page[0].id, "a");
        assert_eq!(page[1].id, "z");
    }
}
