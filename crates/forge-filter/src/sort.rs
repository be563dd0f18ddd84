//! Sort-parameter compilation.
//!
//! A leading `-` on the sort field means descending; absence of a field
//! defaults to most-recent-first (`createdAt` descending). Registered
//! string fields sort case-insensitively via a lowercase shadow key, and
//! registered virtual fields (joined/derived values) emit a join stage
//! before the sort stage. Ties always break on `id` ascending so paging
//! is stable.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use forge_core::defaults;

/// A sort field backed by a joined collection (e.g. a derived numeric
/// value living on a related record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedSort {
    /// Foreign collection to join.
    pub collection: String,
    /// Local field holding the foreign key.
    pub local_field: String,
    /// Foreign field the join matches on.
    pub foreign_field: String,
    /// Key inside the joined document to sort by.
    pub sort_key: String,
}

/// Registry of per-resource sort behaviors.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// String-typed fields compared case-insensitively.
    pub case_insensitive: Vec<String>,
    /// Virtual sort fields requiring a join stage.
    pub joined: BTreeMap<String, JoinedSort>,
}

impl SortOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_insensitive(mut self, field: impl Into<String>) -> Self {
        self.case_insensitive.push(field.into());
        self
    }

    pub fn joined(mut self, field: impl Into<String>, join: JoinedSort) -> Self {
        self.joined.insert(field.into(), join);
        self
    }
}

/// Compiled sort specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
    pub case_insensitive: bool,
    pub join: Option<JoinedSort>,
}

impl SortSpec {
    /// Sort direction as the aggregation document value.
    pub fn direction(&self) -> i64 {
        if self.descending {
            -1
        } else {
            1
        }
    }

    /// Render the aggregation stages for this sort: an optional `$lookup`
    /// (joined fields), an optional `$addFields` lowercase shadow
    /// (case-insensitive fields), then the `$sort` with the `id` tiebreak.
    pub fn to_stages(&self) -> Vec<JsonValue> {
        let mut stages = Vec::new();
        let mut sort_key = self.field.clone();

        if let Some(join) = &self.join {
            stages.push(serde_json::json!({
                "$lookup": {
                    "from": join.collection,
                    "localField": join.local_field,
                    "foreignField": join.foreign_field,
                    "as": self.field,
                }
            }));
            sort_key = format!("{}.{}", self.field, join.sort_key);
        } else if self.case_insensitive {
            let shadow = format!("{}_lower", self.field);
            stages.push(serde_json::json!({
                "$addFields": { (shadow.clone()): { "$toLower": format!("${}", self.field) } }
            }));
            sort_key = shadow;
        }

        stages.push(serde_json::json!({
            "$sort": { (sort_key): self.direction(), "id": 1 }
        }));
        stages
    }
}

/// Compile a raw `sort` parameter into a [`SortSpec`].
pub fn compile_sort(raw: Option<&str>, opts: &SortOptions) -> SortSpec {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());

    let (field, descending) = match raw {
        None => (defaults::SORT_DEFAULT_FIELD.to_string(), true),
        Some(s) => match s.strip_prefix('-') {
            Some(field) => (field.to_string(), true),
            None => (s.to_string(), false),
        },
    };

    SortSpec {
        case_insensitive: opts.case_insensitive.iter().any(|f| f == &field),
        join: opts.joined.get(&field).cloned(),
        field,
        descending,
    }
}
