//! # forge-filter
//!
//! Query-string filter/sort compiler and pagination for funnelforge.
//!
//! This crate provides:
//! - Filter compilation from the flat query grammar (`gt:`, `in:`, `or:`,
//!   `regex:`, ...) into an immutable [`FilterExpression`]
//! - Literal coercion (boolean, numeric, ObjectId detection)
//! - Sort compilation with case-insensitive and joined virtual fields
//! - Pagination metadata (`currentPage` / `totalPages` / cursors)
//! - In-memory evaluation of compiled documents for the memory-backed
//!   listing repository and tests
//!
//! ## Example
//!
//! ```
//! use forge_filter::{compile_filter, compile_sort, PageRequest, SortOptions};
//! use serde_json::{json, Map, Value};
//!
//! let mut params = Map::new();
//! params.insert("age".into(), Value::String("gt:30".into()));
//!
//! let filter = compile_filter(&params, &[]).unwrap();
//! assert_eq!(filter.to_document(), json!({"age": {"$gt": 30}}));
//!
//! let sort = compile_sort(Some("-budget"), &SortOptions::new());
//! assert!(sort.descending);
//!
//! let page = PageRequest::from_params(Some(1), Some(10));
//! assert_eq!(page.skip(), 0);
//! ```

pub mod compile;
pub mod eval;
pub mod pagination;
pub mod sort;
pub mod value;

pub use compile::{
    compile_filter, escape_regex, CompareOp, Condition, FilterExpression, RESERVED_KEYS,
};
pub use eval::{compare_by_field, matches_document};
pub use pagination::{PageRef, PageRequest, Paginated};
pub use sort::{compile_sort, JoinedSort, SortOptions, SortSpec};
pub use value::{is_object_id, FilterValue};
