//! Content management module.
//!
//! This module provides:
//! - Content / ContentType / TypedContent: records and the closed set of types
//! - ContentStore: query execution (PostgreSQL via PgContentStore)
//! - ContentHandler / TypedHandler: fetch and count with type filtering
//! - normalize_type: the one-type-predicate rule

mod handler;
mod model;
mod store;
mod type_filter;

pub use handler::{ContentHandler, TypedHandler};
pub use model::{Content, ContentField, ContentType, TypedContent, UnknownContentType};
pub use store::{ContentStore, PgContentStore, pg_arguments};
pub use type_filter::{clear_type, normalize_type};
