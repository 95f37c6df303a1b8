//! Faceted product search service.
//!
//! Two subsystems share a tantivy-backed product index:
//!
//! - the search path ([`search`]): a structured request is compiled into an
//!   index query, executed, and assembled into a paginated, faceted,
//!   highlighted response;
//! - the indexing path ([`messaging`]): catalog events consumed from the
//!   event transport are applied to the index as idempotent upserts and
//!   deletes, with failed messages dead-lettered after a retry budget.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod messaging;
