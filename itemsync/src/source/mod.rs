//! Retrieval of item records from the paginated admin API.

pub mod client;
pub mod paginator;

pub use client::{ItemsClient, PageResponse};
pub use paginator::{FetchOutcome, PaginationHalt, Paginator};
