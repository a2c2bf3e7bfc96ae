//! Incremental synchronization of workspace items from an administrative API into a versioned
//! table.
//!
//! A run authenticates, follows the API's continuation links to collect every item, writes a
//! dated JSON snapshot, flattens the items into a table, overwrites the staging table with it
//! and finally upserts staging into the target table. [`pipeline::Pipeline`] wires the stages
//! together and reports the outcome.

pub mod auth;
pub mod error;
mod macros;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod snapshot;
pub mod source;
pub mod staging;
pub mod store;
pub mod types;
