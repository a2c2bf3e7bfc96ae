//! Common types used throughout the sync pipeline.
//!
//! Item records as returned by the admin API, and the rectangular table types produced by
//! normalization and consumed by the table store and the merge engine.

mod cell;
mod item;
mod schema;
mod table;
mod table_row;

pub use cell::*;
pub use item::*;
pub use schema::*;
pub use table::*;
pub use table_row::*;
