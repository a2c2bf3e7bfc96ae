//! Upsert of the staging table into the target table.

mod engine;
mod key;

pub use engine::{MergeEngine, MergeMode, MergeOutcome, UpsertResult, upsert};
pub use key::{KeyIndex, MergeKey};
