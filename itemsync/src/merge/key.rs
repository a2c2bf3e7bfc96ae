//! Key values and the hash index used to match staging rows to target rows.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::types::{Cell, TableRow};

/// Value of the key column of a row, usable as a hash map key.
///
/// Null is not a key: [`MergeKey::from_cell`] returns [`None`] for it so null keys never match.
/// Float keys compare by their bits, with `-0.0` folded into `0.0`, and JSON keys by their
/// serialized text, so equality agrees with [`Hash`].
#[derive(Debug, Clone)]
pub struct MergeKey(Cell);

impl PartialEq for MergeKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Cell::F64(a), Cell::F64(b)) => float_bits(*a) == float_bits(*b),
            (Cell::Json(a), Cell::Json(b)) => a.to_string() == b.to_string(),
            (a, b) => a == b,
        }
    }
}

impl Eq for MergeKey {}

impl MergeKey {
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Null => None,
            other => Some(Self(other.clone())),
        }
    }
}

impl Hash for MergeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        cell_hash(&self.0, state);
    }
}

/// Hashes a Cell value in a deterministic way.
fn cell_hash<H: Hasher>(cell: &Cell, state: &mut H) {
    std::mem::discriminant(cell).hash(state);

    match cell {
        Cell::Null => {}
        Cell::Bool(v) => v.hash(state),
        Cell::I64(v) => v.hash(state),
        Cell::F64(v) => float_bits(*v).hash(state),
        Cell::String(v) => v.hash(state),
        Cell::Json(v) => v.to_string().hash(state),
    }
}

fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Maps key values to row positions.
#[derive(Debug, Default)]
pub struct KeyIndex {
    index: HashMap<MergeKey, usize>,
}

impl KeyIndex {
    /// Indexes `rows` by the cell at `key_column`.
    ///
    /// Rows with a null key are skipped. When several rows share a key the last one wins.
    pub fn build(rows: &[TableRow], key_column: usize) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            if let Some(key) = row.get(key_column).and_then(MergeKey::from_cell) {
                index.insert(key, position);
            }
        }

        Self { index }
    }

    pub fn get(&self, key: &MergeKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
