use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string field is empty or only whitespace.
    #[error("`{0}` cannot be empty")]
    EmptyField(&'static str),
    /// The merge must refresh at least one column on matched rows.
    #[error("`merge.update_columns` must contain at least one column")]
    NoUpdateColumns,
    /// The key column is never rewritten by the merge.
    #[error("`merge.update_columns` cannot contain the key column `{0}`")]
    KeyColumnInUpdateColumns(String),
    /// A field holds a value outside of its accepted range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
