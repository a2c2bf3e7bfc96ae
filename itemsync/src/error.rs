//! Error types and result definitions for sync operations.
//!
//! Every fallible operation in the crate returns [`SyncResult`]. A [`SyncError`] carries an
//! [`ErrorKind`] used by the pipeline to decide whether a run continues, a static description,
//! optional dynamic detail, the originating error, and the call site where it was raised.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for sync operations using [`SyncError`] as the error type.
pub type SyncResult<T> = Result<T, SyncError>;

/// Main error type for sync operations.
///
/// Cheap to clone: the source and backtrace are shared.
#[derive(Debug, Clone)]
pub struct SyncError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Specific categories of errors that can occur during a sync run.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Configuration Errors
    ConfigError,

    // Security & Authentication Errors
    AuthenticationError,

    // Source Errors
    SourceConnectionFailed,
    SourceRequestFailed,
    SourceResponseInvalid,

    // Data & Transformation Errors
    ConversionError,
    InvalidData,
    SchemaMismatch,

    // Table Errors
    TableMissing,
    TableCorrupted,
    StorageError,

    // IO & Deserialization Errors
    IoError,
    DeserializationError,

    // State Errors
    InvalidState,

    // Unknown / Uncategorized
    Unknown,
}

impl SyncError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        self.backtrace.as_ref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// The stored source is preserved across clones and exposed via [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SyncError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }
}

impl PartialEq for SyncError {
    fn eq(&self, other: &SyncError) -> bool {
        self.kind == other.kind
    }
}

impl Hash for SyncError {
    /// Hashes only the error kind and static description so that occurrences of the same
    /// failure group together regardless of location or detail.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.description.hash(state);
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        write_detail(self.detail.as_deref(), f, 1)?;
        write_backtrace(self.backtrace.as_ref(), f, 1)?;

        Ok(())
    }
}

impl error::Error for SyncError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

/// Writes the captured backtrace with indentation.
fn write_backtrace(
    backtrace: &Backtrace,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    let indent_str = "  ".repeat(indent);

    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() && rendered_backtrace != "disabled backtrace" {
        write!(f, "\n{indent_str}Backtrace:")?;
        for line in rendered_backtrace.lines() {
            if line.trim().is_empty() {
                write!(f, "\n{indent_str}  ")?;
            } else {
                write!(f, "\n{indent_str}  {line}")?;
            }
        }
    }

    Ok(())
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    if let Some(detail) = detail {
        let indent_str = "  ".repeat(indent);
        if detail.trim().is_empty() {
            write!(f, "\n{indent_str}Detail: <empty>")?;
        } else {
            write!(f, "\n{indent_str}Detail:")?;
            for line in detail.lines() {
                if line.trim().is_empty() {
                    write!(f, "\n{indent_str}  ")?;
                } else {
                    write!(f, "\n{indent_str}  {line}")?;
                }
            }
        }
    }

    Ok(())
}

/// Creates a [`SyncError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SyncError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SyncError {
        SyncError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`SyncError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SyncError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SyncError {
        SyncError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`SyncError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SyncError {
    #[track_caller]
    fn from(err: std::io::Error) -> SyncError {
        let detail = err.to_string();
        SyncError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`SyncError`] with the appropriate error kind.
impl From<serde_json::Error> for SyncError {
    #[track_caller]
    fn from(err: serde_json::Error) -> SyncError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        SyncError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`reqwest::Error`] to [`SyncError`].
///
/// Connection failures and timeouts map to [`ErrorKind::SourceConnectionFailed`], undecodable
/// bodies to [`ErrorKind::SourceResponseInvalid`].
impl From<reqwest::Error> for SyncError {
    #[track_caller]
    fn from(err: reqwest::Error) -> SyncError {
        let (kind, description) = if err.is_timeout() {
            (ErrorKind::SourceConnectionFailed, "HTTP request timed out")
        } else if err.is_connect() {
            (ErrorKind::SourceConnectionFailed, "HTTP connection failed")
        } else if err.is_decode() {
            (
                ErrorKind::SourceResponseInvalid,
                "HTTP response body could not be decoded",
            )
        } else if err.is_builder() {
            (ErrorKind::ConfigError, "HTTP request could not be built")
        } else if err.is_status() {
            (ErrorKind::SourceRequestFailed, "HTTP request failed")
        } else {
            (ErrorKind::SourceConnectionFailed, "HTTP request failed")
        };

        let detail = err.to_string();
        SyncError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`arrow::error::ArrowError`] to [`SyncError`] with [`ErrorKind::ConversionError`].
impl From<arrow::error::ArrowError> for SyncError {
    #[track_caller]
    fn from(err: arrow::error::ArrowError) -> SyncError {
        let detail = err.to_string();
        SyncError::from_components(
            ErrorKind::ConversionError,
            Cow::Borrowed("Arrow conversion failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`parquet::errors::ParquetError`] to [`SyncError`] with [`ErrorKind::StorageError`].
impl From<parquet::errors::ParquetError> for SyncError {
    #[track_caller]
    fn from(err: parquet::errors::ParquetError) -> SyncError {
        let detail = err.to_string();
        SyncError::from_components(
            ErrorKind::StorageError,
            Cow::Borrowed("Parquet operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`tempfile::PersistError`] to [`SyncError`] with [`ErrorKind::IoError`].
impl From<tempfile::PersistError> for SyncError {
    #[track_caller]
    fn from(err: tempfile::PersistError) -> SyncError {
        let detail = err.to_string();
        SyncError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("Atomic file replacement failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err.error)),
        )
    }
}

/// Converts [`tokio::task::JoinError`] to [`SyncError`] with [`ErrorKind::InvalidState`].
impl From<tokio::task::JoinError> for SyncError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> SyncError {
        let detail = err.to_string();
        SyncError::from_components(
            ErrorKind::InvalidState,
            Cow::Borrowed("Blocking storage task failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::error::Error;

    use super::*;
    use crate::{bail, sync_error};

    fn hash_of(err: &SyncError) -> u64 {
        let mut hasher = DefaultHasher::new();
        err.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn display_includes_kind_description_location_and_detail() {
        let err = sync_error!(
            ErrorKind::TableMissing,
            "Table does not exist",
            "no manifest at /tmp/items"
        );

        let rendered = err.to_string();

        assert!(rendered.starts_with("[TableMissing] Table does not exist @ "));
        assert!(rendered.contains("error.rs:"));
        assert!(rendered.contains("Detail:\n    no manifest at /tmp/items"));
        assert_eq!(err.detail(), Some("no manifest at /tmp/items"));
    }

    #[test]
    fn hash_ignores_detail_and_location() {
        let a = sync_error!(ErrorKind::InvalidData, "Bad row", "row 1");
        let b = sync_error!(ErrorKind::InvalidData, "Bad row", "row 2");
        let c = sync_error!(ErrorKind::InvalidData, "Other");

        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(hash_of(&a), hash_of(&c));
        assert_eq!(a, c);
    }

    #[test]
    fn source_is_preserved_across_clones() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err = sync_error!(ErrorKind::IoError, "Read failed", source: io);
        let cloned = err.clone();

        assert_eq!(cloned.source().unwrap().to_string(), "missing file");
    }

    #[test]
    fn io_errors_convert_with_detail() {
        let err: SyncError = std::io::Error::other("disk full").into();

        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(err.detail(), Some("disk full"));
    }

    #[test]
    fn json_syntax_errors_are_deserialization_errors() {
        let err: SyncError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();

        assert_eq!(err.kind(), ErrorKind::DeserializationError);
    }

    #[test]
    fn bail_returns_early() {
        fn check(value: i64) -> SyncResult<i64> {
            if value < 0 {
                bail!(ErrorKind::InvalidData, "Negative value", format!("{value}"));
            }
            Ok(value)
        }

        assert_eq!(check(3).unwrap(), 3);
        let err = check(-1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(err.detail(), Some("-1"));
    }
}
