//! Typed error surface for the crate.
//!
//! Every public entry point returns `Result<T, Error>`. The CLI binary wraps
//! these in `anyhow` for convenient `?`-propagation and human-readable exit
//! diagnostics; library callers match on [`Error`] directly.

use std::path::PathBuf;

/// The crate's error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument was invalid: a null/empty element, a
    /// mismatched array width, an unreadable enum value, a nested
    /// `begin_transaction`, and similar misuse.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedded SQL engine reported a failure not otherwise classified
    /// (constraint violation, malformed SQL, I/O at the storage layer).
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    /// A migration script failed to apply.
    #[error("migration {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: Box<Error>,
    },

    /// The introspected schema violates the collection/vector/set/time-series
    /// naming and structural convention.
    #[error("schema validation failed: {0}")]
    Schema(String),

    /// An insert-time failure not classifiable as a generic `Database` error
    /// (e.g. a vector/set group whose arrays disagree in length).
    #[error("failed to create element in {collection}: {reason}")]
    CreateElement { collection: String, reason: String },

    /// A label, attribute, table, or migration version could not be found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A CSV document failed to parse, or failed schema-aware validation
    /// during import.
    #[error("csv error: {0}")]
    Csv(String),

    /// Filesystem access failed (schema file, migrations directory, CSV path).
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    pub fn csv(msg: impl Into<String>) -> Self {
        Error::Csv(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn create_element(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CreateElement {
            collection: collection.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
