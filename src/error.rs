//! Error types for the translation store.
//!
//! Absence of a translation is never an error: lookups return `Option`. Every
//! variant here is fatal for the calling request and is propagated unchanged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranslationError {
    /// The storage engine rejected a statement or is unreachable.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row for `(logical_id, locale)` already exists. Callers should have
    /// updated the attached row instead of creating a new one.
    #[error("translation {logical_id} already has a row for locale '{locale}'")]
    DuplicateTranslation {
        logical_id: i64,
        locale: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The counter record could not be incremented.
    #[error("could not allocate a translation id: {0}")]
    Sequence(#[source] rusqlite::Error),

    /// A cached payload could not be encoded or decoded.
    #[error("cache payload error: {0}")]
    Cache(#[from] serde_json::Error),

    /// A field was assigned something that is neither a string nor a
    /// locale-keyed mapping of strings.
    #[error("invalid value for translated field '{field}': expected a string or a locale mapping, got {found}")]
    InvalidValue { field: String, found: &'static str },

    #[error("'{field}' is not a translated field of {model}")]
    UnknownField { model: &'static str, field: String },

    /// An identifier handed to the query builder contains characters outside
    /// `[A-Za-z0-9_]`.
    #[error("refusing to render unsafe SQL identifier {0:?}")]
    UnsafeIdentifier(String),

    #[error("database connection lock was poisoned")]
    ConnectionPoisoned,
}

impl TranslationError {
    /// Stable, lowercase name of the error kind (for logs and CLI output).
    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::Database(_) => "database",
            TranslationError::DuplicateTranslation { .. } => "duplicate_translation",
            TranslationError::Sequence(_) => "sequence",
            TranslationError::Cache(_) => "cache",
            TranslationError::InvalidValue { .. } => "invalid_value",
            TranslationError::UnknownField { .. } => "unknown_field",
            TranslationError::UnsafeIdentifier(_) => "unsafe_identifier",
            TranslationError::ConnectionPoisoned => "connection_poisoned",
        }
    }
}

/// Returns true when `err` is a UNIQUE constraint failure.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub type Result<T> = std::result::Result<T, TranslationError>;
