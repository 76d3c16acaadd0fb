// Registry errors - one enum for every library operation
// Hard failures propagate through these; soft failures are logged and dropped
// at the call site.

use crate::entities::BusinessCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("establishment not found: {0}")]
    NotFound(String),

    #[error("business code {0} already exists")]
    DuplicateCode(BusinessCode),

    #[error("unknown program: {0}")]
    UnknownProgram(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("search failed")]
    SearchFailed(#[source] rusqlite::Error),
}

impl RegistryError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RegistryError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// True when the SQLite error is a UNIQUE / PRIMARY KEY violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_descriptive() {
        let err = RegistryError::DuplicateCode(BusinessCode(60001234));
        assert_eq!(err.to_string(), "business code 60001234 already exists");

        let err = RegistryError::invalid("name", "must not be blank");
        assert_eq!(err.to_string(), "invalid name: must not be blank");

        let err = RegistryError::SearchFailed(rusqlite::Error::InvalidQuery);
        assert_eq!(err.to_string(), "search failed");
    }
}
