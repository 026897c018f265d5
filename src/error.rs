//! Error types for gator.

use thiserror::Error;

/// Common error type for gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// Missing or malformed command arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (unknown command, unknown user, no feed to fetch).
    #[error("{0} not found")]
    NotFound(String),

    /// Transport failure or non-success response while fetching a feed.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed XML, unparseable timestamp.
    #[error("parse error: {0}")]
    Parse(String),

    /// A uniqueness constraint was violated.
    ///
    /// Post ingestion recovers from this locally; everywhere else it is
    /// surfaced like any other failure.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other persistence failure.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error, including unparseable intervals.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatorError {
    /// Whether this error is a uniqueness violation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatorError::Conflict(_))
    }
}

// Unique violations (SQLite 2067, PostgreSQL 23505) become `Conflict` so the
// ingestion path can tell a duplicate post apart from a real failure.
impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return GatorError::Conflict(db_err.message().to_string());
            }
        }
        GatorError::Database(e.to_string())
    }
}

/// Result type alias for gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = GatorError::NotFound("command bogus".to_string());
        assert_eq!(err.to_string(), "command bogus not found");
    }

    #[test]
    fn test_validation_error_display() {
        let err = GatorError::Validation("must provide username".to_string());
        assert_eq!(err.to_string(), "validation error: must provide username");
    }

    #[test]
    fn test_network_error_display() {
        let err = GatorError::Network("HTTP error: 500".to_string());
        assert_eq!(err.to_string(), "network error: HTTP error: 500");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GatorError = io_err.into();
        assert!(matches!(err, GatorError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_row_not_found_is_database_error() {
        let err: GatorError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, GatorError::Database(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_is_conflict() {
        assert!(GatorError::Conflict("posts.url".to_string()).is_conflict());
        assert!(!GatorError::Parse("bad xml".to_string()).is_conflict());
    }
}
