//! Error types for the seed loading pipeline.
//!
//! - [`ConfigError`] - Invalid configuration values
//! - [`ModelError`] - Model document loading and validation errors
//! - [`CsvError`] - Seed file decoding and parsing errors
//! - [`StatementError`] - Insert statement construction errors
//! - [`RecordError`] - Errors inserting one table
//! - [`LoadError`] - Top-level errors returned by [`crate::load`]
//!
//! Resolution misses and persistence-skip entities are not errors: they show up
//! as [`crate::SkippedFile`] entries in the load report.

use std::path::PathBuf;
use thiserror::Error;

use crate::db::ClientError;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be interpreted.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// A required variable is not set.
    #[error("Missing {0} environment variable")]
    Missing(String),
}

// =============================================================================
// Model Errors
// =============================================================================

/// Errors while reading a model document.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Failed to read the model file.
    #[error("Failed to read model: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON or does not match the model shape.
    #[error("Model JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document failed schema validation.
    #[error("Invalid model document: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or parsing a seed file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not valid UTF-8.
    #[error("File is not valid UTF-8")]
    Encoding,

    /// Malformed CSV content.
    #[error("Line {line}: {message}")]
    Parse { line: u64, message: String },
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Statement Errors
// =============================================================================

/// Errors while building an insert statement.
#[derive(Debug, Error)]
pub enum StatementError {
    /// Table or column name that cannot be embedded unquoted.
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Seed file has rows but no header.
    #[error("Seed file has no columns")]
    NoColumns,
}

/// Errors of [`crate::records::load_records`].
#[derive(Debug, Error)]
pub enum RecordError {
    /// Statement could not be built.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// The database rejected the statement.
    #[error("Insert into '{table}' failed: {source}")]
    Database {
        table: String,
        #[source]
        source: ClientError,
    },
}

// =============================================================================
// Load Errors (top-level)
// =============================================================================

/// Top-level errors of a load run.
///
/// The first error aborts the remaining files of the run.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Seed file could not be read or parsed.
    #[error("Seed file '{}': {source}", .file.display())]
    Csv {
        file: PathBuf,
        #[source]
        source: CsvError,
    },

    /// Insert statement could not be built.
    #[error("Seed file '{}': {source}", .file.display())]
    Statement {
        file: PathBuf,
        #[source]
        source: StatementError,
    },

    /// Directory listing failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The database rejected the statement for a file.
    #[error("Insert into '{table}' from '{}' failed: {source}", .file.display())]
    Database {
        file: PathBuf,
        table: String,
        #[source]
        source: ClientError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_model_lists_all_errors() {
        let err = ModelError::Invalid(vec!["first".into(), "second".into()]);
        let msg = err.to_string();
        assert!(msg.contains("first"));
        assert!(msg.contains("second"));
    }

    #[test]
    fn test_database_error_names_file_and_table() {
        let err = LoadError::Database {
            file: PathBuf::from("/seed/data/Books.csv"),
            table: "Books".into(),
            source: "relation does not exist".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Books.csv"));
        assert!(msg.contains("'Books'"));
        assert!(msg.contains("relation does not exist"));
    }

    #[test]
    fn test_csv_error_conversion_keeps_line() {
        let data = "a,b\n1,2\n3\n";
        let mut reader = csv::ReaderBuilder::new().from_reader(data.as_bytes());
        let err = reader
            .records()
            .find_map(|r| r.err())
            .expect("ragged row should fail");
        match CsvError::from(err) {
            CsvError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
