//! Error types for the merge run. Every one of them aborts the run.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table}: required column '{column}' is missing")]
    MissingColumn {
        table: String,
        column: String,
    },

    #[error("{table}: column '{column}' appears more than once")]
    DuplicateColumn {
        table: String,
        column: String,
    },

    #[error("{table}, row {row}: '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        table: String,
        row: usize,
        column: String,
        value: String,
    },
}

pub type MergeResult<T> = Result<T, MergeError>;
