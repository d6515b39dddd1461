use std::path::PathBuf;

use thiserror::Error;

/// Structural failures that stop a run before any output is produced.
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("Manifest {path:?} is missing required column '{column}'")]
    ManifestColumnMissing { path: PathBuf, column: &'static str },
    #[error("Table '{table}' is listed as both {first} and {second} in the change plan")]
    ConflictingTableChange {
        table: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("Similarity cutoff must be between 0 and 1 (got {0})")]
    InvalidCutoff(f64),
}
