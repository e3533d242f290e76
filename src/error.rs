//! Error types for the optimizer engine and its CLI front-end.

use std::path::PathBuf;

/// Everything that can go wrong while driving a [`crate::context::Context`].
#[derive(Debug, thiserror::Error)]
pub enum AsmOptError {
    #[error("no input has been parsed")]
    NoInput,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CLI flag was malformed, unknown, or missing its value. Constructed
    /// from clap's own parse failure in `main`'s `parse_cli`, and directly
    /// when stdin is a terminal and no input path was given.
    #[error("missing value for argument {flag}")]
    InvalidArgument { flag: String },
}

pub type Result<T> = std::result::Result<T, AsmOptError>;
