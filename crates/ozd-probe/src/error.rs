//! Error types for the probe crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::convert::ConversionReport;

/// Errors that can occur while probing the native library.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The native library file does not exist.
    #[error("native library not found: {}", .0.display())]
    LibraryNotFound(PathBuf),

    /// The input file does not exist.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The library exists but could not be loaded.
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The symbol is not exported by the library.
    #[error("symbol not exported: {0}")]
    SymbolMissing(String),

    /// A path cannot be passed as a C string.
    #[error("path contains an interior NUL byte: {0}")]
    InteriorNul(String),

    /// The path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// The input does not fit the `int` length parameter.
    #[error("input of {0} bytes is too large for an int length")]
    BufferTooLarge(usize),

    /// The buffer transform has nothing to work on.
    #[error("input file is empty")]
    EmptyInput,

    /// Every call shape was tried and none produced output.
    #[error("no call shape produced output ({} attempts)", .0.attempts.len())]
    AllAttemptsFailed(ConversionReport),
}

/// Result type for probe operations.
pub type Result<T> = std::result::Result<T, Error>;
