//! Error types for rbgen
//!
//! Uses `thiserror` for library errors. The three families mirror the build
//! pipeline: translation failures (one input, isolated), IO failures
//! (directory/file create or write), and configuration failures (roots or
//! config file unusable, not recoverable per file).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rbgen operations
pub type RbgenResult<T> = Result<T, RbgenError>;

/// Main error type for rbgen operations
#[derive(Error, Debug)]
pub enum RbgenError {
    /// Input script failed to translate
    #[error("translation failed for {file}: {message}")]
    Translation {
        file: PathBuf,
        message: String,
        /// 1-based source line, when the translator could pin one down
        line: Option<usize>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Package directory could not be created under the build root
    #[error("could not create package directory {path}: {message}")]
    PackageDir { path: PathBuf, message: String },

    /// Configured source root does not exist or is not a directory
    #[error("source root not found: {path}")]
    SourceRootNotFound { path: PathBuf },

    /// Config file exists but could not be parsed
    #[error("invalid config in {file}: {message}")]
    InvalidConfig { file: PathBuf, message: String },

    /// Watcher could not be set up on the source tree
    #[error("watch error: {0}")]
    Watch(String),
}
