//! rbgen - incremental Ruby-to-Java source builder
//!
//! rbgen watches a project source tree for Ruby scripts, compiles each
//! changed script into one or more generated Java class definitions, and
//! writes them into a mirrored build directory, creating package folders as
//! needed. Failures are isolated per input file and recorded as per-file
//! diagnostics; the batch always runs to completion.

pub mod builder;
pub mod config;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod models;
pub mod registry;
pub mod translate;
pub mod tree;
pub mod watcher;

// Re-exports for convenience
pub use builder::{BuildReport, Builder};
pub use config::{BuildConfig, CONFIG_FILE};
pub use detect::{ChangeDetector, ChangeEvent, ChangeKind};
pub use diagnostics::{Diagnostic, DiagnosticsSink, MemorySink, Severity};
pub use error::{RbgenError, RbgenResult};
pub use fs::{FileSystem, LocalFileSystem};
pub use models::{OutputUnit, SourceUnit};
pub use registry::{RuntimeRegistry, RUBY_RUNTIME_KEY};
pub use translate::{ClassBindingTranslator, TranslationFailure, Translator};
pub use tree::BuildTree;
pub use watcher::{watch, WatchEvent, WatchOptions};
