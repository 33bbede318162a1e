//! Core data models for rbgen
//!
//! Defines the transient value types that flow through one compile pass:
//! - `SourceUnit`: one input script plus its logical paths and content
//! - `OutputUnit`: one generated Java class definition emitted by a translator
//!
//! Both are single-pass values; neither is persisted across builds. The only
//! cross-pass state is the generated file tree itself (see `tree::BuildTree`).

use std::path::{Path, PathBuf};

/// One input script selected for (re)compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Project-relative path (e.g. `src/pkg/thing.rb`)
    pub path: PathBuf,

    /// Path relative to the source root (e.g. `pkg/thing.rb`)
    ///
    /// Passed to the translator as a naming hint; generated bootstrap code
    /// reports load failures against it.
    pub relative_path: PathBuf,

    /// Raw script text
    pub text: String,
}

impl SourceUnit {
    /// Build a SourceUnit, deriving the relative path by stripping the
    /// source-root prefix. Returns `None` if `path` is not under `source_root`.
    pub fn new(path: impl Into<PathBuf>, source_root: &Path, text: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let relative_path = path.strip_prefix(source_root).ok()?.to_path_buf();
        Some(Self {
            path,
            relative_path,
            text: text.into(),
        })
    }

    /// Relative script path as a forward-slash string, the form embedded in
    /// generated code regardless of host platform.
    pub fn script_name(&self) -> String {
        let parts: Vec<_> = self
            .relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        parts.join("/")
    }
}

/// One generated class definition.
///
/// A single script may yield zero, one, or many output units (one per class
/// defined in the script). Identity within a pass is `(package, qualified
/// name)`; nothing is persisted across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Dotted qualified name (e.g. `pkg.A`)
    pub qualified_name: String,

    /// Package name, dot- or slash-separated, possibly empty
    pub package: String,

    /// Generated source text
    pub source: String,
}

impl OutputUnit {
    pub fn new(
        qualified_name: impl Into<String>,
        package: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            package: package.into(),
            source: source.into(),
        }
    }

    /// Simple class name: the segment after the last `.` of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}
