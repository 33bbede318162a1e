//! Per-file problem diagnostics
//!
//! The builder records translation and write failures against the source
//! file that caused them, the way an IDE attaches problem markers. The sink
//! is a side channel only: it never influences control flow or the build
//! tree. Diagnostics for a file are cleared in bulk at the start of each
//! (re)compile attempt and re-populated only when the attempt fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A reported problem attached to a specific source file and line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Project-relative source file the problem belongs to
    pub file: PathBuf,
    pub message: String,
    /// 1-based line number; reports below 1 are normalized to 1
    pub line: usize,
    pub severity: Severity,
}

/// Sink for per-file diagnostics
pub trait DiagnosticsSink {
    /// Drop all diagnostics for a file. Idempotent; a file with no
    /// diagnostics is not an error.
    fn clear(&mut self, file: &Path);

    /// Record a problem against a file. `line` of `None` (or 0) means the
    /// reporter had no position and is normalized to line 1.
    fn report(&mut self, file: &Path, message: &str, line: Option<usize>, severity: Severity);

    /// Current diagnostics for a file, in report order.
    fn for_file(&self, file: &Path) -> Vec<Diagnostic>;
}

/// In-process diagnostics store
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    by_file: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of diagnostics across all files.
    pub fn len(&self) -> usize {
        self.by_file.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All diagnostics, grouped by file in no particular file order.
    pub fn all(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_file.values().flatten()
    }
}

impl DiagnosticsSink for MemorySink {
    fn clear(&mut self, file: &Path) {
        self.by_file.remove(file);
    }

    fn report(&mut self, file: &Path, message: &str, line: Option<usize>, severity: Severity) {
        let line = line.unwrap_or(1).max(1);
        self.by_file
            .entry(file.to_path_buf())
            .or_default()
            .push(Diagnostic {
                file: file.to_path_buf(),
                message: message.to_string(),
                line,
                severity,
            });
    }

    fn for_file(&self, file: &Path) -> Vec<Diagnostic> {
        self.by_file.get(file).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_and_query() {
        let mut sink = MemorySink::new();
        sink.report(Path::new("src/a.rb"), "boom", Some(7), Severity::Error);

        let diags = sink.for_file(Path::new("src/a.rb"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "boom");
        assert_eq!(diags[0].line, 7);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_line_below_one_normalized() {
        let mut sink = MemorySink::new();
        sink.report(Path::new("a.rb"), "no position", None, Severity::Error);
        sink.report(Path::new("a.rb"), "zero", Some(0), Severity::Warning);

        let diags = sink.for_file(Path::new("a.rb"));
        assert_eq!(diags[0].line, 1);
        assert_eq!(diags[1].line, 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut sink = MemorySink::new();
        // Clearing a file with no diagnostics is fine
        sink.clear(Path::new("never-seen.rb"));

        sink.report(Path::new("a.rb"), "boom", Some(1), Severity::Error);
        sink.clear(Path::new("a.rb"));
        sink.clear(Path::new("a.rb"));

        assert!(sink.for_file(Path::new("a.rb")).is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_clear_leaves_other_files_alone() {
        let mut sink = MemorySink::new();
        sink.report(Path::new("a.rb"), "boom", Some(1), Severity::Error);
        sink.report(Path::new("b.rb"), "bang", Some(2), Severity::Error);

        sink.clear(Path::new("a.rb"));

        assert!(sink.for_file(Path::new("a.rb")).is_empty());
        assert_eq!(sink.for_file(Path::new("b.rb")).len(), 1);
    }

    #[test]
    fn test_reports_keep_order() {
        let mut sink = MemorySink::new();
        sink.report(Path::new("a.rb"), "first", Some(1), Severity::Error);
        sink.report(Path::new("a.rb"), "second", Some(2), Severity::Warning);

        let diags = sink.for_file(Path::new("a.rb"));
        assert_eq!(diags[0].message, "first");
        assert_eq!(diags[1].message, "second");
    }
}
