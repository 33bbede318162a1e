//! Change detection
//!
//! Decides which inputs need (re)compiling. Two modes: a full scan over the
//! project tree, and an incremental pass over a change delta. Both apply
//! the same candidate filter: regular file, source extension, and path
//! under the configured source root.
//!
//! Removed events are intentionally not propagated to compilation: removing
//! a script does not delete its generated output. Stale artifacts accumulate
//! until the build tree is cleaned and rebuilt.

use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::RbgenResult;
use crate::fs::FileSystem;

/// What happened to a resource in a change delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// One entry of a change delta, with a project-relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Candidate filter plus the two detection modes
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    source_root: PathBuf,
    extension: String,
}

impl ChangeDetector {
    pub fn new(source_root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(&config.source_root, &config.source_extension)
    }

    /// Path-level filter: under the source root and carrying the source
    /// extension. File-ness is checked separately by each mode.
    pub fn is_candidate_path(&self, path: &Path) -> bool {
        path.starts_with(&self.source_root)
            && path
                .extension()
                .map(|e| e == self.extension.as_str())
                .unwrap_or(false)
    }

    /// Full scan: walk the project tree through the file system seam and
    /// collect every candidate, in deterministic traversal order
    /// (directories visited depth-first, entries name-ordered). An empty
    /// result is not an error.
    pub fn scan<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        project_root: &Path,
    ) -> RbgenResult<Vec<PathBuf>> {
        let mut candidates = Vec::new();
        if fs.is_dir(project_root) {
            self.scan_dir(fs, project_root, project_root, &mut candidates)?;
        }
        Ok(candidates)
    }

    /// Incremental mode: filter a change delta down to candidates,
    /// preserving delta order. Removed events are dropped here and nowhere
    /// else.
    pub fn candidates<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        project_root: &Path,
        events: &[ChangeEvent],
    ) -> Vec<PathBuf> {
        events
            .iter()
            .filter(|event| !matches!(event.kind, ChangeKind::Removed))
            .filter(|event| self.is_candidate_path(&event.path))
            .filter(|event| fs.is_file(&project_root.join(&event.path)))
            .map(|event| event.path.clone())
            .collect()
    }

    fn scan_dir<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        project_root: &Path,
        dir: &Path,
        candidates: &mut Vec<PathBuf>,
    ) -> RbgenResult<()> {
        let mut entries = fs.list_dir(dir)?;
        entries.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

        for path in entries {
            let hidden = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(false);

            if fs.is_dir(&path) {
                if !hidden {
                    self.scan_dir(fs, project_root, &path, candidates)?;
                }
            } else if fs.is_file(&path) {
                if let Ok(relative) = path.strip_prefix(project_root) {
                    if self.is_candidate_path(relative) {
                        candidates.push(relative.to_path_buf());
                    }
                }
            }
        }
        Ok(())
    }
}
