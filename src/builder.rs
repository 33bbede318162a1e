//! Build orchestrator
//!
//! Drives the end-to-end flow per changed script: read the input, invoke
//! the translator once, distribute its output units through the build tree,
//! and keep the diagnostics sink in step. Failures are contained per input:
//! one malformed script never aborts the rest of the batch, and artifacts
//! written for other scripts are left untouched.

use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::detect::{ChangeDetector, ChangeEvent};
use crate::diagnostics::{DiagnosticsSink, MemorySink, Severity};
use crate::error::{RbgenError, RbgenResult};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::models::SourceUnit;
use crate::translate::Translator;
use crate::tree::BuildTree;

/// Result of one build invocation
///
/// The batch always runs to completion; failed inputs are recorded here and
/// in the diagnostics sink rather than aborting the loop.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Source files that compiled cleanly, in processing order
    pub compiled: Vec<PathBuf>,
    /// Generated files created or overwritten, project-relative
    pub written: Vec<PathBuf>,
    /// Source files whose compile attempt failed
    pub failed: Vec<PathBuf>,
    /// Human-readable error lines, one per failed input
    pub errors: Vec<String>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sequential build driver over one project
///
/// The translator instance is reused across the batch; translator purity
/// (§ `translate::Translator`) keeps that reuse invisible in the output.
pub struct Builder<T: Translator, F: FileSystem> {
    project_root: PathBuf,
    config: BuildConfig,
    detector: ChangeDetector,
    tree: BuildTree,
    translator: T,
    fs: F,
    sink: Box<dyn DiagnosticsSink>,
}

impl<T: Translator> Builder<T, LocalFileSystem> {
    /// Builder over the local file system.
    pub fn new(project_root: impl Into<PathBuf>, config: BuildConfig, translator: T) -> Self {
        Self::with_fs(project_root, config, translator, LocalFileSystem)
    }
}

impl<T: Translator, F: FileSystem> Builder<T, F> {
    pub fn with_fs(
        project_root: impl Into<PathBuf>,
        config: BuildConfig,
        translator: T,
        fs: F,
    ) -> Self {
        let project_root = project_root.into();
        let detector = ChangeDetector::from_config(&config);
        let tree = BuildTree::new(
            project_root.join(&config.build_root),
            &config.host_extension,
        );
        Self {
            project_root,
            config,
            detector,
            tree,
            translator,
            fs,
            sink: Box::new(MemorySink::new()),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Current diagnostics, for reporting after a build.
    pub fn sink(&self) -> &dyn DiagnosticsSink {
        self.sink.as_ref()
    }

    /// Full build: scan the whole project tree and compile every candidate.
    ///
    /// A missing source root is a configuration error; a source root with
    /// no candidates is an empty, successful build.
    pub fn full_build(&mut self) -> RbgenResult<BuildReport> {
        let source_root = self.project_root.join(&self.config.source_root);
        if !self.fs.exists(&source_root) {
            return Err(RbgenError::SourceRootNotFound { path: source_root });
        }

        let candidates = self.detector.scan(&self.fs, &self.project_root)?;
        Ok(self.process(&candidates))
    }

    /// Incremental build over a change delta. Removed events are dropped by
    /// the detector; everything else compiles in delta order.
    pub fn incremental_build(&mut self, events: &[ChangeEvent]) -> BuildReport {
        let candidates = self
            .detector
            .candidates(&self.fs, &self.project_root, events);
        self.process(&candidates)
    }

    fn process(&mut self, candidates: &[PathBuf]) -> BuildReport {
        let mut report = BuildReport::default();

        for path in candidates {
            match self.compile_script(path) {
                Ok(written) => {
                    report.compiled.push(path.clone());
                    report.written.extend(written);
                }
                Err(err) => {
                    self.report_failure(path, &err);
                    report.errors.push(format!("{}: {}", path.display(), err));
                    report.failed.push(path.clone());
                }
            }
        }

        report
    }

    /// Compile one candidate script and write its generated classes.
    ///
    /// Diagnostics for the file are cleared at the start of the attempt and
    /// re-populated by the caller only if this returns an error, so a
    /// previously failing script that now compiles ends up with none.
    /// Returns the project-relative paths of the files written; a write
    /// failure mid-way leaves the units already written in place.
    pub fn compile_script(&mut self, path: &Path) -> RbgenResult<Vec<PathBuf>> {
        self.sink.clear(path);

        let text = self.fs.read_to_string(&self.project_root.join(path))?;
        let source = SourceUnit::new(path, &self.config.source_root, text).ok_or_else(|| {
            RbgenError::Translation {
                file: path.to_path_buf(),
                message: format!(
                    "not under source root {}",
                    self.config.source_root.display()
                ),
                line: None,
            }
        })?;

        let units = self
            .translator
            .translate(&source.text, &source.script_name())
            .map_err(|failure| RbgenError::Translation {
                file: path.to_path_buf(),
                message: failure.message,
                line: failure.line,
            })?;

        if units.is_empty() {
            return Ok(Vec::new());
        }

        self.tree.ensure_root(&self.fs)?;

        let mut written = Vec::with_capacity(units.len());
        for unit in &units {
            self.tree.ensure_package_dir(&self.fs, &unit.package)?;
            let target = self.tree.write_unit(&self.fs, unit)?;
            written.push(self.relative_to_project(&target));
        }
        Ok(written)
    }

    fn report_failure(&mut self, path: &Path, err: &RbgenError) {
        let (message, line) = match err {
            RbgenError::Translation { message, line, .. } => (message.clone(), *line),
            other => (other.to_string(), None),
        };
        self.sink.report(path, &message, line, Severity::Error);
    }

    fn relative_to_project(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .to_path_buf()
    }
}
