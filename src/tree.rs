//! Generated build tree
//!
//! `BuildTree` owns the mirrored output directory: it maps package names to
//! directories under the build root and writes generated files into them.
//! Directories are created lazily, one level at a time, and only ever grow;
//! nothing in this module deletes. Invariant: the directory for a package
//! exists before any file is written under it.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{RbgenError, RbgenResult};
use crate::fs::FileSystem;
use crate::models::OutputUnit;

/// The mirrored output directory root plus its package subdirectories
#[derive(Debug, Clone)]
pub struct BuildTree {
    root: PathBuf,
    host_extension: String,
}

impl BuildTree {
    pub fn new(root: impl Into<PathBuf>, host_extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            host_extension: host_extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Split a package name into its path segments. Accepts both dotted
    /// (`a.b`) and slash-separated (`a/b`) forms; empty names yield no
    /// segments.
    pub fn package_segments(package: &str) -> Vec<&str> {
        package
            .split(['.', '/'])
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Ensure the build root itself exists, creating missing levels of a
    /// nested root (e.g. `WebContent/WEB-INF/ruby-java`) one at a time.
    pub fn ensure_root<F: FileSystem + ?Sized>(&self, fs: &F) -> RbgenResult<()> {
        let mut dir = PathBuf::new();
        for component in self.root.components() {
            dir.push(component);
            if matches!(
                component,
                std::path::Component::RootDir | std::path::Component::Prefix(_)
            ) {
                continue;
            }
            self.create_level(fs, &dir)?;
        }
        Ok(())
    }

    /// Ensure the directory chain for a package exists, creating missing
    /// levels one at a time, and return the package directory path.
    ///
    /// An empty package name resolves to the build root. Safe to call
    /// repeatedly or concurrently for the same package: a level that
    /// already exists (including one created by a racing caller between
    /// the check and the create) is success.
    pub fn ensure_package_dir<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        package: &str,
    ) -> RbgenResult<PathBuf> {
        let mut dir = self.root.clone();
        for segment in Self::package_segments(package) {
            dir.push(segment);
            self.create_level(fs, &dir)?;
        }
        Ok(dir)
    }

    /// Path a unit's generated file will land at.
    pub fn unit_path(&self, unit: &OutputUnit) -> PathBuf {
        let mut path = self.root.clone();
        for segment in Self::package_segments(&unit.package) {
            path.push(segment);
        }
        path.push(format!("{}.{}", unit.simple_name(), self.host_extension));
        path
    }

    /// Write one output unit into its package directory, creating or fully
    /// replacing the file. The package directory must already exist (see
    /// `ensure_package_dir`).
    pub fn write_unit<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        unit: &OutputUnit,
    ) -> RbgenResult<PathBuf> {
        let path = self.unit_path(unit);
        fs.write_atomic(&path, &unit.source)?;
        Ok(path)
    }

    fn create_level<F: FileSystem + ?Sized>(&self, fs: &F, dir: &Path) -> RbgenResult<()> {
        if fs.exists(dir) {
            return Ok(());
        }
        match fs.create_dir(dir) {
            Ok(()) => Ok(()),
            // Racing creator got there first
            Err(RbgenError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(RbgenError::Io(e)) => Err(RbgenError::PackageDir {
                path: dir.to_path_buf(),
                message: e.to_string(),
            }),
            Err(other) => Err(other),
        }
    }
}
