//! File system abstraction
//!
//! The builder needs a handful of capabilities from its host: read a file,
//! create/replace a file, probe and list paths, and create a single
//! directory level. Keeping them behind a trait lets tests run against an
//! in-memory tree and keeps the door open for non-local workspaces; every
//! read and write of the build core goes through this seam.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::RbgenResult;

/// Abstract file system interface
pub trait FileSystem {
    /// Read file content as UTF-8 text
    fn read_to_string(&self, path: &Path) -> RbgenResult<String>;

    /// Create or fully replace a file, atomically where possible
    fn write_atomic(&self, path: &Path, content: &str) -> RbgenResult<()>;

    /// Check if a path exists (file or directory)
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// List the entries of a directory as full paths, in no guaranteed
    /// order. A missing directory is an error.
    fn list_dir(&self, path: &Path) -> RbgenResult<Vec<PathBuf>>;

    /// Create a single directory level (parent must already exist).
    ///
    /// Callers treat "already exists" as success; implementations just
    /// surface the raw error.
    fn create_dir(&self, path: &Path) -> RbgenResult<()>;
}

/// Local disk implementation
///
/// Writes go through a temp file in the target directory followed by a
/// rename, so readers never observe a half-written artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read_to_string(&self, path: &Path) -> RbgenResult<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> RbgenResult<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new()?,
        };
        io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> RbgenResult<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> RbgenResult<()> {
        Ok(std::fs::create_dir(path)?)
    }
}

/// In-memory file system for testing
///
/// Uses `Arc<Mutex<>>` internally so it can be cloned and shared between a
/// test and the builder under test. Directory structure is tracked
/// explicitly: writes into a missing directory fail, as they do on disk.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockFileSystem {
    inner: std::sync::Arc<std::sync::Mutex<MockState>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockState {
    files: std::collections::HashMap<std::path::PathBuf, String>,
    dirs: std::collections::HashSet<std::path::PathBuf>,
    /// Paths for which create_dir/write should fail, for fault injection
    poisoned: std::collections::HashSet<std::path::PathBuf>,
}

#[cfg(test)]
impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a directory (and its ancestors) as existing.
    pub fn add_dir(&self, path: &Path) {
        let mut state = self.inner.lock().unwrap();
        let mut current = std::path::PathBuf::new();
        for comp in path.components() {
            current.push(comp);
            state.dirs.insert(current.clone());
        }
    }

    /// Register a file with content; ancestors are created implicitly.
    pub fn add_file(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        let mut state = self.inner.lock().unwrap();
        state.files.insert(path.to_path_buf(), content.to_string());
    }

    /// Make any operation targeting `path` fail with a permission error.
    pub fn poison(&self, path: &Path) {
        let mut state = self.inner.lock().unwrap();
        state.poisoned.insert(path.to_path_buf());
    }

    pub fn file_content(&self, path: &Path) -> Option<String> {
        self.inner.lock().unwrap().files.get(path).cloned()
    }

    pub fn dir_exists(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().dirs.contains(path)
    }

    pub fn file_count(&self) -> usize {
        self.inner.lock().unwrap().files.len()
    }

    fn denied(path: &Path) -> crate::error::RbgenError {
        crate::error::RbgenError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{}: permission denied", path.display()),
        ))
    }
}

#[cfg(test)]
impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> RbgenResult<String> {
        let state = self.inner.lock().unwrap();
        state.files.get(path).cloned().ok_or_else(|| {
            crate::error::RbgenError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: file not found", path.display()),
            ))
        })
    }

    fn write_atomic(&self, path: &Path, content: &str) -> RbgenResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.poisoned.contains(path) {
            return Err(Self::denied(path));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !state.dirs.contains(parent) {
                return Err(crate::error::RbgenError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{}: no such directory", parent.display()),
                )));
            }
        }
        state.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.inner.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().dirs.contains(path)
    }

    fn list_dir(&self, path: &Path) -> RbgenResult<Vec<PathBuf>> {
        let state = self.inner.lock().unwrap();
        if !state.dirs.contains(path) {
            return Err(crate::error::RbgenError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such directory", path.display()),
            )));
        }
        let mut entries: Vec<PathBuf> = state
            .dirs
            .iter()
            .chain(state.files.keys())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> RbgenResult<()> {
        let mut state = self.inner.lock().unwrap();
        if state.poisoned.contains(path) {
            return Err(Self::denied(path));
        }
        if state.dirs.contains(path) {
            return Err(crate::error::RbgenError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: directory exists", path.display()),
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !state.dirs.contains(parent) {
                return Err(crate::error::RbgenError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{}: no such directory", parent.display()),
                )));
            }
        }
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }
}
