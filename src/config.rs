//! Configuration module for rbgen
//!
//! Layout settings come from `rbgen.toml` at the project root:
//!
//! ```toml
//! source-root = "src"
//! build-root = "build"
//! source-extension = "rb"
//! host-extension = "java"
//! ```
//!
//! A missing file falls back to built-in defaults; a file that exists but
//! does not parse is a hard config error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RbgenError, RbgenResult};

/// Name of the config file looked up at the project root
pub const CONFIG_FILE: &str = "rbgen.toml";

/// Build layout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildConfig {
    /// Project-relative root of the script tree
    pub source_root: PathBuf,

    /// Project-relative root of the mirrored generated tree
    pub build_root: PathBuf,

    /// Extension of input scripts, without the dot
    pub source_extension: String,

    /// Extension of generated files, without the dot
    pub host_extension: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            build_root: PathBuf::from("build"),
            source_extension: "rb".to_string(),
            host_extension: "java".to_string(),
        }
    }
}

impl BuildConfig {
    /// Load config from a file, or defaults if the file does not exist.
    pub fn load(path: &Path) -> RbgenResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RbgenError::InvalidConfig {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load config from `rbgen.toml` under the given project root.
    pub fn load_from_project(project_root: &Path) -> RbgenResult<Self> {
        Self::load(&project_root.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = BuildConfig::default();
        assert_eq!(config.source_root, PathBuf::from("src"));
        assert_eq!(config.build_root, PathBuf::from("build"));
        assert_eq!(config.source_extension, "rb");
        assert_eq!(config.host_extension, "java");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = BuildConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "source-root = \"WebContent/WEB-INF/ruby-src\"\nbuild-root = \"WebContent/WEB-INF/ruby-java\"\n").unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.source_root, PathBuf::from("WebContent/WEB-INF/ruby-src"));
        assert_eq!(config.build_root, PathBuf::from("WebContent/WEB-INF/ruby-java"));
        // Unspecified fields keep their defaults
        assert_eq!(config.source_extension, "rb");
        assert_eq!(config.host_extension, "java");
    }

    #[test]
    fn test_load_invalid_config_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "source-root = [not toml").unwrap();

        let err = BuildConfig::load(&path).unwrap_err();
        assert!(matches!(err, RbgenError::InvalidConfig { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_load_from_project() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "host-extension = \"jav\"\n").unwrap();

        let config = BuildConfig::load_from_project(dir.path()).unwrap();
        assert_eq!(config.host_extension, "jav");
    }
}
