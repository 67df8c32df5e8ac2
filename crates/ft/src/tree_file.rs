//! Filter tree documents on disk.
//!
//! Tree files hold a single tree as pretty-printed JSON. Every load goes
//! through the schema validator, so a hand-edited file with a bad operator or
//! a duplicate id is rejected with the path of the offending value. Saves are
//! atomic: the JSON is written to a sibling temp file and renamed into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filter_tree::{import_tree, FilterTree, ImportError};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur reading or writing a tree file.
#[derive(Debug, Error)]
pub enum TreeFileError {
    /// I/O error during file read.
    #[error("failed to read tree file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error during file write.
    #[error("failed to write tree file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error during directory creation.
    #[error("failed to create directory '{path}': {source}")]
    CreateDirError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but does not hold a valid tree.
    #[error("'{path}': {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ImportError,
    },

    /// Serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tree file operations.
pub type Result<T> = std::result::Result<T, TreeFileError>;

/// A tree document at a fixed path.
#[derive(Debug, Clone)]
pub struct TreeFile {
    path: PathBuf,
}

impl TreeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads and validates the tree.
    pub fn load(&self) -> Result<FilterTree> {
        let contents = fs::read_to_string(&self.path).map_err(|e| TreeFileError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        let tree = import_tree(&contents).map_err(|e| TreeFileError::Invalid {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(path = %self.path.display(), tree_id = %tree.id, version = tree.version, "Loaded tree");
        Ok(tree)
    }

    /// Writes the tree, replacing the file atomically.
    pub fn save(&self, tree: &FilterTree) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TreeFileError::CreateDirError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(tree)?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, format!("{json}\n")).map_err(|e| TreeFileError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| TreeFileError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(path = %self.path.display(), version = tree.version, "Saved tree");
        Ok(())
    }
}
