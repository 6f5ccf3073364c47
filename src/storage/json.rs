use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{decode_tree, encode_tree, TreeStore, TREE_FILE_EXTENSION};
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::step::StepTree;

/// Directory-backed store of JSON tree files
#[derive(Debug, Clone)]
pub struct JsonTreeStore {
    dir: PathBuf,
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl JsonTreeStore {
    /// Create a store rooted at the configured tree directory
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_dir(&config.tree_dir)
    }

    /// Create a store rooted at `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the tree files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collect(dir: &Path, found: &mut Vec<PathBuf>) -> StorageResult<()> {
        let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| io_error(dir, e))?.path();
            if path.is_dir() {
                Self::collect(&path, found)?;
            } else if path.extension().is_some_and(|ext| ext == TREE_FILE_EXTENSION) {
                found.push(path);
            }
        }
        Ok(())
    }
}

impl TreeStore for JsonTreeStore {
    fn save(&self, name: &str, tree: &StepTree) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let suffix = format!(".{}", TREE_FILE_EXTENSION);
        let path = if name.ends_with(&suffix) {
            self.dir.join(name)
        } else {
            self.dir.join(format!("{}{}", name, suffix))
        };

        let json = encode_tree(tree)?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;
        info!(path = %path.display(), nodes = tree.len(), "Tree saved");
        Ok(path)
    }

    fn load(&self, path: &Path) -> StorageResult<StepTree> {
        let json = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let tree = decode_tree(&json)?;
        debug!(path = %path.display(), nodes = tree.len(), "Tree loaded");
        Ok(tree)
    }

    fn list(&self) -> StorageResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        if self.dir.is_dir() {
            Self::collect(&self.dir, &mut found)?;
        }
        found.sort();
        Ok(found)
    }
}
