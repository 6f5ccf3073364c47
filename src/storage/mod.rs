//! Storage layer for reasoning tree files.
//!
//! Trees are persisted as JSON documents holding the node arena, so parent and
//! child ids survive a round trip unchanged. Loading re-validates the tree
//! structure before handing it out.

mod json;

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;

pub use json::JsonTreeStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StorageError, StorageResult};
use crate::step::{StepNode, StepTree};

/// Current version of the tree file layout.
pub const TREE_FILE_VERSION: u32 = 1;

/// Extension used for tree files.
pub const TREE_FILE_EXTENSION: &str = "json";

/// On-disk form of a reasoning tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeFile {
    /// Layout version, see [`TREE_FILE_VERSION`].
    pub format_version: u32,
    /// When the tree was written.
    pub saved_at: DateTime<Utc>,
    /// Node arena; index 0 is the root.
    pub nodes: Vec<StepNode>,
}

impl TreeFile {
    /// Snapshot a tree.
    pub fn from_tree(tree: &StepTree) -> Self {
        Self {
            format_version: TREE_FILE_VERSION,
            saved_at: Utc::now(),
            nodes: tree.nodes().to_vec(),
        }
    }

    /// Check the version and rebuild the validated tree.
    pub fn into_tree(self) -> StorageResult<StepTree> {
        if self.format_version != TREE_FILE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.format_version,
                expected: TREE_FILE_VERSION,
            });
        }
        Ok(StepTree::from_nodes(self.nodes)?)
    }
}

/// Encode a tree as a pretty-printed JSON document.
pub fn encode_tree(tree: &StepTree) -> StorageResult<String> {
    Ok(serde_json::to_string_pretty(&TreeFile::from_tree(tree))?)
}

/// Decode and validate a tree from a JSON document.
pub fn decode_tree(json: &str) -> StorageResult<StepTree> {
    serde_json::from_str::<TreeFile>(json)?.into_tree()
}

/// Persistence backend for reasoning trees.
pub trait TreeStore {
    /// Write a tree under `name` and return the file path.
    fn save(&self, name: &str, tree: &StepTree) -> StorageResult<PathBuf>;
    /// Read and validate a tree file.
    fn load(&self, path: &Path) -> StorageResult<StepTree>;
    /// All tree files known to the store, sorted by path.
    fn list(&self) -> StorageResult<Vec<PathBuf>>;
}
