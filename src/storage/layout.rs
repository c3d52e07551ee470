use std::fs;
use std::path::PathBuf;

use crate::core::error::Result;

/// Directory structure for the store. Everything lives in one flat directory:
/// `<name>.table` for record files, `<name>.btree` for persistent ordered
/// indexes, and `<name>.posting` / `<name>.dictionary` for the key and value
/// halves of an inverted index.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(StorageLayout { base_dir })
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.table", name))
    }

    pub fn tree_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.btree", name))
    }

    pub fn posting_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.posting", name))
    }

    pub fn dictionary_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.dictionary", name))
    }
}
