use std::path::{Path, PathBuf};

/// Conventional index location, relative to the working directory.
pub const DEFAULT_INDEX_DIR: &str = "yaml_index";

#[derive(Debug, Clone)]
pub struct IndexDir {
    root: PathBuf,
}

impl IndexDir {
    /// Resolve the index directory from, in order of priority:
    /// 1. An explicit path (from --index-dir)
    /// 2. `yaml_index` under the current working directory
    ///
    /// Nothing is created here; the index manager decides whether a missing
    /// location is created (indexing) or reported (searching).
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let root = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR));
        Self { root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.exists()
    }
}
