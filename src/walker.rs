use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Recognised YAML suffixes, compared case-insensitively.
const YAML_SUFFIXES: &[&str] = &[".yml", ".yaml"];

/// Recursively walk a directory and return every YAML file below it.
///
/// Paths are the root joined with each entry name, so they stay relative
/// when the root is relative. Symlinked files are followed, symlinked
/// directories are not. Any failure to list a directory aborts the walk.
pub fn discover_yaml_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();
    walk_dir(root, &mut results)?;
    results.sort();
    Ok(results)
}

fn walk_dir(current: &Path, results: &mut Vec<PathBuf>) -> Result<()> {
    let walk_err = |source| Error::Walk {
        path: current.to_path_buf(),
        source,
    };

    let entries = std::fs::read_dir(current).map_err(walk_err)?;

    for entry in entries {
        let entry = entry.map_err(walk_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(walk_err)?;

        if file_type.is_dir() {
            walk_dir(&path, results)?;
        } else if is_yaml(&path) {
            // A dangling link is kept so the loader can report the read
            // failure for it.
            if file_type.is_symlink() && path.is_dir() {
                continue;
            }
            results.push(path);
        }
    }

    Ok(())
}

/// Whether the file name ends in `.yml` or `.yaml`, ignoring case.
pub fn is_yaml(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .is_some_and(|name| {
            YAML_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
}
