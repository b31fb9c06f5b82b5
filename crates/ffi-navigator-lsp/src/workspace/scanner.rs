//! Source file discovery

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::config::WorkspaceSettings;
use crate::error::Result;

/// Configured scan directories under `root` followed by `extra`, without repeats
pub fn scan_dirs(root: &Path, settings: &WorkspaceSettings, extra: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in settings.scan_dirs.iter().map(|d| root.join(d)).chain(extra) {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// Every file below `dirs` with one of `extensions`, sorted and deduplicated.
///
/// Missing directories contribute nothing.
pub fn collect_files(dirs: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in dirs {
        if !dir.is_dir() {
            debug!("Skipping missing scan directory {}", dir.display());
            continue;
        }
        let escaped = Pattern::escape(&dir.to_string_lossy());
        for ext in extensions {
            let pattern = format!("{}/**/*.{}", escaped, ext);
            for entry in glob::glob(&pattern)? {
                match entry {
                    Ok(path) if path.is_file() => files.push(path),
                    Ok(_) => {}
                    Err(e) => warn!("Cannot list {}: {}", e.path().display(), e),
                }
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}
