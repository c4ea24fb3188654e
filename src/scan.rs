use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const PAGE_SUFFIX: &str = ".html";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory '{}' not found", .0.display())]
    MissingDir(PathBuf),
    #[error("failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Profile pages directly inside `dir`, sorted by file name.
///
/// Matches every entry named `*.html`: not recursive, case as stored. Dot-files
/// and directories with a matching name are included; reading a directory
/// later fails and the page is reported as unreadable.
pub fn profile_pages(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::MissingDir(dir.to_path_buf()));
    }
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut pages = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_name().to_str().is_some_and(is_page_name) {
            pages.push(entry.path());
        }
    }
    pages.sort();
    Ok(pages)
}

fn is_page_name(name: &str) -> bool {
    name.ends_with(PAGE_SUFFIX)
}
