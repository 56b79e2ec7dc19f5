use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Result, SplitpackError};

pub fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|md| md.len())
        .map_err(|source| SplitpackError::SizeProbe {
            path: path.to_path_buf(),
            partial_bytes: 0,
            source,
        })
}

/// Total size of every non-directory entry below `path`.
///
/// Directory symlinks are listed but not descended; file symlinks count the
/// size of their target. A directory that cannot be listed is skipped and the
/// walk goes on; the first such failure is returned as `SizeProbe` with every
/// byte that was counted. An entry that cannot be stat'ed stops the walk.
pub fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    let mut skipped: Option<std::io::Error> = None;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let at = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::debug!(path = %at.display(), error = %e, "skipping unreadable directory");
                if skipped.is_none() {
                    skipped = Some(e.into());
                }
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        // metadata() on the entry itself would not follow the link
        let md = fs::metadata(entry.path()).map_err(|source| SplitpackError::SizeProbe {
            path: path.to_path_buf(),
            partial_bytes: total,
            source,
        })?;
        if md.is_dir() {
            continue;
        }
        total += md.len();
    }
    match skipped {
        Some(source) => Err(SplitpackError::SizeProbe {
            path: path.to_path_buf(),
            partial_bytes: total,
            source,
        }),
        None => Ok(total),
    }
}

/// Size of a target of either kind.
pub fn target_size(path: &Path) -> Result<u64> {
    if path.is_dir() {
        directory_size(path)
    } else {
        file_size(path)
    }
}
