//! Crash-safe replacement of a file by a freshly written sibling
//!
//! The new content is produced into a temporary file in the target's own
//! directory and renamed over the target only once it is complete, so readers
//! see either the old file or the new one.

use crate::error::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Owner applied to rewritten files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AtomicReplacer {
    owner: Option<FileOwner>,
}

impl AtomicReplacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also chown replaced files to `owner` (best effort, Unix only)
    pub fn with_owner(owner: Option<FileOwner>) -> Self {
        Self { owner }
    }

    /// Replace `target` with whatever `write` produces.
    ///
    /// `write` receives the path of an empty temporary file next to `target`
    /// (same directory, same extension) and must fill it. If `write` fails, or
    /// anything after it does, the temporary file is removed and `target` is
    /// left untouched.
    pub async fn replace_with<F, Fut>(&self, target: &Path, write: F) -> Result<()>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let temp = Self::sibling_temp_file(target)?;
        let temp_path = temp.path().to_path_buf();

        // On every early return `temp` is dropped, which deletes it
        write(temp_path).await?;

        let permissions = tokio::fs::metadata(target).await?.permissions();
        tokio::fs::set_permissions(temp.path(), permissions).await?;

        temp.persist(target).map_err(|e| e.error)?;
        tracing::debug!("Replaced {}", target.display());

        if let Some(owner) = self.owner {
            apply_owner(target, owner);
        }

        Ok(())
    }

    fn sibling_temp_file(target: &Path) -> Result<NamedTempFile> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let suffix = target
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        Ok(tempfile::Builder::new()
            .prefix(".coverdeck-")
            .suffix(&suffix)
            .tempfile_in(dir)?)
    }
}

#[cfg(unix)]
fn apply_owner(path: &Path, owner: FileOwner) {
    match std::os::unix::fs::chown(path, Some(owner.uid), Some(owner.gid)) {
        Ok(()) => tracing::info!(
            "Fixed ownership of {} to {}:{}",
            path.display(),
            owner.uid,
            owner.gid
        ),
        Err(e) => tracing::warn!("Could not fix ownership of {}: {}", path.display(), e),
    }
}

#[cfg(not(unix))]
fn apply_owner(path: &Path, _owner: FileOwner) {
    tracing::debug!("Ownership fix-up not supported here, skipping {}", path.display());
}
