//! Read-only filesystem queries backing the browse and preview endpoints.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::error::{GonkError, Result};

/// Appended to preview content that was cut short.
pub const TRUNCATION_MARKER: &str = "\n\n... (file truncated)";

/// Whether the dispatcher may run this file.
pub fn is_runnable_script(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub current_path: String,
    /// `None` at the filesystem root.
    pub parent: Option<String>,
    pub items: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub is_python: bool,
    /// Only set for regular files.
    pub size: Option<u64>,
    /// Seconds since the epoch.
    pub modified: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilePreview {
    pub name: String,
    pub path: String,
    pub content: String,
}

/// List the visible entries of a directory, directories first.
pub async fn list_directory(path: &Path) -> Result<DirectoryListing> {
    let dir = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| path_error(path, e))?;

    let metadata = tokio::fs::metadata(&dir)
        .await
        .map_err(|e| path_error(&dir, e))?;
    if !metadata.is_dir() {
        return Err(GonkError::NotADirectory(dir.display().to_string()));
    }

    let mut items = Vec::new();
    let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| path_error(&dir, e))?;

    while let Some(entry) = entries.next_entry().await.map_err(|e| path_error(&dir, e))? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        // Follows symlinks so a link to a directory is browsable.
        let entry_path = entry.path();
        let metadata = match tokio::fs::metadata(&entry_path).await {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %entry_path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let is_dir = metadata.is_dir();
        items.push(DirectoryEntry {
            is_python: !is_dir && is_runnable_script(&entry_path),
            path: entry_path.display().to_string(),
            size: metadata.is_file().then(|| metadata.len()),
            modified: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64()),
            name,
            is_dir,
        });
    }

    items.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    Ok(DirectoryListing {
        current_path: dir.display().to_string(),
        parent: dir.parent().map(|p| p.display().to_string()),
        items,
    })
}

/// Read a file as text, cutting it at `max_bytes`.
///
/// At most `max_bytes + 1` bytes are read, whatever the size of the file.
pub async fn preview_file(path: &Path, max_bytes: u64) -> Result<FilePreview> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| path_error(path, e))?;
    if !metadata.is_file() {
        return Err(GonkError::NotAFile(path.display().to_string()));
    }

    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| path_error(path, e))?;
    // One byte past the cap tells a truncated file from one exactly at it.
    let mut bytes = Vec::new();
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| path_error(path, e))?;
    let limit = usize::try_from(max_bytes).unwrap_or(usize::MAX);

    let content = if bytes.len() > limit {
        let mut text = String::from_utf8_lossy(&bytes[..limit]).into_owned();
        text.push_str(TRUNCATION_MARKER);
        text
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    Ok(FilePreview {
        name: file_name(path),
        path: path.display().to_string(),
        content,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn path_error(path: &Path, e: std::io::Error) -> GonkError {
    let shown = path.display().to_string();
    match e.kind() {
        ErrorKind::NotFound => GonkError::PathNotFound(shown),
        ErrorKind::PermissionDenied => GonkError::PermissionDenied(shown),
        _ => GonkError::Io(e),
    }
}

/// Resolve the browse root: an explicit path, else the configured base.
pub fn browse_target(requested: Option<&str>, base_dir: &Path) -> PathBuf {
    match requested {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => base_dir.to_path_buf(),
    }
}
