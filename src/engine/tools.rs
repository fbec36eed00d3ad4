//! Path and file-time utilities

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::types::MediaKind;
use crate::utils::config::ThumbnailConsts;

/// Media kind of `path` from its extension; `None` for unrecognized files and thumbnails.
pub fn media_kind_for(path: &Path) -> Option<MediaKind> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(MediaKind::from_extension)
}

/// Thumbnail location for a source file: `<parent>/.<base name without extension>.thumb`.
pub fn thumbnail_path_for(source: &Path) -> PathBuf {
    let base = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = if base.starts_with('.') {
        format!("{base}.{}", ThumbnailConsts::SUFFIX)
    } else {
        format!(".{base}.{}", ThumbnailConsts::SUFFIX)
    };
    source.parent().unwrap_or(Path::new(".")).join(name)
}

/// Rewrite forward slashes from tool output to the platform separator.
pub fn normalize_separators(raw: &str) -> PathBuf {
    if MAIN_SEPARATOR == '/' {
        PathBuf::from(raw)
    } else {
        PathBuf::from(raw.replace('/', &MAIN_SEPARATOR.to_string()))
    }
}

/// Modification time of `path`, or `None` if it does not exist or cannot be read.
pub fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A thumbnail is reusable iff it is a file and not older than its source.
pub fn is_thumbnail_fresh(thumbnail: &Path, source: &Path) -> bool {
    if !thumbnail.is_file() {
        return false;
    }
    match (mtime(thumbnail), mtime(source)) {
        (Some(thumb), Some(src)) => thumb >= src,
        _ => false,
    }
}

/// File-system creation time as a local civil timestamp. Falls back to the
/// modification time where the platform does not record creation.
pub fn fs_creation_time(path: &Path) -> Option<NaiveDateTime> {
    let meta = std::fs::metadata(path).ok()?;
    let time = meta.created().or_else(|_| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(time).naive_local())
}

/// Make `path` absolute against the current directory without resolving symlinks.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("read current directory")?;
    Ok(cwd.join(path))
}

/// Expand CLI arguments: directories are walked recursively, files pass through. All results absolute.
pub fn expand_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        let input = absolutize(input)?;
        if input.is_dir() {
            for entry in WalkDir::new(&input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if entry.file_type().is_file() {
                    out.push(entry.into_path());
                }
            }
        } else {
            out.push(input);
        }
    }
    Ok(out)
}
