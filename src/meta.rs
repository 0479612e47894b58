//! Filesystem metadata collection and file classification.
//!
//! Every entry is described fresh from the filesystem on each request; the
//! filesystem itself is the source of truth and nothing here is cached.

use crate::error::AppError;
use chrono::{Local, TimeZone};
use humansize::{format_size, BINARY};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Extensions classified as video content. Fixed process-wide data, never
/// rebuilt per request.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "mpeg", "mpg", "m4v", "3gp", "ogv",
];

/// Extensions classified as image content.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Video,
    Image,
    Other,
}

/// Classifies a file by extension. Display concern only, never a security
/// decision.
pub fn categorize(path: &Path) -> FileCategory {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_ascii_lowercase(),
        None => return FileCategory::Other,
    };
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Video
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Image
    } else {
        FileCategory::Other
    }
}

/// MIME type detection for common file types.
pub fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("tar") => "application/x-tar",
        Some("gz") => "application/gzip",
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        Some("wmv") => "video/x-ms-wmv",
        Some("flv") => "video/x-flv",
        Some("mkv") => "video/x-matroska",
        Some("3gp") => "video/3gpp",
        Some("mpeg") | Some("mpg") => "video/mpeg",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// A point-in-time description of one filesystem entry.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntry {
    pub name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub is_directory: bool,
    pub size: u64,
    pub size_formatted: String,
    pub modified: u64,
    pub modified_formatted: String,
    pub is_video: bool,
    pub is_image: bool,
    pub permissions: String,
    pub is_readable: bool,
    pub is_writable: bool,
}

/// Describes a single path, surfacing missing/denied outcomes as typed
/// errors for the dispatcher to map.
pub fn describe(path: &Path) -> Result<ResolvedEntry, AppError> {
    let metadata = fs::metadata(path).map_err(AppError::from_fs)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Ok(entry_from_metadata(path.to_path_buf(), name, &metadata))
}

/// Lists the immediate children of a directory, directories first, then
/// files, case-insensitive by name within each group. Entries that fail to
/// stat (permission error, deleted mid-listing) are skipped; one bad entry
/// never aborts the listing.
pub fn describe_children(dir: &Path) -> Result<Vec<ResolvedEntry>, AppError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(AppError::from_fs)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(entry_from_metadata(entry.path(), name, &metadata));
    }

    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    Ok(entries)
}

fn entry_from_metadata(path: PathBuf, name: String, metadata: &fs::Metadata) -> ResolvedEntry {
    let is_directory = metadata.is_dir();
    let size = if is_directory { 0 } else { metadata.len() };
    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let category = if is_directory {
        FileCategory::Other
    } else {
        categorize(&path)
    };
    let mode = mode_bits(metadata);

    ResolvedEntry {
        name,
        path,
        is_directory,
        size,
        size_formatted: if is_directory {
            "-".to_string()
        } else {
            format_size(size, BINARY)
        },
        modified,
        modified_formatted: format_timestamp(modified),
        is_video: category == FileCategory::Video,
        is_image: category == FileCategory::Image,
        permissions: format!("{mode:03o}"),
        is_readable: mode & 0o400 != 0,
        is_writable: !metadata.permissions().readonly(),
    }
}

fn mode_bits(metadata: &fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o777
    }
    #[cfg(not(unix))]
    {
        if metadata.permissions().readonly() {
            0o444
        } else {
            0o644
        }
    }
}

/// Formats a Unix timestamp as a local `YYYY-MM-DD HH:MM:SS` string.
pub fn format_timestamp(secs: u64) -> String {
    Local
        .timestamp_opt(secs as i64, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
