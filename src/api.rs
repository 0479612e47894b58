//! JSON API endpoints: server status, directory info, per-file info and
//! the video list.

use crate::error::AppError;
use crate::meta::{self, ResolvedEntry};
use crate::resolve::ServedRoot;
use crate::response::HttpResponse;
use crate::utils::percent_encode;
use humansize::{format_size, BINARY};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize)]
struct StatusInfo {
    status: &'static str,
    directory: String,
    timestamp: u64,
    timestamp_formatted: String,
    total_files: usize,
    total_directories: usize,
    videos_count: usize,
    images_count: usize,
    server_version: &'static str,
}

#[derive(Serialize)]
struct DirectoryInfo {
    path: String,
    absolute_path: String,
    directories: Vec<ResolvedEntry>,
    files: Vec<ResolvedEntry>,
    total_files: usize,
    total_directories: usize,
    total_size: u64,
    total_size_formatted: String,
    parent_directory: Option<String>,
}

#[derive(Serialize)]
struct FileInfo {
    #[serde(flatten)]
    entry: ResolvedEntry,
    play_url: String,
    download_url: String,
    direct_url: String,
}

/// Routes a decoded `/api/…` path to its handler. Unknown endpoints are a
/// plain 404.
pub fn handle_api_request(path: &str, root: &ServedRoot) -> Result<HttpResponse, AppError> {
    if path == "/api/status" {
        status_info(root)
    } else if path == "/api/videos" {
        video_list(root)
    } else if let Some(name) = path.strip_prefix("/api/video/") {
        file_info(root, name)
    } else if let Some(dir) = path.strip_prefix("/api/directory/") {
        directory_info(root, dir)
    } else if path == "/api/directory" {
        directory_info(root, "")
    } else {
        Err(AppError::NotFound)
    }
}

fn json_response(body: &impl Serialize) -> Result<HttpResponse, AppError> {
    let body = serde_json::to_string_pretty(body)
        .map_err(|e| AppError::InternalServerError(format!("JSON encoding failed: {e}")))?;
    Ok(HttpResponse::new(200, "OK").with_json_body(body))
}

/// Counts of files, directories, videos and images directly under the
/// served root.
fn status_info(root: &ServedRoot) -> Result<HttpResponse, AppError> {
    let entries = meta::describe_children(root.path())?;
    let total_directories = entries.iter().filter(|e| e.is_directory).count();
    let total_files = entries.len() - total_directories;
    let videos_count = entries.iter().filter(|e| e.is_video).count();
    let images_count = entries.iter().filter(|e| e.is_image).count();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    json_response(&StatusInfo {
        status: "running",
        directory: root.path().to_string_lossy().into_owned(),
        timestamp,
        timestamp_formatted: meta::format_timestamp(timestamp),
        total_files,
        total_directories,
        videos_count,
        images_count,
        server_version: env!("CARGO_PKG_VERSION"),
    })
}

/// Listing of one directory under the root, split into directories and
/// files with size totals and a parent pointer by path string.
fn directory_info(root: &ServedRoot, dir: &str) -> Result<HttpResponse, AppError> {
    let canonical = root.resolve(dir)?;
    if !canonical.is_dir() {
        return Err(AppError::NotFound);
    }

    let (directories, files): (Vec<_>, Vec<_>) = meta::describe_children(&canonical)?
        .into_iter()
        .partition(|e| e.is_directory);
    let total_size: u64 = files.iter().map(|e| e.size).sum();

    let trimmed = dir.trim_matches('/');
    let parent_directory = if trimmed.is_empty() {
        None
    } else {
        Some(
            trimmed
                .rsplit_once('/')
                .map(|(parent, _)| parent.to_string())
                .unwrap_or_default(),
        )
    };

    json_response(&DirectoryInfo {
        path: format!("/{trimmed}"),
        absolute_path: canonical.to_string_lossy().into_owned(),
        total_files: files.len(),
        total_directories: directories.len(),
        directories,
        files,
        total_size,
        total_size_formatted: format_size(total_size, BINARY),
        parent_directory,
    })
}

/// Metadata for one file plus its play/download/direct URLs.
fn file_info(root: &ServedRoot, name: &str) -> Result<HttpResponse, AppError> {
    let canonical = root.resolve(name)?;
    if canonical.is_dir() {
        return Err(AppError::NotFound);
    }
    let entry = meta::describe(&canonical)?;
    json_response(&with_urls(entry, name))
}

/// Video-category files directly under the root.
fn video_list(root: &ServedRoot) -> Result<HttpResponse, AppError> {
    let videos: Vec<FileInfo> = meta::describe_children(root.path())?
        .into_iter()
        .filter(|e| e.is_video)
        .map(|e| {
            let name = e.name.clone();
            with_urls(e, &name)
        })
        .collect();
    json_response(&videos)
}

fn with_urls(entry: ResolvedEntry, name: &str) -> FileInfo {
    let encoded = percent_encode(name.trim_start_matches('/'));
    FileInfo {
        entry,
        play_url: format!("/play/{encoded}"),
        download_url: format!("/download/{encoded}"),
        direct_url: format!("/{encoded}"),
    }
}
