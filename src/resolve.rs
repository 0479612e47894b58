//! Path resolution against the served root.
//!
//! The served root is captured and canonicalized once at startup and is the
//! only state shared between connections. All resolution works on explicit
//! absolute paths; the process working directory is never consulted or
//! changed.

use crate::error::AppError;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Depth limit when the find-by-name fallback crosses into the parent of
/// the served root.
pub const PARENT_SEARCH_DEPTH: usize = 4;

/// Cap on directories visited per find-by-name call, so a pathological
/// tree cannot stall a request indefinitely.
pub const MAX_DIRS_SCANNED: usize = 4096;

/// The directory tree exposed over HTTP. Immutable for the process
/// lifetime.
#[derive(Debug)]
pub struct ServedRoot {
    root: PathBuf,
}

impl ServedRoot {
    pub fn new(directory: &Path) -> Result<Self, AppError> {
        let root = directory
            .canonicalize()
            .map_err(|_| AppError::DirectoryNotFound(directory.to_string_lossy().into_owned()))?;
        if !root.is_dir() {
            return Err(AppError::DirectoryNotFound(
                directory.to_string_lossy().into_owned(),
            ));
        }
        Ok(ServedRoot { root })
    }

    /// The canonical absolute path of the root.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a decoded request path to a canonical absolute path inside
    /// the root.
    ///
    /// The boundary check runs on the canonicalized result, after `.`,
    /// `..` and symlinks are resolved, so neither `..`-escapes nor symlink
    /// escapes can slip through on the raw concatenation.
    pub fn resolve(&self, decoded_path: &str) -> Result<PathBuf, AppError> {
        let relative = decoded_path.trim_start_matches('/');
        let joined = self.root.join(relative);
        let canonical = joined.canonicalize().map_err(AppError::from_fs)?;
        if !canonical.starts_with(&self.root) {
            warn!(
                "Path traversal attempt blocked: '{}' resolved to '{}'",
                decoded_path,
                canonical.display()
            );
            return Err(AppError::Forbidden);
        }
        Ok(canonical)
    }

    /// Locates a file by exact name for download links that carry no
    /// directory part: the root's direct children first, then the whole
    /// subtree, then up to [`PARENT_SEARCH_DEPTH`] levels into the parent
    /// of the root.
    ///
    /// The parent-tree leg deliberately reaches outside the sandbox; it is
    /// a documented convenience fallback, not a security boundary. A match
    /// must still be a regular file and never the served root itself.
    pub fn find_by_name(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('/') {
            return None;
        }

        let direct = self.root.join(name);
        if direct.is_file() {
            return Some(direct);
        }

        let mut budget = MAX_DIRS_SCANNED;
        if let Some(found) = search_dir(&self.root, name, 0, usize::MAX, &mut budget) {
            debug!("Found '{}' under served root: '{}'", name, found.display());
            return Some(found);
        }

        let parent = self.root.parent()?;
        if parent == Path::new("/") {
            return None;
        }
        let found = search_dir(parent, name, 0, PARENT_SEARCH_DEPTH, &mut budget)?;
        if found.is_file() && found != self.root {
            debug!("Found '{}' in parent tree: '{}'", name, found.display());
            Some(found)
        } else {
            None
        }
    }
}

/// Depth-first filename search. Files in a directory are checked before
/// its subdirectories are entered; unreadable directories are skipped.
fn search_dir(
    dir: &Path,
    name: &str,
    depth: usize,
    max_depth: usize,
    budget: &mut usize,
) -> Option<PathBuf> {
    if depth >= max_depth || *budget == 0 {
        return None;
    }
    *budget -= 1;

    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if file_type.is_file() && entry.file_name().to_str() == Some(name) {
            return Some(entry.path());
        }
    }

    for sub in subdirs {
        if let Some(found) = search_dir(&sub, name, depth + 1, max_depth, budget) {
            return Some(found);
        }
    }
    None
}
