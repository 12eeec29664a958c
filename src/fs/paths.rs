//! Path and directory management.

use std::path::{Path, PathBuf};

use directories::UserDirs;

use crate::error::Result;
use crate::fs::naming::{photo_filename, sanitize_path_component};

/// Resolve the download destination.
///
/// Uses the explicit directory when given, otherwise the user's Downloads
/// directory, otherwise the current directory.
pub fn resolve_destination(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit.filter(|d| !d.as_os_str().is_empty()) {
        return dir.to_path_buf();
    }

    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Get the folder for a user's downloads under `base`.
pub fn get_user_folder(base: &Path, username: &str) -> Result<PathBuf> {
    Ok(base.join(sanitize_path_component(username)?))
}

/// Path of a video file.
pub fn video_path(destination: &Path, base_name: &str) -> PathBuf {
    destination.join(format!("{}.mp4", base_name))
}

/// Paths of the images of a photo post, in display order.
pub fn photo_paths(destination: &Path, base_name: &str, count: usize) -> Vec<PathBuf> {
    let folder = destination.join(base_name);
    (0..count).map(|i| folder.join(photo_filename(i))).collect()
}
