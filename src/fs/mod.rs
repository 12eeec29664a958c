//! Filesystem module.
//!
//! Provides:
//! - Destination and media path resolution
//! - Filename generation and sanitization

pub mod naming;
pub mod paths;

pub use naming::{build_filename, sanitize_description, sanitize_path_component};
pub use paths::{get_user_folder, photo_paths, resolve_destination, video_path};
