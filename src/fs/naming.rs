//! Filename generation and manipulation.

use crate::config::FilenameKey;
use crate::error::{Error, Result};
use crate::media::CanonicalItem;

/// Separator between filename components.
pub const FILENAME_SEPARATOR: &str = "_";

/// Maximum length of the description component, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Placeholder for an item without a usable description.
pub const EMPTY_DESCRIPTION: &str = "no_desc";

/// Make a description safe to use as a filename component.
///
/// Strips `<>:"/\|?*` and control characters, trims surrounding whitespace and
/// dots, and truncates to [`MAX_DESCRIPTION_LENGTH`] characters.
pub fn sanitize_description(description: &str) -> String {
    let stripped: String = description
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let truncated: String = stripped
        .trim()
        .chars()
        .take(MAX_DESCRIPTION_LENGTH)
        .collect();

    let cleaned = truncated.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build the base filename (no extension) for an item.
///
/// Components appear in `keys` order. An empty key list yields the ID alone.
pub fn build_filename(item: &CanonicalItem, keys: &[FilenameKey]) -> String {
    if keys.is_empty() {
        return item.id.clone();
    }

    keys.iter()
        .map(|key| match key {
            FilenameKey::Id => item.id.clone(),
            FilenameKey::Timestamp => item.created_at.to_string(),
            FilenameKey::Description => sanitize_description(&item.description),
        })
        .collect::<Vec<_>>()
        .join(FILENAME_SEPARATOR)
}

/// Sanitize a path component (folder or file name) with less strict validation.
///
/// This is used for usernames and other path components where we want to
/// sanitize rather than reject on certain characters.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Filename of the `index`-th (zero-based) image of a photo post.
pub fn photo_filename(index: usize) -> String {
    format!("{}.jpg", index + 1)
}
