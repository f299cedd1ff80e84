//! Filesystem entry classification.
//!
//! Pure predicates over paths: every entry is exactly one of image, video,
//! directory, or other. Media recognition is a fixed case-insensitive
//! extension allow-list plus a regular-file check — no content sniffing, so
//! a mislabeled extension is simply not seen as media.

use std::path::Path;

/// Image extensions the scanner recognizes.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg", "gif"];

/// Video extensions the scanner recognizes.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mpeg4", "m4v", "webm"];

/// What a directory entry is, as far as the walker cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Image,
    Video,
    Directory,
    Other,
}

/// Classify a filesystem entry. Never errors: anything unreadable or
/// unrecognized is [`EntryKind::Other`].
pub fn classify(path: &Path) -> EntryKind {
    if is_image(path) {
        EntryKind::Image
    } else if is_video(path) {
        EntryKind::Video
    } else if path.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::Other
    }
}

/// True iff `path` is a regular file with a recognized image extension.
pub fn is_image(path: &Path) -> bool {
    path.is_file() && has_extension_in(path, IMAGE_EXTENSIONS)
}

/// True iff `path` is a regular file with a recognized video extension.
pub fn is_video(path: &Path) -> bool {
    path.is_file() && has_extension_in(path, VIDEO_EXTENSIONS)
}

fn has_extension_in(path: &Path, allowed: &[&str]) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    allowed.contains(&ext.as_str())
}
