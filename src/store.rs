//! Content-addressed cache output.
//!
//! Every album, image, and video gets one cache entry at
//! `<root>/.shoebox/<id>/`, where `id` is the MD5 hex digest of the entry's
//! `/`-normalized root-relative path. Addressing by path rather than by
//! byte content keeps ids stable across reruns: the presentation layer that
//! reads the cache can compute the same digests from the same paths without
//! touching file contents or timestamps.
//!
//! Writes are unconditional overwrites — no staleness check, no rollback.
//! A crash mid-run leaves already-written entries intact and valid; the
//! next full run simply rewrites everything it visits.
//!
//! `meta.json` is emitted with sorted keys, 4-space indentation, and
//! unescaped non-ASCII, so re-serializing any produced file reproduces it
//! byte-identically.

use image::ImageEncoder;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use md5::{Digest, Md5};
use serde::Serialize;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the hidden cache directory under a scan root. Excluded from all
/// scans.
pub const CACHE_DIR_NAME: &str = ".shoebox";

/// Metadata file name within a cache entry.
pub const METADATA_FILE: &str = "meta.json";

/// Thumbnail file name within a cache entry.
pub const THUMBNAIL_FILE: &str = "tn.jpg";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Cache id for a path: MD5 hex of the `/`-normalized root-relative path.
/// The root itself hashes the empty string.
///
/// Pure in `(root, path)` — file content and timestamps never influence the
/// id. `path` must be the root or one of its descendants.
pub fn content_id(root: &Path, path: &Path) -> String {
    let relative = relative_slash_path(root, path);
    format!("{:x}", Md5::digest(relative.as_bytes()))
}

fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Writer for one scan root's cache directory.
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// `<root>/.shoebox/<id>/`
    pub fn entry_dir(&self, id: &str) -> PathBuf {
        self.root.join(CACHE_DIR_NAME).join(id)
    }

    /// Serialize and overwrite `meta.json` for `id`, creating the entry
    /// directory (and ancestors) as needed.
    pub fn write_metadata<T: Serialize>(&self, id: &str, meta: &T) -> Result<(), StoreError> {
        let dir = self.entry_dir(id);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(METADATA_FILE), sorted_pretty_json(meta)?)?;
        Ok(())
    }

    /// Encode and overwrite `tn.jpg` for `id`.
    pub fn write_thumbnail(&self, id: &str, thumbnail: &RgbImage) -> Result<(), StoreError> {
        let dir = self.entry_dir(id);
        fs::create_dir_all(&dir)?;
        let file = fs::File::create(dir.join(THUMBNAIL_FILE))?;
        let encoder = JpegEncoder::new(BufWriter::new(file));
        encoder.write_image(
            thumbnail.as_raw(),
            thumbnail.width(),
            thumbnail.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(())
    }
}

/// Deterministic JSON: route through `serde_json::Value`, whose object map
/// keeps keys sorted, then pretty-print with a 4-space indent. serde_json
/// leaves non-ASCII unescaped.
pub fn sorted_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    // MD5 of the empty string — the scan root's id.
    const ROOT_ID: &str = "d41d8cd98f00b204e9800998ecf8427e";

    // =========================================================================
    // content_id
    // =========================================================================

    #[test]
    fn root_hashes_empty_string() {
        let root = Path::new("/photos");
        assert_eq!(content_id(root, root), ROOT_ID);
    }

    #[test]
    fn id_matches_digest_of_relative_path() {
        let root = Path::new("/photos");
        let expected = format!("{:x}", Md5::digest(b"holiday/beach.jpg"));
        assert_eq!(
            content_id(root, &root.join("holiday").join("beach.jpg")),
            expected
        );
    }

    #[test]
    fn id_is_deterministic() {
        let root = Path::new("/photos");
        let path = root.join("a.jpg");
        assert_eq!(content_id(root, &path), content_id(root, &path));
    }

    #[test]
    fn id_differs_per_path() {
        let root = Path::new("/photos");
        assert_ne!(
            content_id(root, &root.join("a.jpg")),
            content_id(root, &root.join("b.jpg"))
        );
    }

    #[test]
    fn id_ignores_file_content() {
        // Purely path-derived: no filesystem access happens at all.
        let root = Path::new("/does/not/exist");
        let id = content_id(root, &root.join("ghost.jpg"));
        assert_eq!(id.len(), 32);
    }

    #[test]
    fn nested_paths_use_forward_slashes() {
        let root = Path::new("/p");
        let nested = root.join("a").join("b").join("c.jpg");
        assert_eq!(relative_slash_path(root, &nested), "a/b/c.jpg");
    }

    // =========================================================================
    // sorted_pretty_json
    // =========================================================================

    #[test]
    fn json_keys_are_sorted() {
        let value = json!({"width": 10, "caption": "x", "height": 20});
        let out = sorted_pretty_json(&value).unwrap();
        let caption = out.find("\"caption\"").unwrap();
        let height = out.find("\"height\"").unwrap();
        let width = out.find("\"width\"").unwrap();
        assert!(caption < height && height < width);
    }

    #[test]
    fn json_uses_four_space_indent() {
        let out = sorted_pretty_json(&json!({"a": 1})).unwrap();
        assert_eq!(out, "{\n    \"a\": 1\n}");
    }

    #[test]
    fn json_leaves_non_ascii_unescaped() {
        let out = sorted_pretty_json(&json!({"caption": "café ☀"})).unwrap();
        assert!(out.contains("café ☀"));
        assert!(!out.contains("\\u"));
    }

    #[test]
    fn json_reserialization_is_byte_identical() {
        let value = json!({"b": {"z": 1, "a": 2}, "a": [1, 2], "café": "naïve"});
        let first = sorted_pretty_json(&value).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&first).unwrap();
        let second = sorted_pretty_json(&reparsed).unwrap();
        assert_eq!(first, second);
    }

    // =========================================================================
    // Store writes
    // =========================================================================

    #[test]
    fn write_metadata_creates_entry_dir() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path());
        store.write_metadata(ROOT_ID, &json!({"caption": "root"})).unwrap();

        let written = tmp
            .path()
            .join(CACHE_DIR_NAME)
            .join(ROOT_ID)
            .join(METADATA_FILE);
        let content = std::fs::read_to_string(written).unwrap();
        assert_eq!(content, "{\n    \"caption\": \"root\"\n}");
    }

    #[test]
    fn write_metadata_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path());
        store.write_metadata("abc", &json!({"caption": "one"})).unwrap();
        store.write_metadata("abc", &json!({"caption": "two"})).unwrap();

        let content =
            std::fs::read_to_string(store.entry_dir("abc").join(METADATA_FILE)).unwrap();
        assert!(content.contains("two"));
        assert!(!content.contains("one"));
    }

    #[test]
    fn write_thumbnail_produces_decodable_jpeg() {
        let tmp = TempDir::new().unwrap();
        let store = Store::new(tmp.path());
        let thumbnail = RgbImage::from_pixel(125, 125, image::Rgb([255, 255, 255]));
        store.write_thumbnail("abc", &thumbnail).unwrap();

        let path = store.entry_dir("abc").join(THUMBNAIL_FILE);
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (125, 125));
    }

    #[test]
    fn write_to_unwritable_root_fails() {
        let store = Store::new(Path::new("/proc/shoebox-denied"));
        assert!(store.write_metadata("abc", &json!({})).is_err());
    }
}
