//! End-to-end pipeline test: build a synthetic tree, run a full rebuild,
//! and check the cache the way the gallery frontend would read it.

use image::ImageEncoder;
use shoebox::store::{self, CACHE_DIR_NAME, METADATA_FILE, THUMBNAIL_FILE};
use shoebox::walk::{self, RunStats};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Encode a small RGB JPEG fixture.
fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// A tree exercising every entry kind:
///
/// ```text
/// root/
/// ├── a.jpg              standalone image
/// ├── b.mp4 + b.jpg      video-group with poster
/// ├── notes.txt          ignored
/// └── Trip/
///     └── dawn.jpg
/// ```
fn build_fixture_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    create_test_jpeg(&tmp.path().join("a.jpg"), 80, 60);
    fs::write(tmp.path().join("b.mp4"), b"\x00\x00\x00\x18ftypmp42clip").unwrap();
    create_test_jpeg(&tmp.path().join("b.jpg"), 40, 40);
    fs::write(tmp.path().join("notes.txt"), b"not media").unwrap();
    let trip = tmp.path().join("Trip");
    fs::create_dir(&trip).unwrap();
    create_test_jpeg(&trip.join("dawn.jpg"), 64, 48);
    tmp
}

fn entry_dir(root: &Path, path: &Path) -> PathBuf {
    root.join(CACHE_DIR_NAME).join(store::content_id(root, path))
}

fn read_meta(root: &Path, path: &Path) -> serde_json::Value {
    let file = entry_dir(root, path).join(METADATA_FILE);
    serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap()
}

#[test]
fn full_rebuild_produces_complete_cache() {
    let tmp = build_fixture_tree();
    let root = tmp.path();

    let stats = walk::process_tree(root, None).unwrap();
    // root album, Trip album, a.jpg, b.mp4, b.jpg poster, dawn.jpg
    assert_eq!(
        stats,
        RunStats {
            items: 6,
            thumbnails: 6
        }
    );

    // every entry has both artifacts
    for path in [
        root.to_path_buf(),
        root.join("a.jpg"),
        root.join("b.mp4"),
        root.join("b.jpg"),
        root.join("Trip"),
        root.join("Trip").join("dawn.jpg"),
    ] {
        let dir = entry_dir(root, &path);
        assert!(dir.join(METADATA_FILE).exists(), "no meta.json for {path:?}");
        assert!(dir.join(THUMBNAIL_FILE).exists(), "no tn.jpg for {path:?}");
    }

    // the ignored file got no entry
    assert!(!entry_dir(root, &root.join("notes.txt")).join(METADATA_FILE).exists());
}

#[test]
fn root_id_is_digest_of_empty_string() {
    let tmp = build_fixture_tree();
    walk::process_tree(tmp.path(), None).unwrap();
    assert!(
        tmp.path()
            .join(CACHE_DIR_NAME)
            .join("d41d8cd98f00b204e9800998ecf8427e")
            .join(METADATA_FILE)
            .exists()
    );
}

#[test]
fn album_metadata_matches_documented_schema() {
    let tmp = build_fixture_tree();
    let root = tmp.path();
    walk::process_tree(root, None).unwrap();

    let album = read_meta(root, root);
    assert_eq!(album["caption"], root.file_name().unwrap().to_str().unwrap());

    let items = album["items"].as_object().unwrap();
    // a.jpg, b.mp4, b.jpg, Trip
    assert_eq!(items.len(), 4);
    for (id, summary) in items {
        assert_eq!(id.len(), 32, "content ids are MD5 hex");
        let date = summary["date"].as_str().unwrap();
        // "YYYY-MM-DD HH:MM:SS"
        assert_eq!(date.len(), 19);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[10..11], " ");
        assert!(summary["caption"].is_string());
        assert!(summary.get("width").is_none(), "summaries are trimmed");
    }
}

#[test]
fn leaf_metadata_carries_dimensions() {
    let tmp = build_fixture_tree();
    let root = tmp.path();
    walk::process_tree(root, None).unwrap();

    let record = read_meta(root, &root.join("a.jpg"));
    assert_eq!(record["caption"], "a.jpg");
    assert_eq!(record["width"], 80);
    assert_eq!(record["height"], 60);

    // degraded video record is empty; poster shadows it in the album only
    assert_eq!(read_meta(root, &root.join("b.mp4")), serde_json::json!({}));
    let album = read_meta(root, root);
    let video_id = store::content_id(root, &root.join("b.mp4"));
    assert_eq!(album["items"][&video_id]["caption"], "b.jpg");
}

#[test]
fn thumbnails_meet_the_size_contract() {
    let tmp = build_fixture_tree();
    let root = tmp.path();
    walk::process_tree(root, None).unwrap();

    for path in [root.to_path_buf(), root.join("a.jpg"), root.join("Trip")] {
        let tn = image::open(entry_dir(root, &path).join(THUMBNAIL_FILE)).unwrap();
        assert_eq!((tn.width(), tn.height()), (125, 125), "for {path:?}");
        assert_eq!(tn.color().channel_count(), 3);
    }
}

#[test]
fn reruns_are_byte_identical() {
    let tmp = build_fixture_tree();
    let root = tmp.path();

    walk::process_tree(root, None).unwrap();
    let album_file = entry_dir(root, root).join(METADATA_FILE);
    let leaf_file = entry_dir(root, &root.join("a.jpg")).join(METADATA_FILE);
    let first_album = fs::read(&album_file).unwrap();
    let first_leaf = fs::read(&leaf_file).unwrap();

    walk::process_tree(root, None).unwrap();
    assert_eq!(fs::read(&album_file).unwrap(), first_album);
    assert_eq!(fs::read(&leaf_file).unwrap(), first_leaf);
}

#[test]
fn cache_directory_is_invisible_to_subsequent_scans() {
    let tmp = build_fixture_tree();
    let root = tmp.path();

    let first = walk::process_tree(root, None).unwrap();
    // the .shoebox directory now exists; a second run must not see it as an
    // album or change any counts
    let second = walk::process_tree(root, None).unwrap();
    assert_eq!(first, second);

    let album = read_meta(root, root);
    assert_eq!(album["items"].as_object().unwrap().len(), 4);
}
