//! Metadata extraction and resolution.
//!
//! Each cache entry carries a metadata record whose fields come from up to
//! three independent sources:
//!
//! ## Sources
//!
//! - **Embedded tags** (images only): IPTC Caption-Abstract and Copyright
//!   Notice, plus the EXIF descriptive and camera fields, read through the
//!   [`TagSource`] capability.
//! - **Decoded pixels**: width and height from the raster buffer shape.
//! - **Filesystem**: file name and modification time, the fallbacks of last
//!   resort. Videos carry no embedded descriptive tags in this design, so
//!   they always resolve to these.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently; the first non-blank value wins:
//!
//! - **caption**: IPTC Caption-Abstract → EXIF ImageDescription → file name
//! - **copyright**: IPTC Copyright Notice → EXIF Copyright → EXIF Artist
//! - **date**: EXIF DateTimeOriginal (`YYYY:MM:DD HH:MM:SS`) → file mtime
//!
//! Camera fields (`lat`/`lon`, `shutter`, `aperture`, `iso`, `zoom`) are
//! omitted, never defaulted, when the source tag is absent or fails to
//! parse.
//!
//! ## Records
//!
//! The three record shapes form the [`Meta`] union, serialized losslessly
//! to the cache schema: full image records, video records (empty in
//! degraded no-decoder mode), and album records whose `items` map holds a
//! trimmed `{caption, date}` summary per direct child. Dates serialize as
//! `YYYY-MM-DD HH:MM:SS`.

use crate::group;
use crate::store;
use crate::tags::{Field, FileTagSource, TagSource};
use crate::video::VideoInfo;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Serialized date layout, ISO-8601 with a space separator.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The fixed pattern EXIF capture timestamps use.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

fn serialize_date<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}

fn serialize_opt_date<S: Serializer>(
    date: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serialize_date(date, serializer),
        None => serializer.serialize_none(),
    }
}

/// Full metadata record for an image (standalone or poster).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMeta {
    pub caption: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDateTime,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u32>,
}

/// Metadata record for a raw video. Every field is absent without a video
/// decoder, serializing to the empty record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_date"
    )]
    pub date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Trimmed child summary inside an album record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub caption: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDateTime,
}

/// Metadata record for an album: its caption plus one trimmed summary per
/// direct child, keyed by content id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumMeta {
    pub caption: String,
    pub items: BTreeMap<String, ItemSummary>,
}

/// Everything the store can persist, one variant per cache-record schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Meta {
    Album(AlbumMeta),
    Image(ImageMeta),
    Video(VideoMeta),
}

// ---------------------------------------------------------------------------
// Leaf extraction
// ---------------------------------------------------------------------------

/// Build a full image record from the decoded buffer shape and the file's
/// tags. The mtime fallback is the only fallible step.
pub fn extract_image(
    path: &Path,
    dimensions: (u32, u32),
    tags: &dyn TagSource,
) -> io::Result<ImageMeta> {
    let (width, height) = dimensions;
    let (lat, lon) = match gps_coordinates(tags) {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };

    Ok(ImageMeta {
        caption: image_caption(path, tags),
        date: image_date(path, tags)?,
        width,
        height,
        copyright: resolve(&[
            tags.string_field(Field::IptcCopyright),
            tags.string_field(Field::Copyright),
            tags.string_field(Field::Artist),
        ]),
        lat,
        lon,
        shutter: tags.rational_field(Field::ExposureTime).map(format_shutter),
        aperture: tags
            .rational_field(Field::FNumber)
            .map(|f| (f * 100.0).round() / 100.0),
        iso: tags.integer_field(Field::Iso),
        zoom: tags.integer_field(Field::FocalLength35),
    })
}

/// Build a video record. `info` carries decoder-reported stream properties
/// when a frame source is available; without one the record is empty —
/// degraded, not an error.
pub fn extract_video(path: &Path, info: Option<&VideoInfo>) -> io::Result<VideoMeta> {
    let Some(info) = info else {
        return Ok(VideoMeta::default());
    };
    Ok(VideoMeta {
        caption: Some(file_name(path)),
        date: Some(mtime(path)?),
        width: Some(info.width),
        height: Some(info.height),
        size: Some(fs::metadata(path)?.len()),
    })
}

/// Build an album record from one level of grouping.
///
/// Child albums summarize as basename plus their recursive latest date;
/// child images and videos get trimmed summaries. When a video-group has a
/// poster, the poster's summary shadows each sibling video's entry and the
/// poster is additionally recorded under its own id.
pub fn extract_album(root: &Path, path: &Path) -> io::Result<AlbumMeta> {
    let items = group::group_children(path)?;
    let mut entries = BTreeMap::new();

    for album in &items.albums {
        entries.insert(
            store::content_id(root, album),
            ItemSummary {
                caption: file_name(album),
                date: latest_item_date(album)?,
            },
        );
    }
    for image in &items.images {
        entries.insert(store::content_id(root, image), image_summary(image)?);
    }
    for video_group in &items.video_groups {
        let poster_summary = match &video_group.poster {
            Some(poster) => Some(image_summary(poster)?),
            None => None,
        };
        for video in &video_group.videos {
            let summary = match &poster_summary {
                Some(summary) => summary.clone(),
                None => video_summary(video)?,
            };
            entries.insert(store::content_id(root, video), summary);
        }
        if let (Some(poster), Some(summary)) = (&video_group.poster, poster_summary) {
            entries.insert(store::content_id(root, poster), summary);
        }
    }

    Ok(AlbumMeta {
        caption: file_name(path),
        items: entries,
    })
}

/// The latest date anywhere in an album's subtree: the max over child
/// albums (recursively), child image dates, and per video-group the
/// poster's date if present, else the videos' own dates. A subtree with no
/// dated leaf falls back to the directory's own mtime.
///
/// Recomputed per query — deep trees pay for it, but only tags and mtimes
/// are consulted, never pixels.
pub fn latest_item_date(path: &Path) -> io::Result<NaiveDateTime> {
    let items = group::group_children(path)?;
    let mut latest: Option<NaiveDateTime> = None;

    for album in &items.albums {
        latest = max_date(latest, latest_item_date(album)?);
    }
    for image in &items.images {
        let tags = FileTagSource::open(image);
        latest = max_date(latest, image_date(image, &tags)?);
    }
    for video_group in &items.video_groups {
        match &video_group.poster {
            Some(poster) => {
                let tags = FileTagSource::open(poster);
                latest = max_date(latest, image_date(poster, &tags)?);
            }
            None => {
                for video in &video_group.videos {
                    latest = max_date(latest, mtime(video)?);
                }
            }
        }
    }

    match latest {
        Some(date) => Ok(date),
        None => mtime(path),
    }
}

fn max_date(latest: Option<NaiveDateTime>, candidate: NaiveDateTime) -> Option<NaiveDateTime> {
    match latest {
        Some(current) => Some(current.max(candidate)),
        None => Some(candidate),
    }
}

// ---------------------------------------------------------------------------
// Field resolution
// ---------------------------------------------------------------------------

/// Resolve a field from multiple sources: the first non-blank value wins.
fn resolve(sources: &[Option<String>]) -> Option<String> {
    sources
        .iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn image_caption(path: &Path, tags: &dyn TagSource) -> String {
    resolve(&[
        tags.string_field(Field::IptcCaption),
        tags.string_field(Field::Description),
    ])
    .unwrap_or_else(|| file_name(path))
}

fn image_date(path: &Path, tags: &dyn TagSource) -> io::Result<NaiveDateTime> {
    match capture_time(tags) {
        Some(date) => Ok(date),
        None => mtime(path),
    }
}

/// Trimmed summary for an image without decoding its pixels.
fn image_summary(path: &Path) -> io::Result<ItemSummary> {
    let tags = FileTagSource::open(path);
    Ok(ItemSummary {
        caption: image_caption(path, &tags),
        date: image_date(path, &tags)?,
    })
}

/// Trimmed summary for a raw video: basename and mtime, the same fallbacks
/// a full video record resolves to.
fn video_summary(path: &Path) -> io::Result<ItemSummary> {
    Ok(ItemSummary {
        caption: file_name(path),
        date: mtime(path)?,
    })
}

/// EXIF capture timestamp, if present and well-formed.
fn capture_time(tags: &dyn TagSource) -> Option<NaiveDateTime> {
    let raw = tags.string_field(Field::CaptureTime)?;
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATE_FORMAT).ok()
}

/// Decimal GPS coordinates, only when both rational triples are present.
/// Southern and western hemispheres negate.
fn gps_coordinates(tags: &dyn TagSource) -> Option<(f64, f64)> {
    let lat = dms_to_decimal(tags.rational_triple_field(Field::GpsLatitude)?);
    let lon = dms_to_decimal(tags.rational_triple_field(Field::GpsLongitude)?);
    let lat = if tags.string_field(Field::GpsLatitudeRef).as_deref() == Some("S") {
        -lat
    } else {
        lat
    };
    let lon = if tags.string_field(Field::GpsLongitudeRef).as_deref() == Some("W") {
        -lon
    } else {
        lon
    };
    Some((lat, lon))
}

fn dms_to_decimal(dms: [f64; 3]) -> f64 {
    dms[0] + dms[1] / 60.0 + dms[2] / 3600.0
}

/// `"0"` for a zero exposure, else the conventional `1/N` rendering.
fn format_shutter(exposure: f64) -> String {
    if exposure == 0.0 {
        "0".to_string()
    } else {
        format!("1/{}", (1.0 / exposure).round() as i64)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File modification time as a local naive timestamp, truncated to seconds.
fn mtime(path: &Path) -> io::Result<NaiveDateTime> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(system_time_to_naive(modified))
}

/// Truncated to seconds: the serialized layout has no sub-second field, and
/// date comparisons should match what round-trips through it.
fn system_time_to_naive(time: SystemTime) -> NaiveDateTime {
    use chrono::{DurationRound, TimeDelta};
    let local: chrono::DateTime<chrono::Local> = time.into();
    let naive = local.naive_local();
    naive.duration_trunc(TimeDelta::seconds(1)).unwrap_or(naive)
}
