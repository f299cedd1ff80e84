//! # Shoebox
//!
//! Walks a folder tree of photos and videos and fills a hidden cache
//! directory with one thumbnail and one JSON metadata record per album,
//! image, and video — the data a web gallery layer serves without ever
//! touching the originals.
//!
//! # Architecture: Walk → Extract → Compose → Store
//!
//! One depth-first pass over the tree does everything. For each directory
//! the walker groups children by filename stem, extracts metadata, composes
//! thumbnails, and writes both artifacts into a content-addressed cache:
//!
//! ```text
//! photos/
//! ├── .shoebox/                    # the cache (excluded from scans)
//! │   └── <md5 of relative path>/
//! │       ├── meta.json            # captions, dates, camera fields
//! │       └── tn.jpg               # 125×125 thumbnail
//! ├── Holiday/                     # directory = album
//! │   ├── beach.jpg
//! │   ├── surf.mp4                 # video…
//! │   └── surf.jpg                 # …with its same-named poster image
//! └── portrait.png
//! ```
//!
//! Every run is a full rebuild: entries are overwritten in place, which
//! makes reruns the whole recovery story — there is no cache invalidation
//! to get wrong.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`classify`] | Pure image/video/directory predicates over paths |
//! | [`group`] | Stem grouping: albums, standalone images, video-groups with posters |
//! | [`meta`] | Metadata records and field-precedence extraction |
//! | [`tags`] | Typed EXIF/IPTC capability interface (`kamadak-exif` + [`iptc`]) |
//! | [`iptc`] | Minimal IPTC-IIM parser for JPEG APP13 segments |
//! | [`imaging`] | Pixel operations: square thumbnails, the 2×2 album grid |
//! | [`video`] | Optional frame-capture capability (`ffmpeg` feature) |
//! | [`store`] | Content-addressed cache: MD5 ids, deterministic JSON, JPEG writes |
//! | [`walk`] | The recursive driver, folding per-run counters |
//! | [`output`] | CLI run reporting |
//!
//! # Design Decisions
//!
//! ## Addressed by Path, Not by Content
//!
//! A cache id is the MD5 of an entry's root-relative path. Renaming a file
//! moves its entry; editing pixels does not. The presentation layer can map
//! any path to its cache entry with one hash — no manifest, no database,
//! no lookup table to keep in sync.
//!
//! ## Capabilities Over Libraries
//!
//! The extractor reads tags through [`tags::TagSource`] and the walker
//! captures frames through [`video::FrameSource`]. Both are small traits
//! with an obvious degraded mode: a tag that fails to parse costs one
//! output field, and a build without the `ffmpeg` feature still processes
//! videos — metadata-only, poster thumbnails when a same-named image
//! exists.
//!
//! ## Deterministic Artifacts
//!
//! `meta.json` is written with sorted keys, fixed indentation, and
//! unescaped UTF-8, so an unchanged tree produces byte-identical output on
//! every run and the files diff cleanly under version control.

pub mod classify;
pub mod group;
pub mod imaging;
pub mod iptc;
pub mod meta;
pub mod output;
pub mod store;
pub mod tags;
pub mod video;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
