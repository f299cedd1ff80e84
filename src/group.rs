//! Stem grouping of a directory's children.
//!
//! Entries sharing a base filename (extension stripped) form one group:
//! `surf.mp4` + `surf.jpg` belong together, the image acting as the video's
//! poster. Per group:
//!
//! - every subdirectory is its own album entry, independent of media
//!   sharing its stem;
//! - a group with at least one video collapses into a single video-group
//!   whose poster is the first image of the group — any further images in
//!   that group are dropped from individual processing;
//! - a group with no videos surfaces each image as a standalone item.
//!
//! Listing order is filesystem order; groups keep first-seen stem order.
//! Consumers that need determinism sort lexicographically by path.

use crate::classify::{self, EntryKind};
use crate::store::CACHE_DIR_NAME;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One or more videos sharing a stem, with the group's poster image if one
/// exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoGroup {
    pub videos: Vec<PathBuf>,
    pub poster: Option<PathBuf>,
}

/// A directory's children, grouped and partitioned.
#[derive(Debug, Clone, Default)]
pub struct Items {
    pub albums: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub video_groups: Vec<VideoGroup>,
}

/// One stem's entries, before poster resolution.
#[derive(Default)]
struct StemGroup {
    albums: Vec<PathBuf>,
    images: Vec<PathBuf>,
    videos: Vec<PathBuf>,
}

/// Group a directory's direct children. The cache directory is excluded
/// from grouping (and thereby from all future scans).
pub fn group_children(dir: &Path) -> io::Result<Items> {
    let mut groups: Vec<StemGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy() == CACHE_DIR_NAME {
            continue;
        }
        let path = entry.path();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let slot = *index.entry(stem).or_insert_with(|| {
            groups.push(StemGroup::default());
            groups.len() - 1
        });
        match classify::classify(&path) {
            EntryKind::Image => groups[slot].images.push(path),
            EntryKind::Video => groups[slot].videos.push(path),
            EntryKind::Directory => groups[slot].albums.push(path),
            EntryKind::Other => {}
        }
    }

    let mut items = Items::default();
    for group in groups {
        items.albums.extend(group.albums);
        if group.videos.is_empty() {
            items.images.extend(group.images);
        } else {
            // First image of the group becomes the poster; the rest are
            // not surfaced individually.
            let poster = group.images.into_iter().next();
            items.video_groups.push(VideoGroup {
                videos: group.videos,
                poster,
            });
        }
    }
    Ok(items)
}
