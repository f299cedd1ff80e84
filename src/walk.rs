//! Recursive album processing.
//!
//! The walker drives everything: for each directory it groups the children,
//! writes the album's composite thumbnail and metadata, processes
//! standalone images and video-groups, then recurses into sub-albums —
//! depth-first, single-threaded, blocking.
//!
//! Every run is a full rebuild. There is no per-node error boundary: the
//! first unreadable source or failed write aborts the traversal, and
//! recovery is simply rerunning the command — already-written cache entries
//! are overwritten in place. The one tolerated gap is a missing video
//! decoder, which downgrades poster-less video groups to a stderr warning.
//!
//! Run counters are a [`RunStats`] value returned and folded up the
//! recursion, never process-global state, so sibling subtrees could run in
//! parallel without sharing anything.

use crate::group::{self, VideoGroup};
use crate::imaging::{self, ImagingError};
use crate::meta::{self, Meta, VideoMeta};
use crate::store::{self, Store, StoreError};
use crate::tags::FileTagSource;
use crate::video::{FrameSource, VideoError};
use image::{DynamicImage, GenericImageView, RgbImage};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Video(#[from] VideoError),
}

/// Counters accumulated by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Albums, standalone images, raw videos, and posters visited.
    pub items: u64,
    /// Thumbnails written.
    pub thumbnails: u64,
}

impl std::ops::AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.items += other.items;
        self.thumbnails += other.thumbnails;
    }
}

/// Walk `root` and rebuild its whole cache.
pub fn process_tree(
    root: &Path,
    frames: Option<&dyn FrameSource>,
) -> Result<RunStats, WalkError> {
    Walker::new(root, frames).run()
}

/// One full rebuild of a scan root's cache.
pub struct Walker<'a> {
    root: PathBuf,
    store: Store,
    frames: Option<&'a dyn FrameSource>,
}

impl<'a> Walker<'a> {
    pub fn new(root: &Path, frames: Option<&'a dyn FrameSource>) -> Self {
        Self {
            root: root.to_path_buf(),
            store: Store::new(root),
            frames,
        }
    }

    pub fn run(&self) -> Result<RunStats, WalkError> {
        self.process_directory(&self.root)
    }

    fn process_directory(&self, path: &Path) -> Result<RunStats, WalkError> {
        // The album itself counts as one item
        let mut stats = RunStats {
            items: 1,
            thumbnails: 0,
        };
        stats += self.process_album(path)?;

        let items = group::group_children(path)?;
        stats.items += items.images.len() as u64;
        for video_group in &items.video_groups {
            stats.items += video_group.videos.len() as u64;
            if video_group.poster.is_some() {
                stats.items += 1;
            }
        }

        for image in &items.images {
            stats += self.process_image(image)?;
        }
        for video_group in &items.video_groups {
            stats += self.process_video_group(video_group)?;
        }
        for album in &items.albums {
            stats += self.process_directory(album)?;
        }
        Ok(stats)
    }

    /// Write the album's composite thumbnail and metadata record.
    ///
    /// Grid slots fill in lexicographic path order, images before
    /// video-groups; slot 0 is the built-in glyph whenever sub-albums
    /// exist. A poster-less group without a decoder contributes nothing —
    /// the next candidate takes the slot.
    fn process_album(&self, path: &Path) -> Result<RunStats, WalkError> {
        let items = group::group_children(path)?;
        let mut nails: Vec<RgbImage> = Vec::new();

        if !items.albums.is_empty() {
            nails.push(imaging::make_thumbnail(
                imaging::album_glyph(),
                imaging::PINKYNAIL_SIZE,
            ));
        }

        let mut images = items.images.clone();
        images.sort();
        for image in &images {
            if nails.len() > 3 {
                break;
            }
            let decoded = imaging::load_image(image)?;
            nails.push(imaging::make_thumbnail(&decoded, imaging::PINKYNAIL_SIZE));
        }

        let mut video_groups = items.video_groups.clone();
        video_groups.sort_by_key(|g| g.videos.iter().min().cloned());
        for video_group in &video_groups {
            if nails.len() > 3 {
                break;
            }
            if let Some(poster) = &video_group.poster {
                let decoded = imaging::load_image(poster)?;
                nails.push(imaging::make_thumbnail(&decoded, imaging::PINKYNAIL_SIZE));
            } else if let (Some(frames), Some(first)) = (self.frames, video_group.videos.first())
            {
                let frame = frames.sample_frame(first)?;
                nails.push(imaging::make_thumbnail(
                    &DynamicImage::ImageRgb8(frame),
                    imaging::PINKYNAIL_SIZE,
                ));
            }
        }

        let id = store::content_id(&self.root, path);
        self.store
            .write_thumbnail(&id, &imaging::compose_grid(&nails))?;
        self.store
            .write_metadata(&id, &Meta::Album(meta::extract_album(&self.root, path)?))?;
        Ok(RunStats {
            items: 0,
            thumbnails: 1,
        })
    }

    /// Thumbnail and full metadata record for a standalone image.
    fn process_image(&self, path: &Path) -> Result<RunStats, WalkError> {
        let decoded = imaging::load_image(path)?;
        let tags = FileTagSource::open(path);
        let record = meta::extract_image(path, decoded.dimensions(), &tags)?;

        let id = store::content_id(&self.root, path);
        self.store
            .write_thumbnail(&id, &imaging::make_thumbnail(&decoded, imaging::THUMBNAIL_SIZE))?;
        self.store.write_metadata(&id, &Meta::Image(record))?;
        Ok(RunStats {
            items: 0,
            thumbnails: 1,
        })
    }

    /// Thumbnails and metadata for one video-group.
    ///
    /// With a poster: the poster's thumbnail is written under the poster's
    /// id and reused for every sibling video. Without one, each video gets
    /// a captured-frame thumbnail — decoder permitting. Either way each
    /// video's own record is exactly what [`meta::extract_video`] produced.
    fn process_video_group(&self, video_group: &VideoGroup) -> Result<RunStats, WalkError> {
        if video_group.poster.is_none() && self.frames.is_none() {
            // Missing capability: warn and move on, never abort
            eprintln!(
                "Cannot generate thumbnail for videos: {:?}",
                video_group.videos
            );
            return Ok(RunStats::default());
        }

        let mut stats = RunStats::default();

        if let Some(poster) = &video_group.poster {
            let decoded = imaging::load_image(poster)?;
            let thumbnail = imaging::make_thumbnail(&decoded, imaging::THUMBNAIL_SIZE);
            let tags = FileTagSource::open(poster);
            let record = meta::extract_image(poster, decoded.dimensions(), &tags)?;

            let poster_id = store::content_id(&self.root, poster);
            self.store.write_thumbnail(&poster_id, &thumbnail)?;
            self.store.write_metadata(&poster_id, &Meta::Image(record))?;
            stats.thumbnails += 1;

            for video in &video_group.videos {
                let id = store::content_id(&self.root, video);
                self.store.write_thumbnail(&id, &thumbnail)?;
                self.store
                    .write_metadata(&id, &Meta::Video(self.video_record(video)?))?;
                stats.thumbnails += 1;
            }
        } else if let Some(frames) = self.frames {
            for video in &video_group.videos {
                let frame = frames.sample_frame(video)?;
                let thumbnail = imaging::make_thumbnail(
                    &DynamicImage::ImageRgb8(frame),
                    imaging::THUMBNAIL_SIZE,
                );
                let id = store::content_id(&self.root, video);
                self.store.write_thumbnail(&id, &thumbnail)?;
                self.store
                    .write_metadata(&id, &Meta::Video(self.video_record(video)?))?;
                stats.thumbnails += 1;
            }
        }
        Ok(stats)
    }

    /// Video metadata, degraded to the empty record without a decoder.
    fn video_record(&self, path: &Path) -> Result<VideoMeta, WalkError> {
        let info = match self.frames {
            Some(frames) => Some(frames.probe(path)?),
            None => None,
        };
        Ok(meta::extract_video(path, info.as_ref())?)
    }
}
