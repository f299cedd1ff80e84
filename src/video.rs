//! Optional video decoding capability.
//!
//! Frame capture and stream probing sit behind the [`FrameSource`] trait so
//! the walker can degrade to metadata-only video handling when no decoder
//! is compiled in. The `ffmpeg` cargo feature provides the production
//! implementation on top of `ffmpeg-next`; without the feature, [`detect`]
//! returns `None` and video groups without a poster image are skipped with
//! a warning instead of failing the run.

use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("no video stream in {0}")]
    NoVideoStream(PathBuf),
    #[error("video decode failed: {0}")]
    Decode(String),
}

/// Container properties needed for metadata and frame sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Capability interface for reading video files.
pub trait FrameSource {
    /// Read stream-level properties without decoding frames.
    fn probe(&self, path: &Path) -> Result<VideoInfo, VideoError>;

    /// Decode and return the thumbnail sample frame: the most recent frame
    /// at or before index `floor(fps × 2)`, past the shaky first moments of
    /// handheld clips. Clips shorter than that yield their last frame.
    fn sample_frame(&self, path: &Path) -> Result<RgbImage, VideoError>;
}

/// The compiled-in frame source, if any.
#[cfg(feature = "ffmpeg")]
pub fn detect() -> Option<Box<dyn FrameSource>> {
    ffmpeg::FfmpegFrameSource::new().map(|source| Box::new(source) as Box<dyn FrameSource>)
}

/// The compiled-in frame source, if any. Built without the `ffmpeg`
/// feature there is none.
#[cfg(not(feature = "ffmpeg"))]
pub fn detect() -> Option<Box<dyn FrameSource>> {
    None
}

#[cfg(feature = "ffmpeg")]
mod ffmpeg {
    use super::{FrameSource, VideoError, VideoInfo};
    use ffmpeg_next as ffmpeg;
    use image::RgbImage;
    use std::path::Path;

    /// Frame source backed by system libav.
    pub struct FfmpegFrameSource;

    impl FfmpegFrameSource {
        /// `None` when libav initialization fails; the caller degrades the
        /// same way as a build without the feature.
        pub fn new() -> Option<Self> {
            ffmpeg::init().ok()?;
            Some(Self)
        }
    }

    fn decode_error(path: &Path, error: ffmpeg::Error) -> VideoError {
        VideoError::Decode(format!("{}: {}", path.display(), error))
    }

    fn frame_rate(stream: &ffmpeg::format::stream::Stream) -> f64 {
        let rate = stream.avg_frame_rate();
        if rate.denominator() == 0 {
            0.0
        } else {
            f64::from(rate.numerator()) / f64::from(rate.denominator())
        }
    }

    impl FrameSource for FfmpegFrameSource {
        fn probe(&self, path: &Path) -> Result<VideoInfo, VideoError> {
            let input = ffmpeg::format::input(&path).map_err(|e| decode_error(path, e))?;
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| VideoError::NoVideoStream(path.to_path_buf()))?;
            let fps = frame_rate(&stream);
            let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|e| decode_error(path, e))?;
            Ok(VideoInfo {
                width: decoder.width(),
                height: decoder.height(),
                fps,
            })
        }

        fn sample_frame(&self, path: &Path) -> Result<RgbImage, VideoError> {
            let mut input = ffmpeg::format::input(&path).map_err(|e| decode_error(path, e))?;

            let (stream_index, fps, parameters) = {
                let stream = input
                    .streams()
                    .best(ffmpeg::media::Type::Video)
                    .ok_or_else(|| VideoError::NoVideoStream(path.to_path_buf()))?;
                (stream.index(), frame_rate(&stream), stream.parameters())
            };

            let mut decoder = ffmpeg::codec::context::Context::from_parameters(parameters)
                .and_then(|context| context.decoder().video())
                .map_err(|e| decode_error(path, e))?;

            // Sample two seconds in; clips shorter than that use their last
            // decodable frame.
            let sample_index = (fps * 2.0).floor() as u64;

            let mut frame = ffmpeg::util::frame::video::Video::empty();
            let mut last: Option<ffmpeg::util::frame::video::Video> = None;
            let mut index: u64 = 0;
            let mut reached = false;

            'packets: for (stream, packet) in input.packets() {
                if stream.index() != stream_index {
                    continue;
                }
                if decoder.send_packet(&packet).is_err() {
                    continue;
                }
                while decoder.receive_frame(&mut frame).is_ok() {
                    last = Some(frame.clone());
                    if index >= sample_index {
                        reached = true;
                        break 'packets;
                    }
                    index += 1;
                }
            }

            if !reached {
                // Drain buffered frames from short clips
                let _ = decoder.send_eof();
                while decoder.receive_frame(&mut frame).is_ok() {
                    last = Some(frame.clone());
                    if index >= sample_index {
                        break;
                    }
                    index += 1;
                }
            }

            let decoded = last.ok_or_else(|| {
                VideoError::Decode(format!("{}: no frames decoded", path.display()))
            })?;

            let mut scaler = ffmpeg::software::scaling::context::Context::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                ffmpeg::format::Pixel::RGB24,
                decoded.width(),
                decoded.height(),
                ffmpeg::software::scaling::flag::Flags::BILINEAR,
            )
            .map_err(|e| decode_error(path, e))?;

            let mut rgb = ffmpeg::util::frame::video::Video::empty();
            scaler.run(&decoded, &mut rgb).map_err(|e| decode_error(path, e))?;
            rgb_frame_to_image(&rgb, path)
        }
    }

    /// Copy an RGB24 frame into an image buffer, dropping row padding.
    fn rgb_frame_to_image(
        frame: &ffmpeg::util::frame::video::Video,
        path: &Path,
    ) -> Result<RgbImage, VideoError> {
        let width = frame.width();
        let height = frame.height();
        let stride = frame.stride(0);
        let data = frame.data(0);
        let row_len = width as usize * 3;

        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }

        RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            VideoError::Decode(format!("{}: bad frame buffer", path.display()))
        })
    }
}
