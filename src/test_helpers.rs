//! Shared test utilities.
//!
//! Synthetic media builders used across the unit tests. Classification is
//! extension-only, so video fixtures can be arbitrary bytes; images go
//! through real encoders because extraction and thumbnailing decode them.

use image::{ImageEncoder, RgbImage};
use std::fs;
use std::path::Path;

/// Encode a small RGB JPEG with a deterministic gradient (blue pinned at
/// 128, handy for pixel assertions through lossy encoding).
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Encode an RGBA PNG filled with one color and alpha value.
pub fn create_test_png_rgba(path: &Path, width: u32, height: u32, alpha: u8) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 10, 10, alpha]));
    img.save(path).unwrap();
}

/// Write a placeholder video file. A few container-ish magic bytes, enough
/// for grouping and store tests; never decoded.
pub fn create_fake_video(path: &Path) {
    fs::write(path, b"\x00\x00\x00\x18ftypmp42fakevideodata").unwrap();
}
