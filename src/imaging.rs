//! Pixel operations for thumbnail production — pure Rust via the `image`
//! crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, GIF) | `image::ImageReader` |
//! | **Crop / scale** | `crop_imm` + `resize_exact` (Lanczos3) |
//! | **Alpha flatten** | per-pixel composite onto opaque white |
//! | **Grid composite** | `imageops::replace` onto a white canvas |
//!
//! [`make_thumbnail`] always yields an exact `size`×`size` 8-bit RGB
//! square, whatever the input's aspect ratio or channel count.
//! [`compose_grid`] lays up to four such squares onto the fixed 125×125
//! album canvas.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Edge of a leaf thumbnail and of the album canvas.
pub const THUMBNAIL_SIZE: u32 = 125;

/// Edge of one cell in an album's 2×2 grid.
pub const PINKYNAIL_SIZE: u32 = 50;

/// Gutter between grid cells and around the canvas border.
pub const PINKYNAIL_SPACING: u32 = 7;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// 50×50 glyph composed into slot 0 of albums that contain sub-albums.
static ALBUM_GLYPH: LazyLock<DynamicImage> = LazyLock::new(|| {
    image::load_from_memory_with_format(include_bytes!("../assets/album.gif"), ImageFormat::Gif)
        .expect("embedded album glyph is a valid GIF")
});

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// The built-in "contains albums" placeholder.
pub fn album_glyph() -> &'static DynamicImage {
    &ALBUM_GLYPH
}

/// Load and decode a raster image from disk.
pub fn load_image(path: &Path) -> Result<DynamicImage, ImagingError> {
    image::ImageReader::open(path)?
        .decode()
        .map_err(|e| ImagingError::Decode(format!("{}: {}", path.display(), e)))
}

/// Reduce any raster to an exact `size`×`size` 8-bit RGB square.
///
/// Center-crops to the shorter edge (odd margins lose their extra pixel
/// from the trailing edge), scales down to at most `size` — never up —
/// composites any alpha channel onto opaque white, expands grayscale to
/// three channels, then pads symmetrically with white; an odd remainder
/// lands on the bottom/right edge.
pub fn make_thumbnail(image: &DynamicImage, size: u32) -> RgbImage {
    // Crop the longer edge to a centered square
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let cropped = image.crop_imm((width - side) / 2, (height - side) / 2, side, side);

    let scaled = if side > size {
        cropped.resize_exact(size, size, FilterType::Lanczos3)
    } else {
        cropped
    };

    let flattened = flatten_onto_white(&scaled);

    let (scaled_w, scaled_h) = flattened.dimensions();
    if (scaled_w, scaled_h) == (size, size) {
        return flattened;
    }

    // Pad small results up to the contract size
    let mut canvas = RgbImage::from_pixel(size, size, WHITE);
    let dx = (size - scaled_w) / 2;
    let dy = (size - scaled_h) / 2;
    imageops::replace(&mut canvas, &flattened, i64::from(dx), i64::from(dy));
    canvas
}

/// Composite alpha onto opaque white and return 8-bit RGB. Grayscale
/// expands to three channels by replication.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = f32::from(a) / 255.0;
        let blend =
            |channel: u8| (255.0 * (1.0 - alpha) + f32::from(channel) * alpha).min(255.0) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Lay up to four pinkynails onto the 125×125 album canvas, row-major with
/// 7px gutters. Missing trailing cells stay white; cells past the fourth
/// are ignored.
pub fn compose_grid(cells: &[RgbImage]) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(THUMBNAIL_SIZE, THUMBNAIL_SIZE, WHITE);
    for (slot, cell) in cells.iter().take(4).enumerate() {
        let slot = slot as u32;
        let x = PINKYNAIL_SPACING + (slot % 2) * (PINKYNAIL_SIZE + PINKYNAIL_SPACING);
        let y = PINKYNAIL_SPACING + (slot / 2) * (PINKYNAIL_SIZE + PINKYNAIL_SPACING);
        imageops::replace(&mut canvas, cell, i64::from(x), i64::from(y));
    }
    canvas
}
