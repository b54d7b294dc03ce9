// Single-image recompression.
//
// Every recognized raster entry is decoded, flattened to opaque 8-bit RGB
// and rewritten in place as a baseline JPEG. The file keeps its name, so a
// `.png` entry ends up holding JPEG data; office readers sniff content.

use std::fs;
use std::io;
use std::path::Path;

use image::{DynamicImage, ImageReader, Rgb, RgbImage};

use crate::size::SizeChange;

/// Extensions treated as raster images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Default JPEG quality for re-encoded images.
pub const DEFAULT_QUALITY: u8 = 85;

/// Largest width/height a baseline JPEG can carry.
const JPEG_MAX_DIMENSION: u32 = u16::MAX as u32;

/// JPEG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegSettings {
    /// Quality level (1-100).
    pub quality: u8,
    /// Compute optimized Huffman tables (smaller output, slower encode).
    pub optimize: bool,
}

impl Default for JpegSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            optimize: true,
        }
    }
}

/// Error type for a single image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("{width}x{height} exceeds the JPEG dimension limit")]
    TooLarge { width: u32, height: u32 },
    #[error("encode error: {0}")]
    Encode(#[from] jpeg_encoder::EncodingError),
}

impl ImageError {
    /// Short stable label used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Decode(_) => "decode",
            Self::TooLarge { .. } => "too-large",
            Self::Encode(_) => "encode",
        }
    }
}

/// Whether `path` names a recognized raster image.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Drop transparency and normalize to 8-bit RGB.
///
/// Images with an alpha channel are composited onto an opaque white
/// background using their own alpha as the mask. Everything else that is
/// not already RGB8 is converted.
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return match img {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let alpha = u16::from(src[3]);
        for c in 0..3 {
            let blended = u16::from(src[c]) * alpha + 255 * (255 - alpha);
            dst[c] = ((blended + 127) / 255) as u8;
        }
    }
    out
}

/// Encode an RGB image as JPEG into memory.
pub fn encode_jpeg(rgb: &RgbImage, settings: &JpegSettings) -> Result<Vec<u8>, ImageError> {
    let (width, height) = rgb.dimensions();
    if width > JPEG_MAX_DIMENSION || height > JPEG_MAX_DIMENSION {
        return Err(ImageError::TooLarge { width, height });
    }

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, settings.quality);
    encoder.set_optimized_huffman_tables(settings.optimize);
    encoder.encode(
        rgb.as_raw(),
        width as u16,
        height as u16,
        jpeg_encoder::ColorType::Rgb,
    )?;
    Ok(out)
}

/// Re-encode the image at `path` as JPEG, overwriting it.
///
/// The file is only written once encoding has succeeded, so decode and
/// encode failures leave it untouched. Anything other than a regular file
/// (a symlink in particular) is refused before it is opened.
pub fn recompress_image(path: &Path, settings: &JpegSettings) -> Result<SizeChange, ImageError> {
    if !fs::symlink_metadata(path)?.is_file() {
        return Err(ImageError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let before = fs::metadata(path)?.len();

    let rgb = flatten_to_rgb(img);
    let jpeg = encode_jpeg(&rgb, settings)?;
    fs::write(path, &jpeg)?;

    let after = fs::metadata(path)?.len();
    log::debug!(
        "recompressed {} ({}x{}): {before} -> {after} bytes",
        path.display(),
        rgb.width(),
        rgb.height()
    );
    Ok(SizeChange::new(before, after))
}
