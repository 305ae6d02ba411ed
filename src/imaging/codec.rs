//! Pixel-level codec work on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | Orientation | `kamadak-exif` tag read + [`Orientation::apply`] |
//! | Greyscale | `DynamicImage::to_luma8` |
//! | Thumbnail | [`fit_within`] + `resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! JPEG has no alpha channel and only 8-bit luma or RGB, so [`encode_jpeg`]
//! keeps single-channel luma images as-is and flattens everything else to
//! RGB8 before encoding.

use super::calculations::fit_within;
use super::orientation::{Orientation, read_orientation};
use super::params::{Quality, ThumbnailBounds};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unrecognized image data: {0}")]
    UnknownFormat(#[source] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("JPEG encode failed: {0}")]
    Encode(#[source] image::ImageError),
}

/// Decode an encoded image, guessing its format from the content.
pub fn decode(data: &[u8]) -> Result<DynamicImage, CodecError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(CodecError::UnknownFormat)?
        .decode()
        .map_err(CodecError::Decode)
}

/// Decode and apply the embedded EXIF orientation, returning upright pixels.
pub fn decode_upright(data: &[u8]) -> Result<DynamicImage, CodecError> {
    let img = decode(data)?;
    let orientation = read_orientation(data);
    if orientation != Orientation::Normal {
        tracing::debug!(?orientation, "normalizing orientation");
    }
    Ok(orientation.apply(img))
}

/// Single-channel luminance copy. Images already in 8-bit luma are cloned.
pub fn to_greyscale(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) => img.clone(),
        other => DynamicImage::ImageLuma8(other.to_luma8()),
    }
}

/// Normalize colour mode for thumbnails: 8-bit luma and RGB stay as they are,
/// every other layout (alpha, 16-bit, float) becomes RGB8.
pub fn to_thumbnail_mode(img: &DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img.clone(),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Shrink to fit inside `bounds`, preserving aspect ratio. Never upscales.
pub fn thumbnail(img: &DynamicImage, bounds: ThumbnailBounds) -> DynamicImage {
    let source = (img.width(), img.height());
    let (w, h) = fit_within(source, bounds.as_tuple());
    if (w, h) == source {
        img.clone()
    } else {
        img.resize_exact(w, h, FilterType::Lanczos3)
    }
}

/// Encode as baseline JPEG.
pub fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
    let written = match img {
        DynamicImage::ImageLuma8(luma) => luma.write_with_encoder(encoder),
        other => other.to_rgb8().write_with_encoder(encoder),
    };
    written.map_err(CodecError::Encode)?;
    Ok(buf.into_inner())
}
