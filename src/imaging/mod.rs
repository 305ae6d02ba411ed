//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Orientation** | `kamadak-exif` tag 0x0112 + rotate/flip |
//! | **EXIF dump** | `kamadak-exif` primary IFD → JSON scalars |
//! | **Greyscale** | `to_luma8` |
//! | **Thumbnail** | fit-within bounds + Lanczos3, never upscaled |
//! | **Encode** | JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality and thumbnail bounds
//! - **Orientation**: EXIF orientation read + pixel reorientation
//! - **EXIF tags**: Metadata extraction into a JSON-safe mapping
//! - **Codec**: Decode, colour-mode conversion, resize, encode

mod calculations;
pub mod codec;
pub mod exif_tags;
pub mod orientation;
mod params;

pub use calculations::fit_within;
pub use codec::{
    CodecError, decode, decode_upright, encode_jpeg, thumbnail, to_greyscale, to_thumbnail_mode,
};
pub use exif_tags::{ExifTags, read_exif_tags};
pub use orientation::{Orientation, read_orientation};
pub use params::{Quality, ThumbnailBounds};
