//! EXIF orientation normalization.
//!
//! Cameras store pixels in sensor order and record how to display them in
//! the EXIF `Orientation` tag (0x0112). Every job applies that tag to the
//! decoded pixels first, so derived artifacts are upright no matter how the
//! camera was held. Missing or out-of-range tags mean "already upright".

use image::DynamicImage;
use std::io::Cursor;

/// Values of the EXIF `Orientation` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Mirrored across the top-left/bottom-right diagonal.
    Transpose,
    Rotate90,
    /// Mirrored across the top-right/bottom-left diagonal.
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_tag(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Normal),
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// Whether applying this orientation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Reorient pixel data so the image displays upright.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}

/// Read the orientation tag from an encoded image, if it carries one.
pub fn read_orientation(data: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(data);
    exif::Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|parsed| {
            parsed
                .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|f| f.value.get_uint(0))
        })
        .and_then(Orientation::from_tag)
        .unwrap_or_default()
}
