//! Shared test utilities for the image-jobs unit tests.
//!
//! Fixture images are synthesized rather than checked in: a small gradient
//! encoded with the `image` crate, optionally with a hand-built EXIF APP1
//! segment spliced in after the JPEG SOI marker.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tiff = exif_block(&[TiffEntry::Ascii(0x010F, "Canon"), TiffEntry::Short(0x0112, 6)]);
//! let jpeg = jpeg_with_exif(&encode_test_jpeg(40, 20), &tiff);
//! ```

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

// =========================================================================
// Image fixtures
// =========================================================================

fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        image::Rgb([r, g, 128])
    });
    DynamicImage::ImageRgb8(img)
}

/// A `width`×`height` gradient encoded as JPEG, with no metadata.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// Same gradient as [`encode_test_jpeg`], encoded as PNG.
pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// =========================================================================
// EXIF fixtures
// =========================================================================

/// One IFD0 entry for [`exif_block`].
#[derive(Debug, Clone, Copy)]
pub enum TiffEntry<'a> {
    Short(u16, u16),
    Ascii(u16, &'a str),
    Rational(u16, u32, u32),
}

impl TiffEntry<'_> {
    fn tag(&self) -> u16 {
        match self {
            Self::Short(tag, _) | Self::Ascii(tag, _) | Self::Rational(tag, _, _) => *tag,
        }
    }

    /// (type, count, value bytes)
    fn encoded(&self) -> (u16, u32, Vec<u8>) {
        match self {
            Self::Short(_, v) => (3, 1, v.to_be_bytes().to_vec()),
            Self::Ascii(_, s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                (2, bytes.len() as u32, bytes)
            }
            Self::Rational(_, num, den) => {
                let mut bytes = num.to_be_bytes().to_vec();
                bytes.extend_from_slice(&den.to_be_bytes());
                (5, 1, bytes)
            }
        }
    }
}

/// Big-endian TIFF structure with a single IFD0 holding `entries`.
pub fn exif_block(entries: &[TiffEntry]) -> Vec<u8> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| entry.tag());

    let ifd_len = 2 + 12 * sorted.len() + 4;
    let data_start = 8 + ifd_len;

    let mut ifd = Vec::with_capacity(ifd_len);
    let mut data = Vec::new();
    ifd.extend_from_slice(&(sorted.len() as u16).to_be_bytes());

    for entry in &sorted {
        let (kind, count, value) = entry.encoded();
        ifd.extend_from_slice(&entry.tag().to_be_bytes());
        ifd.extend_from_slice(&kind.to_be_bytes());
        ifd.extend_from_slice(&count.to_be_bytes());
        if value.len() <= 4 {
            let mut inline = value;
            inline.resize(4, 0);
            ifd.extend_from_slice(&inline);
        } else {
            let offset = (data_start + data.len()) as u32;
            ifd.extend_from_slice(&offset.to_be_bytes());
            data.extend_from_slice(&value);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    ifd.extend_from_slice(&0u32.to_be_bytes());

    let mut tiff = b"MM\x00\x2A\x00\x00\x00\x08".to_vec();
    tiff.extend_from_slice(&ifd);
    tiff.extend_from_slice(&data);
    tiff
}

/// TIFF block carrying only an `Orientation` tag.
pub fn orientation_exif(value: u16) -> Vec<u8> {
    exif_block(&[TiffEntry::Short(0x0112, value)])
}

/// Splice an APP1 `Exif` segment holding `tiff` right after the SOI marker.
pub fn jpeg_with_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\x00\x00");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_fixture_has_soi() {
        assert_eq!(&encode_test_jpeg(4, 4)[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn exif_block_layout() {
        let tiff = orientation_exif(6);
        assert_eq!(&tiff[..8], b"MM\x00\x2A\x00\x00\x00\x08");
        // one entry, tag 0x0112, SHORT, count 1, value 6
        assert_eq!(&tiff[8..10], &[0, 1]);
        assert_eq!(&tiff[10..12], &[0x01, 0x12]);
        assert_eq!(&tiff[12..14], &[0, 3]);
        assert_eq!(&tiff[18..20], &[0, 6]);
        assert_eq!(tiff.len(), 8 + 2 + 12 + 4);
    }

    #[test]
    fn long_values_go_to_data_area() {
        let tiff = exif_block(&[TiffEntry::Ascii(0x010F, "Canon")]);
        let offset = u32::from_be_bytes([tiff[18], tiff[19], tiff[20], tiff[21]]) as usize;
        assert_eq!(&tiff[offset..offset + 6], b"Canon\x00");
    }

    #[test]
    fn app1_spliced_after_soi() {
        let jpeg = jpeg_with_exif(&encode_test_jpeg(4, 4), &orientation_exif(1));
        assert_eq!(&jpeg[2..4], &[0xFF, 0xE1]);
        assert_eq!(&jpeg[6..12], b"Exif\x00\x00");
    }
}
