//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*: the transforms in
//! [`crate::transform`] pick values, and the codec functions in
//! [`codec`](super::codec) do the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`ThumbnailBounds`]: maximum thumbnail box. The jobs use the fixed
//!   [`ThumbnailBounds::STANDARD`] 1024×1024 policy.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Maximum thumbnail dimensions. Aspect ratio is always preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl ThumbnailBounds {
    pub const STANDARD: Self = Self {
        max_width: 1024,
        max_height: 1024,
    };

    pub fn as_tuple(self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}

impl Default for ThumbnailBounds {
    fn default() -> Self {
        Self::STANDARD
    }
}
