//! Transforms: the pluggable unit of work each job runs per object.
//!
//! A [`Transform`] receives an upright, decoded [`SourceImage`] and returns
//! the artifacts to write. It never touches storage and never derives full
//! keys itself; each [`Artifact`] names a namespace and extension and the
//! processor turns that into `processed/<namespace>/<stem>.<ext>`.
//!
//! | Job | Transform | Artifacts |
//! |---|---|---|
//! | `exif` | [`ExifExtract`] | `exif/<stem>.json` |
//! | `greyscale` | [`Greyscale`] | `greyscale/<stem>.jpg` |
//! | `resize` | [`Resize`] | `resized/<stem>.jpg` |
//! | `resize-pipeline` | [`ResizePipeline`] | `resized/<stem>.jpg`, `grayscale/<stem>.jpg`, `metadata/<stem>.json` |
//!
//! ## Payloads
//!
//! Artifacts carry a [`Payload`]: either bytes that are already encoded
//! (the JSON documents) or a decoded image. Images are encoded to JPEG by an
//! explicit [`Payload::encode`] call before anything reaches the store, so
//! stores only ever see bytes and a content type.

use crate::envelope::ObjectReference;
use crate::imaging::{
    self, CodecError, ExifTags, Quality, ThumbnailBounds, read_exif_tags,
};
use crate::naming::{
    self, EXIF_NAMESPACE, GREYSCALE_NAMESPACE, PIPELINE_GREYSCALE_NAMESPACE,
    PIPELINE_METADATA_NAMESPACE, RESIZED_NAMESPACE,
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("failed to serialize metadata document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// A fetched object, decoded and with EXIF orientation already applied.
///
/// The original bytes are kept alongside the pixels: metadata extraction
/// reads them, since decoding drops the EXIF block.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub reference: ObjectReference,
    pub bytes: Vec<u8>,
    pub image: DynamicImage,
}

impl SourceImage {
    /// Decode `bytes` and normalize orientation.
    pub fn decode(reference: ObjectReference, bytes: Vec<u8>) -> Result<Self, CodecError> {
        let image = imaging::decode_upright(&bytes)?;
        Ok(Self {
            reference,
            bytes,
            image,
        })
    }
}

/// What an artifact contains.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Ready-to-store bytes.
    Encoded {
        bytes: Vec<u8>,
        content_type: &'static str,
    },
    /// Pixels still to be encoded as JPEG.
    Image(DynamicImage),
}

impl Payload {
    /// Produce the bytes and content type to store.
    pub fn encode(self, quality: Quality) -> Result<(Vec<u8>, &'static str), CodecError> {
        match self {
            Self::Encoded {
                bytes,
                content_type,
            } => Ok((bytes, content_type)),
            Self::Image(img) => Ok((imaging::encode_jpeg(&img, quality)?, JPEG_CONTENT_TYPE)),
        }
    }
}

/// One derived output of a transform.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub namespace: &'static str,
    pub extension: &'static str,
    pub payload: Payload,
}

impl Artifact {
    fn jpeg(namespace: &'static str, image: DynamicImage) -> Self {
        Self {
            namespace,
            extension: "jpg",
            payload: Payload::Image(image),
        }
    }

    fn json(namespace: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            namespace,
            extension: "json",
            payload: Payload::Encoded {
                bytes,
                content_type: JSON_CONTENT_TYPE,
            },
        }
    }

    /// Where this artifact lands for a given source key.
    pub fn destination_key(&self, source_key: &str) -> String {
        naming::derive_key(source_key, self.namespace, self.extension)
    }
}

/// One image operation, run once per object.
pub trait Transform {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Artifacts to write, in write order.
    fn apply(&self, source: &SourceImage) -> Result<Vec<Artifact>, TransformError>;
}

// ============================================================================
// Metadata document
// ============================================================================

/// JSON document written by the EXIF extraction jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExifDocument {
    pub source_key: String,
    pub exif: ExifTags,
}

impl ExifDocument {
    pub fn read(source: &SourceImage) -> Self {
        Self {
            source_key: source.reference.key.clone(),
            exif: read_exif_tags(&source.bytes),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TransformError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ============================================================================
// Variants
// ============================================================================

/// Dump embedded EXIF metadata. Absent metadata produces `"exif": {}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtract;

impl Transform for ExifExtract {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn apply(&self, source: &SourceImage) -> Result<Vec<Artifact>, TransformError> {
        let document = ExifDocument::read(source);
        Ok(vec![Artifact::json(EXIF_NAMESPACE, document.to_bytes()?)])
    }
}

/// Single-channel luminance copy of the upright image.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greyscale;

impl Transform for Greyscale {
    fn name(&self) -> &'static str {
        "greyscale"
    }

    fn apply(&self, source: &SourceImage) -> Result<Vec<Artifact>, TransformError> {
        ensure_pixels(&source.image)?;
        Ok(vec![Artifact::jpeg(
            GREYSCALE_NAMESPACE,
            imaging::to_greyscale(&source.image),
        )])
    }
}

/// Bounded thumbnail. Greyscale sources stay single-channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resize {
    pub bounds: ThumbnailBounds,
}

impl Resize {
    fn thumbnail(&self, image: &DynamicImage) -> DynamicImage {
        imaging::thumbnail(&imaging::to_thumbnail_mode(image), self.bounds)
    }
}

impl Transform for Resize {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn apply(&self, source: &SourceImage) -> Result<Vec<Artifact>, TransformError> {
        ensure_pixels(&source.image)?;
        Ok(vec![Artifact::jpeg(
            RESIZED_NAMESPACE,
            self.thumbnail(&source.image),
        )])
    }
}

/// Thumbnail, greyscale copy and metadata document from one decode.
///
/// The greyscale copy is taken from the full-size upright image, not the
/// thumbnail. The three artifacts count as one item: if any write fails the
/// item fails, and artifacts written before the failure stay in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizePipeline {
    pub resize: Resize,
}

impl Transform for ResizePipeline {
    fn name(&self) -> &'static str {
        "resize-pipeline"
    }

    fn apply(&self, source: &SourceImage) -> Result<Vec<Artifact>, TransformError> {
        ensure_pixels(&source.image)?;
        let document = ExifDocument::read(source);
        Ok(vec![
            Artifact::jpeg(RESIZED_NAMESPACE, self.resize.thumbnail(&source.image)),
            Artifact::jpeg(
                PIPELINE_GREYSCALE_NAMESPACE,
                imaging::to_greyscale(&source.image),
            ),
            Artifact::json(PIPELINE_METADATA_NAMESPACE, document.to_bytes()?),
        ])
    }
}

fn ensure_pixels(image: &DynamicImage) -> Result<(), TransformError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(TransformError::EmptyImage { width, height });
    }
    Ok(())
}

// ============================================================================
// Job selection
// ============================================================================

/// The deployable jobs. Each maps to exactly one transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Job {
    Exif,
    Greyscale,
    Resize,
    ResizePipeline,
}

impl Job {
    pub fn transform(self) -> Box<dyn Transform + Send + Sync> {
        match self {
            Self::Exif => Box::new(ExifExtract),
            Self::Greyscale => Box::new(Greyscale),
            Self::Resize => Box::new(Resize::default()),
            Self::ResizePipeline => Box::new(ResizePipeline::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exif => "exif",
            Self::Greyscale => "greyscale",
            Self::Resize => "resize",
            Self::ResizePipeline => "resize-pipeline",
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
