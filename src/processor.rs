//! Batch processing with failure isolation at both nesting levels.
//!
//! ```text
//! for each outer record            ── unwrap fails → failed += 1, next record
//!   for each inner record          ── any step fails → failed += 1, next item
//!     parse record → decode key → fetch → decode + orient
//!     → transform → encode every artifact → put each, in order
//!     processed += 1
//! ```
//!
//! Both loops are collect-and-continue: the per-record and per-item bodies
//! return `Result`, and the loop folds the result into a [`BatchReport`].
//! Nothing below the envelope propagates to the caller.
//!
//! ## Partial writes
//!
//! All artifacts for an item are encoded before the first put, so encode
//! failures never leave output behind. Puts happen in artifact order with no
//! rollback: when a put fails, the keys already written for that item are
//! listed in [`ItemError::Store`] and stay in storage.

use crate::envelope::{
    EnvelopeError, InnerRecord, NotificationEnvelope, ObjectReference, describe_raw_record,
};
use crate::imaging::{CodecError, Quality};
use crate::store::{ImageStore, StoreError, StoredObject};
use crate::transform::{SourceImage, Transform, TransformError};
use serde_json::Value;
use thiserror::Error;

/// Why one item failed.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("storage event record is malformed: {0}")]
    MalformedRecord(#[source] serde_json::Error),
    #[error("fetch failed: {0}")]
    Fetch(#[source] StoreError),
    #[error("not a decodable image: {0}")]
    Decode(#[source] CodecError),
    #[error("transform failed: {0}")]
    Transform(#[source] TransformError),
    #[error("encode failed: {0}")]
    Encode(#[source] CodecError),
    #[error("storing {key} failed after {} artifact(s) written: {source}", .stored.len())]
    Store {
        key: String,
        /// Keys written for this item before the failure.
        stored: Vec<String>,
        #[source]
        source: StoreError,
    },
}

/// Running counters for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub processed: usize,
    pub failed: usize,
}

/// Diagnostic for one failure unit.
#[derive(Debug)]
pub enum Failure {
    /// An outer record whose message could not be unwrapped.
    Record { index: usize, error: EnvelopeError },
    /// One storage object. Bucket and key are best-effort when the record
    /// itself was malformed.
    Item {
        bucket: Option<String>,
        key: Option<String>,
        error: ItemError,
    },
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record { index, error } => write!(f, "record #{index}: {error}"),
            Self::Item { bucket, key, error } => write!(
                f,
                "{}/{}: {error}",
                bucket.as_deref().unwrap_or("?"),
                key.as_deref().unwrap_or("?")
            ),
        }
    }
}

/// A successfully processed object and what was written for it.
#[derive(Debug, Clone)]
pub struct ItemReport {
    pub reference: ObjectReference,
    pub stored: Vec<StoredObject>,
}

/// Everything one batch run produced: counts plus per-unit diagnostics.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub items: Vec<ItemReport>,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    fn record_success(&mut self, item: ItemReport) {
        self.outcome.processed += 1;
        self.items.push(item);
    }

    fn record_failure(&mut self, failure: Failure) {
        self.outcome.failed += 1;
        self.failures.push(failure);
    }
}

/// Knobs that apply to every item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    pub quality: Quality,
}

/// Drives one transform over every object in an envelope.
pub struct BatchProcessor<'a, S: ImageStore + ?Sized> {
    store: &'a S,
    transform: &'a dyn Transform,
    options: ProcessOptions,
}

impl<'a, S: ImageStore + ?Sized> BatchProcessor<'a, S> {
    pub fn new(store: &'a S, transform: &'a dyn Transform, options: ProcessOptions) -> Self {
        Self {
            store,
            transform,
            options,
        }
    }

    /// Process every record in arrival order. Never fails as a whole.
    pub fn process(&self, envelope: &NotificationEnvelope) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, batch) in envelope.batches().enumerate() {
            let batch = match batch {
                Ok(batch) => batch,
                Err(error) => {
                    tracing::warn!(record = index, %error, "skipping notification record");
                    report.record_failure(Failure::Record { index, error });
                    continue;
                }
            };
            tracing::debug!(record = index, items = batch.len(), "unwrapped notification record");

            for value in batch {
                match self.process_item(&value) {
                    Ok(item) => {
                        tracing::info!(
                            bucket = %item.reference.bucket,
                            key = %item.reference.key,
                            artifacts = item.stored.len(),
                            "processed"
                        );
                        report.record_success(item);
                    }
                    Err(failure) => {
                        tracing::warn!(%failure, "item failed");
                        report.record_failure(failure);
                    }
                }
            }
        }

        report
    }

    fn process_item(&self, value: &Value) -> Result<ItemReport, Failure> {
        let record = InnerRecord::from_value(value).map_err(|e| {
            let (bucket, key) = describe_raw_record(value);
            Failure::Item {
                bucket,
                key,
                error: ItemError::MalformedRecord(e),
            }
        })?;
        let reference = record.object_reference();

        self.run(&reference).map_err(|error| Failure::Item {
            bucket: Some(reference.bucket.clone()),
            key: Some(reference.key.clone()),
            error,
        })
    }

    fn run(&self, reference: &ObjectReference) -> Result<ItemReport, ItemError> {
        let bytes = self
            .store
            .fetch(&reference.bucket, &reference.key)
            .map_err(ItemError::Fetch)?;
        let source = SourceImage::decode(reference.clone(), bytes).map_err(ItemError::Decode)?;
        let artifacts = self
            .transform
            .apply(&source)
            .map_err(ItemError::Transform)?;

        let encoded = artifacts
            .into_iter()
            .map(|artifact| {
                let key = artifact.destination_key(&reference.key);
                let (body, content_type) = artifact.payload.encode(self.options.quality)?;
                Ok((key, body, content_type))
            })
            .collect::<Result<Vec<_>, CodecError>>()
            .map_err(ItemError::Encode)?;

        let mut stored: Vec<StoredObject> = Vec::with_capacity(encoded.len());
        for (key, body, content_type) in encoded {
            match self.store.put(&reference.bucket, &key, &body, content_type) {
                Ok(receipt) => stored.push(receipt),
                Err(source) => {
                    return Err(ItemError::Store {
                        key,
                        stored: stored.into_iter().map(|s| s.key).collect(),
                        source,
                    });
                }
            }
        }

        Ok(ItemReport {
            reference: reference.clone(),
            stored,
        })
    }
}

/// Convenience wrapper: run `transform` over `envelope` against `store`.
pub fn process_envelope<S: ImageStore + ?Sized>(
    store: &S,
    transform: &dyn Transform,
    envelope: &NotificationEnvelope,
    options: ProcessOptions,
) -> BatchReport {
    BatchProcessor::new(store, transform, options).process(envelope)
}
