//! # image-jobs
//!
//! Event-triggered image processing. An upstream storage "put" event arrives
//! wrapped in a notification envelope; a job unwraps the batch, applies one
//! image transform to every referenced object, writes the derived artifacts
//! back to storage under namespaced keys, and reports a summary that stays
//! honest about partial failure.
//!
//! # Flow
//!
//! ```text
//! envelope ─▶ unwrap outer record ─▶ inner storage events
//!                                      │  per object:
//!                                      ▼
//!        fetch ─▶ decode + orient ─▶ transform ─▶ encode ─▶ put
//!                                      │
//!              (processed, failed) ◀───┘  ─▶ {statusCode: 200 | 207}
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`envelope`] | Two-level notification envelope, inner storage events, key percent-decoding |
//! | [`naming`] | Stem extraction and `processed/<namespace>/<stem>.<ext>` key derivation |
//! | [`transform`] | The `Transform` trait, artifacts and payloads, the four job transforms |
//! | [`imaging`] | Pure-Rust codec work: decode, orientation, greyscale, thumbnail, JPEG, EXIF tags |
//! | [`store`] | `ImageStore` trait with filesystem and in-memory implementations |
//! | [`processor`] | Batch loop with per-record and per-item failure isolation |
//! | [`summary`] | `(processed, failed)` → `{statusCode, processed, failed}` |
//! | [`handler`] | Invocation entry point holding the injected store and job |
//! | [`config`] | TOML configuration for the binary |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Failure Isolation Is Control Flow
//!
//! The batch loop never unwinds. Each outer record and each object is
//! processed by a function returning `Result`, and the loop folds that result
//! into counters and a diagnostic list. One unreadable record or missing
//! object costs exactly one failure unit and the rest of the batch still
//! runs. The caller sees `207` whenever anything failed.
//!
//! ## Stores See Bytes Only
//!
//! Transforms return [`transform::Payload`] values that are either already
//! encoded (JSON documents) or decoded images. The processor encodes images
//! to JPEG explicitly before calling [`store::ImageStore::put`], so a store
//! implementation never has to inspect what it was handed.
//!
//! ## Injected Store
//!
//! [`handler::Handler`] takes its store at construction and reuses it for
//! every invocation, so any client or connection pool behind it lives for
//! the whole process.
//!
//! ## Upright Pixels Everywhere
//!
//! Every transform receives pixels with the EXIF orientation already
//! applied, so thumbnails and greyscale copies display the right way up no
//! matter how the camera was held.

pub mod config;
pub mod envelope;
pub mod handler;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod processor;
pub mod store;
pub mod summary;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_helpers;
