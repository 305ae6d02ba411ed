//! Notification envelope parsing.
//!
//! Storage put events reach the jobs wrapped twice: a notification batch
//! whose records each carry a JSON *string* message, and inside that message
//! a batch of storage-event records.
//!
//! ```text
//! {"Records": [                                  ← NotificationEnvelope
//!   {"Sns": {"Message": "{\"Records\": [        ← OuterRecord
//!       {\"s3\": {\"bucket\": {\"name\": \"b\"},  ← InnerRecord
//!                 \"object\": {\"key\": \"images/cat.jpg\"}}}
//!   ]}"}}
//! ]}
//! ```
//!
//! ## Laziness and failure units
//!
//! [`NotificationEnvelope::batches`] parses one outer record at a time as
//! the caller advances. A message that is not JSON, or lacks the inner
//! `Records` array, yields an [`EnvelopeError`] for that outer record only;
//! the processor counts it as a single failure and moves on.
//!
//! Inner records stay as raw JSON until the processor reaches them, so a
//! record missing its bucket or key fails as one *item* rather than taking
//! the whole outer record down with it.

use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("notification record has no message: {0}")]
    MissingMessage(#[source] serde_json::Error),
    #[error("notification message is not a storage event batch: {0}")]
    MalformedMessage(#[source] serde_json::Error),
}

/// Top-level invocation payload: an ordered list of notification records.
///
/// A payload without `Records` is an empty envelope, not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<OuterRecord>,
}

impl NotificationEnvelope {
    /// Unwrap outer records one at a time, in arrival order.
    pub fn batches(&self) -> impl Iterator<Item = Result<InnerBatch, EnvelopeError>> + '_ {
        self.records.iter().map(OuterRecord::unwrap_batch)
    }
}

/// One notification record. Kept as raw JSON so that a malformed record is
/// a per-record failure instead of rejecting the whole envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct OuterRecord(pub Value);

#[derive(Deserialize)]
struct Notification {
    #[serde(rename = "Sns")]
    sns: NotificationBody,
}

#[derive(Deserialize)]
struct NotificationBody {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Deserialize)]
struct StorageEventBatch {
    #[serde(rename = "Records")]
    records: Vec<Value>,
}

impl OuterRecord {
    /// Parse the embedded message into its batch of storage events.
    pub fn unwrap_batch(&self) -> Result<InnerBatch, EnvelopeError> {
        let notification =
            Notification::deserialize(&self.0).map_err(EnvelopeError::MissingMessage)?;
        let batch: StorageEventBatch = serde_json::from_str(&notification.sns.message)
            .map_err(EnvelopeError::MalformedMessage)?;
        Ok(InnerBatch {
            records: batch.records,
        })
    }
}

/// Storage-event records from one successfully unwrapped outer record.
/// May be empty.
#[derive(Debug, Clone, Default)]
pub struct InnerBatch {
    pub records: Vec<Value>,
}

impl InnerBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for InnerBatch {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[derive(Debug, Deserialize)]
struct StorageEvent {
    s3: StorageEntity,
}

#[derive(Debug, Deserialize)]
struct StorageEntity {
    bucket: StorageBucket,
    object: StorageObject,
}

#[derive(Debug, Deserialize)]
struct StorageBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StorageObject {
    key: String,
}

/// One storage object as named by the event: key still percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerRecord {
    pub bucket: String,
    pub raw_key: String,
}

impl InnerRecord {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let event = StorageEvent::deserialize(value)?;
        Ok(Self {
            bucket: event.s3.bucket.name,
            raw_key: event.s3.object.key,
        })
    }

    /// Decode the key and produce the unit of work.
    pub fn object_reference(&self) -> ObjectReference {
        ObjectReference {
            bucket: self.bucket.clone(),
            key: decode_key(&self.raw_key).into_owned(),
        }
    }
}

/// Best-effort `(bucket, raw key)` for diagnostics when a record could not
/// be parsed as a storage event.
pub fn describe_raw_record(value: &Value) -> (Option<String>, Option<String>) {
    let s3 = value.get("s3");
    let bucket = s3
        .and_then(|s| s.pointer("/bucket/name"))
        .and_then(Value::as_str)
        .map(String::from);
    let key = s3
        .and_then(|s| s.pointer("/object/key"))
        .and_then(Value::as_str)
        .map(String::from);
    (bucket, key)
}

/// A storage object with its key decoded, ready to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Decode a form-encoded object key: `+` is a space, `%XX` is a byte.
///
/// Invalid UTF-8 after decoding is replaced rather than rejected, so every
/// key decodes to something usable as a diagnostic and a storage key.
pub fn decode_key(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['+', '%']) {
        return Cow::Borrowed(raw);
    }
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(message: &str) -> Value {
        json!({"Sns": {"Message": message}})
    }

    fn storage_event(bucket: &str, key: &str) -> Value {
        json!({"s3": {"bucket": {"name": bucket}, "object": {"key": key}}})
    }

    #[test]
    fn unwraps_inner_batch() {
        let message = json!({"Records": [storage_event("b", "images/cat.jpg")]}).to_string();
        let envelope: NotificationEnvelope =
            serde_json::from_value(json!({"Records": [notification(&message)]})).unwrap();

        let batches: Vec<_> = envelope.batches().collect();
        assert_eq!(batches.len(), 1);
        let batch = batches.into_iter().next().unwrap().unwrap();
        assert_eq!(batch.len(), 1);

        let record = InnerRecord::from_value(&batch.records[0]).unwrap();
        assert_eq!(record.bucket, "b");
        assert_eq!(record.raw_key, "images/cat.jpg");
    }

    #[test]
    fn missing_records_is_empty_envelope() {
        let envelope: NotificationEnvelope = serde_json::from_value(json!({})).unwrap();
        assert_eq!(envelope.batches().count(), 0);
    }

    #[test]
    fn empty_inner_batch_is_not_an_error() {
        let record = OuterRecord(notification(r#"{"Records": []}"#));
        let batch = record.unwrap_batch().unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn unparseable_message_fails_outer_record() {
        let record = OuterRecord(notification("not json {"));
        assert!(matches!(
            record.unwrap_batch(),
            Err(EnvelopeError::MalformedMessage(_))
        ));
    }

    #[test]
    fn message_without_records_fails_outer_record() {
        let record = OuterRecord(notification(r#"{"Event": "s3:TestEvent"}"#));
        assert!(matches!(
            record.unwrap_batch(),
            Err(EnvelopeError::MalformedMessage(_))
        ));
    }

    #[test]
    fn record_without_sns_fails_outer_record() {
        let record = OuterRecord(json!({"EventSource": "aws:sns"}));
        assert!(matches!(
            record.unwrap_batch(),
            Err(EnvelopeError::MissingMessage(_))
        ));
    }

    #[test]
    fn batches_are_independent() {
        let good = json!({"Records": [storage_event("b", "x.jpg")]}).to_string();
        let envelope: NotificationEnvelope = serde_json::from_value(json!({
            "Records": [notification("garbage"), notification(&good)]
        }))
        .unwrap();

        let results: Vec<_> = envelope.batches().collect();
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap().len(), 1);
    }

    #[test]
    fn inner_record_missing_key_is_an_error() {
        let value = json!({"s3": {"bucket": {"name": "b"}, "object": {}}});
        assert!(InnerRecord::from_value(&value).is_err());
        assert_eq!(describe_raw_record(&value), (Some("b".to_string()), None));
    }

    #[test]
    fn plus_decodes_to_space() {
        assert_eq!(decode_key("my+photo.jpg"), "my photo.jpg");
    }

    #[test]
    fn percent_sequences_decode() {
        assert_eq!(decode_key("my%20photo.jpg"), "my photo.jpg");
        assert_eq!(decode_key("caf%C3%A9.png"), "café.png");
        assert_eq!(decode_key("a%2Bb.jpg"), "a+b.jpg");
    }

    #[test]
    fn plain_key_is_borrowed() {
        assert!(matches!(decode_key("images/cat.jpg"), Cow::Borrowed(_)));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_key("bad%FF.jpg"), "bad\u{FFFD}.jpg");
    }

    #[test]
    fn object_reference_uses_decoded_key() {
        let record = InnerRecord {
            bucket: "b".into(),
            raw_key: "uploads/my+photo.jpg".into(),
        };
        let reference = record.object_reference();
        assert_eq!(reference.key, "uploads/my photo.jpg");
        assert_eq!(reference.to_string(), "b/uploads/my photo.jpg");
    }
}
