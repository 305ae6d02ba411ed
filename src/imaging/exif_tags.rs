//! EXIF tag extraction into a JSON-safe mapping.
//!
//! Reads the primary image's EXIF fields (IFD0 plus the Exif and GPS
//! sub-IFDs it points to; the embedded thumbnail's IFD is skipped) and maps
//! each tag name to a JSON value:
//!
//! | EXIF value | JSON |
//! |---|---|
//! | single ASCII string | string (trailing NULs trimmed) |
//! | single integer (BYTE, SHORT, LONG, signed variants) | number |
//! | single FLOAT / DOUBLE | number (string if not finite) |
//! | anything else (rationals, arrays, UNDEFINED blobs) | display string |
//!
//! Extraction never fails. An image without EXIF, or with an EXIF block
//! the parser rejects, produces an empty mapping.

use serde_json::{Map, Number, Value};
use std::io::Cursor;

/// Tag name → scalar value, ordered by tag name for stable output.
pub type ExifTags = Map<String, Value>;

/// Extract every primary-image EXIF field from an encoded image.
pub fn read_exif_tags(data: &[u8]) -> ExifTags {
    let mut cursor = Cursor::new(data);
    let parsed = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(error = %err, "no readable EXIF block");
            return ExifTags::new();
        }
    };

    parsed
        .fields()
        .filter(|field| field.ifd_num == exif::In::PRIMARY)
        .map(|field| (field.tag.to_string(), scalar_value(field)))
        .collect()
}

/// Coerce a field into a JSON primitive, falling back to its display string.
fn scalar_value(field: &exif::Field) -> Value {
    use exif::Value as V;

    match &field.value {
        V::Ascii(parts) if parts.len() == 1 => {
            let text = String::from_utf8_lossy(&parts[0]);
            Value::String(text.trim_end_matches('\0').to_string())
        }
        V::Byte(v) if v.len() == 1 => Value::from(v[0]),
        V::Short(v) if v.len() == 1 => Value::from(v[0]),
        V::Long(v) if v.len() == 1 => Value::from(v[0]),
        V::SByte(v) if v.len() == 1 => Value::from(v[0]),
        V::SShort(v) if v.len() == 1 => Value::from(v[0]),
        V::SLong(v) if v.len() == 1 => Value::from(v[0]),
        V::Float(v) if v.len() == 1 => float_or_display(f64::from(v[0]), field),
        V::Double(v) if v.len() == 1 => float_or_display(v[0], field),
        _ => display(field),
    }
}

fn float_or_display(value: f64, field: &exif::Field) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| display(field))
}

fn display(field: &exif::Field) -> Value {
    Value::String(field.display_value().to_string())
}
