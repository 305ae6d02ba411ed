//! Destination-key derivation for derived artifacts.
//!
//! Every artifact a job writes lands under a fixed `processed/` prefix,
//! namespaced by the kind of derivative, and named after the source object's
//! stem:
//!
//! ```text
//! images/cat.jpg   →  processed/exif/cat.json
//!                     processed/greyscale/cat.jpg
//!                     processed/resized/cat.jpg
//! ```
//!
//! ## Stems
//!
//! The stem is the final path segment with its last extension removed:
//! - `a/b/c.png` → `c`
//! - `photo.JPG` → `photo`
//! - `archive.tar.gz` → `archive.tar`
//! - `README` → `README` (no extension, whole segment is the stem)
//! - `.hidden` → `.hidden` (a leading dot is not an extension separator)
//!
//! Keys are `/`-separated regardless of platform, so this module never goes
//! through `std::path`.

/// Prefix shared by every derived artifact.
pub const OUTPUT_ROOT: &str = "processed";

/// Namespace for the standalone EXIF job.
pub const EXIF_NAMESPACE: &str = "exif";
/// Namespace for the standalone greyscale job.
pub const GREYSCALE_NAMESPACE: &str = "greyscale";
/// Namespace for thumbnails (standalone resize and the composite pipeline).
pub const RESIZED_NAMESPACE: &str = "resized";
/// Greyscale derivative written by the composite resize pipeline.
pub const PIPELINE_GREYSCALE_NAMESPACE: &str = "grayscale";
/// Metadata document written by the composite resize pipeline.
pub const PIPELINE_METADATA_NAMESPACE: &str = "metadata";

/// Final path segment of `key` with its last extension stripped.
pub fn stem(key: &str) -> &str {
    let name = key
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Compute `processed/<namespace>/<stem>.<extension>` for a source key.
///
/// Pure and total: any string is accepted, and the extension is always
/// lowercase as given by the caller (the source's own extension is dropped).
pub fn derive_key(source_key: &str, namespace: &str, extension: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        OUTPUT_ROOT,
        namespace,
        stem(source_key),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_filename_with_uppercase_extension() {
        assert_eq!(
            derive_key("photo.JPG", "greyscale", "jpg"),
            "processed/greyscale/photo.jpg"
        );
    }

    #[test]
    fn nested_path_is_stripped() {
        assert_eq!(
            derive_key("a/b/c.png", "resized", "jpg"),
            "processed/resized/c.jpg"
        );
    }

    #[test]
    fn exif_document_key() {
        assert_eq!(
            derive_key("images/cat.jpg", EXIF_NAMESPACE, "json"),
            "processed/exif/cat.json"
        );
    }

    #[test]
    fn no_extension_keeps_whole_segment() {
        assert_eq!(stem("uploads/README"), "README");
        assert_eq!(stem("README"), "README");
    }

    #[test]
    fn only_last_extension_is_removed() {
        assert_eq!(stem("backups/archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn leading_dot_is_not_an_extension() {
        assert_eq!(stem("config/.hidden"), ".hidden");
    }

    #[test]
    fn spaces_survive_derivation() {
        assert_eq!(
            derive_key("my photo.jpg", GREYSCALE_NAMESPACE, "jpg"),
            "processed/greyscale/my photo.jpg"
        );
    }

    #[test]
    fn trailing_slash_uses_last_segment() {
        assert_eq!(stem("albums/summer/"), "summer");
    }

    #[test]
    fn empty_key_has_empty_stem() {
        assert_eq!(stem(""), "");
        assert_eq!(derive_key("", "exif", "json"), "processed/exif/.json");
    }
}
