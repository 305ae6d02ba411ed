//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate thumbnail dimensions that fit inside a bounding box.
///
/// The source aspect ratio is preserved and the image is never enlarged:
/// a source already inside the box keeps its dimensions. Each edge is at
/// least 1px and never exceeds the corresponding bound.
///
/// # Arguments
/// * `source` - Oriented source dimensions (width, height)
/// * `bounds` - Maximum (width, height)
///
/// # Examples
/// ```
/// # use image_jobs::imaging::fit_within;
/// // 4000x3000 landscape into 1024x1024 → 1024x768
/// assert_eq!(fit_within((4000, 3000), (1024, 1024)), (1024, 768));
///
/// // Already small enough → unchanged
/// assert_eq!(fit_within((640, 480), (1024, 1024)), (640, 480));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w == 0 || src_h == 0 || (src_w <= max_w && src_h <= max_h) {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}
