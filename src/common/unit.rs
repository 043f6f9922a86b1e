//! Unit conversion utilities.
//!
//! DrawingML extents are expressed in EMUs (English Metric Units). Field flags
//! size pictures in typographic points, and decoded images report pixels.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_PT: i64 = 12_700;

/// Resolution assumed for images that carry no usable DPI information.
pub const DEFAULT_IMAGE_DPI: u32 = 72;

#[inline]
pub fn pt_to_emu(pt: i64) -> i64 {
    pt.saturating_mul(EMUS_PER_PT)
}

#[inline]
pub fn px_to_emu(px: u32, dpi: u32) -> i64 {
    ((px as f64) * EMUS_PER_INCH as f64 / dpi.max(1) as f64) as i64
}

/// Scale `(native_cx, native_cy)` to the requested extent.
///
/// When only one side is given the other keeps the native aspect ratio, and
/// with neither given the native extent is returned unchanged.
pub fn scaled_extent(
    native_cx: i64,
    native_cy: i64,
    cx: Option<i64>,
    cy: Option<i64>,
) -> (i64, i64) {
    match (cx, cy) {
        (Some(cx), Some(cy)) => (cx, cy),
        (Some(cx), None) if native_cx > 0 => {
            let scale = cx as f64 / native_cx as f64;
            (cx, (native_cy as f64 * scale).round() as i64)
        },
        (None, Some(cy)) if native_cy > 0 => {
            let scale = cy as f64 / native_cy as f64;
            ((native_cx as f64 * scale).round() as i64, cy)
        },
        (Some(cx), None) => (cx, native_cy),
        (None, Some(cy)) => (native_cx, cy),
        (None, None) => (native_cx, native_cy),
    }
}
