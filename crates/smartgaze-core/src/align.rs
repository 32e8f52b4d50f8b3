//! Alignment of session-relative time offsets to frame indices in the
//! externally recorded world-timestamp array.
//!
//! The tracker ships a strictly ascending array of frame timestamps; a time
//! offset maps to the insertion point of that offset in the array. Lookups
//! never extrapolate: offsets before the first frame map to index 0, offsets
//! past the last frame map to `len`.

/// Map a time offset in seconds to a frame index in `timestamps`.
///
/// Returns the left-biased insertion point of `time_seconds` in the
/// ascending sequence, or `None` when either input is absent, the sequence
/// is empty, or the offset is not a finite number.
pub fn frame_for(time_seconds: Option<f64>, timestamps: Option<&[f64]>) -> Option<usize> {
    let t = time_seconds?;
    let ts = timestamps?;
    if ts.is_empty() || !t.is_finite() {
        return None;
    }
    Some(ts.partition_point(|&x| x < t))
}

/// Frame-index bounds for a `[start, end)` window, each side independently
/// degrading to `None` when alignment is unavailable.
pub fn frame_bounds(
    start_seconds: Option<f64>,
    end_seconds: Option<f64>,
    timestamps: Option<&[f64]>,
) -> (Option<usize>, Option<usize>) {
    (
        frame_for(start_seconds, timestamps),
        frame_for(end_seconds, timestamps),
    )
}
