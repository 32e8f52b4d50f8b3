//! Gaze sample stream types and preprocessing.
//!
//! Samples arrive as an already-materialized, ordered sequence in the
//! tracker's normalized coordinate space. Malformed rows are dropped one by
//! one rather than failing the session; the confidence gate is applied by
//! the attention aggregator before any AOI hit-testing. Blink intervals and
//! pupil diameters are side channels consumed only for summary statistics.

use serde::{Deserialize, Serialize};

/// Samples below this confidence are discarded before aggregation.
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// One gaze sample: session-relative timestamp in seconds, normalized
/// coordinates, tracker confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl GazeSample {
    /// A row is well-formed when every field is a finite number and the
    /// confidence lies in `[0, 1]`.
    pub fn is_well_formed(&self) -> bool {
        self.timestamp.is_finite()
            && self.x.is_finite()
            && self.y.is_finite()
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Drop malformed rows, keeping the rest in order.
pub fn filter_malformed(samples: &[GazeSample]) -> Vec<GazeSample> {
    samples.iter().copied().filter(GazeSample::is_well_formed).collect()
}

/// A blink, as a `[start, end)` interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkInterval {
    pub start: f64,
    pub end: f64,
}

impl BlinkInterval {
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// One pupil-diameter reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PupilSample {
    pub timestamp: f64,
    pub diameter_mm: f64,
}

/// Summary statistics over one recording, for the audit sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeSummary {
    pub total_samples: usize,
    pub well_formed_samples: usize,
    pub confident_samples: usize,
    /// Span from first to last well-formed sample, in seconds.
    pub duration_secs: f64,
    pub blink_count: usize,
    pub total_blink_secs: f64,
    pub mean_pupil_diameter_mm: Option<f64>,
    pub pupil_diameter_std_mm: Option<f64>,
}

/// Summarize a recording: sample retention, blink totals, pupil statistics.
pub fn summarize(
    samples: &[GazeSample],
    blinks: &[BlinkInterval],
    pupils: &[PupilSample],
) -> GazeSummary {
    let well_formed = filter_malformed(samples);
    let confident = well_formed
        .iter()
        .filter(|s| s.confidence >= CONFIDENCE_THRESHOLD)
        .count();
    let duration_secs = match (well_formed.first(), well_formed.last()) {
        (Some(first), Some(last)) => (last.timestamp - first.timestamp).max(0.0),
        _ => 0.0,
    };

    let diameters: Vec<f64> = pupils
        .iter()
        .map(|p| p.diameter_mm)
        .filter(|d| d.is_finite())
        .collect();
    let (mean, std) = mean_std(&diameters);

    GazeSummary {
        total_samples: samples.len(),
        well_formed_samples: well_formed.len(),
        confident_samples: confident,
        duration_secs,
        blink_count: blinks.len(),
        total_blink_secs: blinks.iter().map(BlinkInterval::duration_secs).sum(),
        mean_pupil_diameter_mm: mean,
        pupil_diameter_std_mm: std,
    }
}

fn mean_std(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (Some(mean), None);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (Some(mean), Some(var.sqrt()))
}
