//! Gaze attention aggregation.
//!
//! Consumes the screens a finished session produced, the gaze sample
//! stream, and the world-timestamp array, and attributes dwell time,
//! fixation counts, and time-to-first-fixation to each product's AOI
//! rectangles. Analysis runs after the session completes; the sample
//! stream is an immutable input here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::align::frame_bounds;
use crate::aoi::{generate_layout, AoiElement};
use crate::gaze::{filter_malformed, GazeSample, CONFIDENCE_THRESHOLD};
use crate::session::Screen;

/// Inter-sample deltas above this are clock glitches and contribute no
/// dwell.
const MAX_SAMPLE_DELTA_SECS: f64 = 1.0;

/// Attention on one AOI element of one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementAttention {
    pub dwell_secs: f64,
    pub fixations: u32,
    pub time_to_first_fixation: Option<f64>,
}

impl ElementAttention {
    fn record_hit(&mut self, timestamp: f64, dt: f64) {
        self.dwell_secs += dt;
        self.fixations += 1;
        if self.time_to_first_fixation.is_none() {
            self.time_to_first_fixation = Some(timestamp);
        }
    }
}

/// Attention on one product within one screen's time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionRecord {
    pub screen_id: String,
    pub product: String,
    pub dwell_secs: f64,
    pub fixations: u32,
    pub time_to_first_fixation: Option<f64>,
    pub frame_start: Option<usize>,
    pub frame_end: Option<usize>,
    pub by_element: BTreeMap<AoiElement, ElementAttention>,
}

/// One row of the per-sample audit trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    pub screen_id: String,
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    pub frame: Option<usize>,
    /// Most specific (smallest) AOI rectangle hit, if any.
    pub product: Option<String>,
    pub element: Option<AoiElement>,
}

#[derive(Debug, Clone)]
pub struct AttentionAggregator {
    confidence_threshold: f64,
    /// The recommended product, when the participant's condition shows
    /// recommendations; layout generation receives it unchanged. The
    /// aggregation itself never branches on condition.
    recommended_product: Option<String>,
}

impl Default for AttentionAggregator {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            recommended_product: None,
        }
    }
}

impl AttentionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_recommended_product(mut self, product: Option<String>) -> Self {
        self.recommended_product = product;
        self
    }

    /// Aggregate attention per `(screen, product)`.
    pub fn aggregate(
        &self,
        screens: &[Screen],
        samples: &[GazeSample],
        world_timestamps: Option<&[f64]>,
    ) -> Vec<AttentionRecord> {
        self.aggregate_with_trace(screens, samples, world_timestamps).0
    }

    /// Aggregate attention and emit the per-sample audit trace alongside.
    pub fn aggregate_with_trace(
        &self,
        screens: &[Screen],
        samples: &[GazeSample],
        world_timestamps: Option<&[f64]>,
    ) -> (Vec<AttentionRecord>, Vec<TraceRow>) {
        // Preprocessing is this stage's responsibility: drop malformed
        // rows, then apply the confidence gate.
        let retained: Vec<GazeSample> = filter_malformed(samples)
            .into_iter()
            .filter(|s| s.confidence >= self.confidence_threshold)
            .collect();

        let mut records = Vec::new();
        let mut trace = Vec::new();

        for screen in screens {
            let layout = generate_layout(
                screen.mode,
                &screen.visible_products,
                self.recommended_product.as_deref(),
                &screen.screen_id,
            );
            let (frame_start, frame_end) = frame_bounds(
                screen.window_start_secs,
                screen.window_end_secs,
                world_timestamps,
            );

            let windowed = window_samples(&retained, screen);
            let mut per_product: BTreeMap<String, BTreeMap<AoiElement, ElementAttention>> =
                screen
                    .visible_products
                    .iter()
                    .map(|p| (p.clone(), BTreeMap::new()))
                    .collect();
            let mut product_totals: BTreeMap<String, ElementAttention> = screen
                .visible_products
                .iter()
                .map(|p| (p.clone(), ElementAttention::default()))
                .collect();

            let mut prev_timestamp: Option<f64> = None;
            for sample in &windowed {
                let dt = prev_timestamp
                    .map(|prev| (sample.timestamp - prev).clamp(0.0, MAX_SAMPLE_DELTA_SECS))
                    .unwrap_or(0.0);
                prev_timestamp = Some(sample.timestamp);

                let mut best_hit: Option<(&str, AoiElement, f64)> = None;
                for (product, element, rect) in layout.rects() {
                    if !rect.contains(sample.x, sample.y) {
                        continue;
                    }
                    if let Some(elements) = per_product.get_mut(product) {
                        elements
                            .entry(element)
                            .or_default()
                            .record_hit(sample.timestamp, dt);
                    }
                    let area = rect.area();
                    if best_hit.map_or(true, |(_, _, a)| area < a) {
                        best_hit = Some((product, element, area));
                    }
                }

                // Product-level attention counts each sample once even when
                // it falls inside overlapping rectangles of the same
                // product (the badge sits inside the pack region).
                let hit_products: Vec<&str> = layout
                    .regions
                    .iter()
                    .filter(|(_, elements)| {
                        elements.values().any(|r| r.contains(sample.x, sample.y))
                    })
                    .map(|(p, _)| p.as_str())
                    .collect();
                for product in hit_products {
                    if let Some(total) = product_totals.get_mut(product) {
                        total.record_hit(sample.timestamp, dt);
                    }
                }

                trace.push(TraceRow {
                    screen_id: screen.screen_id.clone(),
                    timestamp: sample.timestamp,
                    x: sample.x,
                    y: sample.y,
                    frame: crate::align::frame_for(Some(sample.timestamp), world_timestamps),
                    product: best_hit.map(|(p, _, _)| p.to_string()),
                    element: best_hit.map(|(_, e, _)| e),
                });
            }

            for product in &screen.visible_products {
                let totals = product_totals.remove(product).unwrap_or_default();
                records.push(AttentionRecord {
                    screen_id: screen.screen_id.clone(),
                    product: product.clone(),
                    dwell_secs: totals.dwell_secs,
                    fixations: totals.fixations,
                    time_to_first_fixation: totals.time_to_first_fixation,
                    frame_start,
                    frame_end,
                    by_element: per_product.remove(product).unwrap_or_default(),
                });
            }
        }

        tracing::debug!(
            screens = screens.len(),
            retained = retained.len(),
            records = records.len(),
            "attention aggregation finished"
        );
        (records, trace)
    }
}

/// Samples inside the screen's `[start, end)` window. A screen without a
/// start has no window and attracts nothing; an open end extends to the end
/// of the stream.
fn window_samples(samples: &[GazeSample], screen: &Screen) -> Vec<GazeSample> {
    let Some(start) = screen.window_start_secs else {
        return Vec::new();
    };
    samples
        .iter()
        .copied()
        .filter(|s| {
            s.timestamp >= start
                && screen.window_end_secs.map_or(true, |end| s.timestamp < end)
        })
        .collect()
}
