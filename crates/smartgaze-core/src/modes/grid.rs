//! Grid comparison: up to four images shown at once, free choice at any
//! time, re-choosing allowed until the session advances.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{now_ms, secs_between, Availability, ImageRef, ModeKind, GRID_MAX_IMAGES, GRID_MIN_IMAGES};
use crate::events::Event;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridMode {
    images: Vec<ImageRef>,
    availability: Availability,
    selected: Option<usize>,
    start_time_ms: Option<u64>,
    selection_time_ms: Option<u64>,
    completion_time_ms: Option<u64>,
    /// Seconds from mode start at the moment each product was chosen;
    /// re-choosing overwrites the product's entry.
    durations: BTreeMap<String, f64>,
}

impl GridMode {
    pub fn new(mut images: Vec<ImageRef>) -> Self {
        let availability = if images.is_empty() {
            Availability::NoImages
        } else if images.len() < GRID_MIN_IMAGES {
            Availability::Insufficient {
                required: GRID_MIN_IMAGES,
                available: images.len(),
            }
        } else {
            images.truncate(GRID_MAX_IMAGES);
            Availability::Ready
        };
        Self {
            images,
            availability,
            selected: None,
            start_time_ms: None,
            selection_time_ms: None,
            completion_time_ms: None,
            durations: BTreeMap::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn displayed(&self) -> Vec<&ImageRef> {
        if !self.availability.is_ready() {
            return Vec::new();
        }
        self.images.iter().collect()
    }

    pub fn selected(&self) -> Option<&ImageRef> {
        self.selected.and_then(|i| self.images.get(i))
    }

    pub fn is_complete(&self) -> bool {
        self.completion_time_ms.is_some()
    }

    pub fn start_time_ms(&self) -> Option<u64> {
        self.start_time_ms
    }

    pub fn selection_time_ms(&self) -> Option<u64> {
        self.selection_time_ms
    }

    pub fn completion_time_ms(&self) -> Option<u64> {
        self.completion_time_ms
    }

    pub fn durations(&self) -> &BTreeMap<String, f64> {
        &self.durations
    }

    /// Seconds from mode start to the (latest) selection.
    pub fn selection_duration_secs(&self) -> Option<f64> {
        match (self.start_time_ms, self.selection_time_ms) {
            (Some(start), Some(sel)) => Some(secs_between(start, sel)),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn ensure_started(&mut self) -> Option<Event> {
        if !self.availability.is_ready() || self.start_time_ms.is_some() {
            return None;
        }
        self.start_time_ms = Some(now_ms());
        Some(Event::ModeStarted {
            mode: ModeKind::Grid,
            at: Utc::now(),
        })
    }

    /// Choose any visible image; overwrites a prior selection.
    pub fn choose(&mut self, image_id: &str) -> Option<Event> {
        if self.is_complete() || !self.availability.is_ready() {
            return None;
        }
        self.ensure_started();

        let index = self.images.iter().position(|i| i.id == image_id)?;
        let now = now_ms();
        self.selected = Some(index);
        self.selection_time_ms = Some(now);
        let elapsed = secs_between(self.start_time_ms.unwrap_or(now), now);
        self.durations.insert(image_id.to_string(), elapsed);

        Some(Event::ChoiceRecorded {
            mode: ModeKind::Grid,
            stage: None,
            image_id: image_id.to_string(),
            at: Utc::now(),
        })
    }

    /// Idempotent terminal stamp, applied by the session controller at
    /// advance time (the grid has no confirm step of its own).
    pub fn finalize(&mut self) -> Option<Event> {
        if self.completion_time_ms.is_some() {
            return None;
        }
        if self.availability.is_ready() && self.selected.is_none() {
            return None;
        }
        self.completion_time_ms = Some(now_ms());
        Some(Event::ModeCompleted {
            mode: ModeKind::Grid,
            selected: self.selected().map(|i| i.id.clone()),
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) {
        *self = GridMode::new(std::mem::take(&mut self.images));
    }
}
