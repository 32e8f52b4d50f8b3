//! Sequential review: one image at a time behind a navigation cursor, with
//! per-image dwell accrual and a tentative choice that only an explicit
//! confirmation makes terminal.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{now_ms, secs_between, Availability, ImageRef, ModeKind};
use crate::events::Event;

/// One stay on one image: the unit the attention aggregator treats as a
/// screen. `ended_at_ms` stays open while the image is on display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpan {
    pub image_id: String,
    /// 1-based visit ordinal for this image (revisits count).
    pub visit: u32,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialMode {
    images: Vec<ImageRef>,
    availability: Availability,
    cursor: usize,
    selected: Option<usize>,
    confirmed: bool,
    start_time_ms: Option<u64>,
    selection_time_ms: Option<u64>,
    completion_time_ms: Option<u64>,
    /// Accumulated seconds on screen per image id.
    dwell_secs: BTreeMap<String, f64>,
    /// View events per image id, revisits included.
    visit_counts: BTreeMap<String, u32>,
    view_log: Vec<ViewSpan>,
}

impl SequentialMode {
    pub fn new(images: Vec<ImageRef>) -> Self {
        let availability = if images.is_empty() {
            Availability::NoImages
        } else {
            Availability::Ready
        };
        Self {
            images,
            availability,
            cursor: 0,
            selected: None,
            confirmed: false,
            start_time_ms: None,
            selection_time_ms: None,
            completion_time_ms: None,
            dwell_secs: BTreeMap::new(),
            visit_counts: BTreeMap::new(),
            view_log: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_image(&self) -> Option<&ImageRef> {
        if !self.availability.is_ready() {
            return None;
        }
        self.images.get(self.cursor)
    }

    pub fn selected(&self) -> Option<&ImageRef> {
        self.selected.and_then(|i| self.images.get(i))
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
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

    pub fn dwell_secs(&self) -> &BTreeMap<String, f64> {
        &self.dwell_secs
    }

    pub fn visit_counts(&self) -> &BTreeMap<String, u32> {
        &self.visit_counts
    }

    pub fn view_log(&self) -> &[ViewSpan] {
        &self.view_log
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idempotent: opens the mode clock and the first image's accrual.
    pub fn ensure_started(&mut self) -> Option<Event> {
        if !self.availability.is_ready() || self.start_time_ms.is_some() {
            return None;
        }
        let now = now_ms();
        self.start_time_ms = Some(now);
        self.open_accrual(now);
        Some(Event::ModeStarted {
            mode: ModeKind::Sequential,
            at: Utc::now(),
        })
    }

    /// Move the cursor forward; at the last image this is a no-op.
    pub fn next(&mut self) -> Option<Event> {
        self.navigate(1)
    }

    /// Move the cursor backward; at the first image this is a no-op.
    pub fn previous(&mut self) -> Option<Event> {
        self.navigate(-1)
    }

    fn navigate(&mut self, delta: isize) -> Option<Event> {
        if self.is_complete() || !self.availability.is_ready() {
            return None;
        }
        self.ensure_started();

        let target = self.cursor.checked_add_signed(delta)?;
        if target >= self.images.len() {
            return None;
        }

        let now = now_ms();
        let from = self.images[self.cursor].id.clone();
        self.close_accrual(now);
        self.cursor = target;
        self.open_accrual(now);

        Some(Event::Navigated {
            mode: ModeKind::Sequential,
            from_image: from,
            to_image: self.images[self.cursor].id.clone(),
            at: Utc::now(),
        })
    }

    /// Tentatively choose the currently viewed image. The mode stays open
    /// for further browsing until `confirm`.
    pub fn choose(&mut self, image_id: &str) -> Option<Event> {
        if self.is_complete() || !self.availability.is_ready() {
            return None;
        }
        self.ensure_started();

        let current = self.images.get(self.cursor)?;
        if current.id != image_id {
            return None;
        }
        self.selected = Some(self.cursor);
        self.selection_time_ms = Some(now_ms());

        Some(Event::ChoiceRecorded {
            mode: ModeKind::Sequential,
            stage: None,
            image_id: image_id.to_string(),
            at: Utc::now(),
        })
    }

    /// Confirm the tentative choice: the explicit step that makes the mode
    /// terminal and closes the open dwell accrual.
    pub fn confirm(&mut self) -> Option<Event> {
        if self.is_complete() || !self.availability.is_ready() {
            return None;
        }
        let selected = self.selected()?.id.clone();
        let now = now_ms();
        self.close_accrual(now);
        self.confirmed = true;
        self.completion_time_ms = Some(now);
        tracing::debug!(image = %selected, "sequential selection confirmed");

        Some(Event::SelectionConfirmed {
            mode: ModeKind::Sequential,
            image_id: selected,
            at: Utc::now(),
        })
    }

    /// Idempotent terminal stamp applied by the session controller; also
    /// closes out an unavailable mode.
    pub fn finalize(&mut self) -> Option<Event> {
        if self.completion_time_ms.is_some() {
            return None;
        }
        if self.availability.is_ready() {
            // Finalization of a ready sequential mode goes through confirm.
            return self.confirm();
        }
        self.completion_time_ms = Some(now_ms());
        Some(Event::ModeCompleted {
            mode: ModeKind::Sequential,
            selected: None,
            at: Utc::now(),
        })
    }

    /// Close any still-open dwell accrual. Safe to call twice.
    pub fn close_open_accrual(&mut self) {
        self.close_accrual(now_ms());
    }

    pub fn reset(&mut self) {
        *self = SequentialMode::new(std::mem::take(&mut self.images));
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn open_accrual(&mut self, now: u64) {
        let Some(image) = self.images.get(self.cursor) else {
            return;
        };
        let count = self.visit_counts.entry(image.id.clone()).or_insert(0);
        *count += 1;
        self.view_log.push(ViewSpan {
            image_id: image.id.clone(),
            visit: *count,
            started_at_ms: now,
            ended_at_ms: None,
        });
    }

    fn close_accrual(&mut self, now: u64) {
        let Some(span) = self.view_log.last_mut() else {
            return;
        };
        if span.ended_at_ms.is_some() {
            return;
        }
        span.ended_at_ms = Some(now);
        let elapsed = secs_between(span.started_at_ms, now);
        *self.dwell_secs.entry(span.image_id.clone()).or_insert(0.0) += elapsed;
    }
}
