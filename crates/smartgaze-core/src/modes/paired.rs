//! Paired-elimination bracket: two preliminary pairs, then a final between
//! the winners.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{now_ms, secs_between, Availability, ImageRef, ModeKind, PAIRED_CANDIDATES};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairedStage {
    Pair1,
    Pair2,
    Final,
    Done,
}

impl PairedStage {
    /// Stable key used for duration maps and screen identifiers.
    pub fn key(&self) -> &'static str {
        match self {
            PairedStage::Pair1 => "pair_1",
            PairedStage::Pair2 => "pair_2",
            PairedStage::Final => "final",
            PairedStage::Done => "done",
        }
    }
}

/// One closed bracket stage: the two images shown, the winner, and the
/// stage's own time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: PairedStage,
    pub left: String,
    pub right: String,
    pub winner: String,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairedEliminationMode {
    images: Vec<ImageRef>,
    availability: Availability,
    stage: PairedStage,
    pairs: [[usize; 2]; 2],
    /// Winner index (into `images`) per preliminary pair.
    winners: [Option<usize>; 2],
    selected: Option<usize>,
    start_time_ms: Option<u64>,
    stage_started_ms: Option<u64>,
    selection_time_ms: Option<u64>,
    completion_time_ms: Option<u64>,
    /// Per-stage elapsed seconds, keyed `pair_1` / `pair_2` / `final`.
    stage_durations: BTreeMap<String, f64>,
    stage_log: Vec<StageRecord>,
}

impl PairedEliminationMode {
    /// Build the bracket. Fewer than four candidates disables elimination
    /// entirely; surplus candidates beyond the first four are not shown.
    pub fn new(mut images: Vec<ImageRef>) -> Self {
        let availability = if images.is_empty() {
            Availability::NoImages
        } else if images.len() < PAIRED_CANDIDATES {
            Availability::Insufficient {
                required: PAIRED_CANDIDATES,
                available: images.len(),
            }
        } else {
            images.truncate(PAIRED_CANDIDATES);
            Availability::Ready
        };
        Self {
            images,
            availability,
            stage: PairedStage::Pair1,
            pairs: [[0, 1], [2, 3]],
            winners: [None, None],
            selected: None,
            start_time_ms: None,
            stage_started_ms: None,
            selection_time_ms: None,
            completion_time_ms: None,
            stage_durations: BTreeMap::new(),
            stage_log: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn stage(&self) -> PairedStage {
        self.stage
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
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

    pub fn stage_durations(&self) -> &BTreeMap<String, f64> {
        &self.stage_durations
    }

    pub fn stage_log(&self) -> &[StageRecord] {
        &self.stage_log
    }

    pub fn total_duration_secs(&self) -> Option<f64> {
        match (self.start_time_ms, self.completion_time_ms) {
            (Some(start), Some(end)) => Some(secs_between(start, end)),
            _ => None,
        }
    }

    /// The pair on display for the given stage: a pure function of
    /// `(stage, pairs, winners)`.
    pub fn display_indices(&self) -> Option<[usize; 2]> {
        if !self.availability.is_ready() {
            return None;
        }
        match self.stage {
            PairedStage::Pair1 => Some(self.pairs[0]),
            PairedStage::Pair2 => Some(self.pairs[1]),
            PairedStage::Final => match (self.winners[0], self.winners[1]) {
                (Some(a), Some(b)) => Some([a, b]),
                _ => None,
            },
            PairedStage::Done => None,
        }
    }

    pub fn displayed(&self) -> Vec<&ImageRef> {
        self.display_indices()
            .map(|pair| pair.iter().filter_map(|&i| self.images.get(i)).collect())
            .unwrap_or_default()
    }

    /// The still-open stage window, for deriving the current screen.
    pub fn open_stage(&self) -> Option<(PairedStage, u64)> {
        if self.stage == PairedStage::Done {
            return None;
        }
        self.stage_started_ms.map(|start| (self.stage, start))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idempotent: opens the bracket clock and the first pair's clock.
    pub fn ensure_started(&mut self) -> Option<Event> {
        if !self.availability.is_ready() || self.start_time_ms.is_some() {
            return None;
        }
        let now = now_ms();
        self.start_time_ms = Some(now);
        self.stage_started_ms = Some(now);
        Some(Event::ModeStarted {
            mode: ModeKind::PairedElimination,
            at: Utc::now(),
        })
    }

    /// Record a choice for the current stage. A choice naming an image that
    /// is not one of the two on display is ignored -- it is a race with a
    /// stale display, not an error.
    pub fn choose(&mut self, image_id: &str) -> Option<Event> {
        if self.is_complete() || !self.availability.is_ready() {
            return None;
        }
        self.ensure_started();

        let pair = self.display_indices()?;
        let winner = pair
            .iter()
            .copied()
            .find(|&i| self.images[i].id == image_id)?;

        let now = now_ms();
        let stage_start = self.stage_started_ms.unwrap_or(now);
        let duration = secs_between(stage_start, now);
        let stage = self.stage;

        self.stage_durations.insert(stage.key().to_string(), duration);
        self.stage_log.push(StageRecord {
            stage,
            left: self.images[pair[0]].id.clone(),
            right: self.images[pair[1]].id.clone(),
            winner: self.images[winner].id.clone(),
            started_at_ms: stage_start,
            ended_at_ms: now,
            duration_secs: duration,
        });

        match stage {
            PairedStage::Pair1 => {
                self.winners[0] = Some(winner);
                self.stage = PairedStage::Pair2;
                self.stage_started_ms = Some(now);
            }
            PairedStage::Pair2 => {
                self.winners[1] = Some(winner);
                self.stage = PairedStage::Final;
                self.stage_started_ms = Some(now);
            }
            PairedStage::Final => {
                self.selected = Some(winner);
                self.selection_time_ms = Some(now);
                self.completion_time_ms = Some(now);
                self.stage = PairedStage::Done;
                self.stage_started_ms = None;
                tracing::debug!(winner = %self.images[winner].id, "elimination bracket closed");
            }
            PairedStage::Done => unreachable!("display_indices is None when done"),
        }

        Some(Event::ChoiceRecorded {
            mode: ModeKind::PairedElimination,
            stage: Some(stage.key().to_string()),
            image_id: image_id.to_string(),
            at: Utc::now(),
        })
    }

    /// Idempotent terminal stamp. The bracket finalizes itself on the final
    /// choice; this only closes out an unavailable mode so the session can
    /// move past it.
    pub fn finalize(&mut self) -> Option<Event> {
        if self.completion_time_ms.is_some() {
            return None;
        }
        if self.availability.is_ready() {
            return None;
        }
        self.completion_time_ms = Some(now_ms());
        Some(Event::ModeCompleted {
            mode: ModeKind::PairedElimination,
            selected: None,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) {
        *self = PairedEliminationMode::new(std::mem::take(&mut self.images));
    }
}
