//! Experiment session controller.
//!
//! Owns the ordered mode sequence and the cursor into it, sequences the
//! three viewing modes, and derives the ephemeral `Screen` views the
//! presentation layer renders and the attention aggregator windows gaze
//! samples against. Single-writer: every mutation happens synchronously in
//! response to one user intent.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::Event;
use crate::modes::{now_ms, secs_between, ModeKind, ModeState};

/// A discrete action from the presentation layer. Stale intents (choosing
/// an image no longer displayed, advancing without a selection) are silent
/// no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum UserIntent {
    Choose { image_id: String },
    Next,
    Previous,
    Confirm,
    Advance,
}

/// One materialized presentation instant, derived on demand from a mode's
/// state and never persisted independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Stable identifier used for AOI keying, e.g. `paired/pair_1`,
    /// `grid`, `sequential/q/v2`.
    pub screen_id: String,
    pub label: String,
    pub mode: ModeKind,
    /// Bracket stage key or sequential visit key, when applicable.
    pub stage: Option<String>,
    pub visible_products: Vec<String>,
    /// `[start, end)` window in seconds relative to session start. An open
    /// end means the screen is still on display.
    pub window_start_secs: Option<f64>,
    pub window_end_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSession {
    pub id: Uuid,
    modes: Vec<ModeState>,
    cursor: usize,
    start_time_ms: Option<u64>,
    end_time_ms: Option<u64>,
    complete: bool,
}

impl ExperimentSession {
    pub fn new(modes: Vec<ModeState>) -> Self {
        Self {
            id: Uuid::new_v4(),
            modes,
            cursor: 0,
            start_time_ms: None,
            end_time_ms: None,
            complete: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn modes(&self) -> &[ModeState] {
        &self.modes
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn start_time_ms(&self) -> Option<u64> {
        self.start_time_ms
    }

    pub fn end_time_ms(&self) -> Option<u64> {
        self.end_time_ms
    }

    /// Complete only when every mode in the sequence carries a completion
    /// timestamp.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn current_mode(&self) -> Option<&ModeState> {
        self.modes.get(self.cursor)
    }

    /// Total session duration in seconds, once ended.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.start_time_ms, self.end_time_ms) {
            (Some(start), Some(end)) => Some(secs_between(start, end)),
            _ => None,
        }
    }

    /// Seconds relative to session start for an absolute epoch-ms stamp.
    pub fn rel_secs(&self, at_ms: u64) -> Option<f64> {
        self.start_time_ms.map(|start| secs_between(start, at_ms))
    }

    /// Derive the screen currently on display. Never mutates mode state.
    pub fn current_screen(&self) -> Option<Screen> {
        let mode = self.current_mode()?;
        match mode {
            ModeState::PairedElimination(m) => {
                let (stage, started) = m.open_stage()?;
                Some(self.paired_screen(
                    stage.key(),
                    m.displayed().iter().map(|i| i.id.clone()).collect(),
                    Some(started),
                    None,
                ))
            }
            ModeState::Grid(m) => Some(Screen {
                screen_id: "grid".to_string(),
                label: ModeKind::Grid.label().to_string(),
                mode: ModeKind::Grid,
                stage: None,
                visible_products: m.displayed().iter().map(|i| i.id.clone()).collect(),
                window_start_secs: m.start_time_ms().and_then(|t| self.rel_secs(t)),
                window_end_secs: m.completion_time_ms().and_then(|t| self.rel_secs(t)),
            }),
            ModeState::Sequential(m) => {
                let span = m.view_log().last()?;
                Some(Screen {
                    screen_id: format!("sequential/{}/v{}", span.image_id, span.visit),
                    label: ModeKind::Sequential.label().to_string(),
                    mode: ModeKind::Sequential,
                    stage: Some(format!("v{}", span.visit)),
                    visible_products: vec![span.image_id.clone()],
                    window_start_secs: self.rel_secs(span.started_at_ms),
                    window_end_secs: span.ended_at_ms.and_then(|t| self.rel_secs(t)),
                })
            }
        }
    }

    /// Every screen the session has produced, in mode order then stage
    /// order within a mode. This is the input to attention aggregation and
    /// results assembly.
    pub fn screens(&self) -> Vec<Screen> {
        let mut screens = Vec::new();
        for mode in &self.modes {
            match mode {
                ModeState::PairedElimination(m) => {
                    for record in m.stage_log() {
                        screens.push(self.paired_screen(
                            record.stage.key(),
                            vec![record.left.clone(), record.right.clone()],
                            Some(record.started_at_ms),
                            Some(record.ended_at_ms),
                        ));
                    }
                    if let Some((stage, started)) = m.open_stage() {
                        screens.push(self.paired_screen(
                            stage.key(),
                            m.displayed().iter().map(|i| i.id.clone()).collect(),
                            Some(started),
                            None,
                        ));
                    }
                }
                ModeState::Grid(m) => {
                    if m.start_time_ms().is_some() {
                        screens.push(Screen {
                            screen_id: "grid".to_string(),
                            label: ModeKind::Grid.label().to_string(),
                            mode: ModeKind::Grid,
                            stage: None,
                            visible_products: m
                                .images()
                                .iter()
                                .map(|i| i.id.clone())
                                .collect(),
                            window_start_secs: m
                                .start_time_ms()
                                .and_then(|t| self.rel_secs(t)),
                            window_end_secs: m
                                .completion_time_ms()
                                .and_then(|t| self.rel_secs(t)),
                        });
                    }
                }
                ModeState::Sequential(m) => {
                    for span in m.view_log() {
                        screens.push(Screen {
                            screen_id: format!("sequential/{}/v{}", span.image_id, span.visit),
                            label: ModeKind::Sequential.label().to_string(),
                            mode: ModeKind::Sequential,
                            stage: Some(format!("v{}", span.visit)),
                            visible_products: vec![span.image_id.clone()],
                            window_start_secs: self.rel_secs(span.started_at_ms),
                            window_end_secs: span.ended_at_ms.and_then(|t| self.rel_secs(t)),
                        });
                    }
                }
            }
        }
        screens
    }

    fn paired_screen(
        &self,
        stage_key: &str,
        visible: Vec<String>,
        start_ms: Option<u64>,
        end_ms: Option<u64>,
    ) -> Screen {
        Screen {
            screen_id: format!("paired/{stage_key}"),
            label: ModeKind::PairedElimination.label().to_string(),
            mode: ModeKind::PairedElimination,
            stage: Some(stage_key.to_string()),
            visible_products: visible,
            window_start_secs: start_ms.and_then(|t| self.rel_secs(t)),
            window_end_secs: end_ms.and_then(|t| self.rel_secs(t)),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idempotent: stamps the session start and opens the first mode.
    pub fn start(&mut self) -> Option<Event> {
        if self.start_time_ms.is_some() {
            if let Some(mode) = self.modes.get_mut(self.cursor) {
                mode.ensure_started();
            }
            return None;
        }
        self.start_time_ms = Some(now_ms());
        if let Some(mode) = self.modes.get_mut(self.cursor) {
            mode.ensure_started();
        }
        Some(Event::SessionStarted {
            session_id: self.id,
            at: Utc::now(),
        })
    }

    /// Apply one user intent to the active mode.
    pub fn apply(&mut self, intent: &UserIntent) -> Option<Event> {
        if self.complete {
            return None;
        }
        if let UserIntent::Advance = intent {
            return self.advance();
        }
        let mode = self.modes.get_mut(self.cursor)?;
        match (intent, mode) {
            (UserIntent::Choose { image_id }, ModeState::PairedElimination(m)) => {
                m.choose(image_id)
            }
            (UserIntent::Choose { image_id }, ModeState::Grid(m)) => m.choose(image_id),
            (UserIntent::Choose { image_id }, ModeState::Sequential(m)) => m.choose(image_id),
            (UserIntent::Next, ModeState::Sequential(m)) => m.next(),
            (UserIntent::Previous, ModeState::Sequential(m)) => m.previous(),
            (UserIntent::Confirm, ModeState::Sequential(m)) => m.confirm(),
            // Navigation and confirmation are sequential-only intents.
            _ => None,
        }
    }

    /// Advance past the current mode. Valid only when the mode reports a
    /// non-empty selection (for Sequential, the confirmation flag); an
    /// invalid call is a no-op. Advancing the last mode completes the
    /// session.
    pub fn advance(&mut self) -> Option<Event> {
        if self.complete {
            return None;
        }
        let mode = self.modes.get_mut(self.cursor)?;
        if !mode.ready_to_advance() {
            return None;
        }
        mode.finalize();

        if self.cursor + 1 < self.modes.len() {
            self.cursor += 1;
            let next = &mut self.modes[self.cursor];
            next.ensure_started();
            return Some(Event::ModeStarted {
                mode: next.kind(),
                at: Utc::now(),
            });
        }

        // Last mode: complete the session.
        self.end_time_ms = Some(now_ms());
        for mode in &mut self.modes {
            mode.close_open_accruals();
        }
        self.complete = true;
        tracing::info!(session = %self.id, "session complete");
        Some(Event::SessionCompleted {
            session_id: self.id,
            at: Utc::now(),
        })
    }

    /// Clear the whole session back to its initial empty state. The only
    /// way out of a stuck state; there are no timeouts.
    pub fn reset(&mut self) -> Option<Event> {
        for mode in &mut self.modes {
            mode.reset();
        }
        self.cursor = 0;
        self.start_time_ms = None;
        self.end_time_ms = None;
        self.complete = false;
        Some(Event::SessionReset {
            session_id: self.id,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{GridMode, ImageRef, PairedEliminationMode, SequentialMode};

    fn refs(ids: &[&str]) -> Vec<ImageRef> {
        ids.iter().map(|s| ImageRef::new(*s)).collect()
    }

    fn three_mode_session() -> ExperimentSession {
        ExperimentSession::new(vec![
            ModeState::PairedElimination(PairedEliminationMode::new(refs(&[
                "a", "b", "c", "d",
            ]))),
            ModeState::Grid(GridMode::new(refs(&["a", "b", "c", "d"]))),
            ModeState::Sequential(SequentialMode::new(refs(&["p", "q", "r"]))),
        ])
    }

    fn choose(id: &str) -> UserIntent {
        UserIntent::Choose {
            image_id: id.to_string(),
        }
    }

    #[test]
    fn advance_requires_selection() {
        let mut session = three_mode_session();
        session.start();
        assert!(session.apply(&UserIntent::Advance).is_none());
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn full_session_flow() {
        let mut session = three_mode_session();
        assert!(session.start().is_some());

        // Paired elimination: three choices close the bracket.
        session.apply(&choose("a"));
        session.apply(&choose("c"));
        session.apply(&choose("a"));
        assert!(session.apply(&UserIntent::Advance).is_some());
        assert_eq!(session.cursor(), 1);

        // Grid.
        session.apply(&choose("b"));
        assert!(session.apply(&UserIntent::Advance).is_some());
        assert_eq!(session.cursor(), 2);

        // Sequential: choose alone is not enough to advance.
        session.apply(&choose("p"));
        assert!(session.apply(&UserIntent::Advance).is_none());
        session.apply(&UserIntent::Confirm);
        assert!(session.apply(&UserIntent::Advance).is_some());

        assert!(session.is_complete());
        assert!(session.end_time_ms().is_some());
        assert!(session.modes().iter().all(|m| m.is_complete()));
    }

    #[test]
    fn current_screen_derivation_is_pure() {
        let mut session = three_mode_session();
        session.start();
        let before = session.current_screen().unwrap();
        let again = session.current_screen().unwrap();
        assert_eq!(before, again);
        assert_eq!(before.screen_id, "paired/pair_1");
        assert_eq!(before.visible_products, vec!["a", "b"]);
        assert!(before.window_end_secs.is_none());
    }

    #[test]
    fn screens_follow_mode_then_stage_order() {
        let mut session = three_mode_session();
        session.start();
        session.apply(&choose("a"));
        session.apply(&choose("c"));
        session.apply(&choose("a"));
        session.apply(&UserIntent::Advance);
        session.apply(&choose("b"));
        session.apply(&UserIntent::Advance);
        session.apply(&UserIntent::Next);
        session.apply(&choose("q"));
        session.apply(&UserIntent::Confirm);
        session.apply(&UserIntent::Advance);

        let ids: Vec<String> = session.screens().iter().map(|s| s.screen_id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "paired/pair_1",
                "paired/pair_2",
                "paired/final",
                "grid",
                "sequential/p/v1",
                "sequential/q/v1",
            ]
        );
        // Every closed screen carries a finite window.
        for screen in session.screens() {
            assert!(screen.window_start_secs.is_some());
            assert!(screen.window_end_secs.is_some());
        }
    }

    #[test]
    fn completion_closes_open_accruals_idempotently() {
        let mut session = three_mode_session();
        session.start();
        session.apply(&choose("a"));
        session.apply(&choose("c"));
        session.apply(&choose("a"));
        session.apply(&UserIntent::Advance);
        session.apply(&choose("b"));
        session.apply(&UserIntent::Advance);
        session.apply(&choose("p"));
        session.apply(&UserIntent::Confirm);
        session.apply(&UserIntent::Advance);

        // Safe to force closure again after completion.
        let ModeState::Sequential(m) = &session.modes()[2] else {
            panic!("expected sequential mode");
        };
        let spans = m.view_log().len();
        assert!(m.view_log().iter().all(|s| s.ended_at_ms.is_some()));
        assert_eq!(spans, 1);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut session = three_mode_session();
        session.start();
        session.apply(&choose("a"));
        session.reset();
        assert!(!session.is_complete());
        assert_eq!(session.cursor(), 0);
        assert!(session.start_time_ms().is_none());
        assert!(session.modes().iter().all(|m| !m.is_complete()));
    }

    #[test]
    fn unavailable_mode_does_not_deadlock() {
        let mut session = ExperimentSession::new(vec![
            ModeState::PairedElimination(PairedEliminationMode::new(refs(&["a", "b"]))),
            ModeState::Grid(GridMode::new(refs(&["a", "b"]))),
        ]);
        session.start();
        // The bracket is insufficient; advance passes through.
        assert!(session.apply(&UserIntent::Advance).is_some());
        assert_eq!(session.cursor(), 1);
        session.apply(&choose("a"));
        session.apply(&UserIntent::Advance);
        assert!(session.is_complete());
    }
}
