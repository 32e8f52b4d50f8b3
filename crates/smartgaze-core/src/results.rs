//! Results assembly: one exportable table joining choices, timing, frame
//! bounds, AOI layouts, and attention metrics.
//!
//! Rows follow mode sequence order, then stage order within a mode. The
//! paired-elimination bracket contributes one row per stage, each carrying
//! only that stage's products and timing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::align::frame_bounds;
use crate::aoi::generate_layout;
use crate::attention::AttentionRecord;
use crate::modes::{ModeKind, ModeState};
use crate::session::ExperimentSession;

/// One flattened record per `(mode, screen)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub mode: ModeKind,
    pub mode_label: String,
    pub screen_id: String,
    pub stage: Option<String>,
    pub visible_products: Vec<String>,
    /// Chosen product for this row, mapped back to its display name.
    pub chosen_product: Option<String>,
    pub chosen_product_id: Option<String>,
    pub duration_secs: Option<f64>,
    pub window_start_secs: Option<f64>,
    pub window_end_secs: Option<f64>,
    pub frame_start: Option<usize>,
    pub frame_end: Option<usize>,
    /// The screen's AOI layout, serialized.
    pub aoi_layout: Value,
    /// Attention metrics for this screen; `None` when no gaze stream was
    /// available.
    pub attention: Option<Vec<AttentionRecord>>,
}

/// Flatten a session into the exportable table.
///
/// `recommended_product` must already reflect the participant's condition
/// (`None` when recommendations are hidden); `attention` is the
/// aggregator's output when a gaze stream was available.
pub fn assemble(
    session: &ExperimentSession,
    recommended_product: Option<&str>,
    attention: Option<&[AttentionRecord]>,
    world_timestamps: Option<&[f64]>,
) -> Vec<ResultRow> {
    let mut rows = Vec::new();

    for mode in session.modes() {
        match mode {
            ModeState::PairedElimination(m) => {
                for record in m.stage_log() {
                    let visible = vec![record.left.clone(), record.right.clone()];
                    rows.push(build_row(
                        ModeKind::PairedElimination,
                        format!("paired/{}", record.stage.key()),
                        Some(record.stage.key().to_string()),
                        visible,
                        Some(record.winner.clone()),
                        display_name(mode, &record.winner),
                        Some(record.duration_secs),
                        session.rel_secs(record.started_at_ms),
                        session.rel_secs(record.ended_at_ms),
                        recommended_product,
                        attention,
                        world_timestamps,
                    ));
                }
            }
            ModeState::Grid(m) => {
                if m.start_time_ms().is_none() {
                    continue;
                }
                let selected_id = m.selected().map(|i| i.id.clone());
                rows.push(build_row(
                    ModeKind::Grid,
                    "grid".to_string(),
                    None,
                    m.images().iter().map(|i| i.id.clone()).collect(),
                    selected_id.clone(),
                    selected_id.as_deref().and_then(|id| display_name(mode, id)),
                    m.selection_duration_secs(),
                    m.start_time_ms().and_then(|t| session.rel_secs(t)),
                    m.completion_time_ms().and_then(|t| session.rel_secs(t)),
                    recommended_product,
                    attention,
                    world_timestamps,
                ));
            }
            ModeState::Sequential(m) => {
                let selected_id = m.selected().map(|i| i.id.clone());
                for span in m.view_log() {
                    rows.push(build_row(
                        ModeKind::Sequential,
                        format!("sequential/{}/v{}", span.image_id, span.visit),
                        Some(format!("v{}", span.visit)),
                        vec![span.image_id.clone()],
                        selected_id.clone(),
                        selected_id.as_deref().and_then(|id| display_name(mode, id)),
                        span.ended_at_ms
                            .map(|end| (end.saturating_sub(span.started_at_ms)) as f64 / 1000.0),
                        session.rel_secs(span.started_at_ms),
                        span.ended_at_ms.and_then(|t| session.rel_secs(t)),
                        recommended_product,
                        attention,
                        world_timestamps,
                    ));
                }
            }
        }
    }

    rows
}

fn display_name(mode: &ModeState, image_id: &str) -> Option<String> {
    mode.images()
        .iter()
        .find(|i| i.id == image_id)
        .map(|i| i.display_name.clone())
}

#[allow(clippy::too_many_arguments)]
fn build_row(
    mode: ModeKind,
    screen_id: String,
    stage: Option<String>,
    visible_products: Vec<String>,
    chosen_id: Option<String>,
    chosen_display: Option<String>,
    duration_secs: Option<f64>,
    window_start_secs: Option<f64>,
    window_end_secs: Option<f64>,
    recommended_product: Option<&str>,
    attention: Option<&[AttentionRecord]>,
    world_timestamps: Option<&[f64]>,
) -> ResultRow {
    let layout = generate_layout(mode, &visible_products, recommended_product, &screen_id);
    let (frame_start, frame_end) =
        frame_bounds(window_start_secs, window_end_secs, world_timestamps);
    let attention = attention.map(|records| {
        records
            .iter()
            .filter(|r| r.screen_id == screen_id)
            .cloned()
            .collect()
    });

    ResultRow {
        mode,
        mode_label: mode.label().to_string(),
        screen_id,
        stage,
        visible_products,
        chosen_product: chosen_display,
        chosen_product_id: chosen_id,
        duration_secs,
        window_start_secs,
        window_end_secs,
        frame_start,
        frame_end,
        aoi_layout: serde_json::to_value(&layout).unwrap_or(Value::Null),
        attention,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{GridMode, ImageRef, PairedEliminationMode, SequentialMode};
    use crate::session::UserIntent;

    fn refs(ids: &[&str]) -> Vec<ImageRef> {
        ids.iter().map(|s| ImageRef::new(*s)).collect()
    }

    fn choose(id: &str) -> UserIntent {
        UserIntent::Choose {
            image_id: id.to_string(),
        }
    }

    fn finished_session() -> ExperimentSession {
        let mut session = ExperimentSession::new(vec![
            ModeState::PairedElimination(PairedEliminationMode::new(refs(&[
                "alpha_pack",
                "beta_pack",
                "gamma_pack",
                "delta_pack",
            ]))),
            ModeState::Grid(GridMode::new(refs(&[
                "alpha_pack",
                "beta_pack",
                "gamma_pack",
                "delta_pack",
            ]))),
            ModeState::Sequential(SequentialMode::new(refs(&["p", "q"]))),
        ]);
        session.start();
        session.apply(&choose("alpha_pack"));
        session.apply(&choose("gamma_pack"));
        session.apply(&choose("alpha_pack"));
        session.apply(&UserIntent::Advance);
        session.apply(&choose("beta_pack"));
        session.apply(&UserIntent::Advance);
        session.apply(&UserIntent::Next);
        session.apply(&choose("q"));
        session.apply(&UserIntent::Confirm);
        session.apply(&UserIntent::Advance);
        session
    }

    #[test]
    fn one_row_per_bracket_stage_with_only_that_stages_products() {
        let session = finished_session();
        let rows = assemble(&session, None, None, None);

        let paired: Vec<&ResultRow> = rows
            .iter()
            .filter(|r| r.mode == ModeKind::PairedElimination)
            .collect();
        assert_eq!(paired.len(), 3);
        assert_eq!(paired[0].visible_products, vec!["alpha_pack", "beta_pack"]);
        assert_eq!(paired[1].visible_products, vec!["gamma_pack", "delta_pack"]);
        assert_eq!(paired[2].visible_products, vec!["alpha_pack", "gamma_pack"]);
        for row in &paired {
            assert_eq!(row.visible_products.len(), 2);
            assert!(row.duration_secs.is_some());
        }
        assert_eq!(paired[2].chosen_product.as_deref(), Some("alpha pack"));
    }

    #[test]
    fn rows_follow_mode_then_stage_order() {
        let session = finished_session();
        let rows = assemble(&session, None, None, None);
        let ids: Vec<&str> = rows.iter().map(|r| r.screen_id.as_str()).collect();
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
    }

    #[test]
    fn frame_bounds_absent_without_world_timestamps() {
        let session = finished_session();
        let rows = assemble(&session, None, None, None);
        assert!(rows.iter().all(|r| r.frame_start.is_none()));
        assert!(rows.iter().all(|r| r.attention.is_none()));

        let ts: Vec<f64> = (0..600).map(|i| i as f64 / 30.0).collect();
        let rows = assemble(&session, None, None, Some(&ts));
        assert!(rows.iter().all(|r| r.frame_start.is_some()));
    }

    #[test]
    fn aoi_layout_round_trips() {
        let session = finished_session();
        let rows = assemble(&session, Some("alpha_pack"), None, None);
        for row in &rows {
            let layout: crate::aoi::AoiLayout =
                serde_json::from_value(row.aoi_layout.clone()).unwrap();
            let back = serde_json::to_value(&layout).unwrap();
            assert_eq!(row.aoi_layout, back);
        }
    }

    #[test]
    fn grid_row_carries_selection_and_duration() {
        let session = finished_session();
        let rows = assemble(&session, None, None, None);
        let grid = rows.iter().find(|r| r.mode == ModeKind::Grid).unwrap();
        assert_eq!(grid.chosen_product_id.as_deref(), Some("beta_pack"));
        assert_eq!(grid.chosen_product.as_deref(), Some("beta pack"));
        assert!(grid.duration_secs.is_some());
        assert_eq!(grid.visible_products.len(), 4);
    }
}
