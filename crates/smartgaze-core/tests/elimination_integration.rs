//! Integration tests for the experiment flow: the elimination bracket,
//! sequential review, and the session controller sequencing all three
//! modes.

use smartgaze_core::{
    ExperimentSession, GridMode, ImageRef, ModeState, PairedEliminationMode, SequentialMode,
    UserIntent,
};

fn refs(ids: &[&str]) -> Vec<ImageRef> {
    ids.iter().map(|s| ImageRef::new(*s)).collect()
}

fn choose(id: &str) -> UserIntent {
    UserIntent::Choose {
        image_id: id.to_string(),
    }
}

#[test]
fn bracket_scenario_a_over_b_c_over_d_a_over_c() {
    let mut mode = PairedEliminationMode::new(refs(&["A", "B", "C", "D"]));
    mode.ensure_started();

    assert!(mode.choose("A").is_some()); // pair 1
    assert!(mode.choose("C").is_some()); // pair 2
    assert!(mode.choose("A").is_some()); // final

    assert!(mode.is_complete());
    assert_eq!(mode.selected().unwrap().id, "A");
    assert_eq!(mode.stage_log().len(), 3);
    assert_eq!(mode.stage_durations().len(), 3);

    let sum: f64 = mode.stage_durations().values().sum();
    let total = mode.total_duration_secs().unwrap();
    assert!((sum - total).abs() < 1e-6);
}

#[test]
fn sequential_scenario_next_next_prev_choose_q_confirm() {
    let mut mode = SequentialMode::new(refs(&["P", "Q", "R"]));
    mode.ensure_started();

    mode.next(); // Q
    mode.next(); // R
    mode.previous(); // Q again
    assert!(mode.choose("Q").is_some());
    assert!(!mode.is_complete(), "choose alone must not finalize");
    assert!(mode.confirm().is_some());

    assert!(mode.is_complete());
    assert_eq!(mode.selected().unwrap().id, "Q");
    assert_eq!(mode.visit_counts()["P"], 1);
    assert_eq!(mode.visit_counts()["Q"], 2);
    assert_eq!(mode.visit_counts()["R"], 1);
}

#[test]
fn session_sequences_modes_and_completes_once_all_are_terminal() {
    let mut session = ExperimentSession::new(vec![
        ModeState::PairedElimination(PairedEliminationMode::new(refs(&["A", "B", "C", "D"]))),
        ModeState::Grid(GridMode::new(refs(&["A", "B", "C", "D"]))),
        ModeState::Sequential(SequentialMode::new(refs(&["P", "Q", "R"]))),
    ]);
    session.start();
    assert!(!session.is_complete());

    session.apply(&choose("A"));
    session.apply(&choose("C"));
    session.apply(&choose("A"));
    session.apply(&UserIntent::Advance);

    session.apply(&choose("D"));
    session.apply(&choose("B")); // re-choosing is allowed on the grid
    session.apply(&UserIntent::Advance);

    session.apply(&UserIntent::Next);
    session.apply(&choose("Q"));
    session.apply(&UserIntent::Confirm);
    let completed = session.apply(&UserIntent::Advance);
    assert!(completed.is_some());

    assert!(session.is_complete());
    assert!(session.modes().iter().all(|m| m.is_complete()));
    assert!(session.duration_secs().is_some());

    // A completed session ignores further intents.
    assert!(session.apply(&choose("A")).is_none());
    assert!(session.apply(&UserIntent::Advance).is_none());
}

#[test]
fn stale_intents_are_silent_no_ops() {
    let mut session = ExperimentSession::new(vec![ModeState::PairedElimination(
        PairedEliminationMode::new(refs(&["A", "B", "C", "D"])),
    )]);
    session.start();

    // Navigation intents don't apply to the bracket.
    assert!(session.apply(&UserIntent::Next).is_none());
    assert!(session.apply(&UserIntent::Confirm).is_none());
    // Choosing an image from a later pair is a stale-display race.
    assert!(session.apply(&choose("C")).is_none());
    // Advancing without a selection changes nothing.
    assert!(session.apply(&UserIntent::Advance).is_none());
    assert_eq!(session.cursor(), 0);
    assert!(!session.is_complete());
}

#[test]
fn reset_restores_initial_state_after_partial_progress() {
    let mut session = ExperimentSession::new(vec![
        ModeState::PairedElimination(PairedEliminationMode::new(refs(&["A", "B", "C", "D"]))),
        ModeState::Grid(GridMode::new(refs(&["A", "B"]))),
    ]);
    session.start();
    session.apply(&choose("B"));
    session.apply(&choose("D"));
    session.reset();

    assert_eq!(session.cursor(), 0);
    assert!(session.start_time_ms().is_none());
    assert!(session.screens().is_empty());

    // The session can run again from scratch.
    session.start();
    session.apply(&choose("A"));
    session.apply(&choose("C"));
    session.apply(&choose("C"));
    assert!(session.apply(&UserIntent::Advance).is_some());
    assert_eq!(session.cursor(), 1);
}
