use std::path::PathBuf;

use clap::Subcommand;
use serde::Deserialize;
use smartgaze_core::{
    images_from_dir, Config, ExperimentSession, GridMode, ModeKind, ModeState,
    PairedEliminationMode, SequentialMode, UserIntent,
};

use super::{read_json, write_json};

/// One scripted step: a user intent, optionally delayed to reproduce
/// participant pacing.
#[derive(Debug, Deserialize)]
struct ScriptStep {
    #[serde(flatten)]
    intent: UserIntent,
    #[serde(default)]
    delay_ms: u64,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Drive a session from an intent script and write the session record
    Run {
        /// JSON array of user intents
        #[arg(long)]
        script: PathBuf,
        /// Paired-elimination image folder (default: config)
        #[arg(long)]
        paired_dir: Option<PathBuf>,
        /// Grid image folder (default: config)
        #[arg(long)]
        grid_dir: Option<PathBuf>,
        /// Sequential image folder (default: config)
        #[arg(long)]
        sequential_dir: Option<PathBuf>,
        /// Write the session record here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the screens a recorded session produced
    Screens {
        /// Session record JSON
        #[arg(long)]
        record: PathBuf,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            script,
            paired_dir,
            grid_dir,
            sequential_dir,
            out,
        } => {
            let config = Config::load()?;
            let steps: Vec<ScriptStep> = read_json(&script)?;

            let mut modes = Vec::new();
            for kind in &config.mode_order {
                let dir = match kind {
                    ModeKind::PairedElimination => paired_dir.as_ref(),
                    ModeKind::Grid => grid_dir.as_ref(),
                    ModeKind::Sequential => sequential_dir.as_ref(),
                }
                .or_else(|| config.image_dirs.for_mode(*kind));
                let images = dir.map(|d| images_from_dir(d)).unwrap_or_default();
                modes.push(match kind {
                    ModeKind::PairedElimination => {
                        ModeState::PairedElimination(PairedEliminationMode::new(images))
                    }
                    ModeKind::Grid => ModeState::Grid(GridMode::new(images)),
                    ModeKind::Sequential => ModeState::Sequential(SequentialMode::new(images)),
                });
            }

            let mut session = ExperimentSession::new(modes);
            let mut events = Vec::new();
            if let Some(event) = session.start() {
                events.push(event);
            }
            for step in &steps {
                if step.delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(step.delay_ms));
                }
                if let Some(event) = session.apply(&step.intent) {
                    events.push(event);
                }
            }

            write_json(&events, None)?;
            write_json(&session, out.as_deref())?;
        }
        SessionAction::Screens { record } => {
            let session: ExperimentSession = read_json(&record)?;
            write_json(&session.screens(), None)?;
        }
    }
    Ok(())
}
