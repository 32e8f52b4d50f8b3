use std::path::PathBuf;

use clap::Subcommand;
use smartgaze_core::{
    assemble, AttentionRecord, ExperimentSession, Participant,
};

use super::{read_json, write_json};

#[derive(Subcommand)]
pub enum ResultsAction {
    /// Flatten a recorded session into the exportable results table
    Assemble {
        /// Session record JSON
        #[arg(long)]
        record: PathBuf,
        /// Participant JSON (condition decides badge visibility)
        #[arg(long)]
        participant: Option<PathBuf>,
        /// Attention records JSON, as produced by `analyze attention`
        #[arg(long)]
        attention: Option<PathBuf>,
        /// World timestamps JSON (frame alignment)
        #[arg(long)]
        world: Option<PathBuf>,
        /// Write the table here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run(action: ResultsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ResultsAction::Assemble {
            record,
            participant,
            attention,
            world,
            out,
        } => {
            let session: ExperimentSession = read_json(&record)?;
            let participant: Option<Participant> =
                participant.map(|p| read_json(&p)).transpose()?;
            let attention: Option<Vec<AttentionRecord>> =
                attention.map(|p| read_json(&p)).transpose()?;
            let world: Option<Vec<f64>> = world.map(|p| read_json(&p)).transpose()?;

            let recommended = participant
                .as_ref()
                .and_then(|p| p.visible_recommendation());
            let rows = assemble(
                &session,
                recommended,
                attention.as_deref(),
                world.as_deref(),
            );
            write_json(&rows, out.as_deref())?;
        }
    }
    Ok(())
}
