use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;
use smartgaze_core::{
    summarize, AttentionAggregator, AttentionRecord, BlinkInterval, Config, ExperimentSession,
    GazeSample, GazeSummary, Participant, PupilSample, TraceRow,
};

use super::{read_json, write_json};

#[derive(Serialize)]
struct AnalysisOutput {
    records: Vec<AttentionRecord>,
    summary: GazeSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<TraceRow>>,
}

#[derive(Subcommand)]
pub enum AnalyzeAction {
    /// Aggregate gaze attention over a recorded session
    Attention {
        /// Session record JSON
        #[arg(long)]
        record: PathBuf,
        /// Gaze samples JSON
        #[arg(long)]
        gaze: PathBuf,
        /// World timestamps JSON (frame alignment)
        #[arg(long)]
        world: Option<PathBuf>,
        /// Participant JSON (condition decides badge visibility)
        #[arg(long)]
        participant: Option<PathBuf>,
        /// Blink intervals JSON (summary only)
        #[arg(long)]
        blinks: Option<PathBuf>,
        /// Pupil diameter samples JSON (summary only)
        #[arg(long)]
        pupils: Option<PathBuf>,
        /// Emit the per-sample audit trace
        #[arg(long)]
        trace: bool,
        /// Write the analysis here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Gaze stream summary statistics only
    Summary {
        #[arg(long)]
        gaze: PathBuf,
        #[arg(long)]
        blinks: Option<PathBuf>,
        #[arg(long)]
        pupils: Option<PathBuf>,
    },
}

pub fn run(action: AnalyzeAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AnalyzeAction::Attention {
            record,
            gaze,
            world,
            participant,
            blinks,
            pupils,
            trace,
            out,
        } => {
            let config = Config::load()?;
            let session: ExperimentSession = read_json(&record)?;
            let samples: Vec<GazeSample> = read_json(&gaze)?;
            let world: Option<Vec<f64>> = world.map(|p| read_json(&p)).transpose()?;
            let blinks: Vec<BlinkInterval> =
                blinks.map(|p| read_json(&p)).transpose()?.unwrap_or_default();
            let pupils: Vec<PupilSample> =
                pupils.map(|p| read_json(&p)).transpose()?.unwrap_or_default();
            let recommended = participant
                .map(|p| read_json::<Participant>(&p))
                .transpose()?
                .and_then(|p| p.visible_recommendation().map(|s| s.to_string()));

            let aggregator = AttentionAggregator::new()
                .with_confidence_threshold(config.confidence_threshold)
                .with_recommended_product(recommended);

            let screens = session.screens();
            let summary = summarize(&samples, &blinks, &pupils);
            let output = if trace {
                let (records, trace) =
                    aggregator.aggregate_with_trace(&screens, &samples, world.as_deref());
                AnalysisOutput {
                    records,
                    summary,
                    trace: Some(trace),
                }
            } else {
                AnalysisOutput {
                    records: aggregator.aggregate(&screens, &samples, world.as_deref()),
                    summary,
                    trace: None,
                }
            };
            write_json(&output, out.as_deref())?;
        }
        AnalyzeAction::Summary {
            gaze,
            blinks,
            pupils,
        } => {
            let samples: Vec<GazeSample> = read_json(&gaze)?;
            let blinks: Vec<BlinkInterval> =
                blinks.map(|p| read_json(&p)).transpose()?.unwrap_or_default();
            let pupils: Vec<PupilSample> =
                pupils.map(|p| read_json(&p)).transpose()?.unwrap_or_default();
            write_json(&summarize(&samples, &blinks, &pupils), None)?;
        }
    }
    Ok(())
}
