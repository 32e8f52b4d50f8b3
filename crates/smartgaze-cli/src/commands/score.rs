use std::path::PathBuf;

use clap::Subcommand;
use smartgaze_core::{
    category_stats, top_per_category, ProductAttributes, QuestionnaireAnswers, SmartScoreEngine,
};

use super::{read_json, write_json};

#[derive(Subcommand)]
pub enum ScoreAction {
    /// Rank the catalog with a participant's questionnaire answers
    Rank {
        /// Questionnaire answers JSON
        #[arg(long)]
        answers: PathBuf,
        /// Product catalog JSON
        #[arg(long)]
        catalog: PathBuf,
        /// Write the ranking here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Best products per category
    Top {
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        catalog: PathBuf,
        /// Products per category
        #[arg(long, default_value_t = 3)]
        k: usize,
    },
    /// Per-category score statistics
    Stats {
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Show the normalized preference weights
    Weights {
        #[arg(long)]
        answers: PathBuf,
    },
}

pub fn run(action: ScoreAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScoreAction::Rank {
            answers,
            catalog,
            out,
        } => {
            let engine = engine_from(&answers)?;
            let catalog: Vec<ProductAttributes> = read_json(&catalog)?;
            let scored = engine.score_catalog(&catalog);
            write_json(&scored, out.as_deref())?;
        }
        ScoreAction::Top {
            answers,
            catalog,
            k,
        } => {
            let engine = engine_from(&answers)?;
            let catalog: Vec<ProductAttributes> = read_json(&catalog)?;
            let top = top_per_category(&engine.score_catalog(&catalog), k);
            write_json(&top, None)?;
        }
        ScoreAction::Stats { answers, catalog } => {
            let engine = engine_from(&answers)?;
            let catalog: Vec<ProductAttributes> = read_json(&catalog)?;
            let stats = category_stats(&engine.score_catalog(&catalog));
            write_json(&stats, None)?;
        }
        ScoreAction::Weights { answers } => {
            let engine = engine_from(&answers)?;
            write_json(engine.weights(), None)?;
        }
    }
    Ok(())
}

fn engine_from(path: &PathBuf) -> Result<SmartScoreEngine, Box<dyn std::error::Error>> {
    let answers: QuestionnaireAnswers = read_json(path)?;
    answers.validate()?;
    Ok(SmartScoreEngine::from_answers(&answers))
}
