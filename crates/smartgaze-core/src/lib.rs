//! # Smartgaze Core Library
//!
//! Core business logic for the Smartgaze preference-elicitation experiment:
//! a stateful controller that runs three image-viewing modes while an
//! external eye tracker records point-of-gaze, plus the offline analysis
//! that joins choices, timing, and attention into one exportable dataset.
//! All operations are available through a standalone CLI binary; any
//! richer presentation surface is a thin layer over this same library.
//!
//! ## Architecture
//!
//! - **Mode State Machines**: wall-clock-based machines for the three
//!   viewing modes (paired elimination, grid comparison, sequential
//!   review); mutation happens synchronously per user intent
//! - **Session Controller**: sequences the modes and derives the ephemeral
//!   `Screen` views used for rendering and aggregation
//! - **AOI Layout Generator**: pure geometry mapping on-screen products to
//!   normalized regions
//! - **Attention Aggregator**: aligns the externally clocked gaze stream
//!   to screen time windows and computes dwell/fixation metrics
//! - **Scoring**: questionnaire-driven SmartScore ranking of the product
//!   catalog
//!
//! ## Key Components
//!
//! - [`ExperimentSession`]: the session aggregate and intent entry point
//! - [`AttentionAggregator`]: post-session gaze attention analysis
//! - [`SmartScoreEngine`]: personalized compatibility scoring
//! - [`Config`]: application configuration management

pub mod align;
pub mod aoi;
pub mod attention;
pub mod config;
pub mod error;
pub mod events;
pub mod gaze;
pub mod modes;
pub mod participant;
pub mod results;
pub mod scoring;
pub mod session;

pub use align::{frame_bounds, frame_for};
pub use aoi::{generate_layout, AoiElement, AoiLayout, Rect};
pub use attention::{AttentionAggregator, AttentionRecord, ElementAttention, TraceRow};
pub use config::{data_dir, Config, ImageDirs};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use gaze::{
    filter_malformed, summarize, BlinkInterval, GazeSample, GazeSummary, PupilSample,
    CONFIDENCE_THRESHOLD,
};
pub use modes::{
    images_from_dir, Availability, GridMode, ImageRef, ModeKind, ModeState,
    PairedEliminationMode, PairedStage, SequentialMode, StageRecord, ViewSpan,
};
pub use participant::{assign_condition, Condition, Demographics, Participant};
pub use results::{assemble, ResultRow};
pub use scoring::{
    category_stats, top_per_category, CategoryStats, PreferenceWeights, ProductAttributes,
    QuestionnaireAnswers, ScoredProduct, SmartScoreEngine,
};
pub use session::{ExperimentSession, Screen, UserIntent};
