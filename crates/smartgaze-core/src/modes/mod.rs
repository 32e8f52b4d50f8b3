//! The three viewing-mode state machines.
//!
//! Each machine is wall-clock based with no internal threads: all mutation
//! happens synchronously in response to a discrete user intent, commands
//! return `Option<Event>`, and an invalid or stale intent is a silent no-op
//! (`None`) rather than an error. Once a mode's completion timestamp is set
//! it is terminal; only `reset` mutates it afterwards.

mod grid;
mod paired;
mod sequential;

pub use grid::GridMode;
pub use paired::{PairedEliminationMode, PairedStage, StageRecord};
pub use sequential::{SequentialMode, ViewSpan};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Candidate count the elimination bracket requires.
pub const PAIRED_CANDIDATES: usize = 4;
/// Minimum and maximum images the grid displays.
pub const GRID_MIN_IMAGES: usize = 2;
pub const GRID_MAX_IMAGES: usize = 4;

/// Image file extensions accepted when scanning a source folder.
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    PairedElimination,
    Grid,
    Sequential,
}

impl ModeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModeKind::PairedElimination => "Paired Elimination",
            ModeKind::Grid => "Grid Comparison",
            ModeKind::Sequential => "Sequential Review",
        }
    }
}

/// Whether a mode could assemble a valid image set. Surfaced as a state the
/// presentation layer acts on, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Availability {
    Ready,
    Insufficient { required: usize, available: usize },
    NoImages,
}

impl Availability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Availability::Ready)
    }
}

/// A product image: stable identifier (the file's base name), human display
/// name, and the asset path used only at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ImageRef {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let display_name = id.replace(['_', '-'], " ");
        Self {
            id,
            display_name,
            path: None,
        }
    }

    /// Build from a file path; the base name (without extension) is the
    /// stable identifier. Returns `None` for paths without a valid stem.
    pub fn from_path(path: &Path) -> Option<Self> {
        let id = path.file_stem()?.to_str()?.to_string();
        let mut image = ImageRef::new(id);
        image.path = Some(path.to_path_buf());
        Some(image)
    }
}

/// Scan a source folder for product images, sorted by file name.
///
/// An unreadable folder yields an empty list; the mode built from it will
/// report `NoImages`, which the presentation layer must act on.
pub fn images_from_dir(dir: &Path) -> Vec<ImageRef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), %err, "image folder unreadable");
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    paths.iter().filter_map(|p| ImageRef::from_path(p)).collect()
}

/// Closed sum over the three machines; all dispatch is by pattern matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModeState {
    PairedElimination(PairedEliminationMode),
    Grid(GridMode),
    Sequential(SequentialMode),
}

impl ModeState {
    pub fn kind(&self) -> ModeKind {
        match self {
            ModeState::PairedElimination(_) => ModeKind::PairedElimination,
            ModeState::Grid(_) => ModeKind::Grid,
            ModeState::Sequential(_) => ModeKind::Sequential,
        }
    }

    pub fn availability(&self) -> Availability {
        match self {
            ModeState::PairedElimination(m) => m.availability(),
            ModeState::Grid(m) => m.availability(),
            ModeState::Sequential(m) => m.availability(),
        }
    }

    /// Idempotent: starts the mode clock on first call, no-op afterwards.
    pub fn ensure_started(&mut self) -> Option<Event> {
        match self {
            ModeState::PairedElimination(m) => m.ensure_started(),
            ModeState::Grid(m) => m.ensure_started(),
            ModeState::Sequential(m) => m.ensure_started(),
        }
    }

    pub fn selected(&self) -> Option<&ImageRef> {
        match self {
            ModeState::PairedElimination(m) => m.selected(),
            ModeState::Grid(m) => m.selected(),
            ModeState::Sequential(m) => m.selected(),
        }
    }

    /// Whether the session controller may advance past this mode. An
    /// unavailable mode passes through so a broken image source cannot
    /// deadlock the session.
    pub fn ready_to_advance(&self) -> bool {
        if !self.availability().is_ready() {
            return true;
        }
        match self {
            ModeState::PairedElimination(m) => m.is_complete(),
            ModeState::Grid(m) => m.selected().is_some(),
            ModeState::Sequential(m) => m.is_confirmed(),
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            ModeState::PairedElimination(m) => m.is_complete(),
            ModeState::Grid(m) => m.is_complete(),
            ModeState::Sequential(m) => m.is_complete(),
        }
    }

    /// Idempotent terminal stamp; closes any open accrual first.
    pub fn finalize(&mut self) -> Option<Event> {
        match self {
            ModeState::PairedElimination(m) => m.finalize(),
            ModeState::Grid(m) => m.finalize(),
            ModeState::Sequential(m) => m.finalize(),
        }
    }

    /// Close any open per-product dwell accrual without finalizing.
    /// Safe to call twice.
    pub fn close_open_accruals(&mut self) {
        if let ModeState::Sequential(m) = self {
            m.close_open_accrual();
        }
    }

    pub fn reset(&mut self) {
        match self {
            ModeState::PairedElimination(m) => m.reset(),
            ModeState::Grid(m) => m.reset(),
            ModeState::Sequential(m) => m.reset(),
        }
    }

    pub fn images(&self) -> &[ImageRef] {
        match self {
            ModeState::PairedElimination(m) => m.images(),
            ModeState::Grid(m) => m.images(),
            ModeState::Sequential(m) => m.images(),
        }
    }

    /// Images visible on the current screen.
    pub fn visible_images(&self) -> Vec<&ImageRef> {
        match self {
            ModeState::PairedElimination(m) => m.displayed(),
            ModeState::Grid(m) => m.displayed(),
            ModeState::Sequential(m) => m.current_image().into_iter().collect(),
        }
    }

    pub fn start_time_ms(&self) -> Option<u64> {
        match self {
            ModeState::PairedElimination(m) => m.start_time_ms(),
            ModeState::Grid(m) => m.start_time_ms(),
            ModeState::Sequential(m) => m.start_time_ms(),
        }
    }

    pub fn completion_time_ms(&self) -> Option<u64> {
        match self {
            ModeState::PairedElimination(m) => m.completion_time_ms(),
            ModeState::Grid(m) => m.completion_time_ms(),
            ModeState::Sequential(m) => m.completion_time_ms(),
        }
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub(crate) fn secs_between(start_ms: u64, end_ms: u64) -> f64 {
    end_ms.saturating_sub(start_ms) as f64 / 1000.0
}
