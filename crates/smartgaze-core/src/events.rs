use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modes::ModeKind;

/// Every externally visible state change in the engine produces an Event.
/// The presentation layer polls for events; exporters append them to the
/// session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    ModeStarted {
        mode: ModeKind,
        at: DateTime<Utc>,
    },
    /// A choice was accepted by the active mode. `stage` is set for the
    /// paired-elimination bracket (`pair_1`, `pair_2`, `final`).
    ChoiceRecorded {
        mode: ModeKind,
        stage: Option<String>,
        image_id: String,
        at: DateTime<Utc>,
    },
    /// The sequential cursor moved to a different image.
    Navigated {
        mode: ModeKind,
        from_image: String,
        to_image: String,
        at: DateTime<Utc>,
    },
    /// The tentative sequential selection was confirmed.
    SelectionConfirmed {
        mode: ModeKind,
        image_id: String,
        at: DateTime<Utc>,
    },
    ModeCompleted {
        mode: ModeKind,
        selected: Option<String>,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    SessionReset {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
}
