use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::{FadeOpacity, FlowCategory, SessionPhase, SessionStats};

/// Every state change in a session produces an Event.
/// The presentation layer drains them after each input or tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        gauge: f64,
        at: DateTime<Utc>,
    },
    Tick {
        elapsed_secs: u64,
        cpm: u32,
        gauge: f64,
        category: FlowCategory,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
        at: DateTime<Utc>,
    },
    /// Gauge ran dry; the fade countdown began.
    FadeStarted {
        countdown_secs: u32,
        at: DateTime<Utc>,
    },
    FadeCountdown {
        remaining_secs: u32,
        opacity: FadeOpacity,
        at: DateTime<Utc>,
    },
    FadeRecovered {
        gauge: f64,
        fade_recoveries: u32,
        at: DateTime<Utc>,
    },
    SessionEnded {
        stats: SessionStats,
        at: DateTime<Utc>,
    },
}
