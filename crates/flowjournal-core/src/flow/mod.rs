mod degradation;
mod gauge;
mod policy;
mod rate;
mod session;
mod stats;
mod timer;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use degradation::{
    DegradationController, DegradationSignal, DegradationState, FadeConfig, FadeOpacity,
};
pub use gauge::{Gauge, GaugeStep, GAUGE_MAX, GAUGE_MIN};
pub use policy::{FlowBand, FlowCategory, ThresholdPolicy};
pub use rate::{RateConfig, RateEstimator};
pub use session::{FadeSnapshot, FlowSession, FlowSnapshot, SessionPhase};
pub use stats::{word_count, EndReason, SessionStats, StatsAccumulator};
pub use timer::SessionTimer;

/// Everything the engine needs to run a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    pub thresholds: ThresholdPolicy,
    pub rate: RateConfig,
    pub fade: FadeConfig,
    /// Gauge value at session start.
    pub gauge_initial: f64,
    /// Gauge value after a successful fade recovery.
    pub gauge_recovery: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdPolicy::default(),
            rate: RateConfig::default(),
            fade: FadeConfig::default(),
            gauge_initial: 50.0,
            gauge_recovery: 40.0,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.thresholds.validate()?;
        for (field, value) in [
            ("gauge_initial", self.gauge_initial),
            ("gauge_recovery", self.gauge_recovery),
        ] {
            if !(value > GAUGE_MIN && value <= GAUGE_MAX) {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: format!("must be in ({GAUGE_MIN}, {GAUGE_MAX}], got {value}"),
                });
            }
        }
        if self.rate.window_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rate.window_secs".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.fade.countdown_secs == 0 || self.fade.recovery_chars == 0 {
            return Err(ValidationError::InvalidValue {
                field: "fade".into(),
                message: "countdown_secs and recovery_chars must be at least 1".into(),
            });
        }
        Ok(())
    }
}
