//! CPM -> flow category and gauge delta.
//!
//! Both outputs are derived from a single [`FlowBand`] lookup so the label
//! shown to the writer and the direction the gauge moves can never drift
//! apart.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Qualitative label shown next to the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowCategory {
    Stopped,
    Slow,
    Flow,
}

impl FlowCategory {
    pub fn label(&self) -> &'static str {
        match self {
            FlowCategory::Stopped => "stopped",
            FlowCategory::Slow => "slow",
            FlowCategory::Flow => "flow",
        }
    }
}

impl std::fmt::Display for FlowCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowBand {
    /// At or above the flow breakpoint.
    Flow,
    /// Between the slow and flow breakpoints.
    Slow,
    /// Still typing, but barely. Reported as `Slow`, penalised harder.
    Stopping,
    /// No input at all.
    Stopped,
}

impl FlowBand {
    pub fn category(&self) -> FlowCategory {
        match self {
            FlowBand::Flow => FlowCategory::Flow,
            FlowBand::Slow | FlowBand::Stopping => FlowCategory::Slow,
            FlowBand::Stopped => FlowCategory::Stopped,
        }
    }
}

/// Threshold table: breakpoints in CPM and gauge deltas per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub flow_cpm: u32,
    pub slow_cpm: u32,
    pub stopping_cpm: u32,
    pub flow_delta: f64,
    pub slow_delta: f64,
    pub stopping_delta: f64,
    pub stopped_delta: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            flow_cpm: 100,
            slow_cpm: 40,
            stopping_cpm: 1,
            flow_delta: 1.5,
            slow_delta: -1.0,
            stopping_delta: -3.0,
            stopped_delta: -8.0,
        }
    }
}

impl ThresholdPolicy {
    /// Check that a (possibly user-edited) table keeps category and delta
    /// pointing the same way.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.flow_cpm > self.slow_cpm
            && self.slow_cpm > self.stopping_cpm
            && self.stopping_cpm >= 1)
        {
            return Err(ValidationError::InvalidThresholds(format!(
                "breakpoints must satisfy flow > slow > stopping >= 1 (got {}/{}/{})",
                self.flow_cpm, self.slow_cpm, self.stopping_cpm
            )));
        }
        let deltas = [
            self.flow_delta,
            self.slow_delta,
            self.stopping_delta,
            self.stopped_delta,
        ];
        if deltas.iter().any(|d| !d.is_finite()) {
            return Err(ValidationError::InvalidThresholds(
                "gauge deltas must be finite".into(),
            ));
        }
        if self.flow_delta <= 0.0 || self.slow_delta >= 0.0 {
            return Err(ValidationError::InvalidThresholds(
                "flow delta must be positive and slow delta negative".into(),
            ));
        }
        if !(self.stopping_delta < self.slow_delta && self.stopped_delta < self.stopping_delta) {
            return Err(ValidationError::InvalidThresholds(
                "each lower band must drain the gauge faster than the one above".into(),
            ));
        }
        Ok(())
    }

    pub fn band(&self, cpm: u32) -> FlowBand {
        if cpm >= self.flow_cpm {
            FlowBand::Flow
        } else if cpm >= self.slow_cpm {
            FlowBand::Slow
        } else if cpm >= self.stopping_cpm {
            FlowBand::Stopping
        } else {
            FlowBand::Stopped
        }
    }

    pub fn category(&self, cpm: u32) -> FlowCategory {
        self.band(cpm).category()
    }

    pub fn gauge_delta(&self, cpm: u32) -> f64 {
        self.delta_for(self.band(cpm))
    }

    pub fn delta_for(&self, band: FlowBand) -> f64 {
        match band {
            FlowBand::Flow => self.flow_delta,
            FlowBand::Slow => self.slow_delta,
            FlowBand::Stopping => self.stopping_delta,
            FlowBand::Stopped => self.stopped_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flow_at_and_above_breakpoint() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.category(100), FlowCategory::Flow);
        assert_eq!(policy.category(250), FlowCategory::Flow);
        assert_eq!(policy.gauge_delta(100), 1.5);
        assert_eq!(policy.category(99), FlowCategory::Slow);
        assert_eq!(policy.gauge_delta(99), -1.0);
    }

    #[test]
    fn slow_band_boundaries() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.category(40), FlowCategory::Slow);
        assert_eq!(policy.gauge_delta(40), -1.0);
        assert_eq!(policy.gauge_delta(39), -3.0);
    }

    #[test]
    fn stopping_band_reports_slow_with_steeper_penalty() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.band(1), FlowBand::Stopping);
        assert_eq!(policy.category(1), FlowCategory::Slow);
        assert_eq!(policy.gauge_delta(1), -3.0);
        assert_eq!(policy.gauge_delta(39), -3.0);
    }

    #[test]
    fn zero_cpm_is_stopped_and_steepest() {
        let policy = ThresholdPolicy::default();
        assert_eq!(policy.category(0), FlowCategory::Stopped);
        assert_eq!(policy.gauge_delta(0), -8.0);
        for cpm in 1..200 {
            assert!(policy.gauge_delta(0) < policy.gauge_delta(cpm));
        }
    }

    #[test]
    fn default_table_is_valid() {
        assert!(ThresholdPolicy::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unordered_breakpoints() {
        let policy = ThresholdPolicy {
            slow_cpm: 120,
            ..ThresholdPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(ValidationError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn validate_rejects_sign_mismatch() {
        let policy = ThresholdPolicy {
            flow_delta: -0.5,
            ..ThresholdPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = ThresholdPolicy {
            stopped_delta: -2.0,
            ..ThresholdPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    proptest! {
        #[test]
        fn category_and_delta_agree(cpm in 0u32..2_000) {
            let policy = ThresholdPolicy::default();
            let delta = policy.gauge_delta(cpm);
            match policy.category(cpm) {
                FlowCategory::Flow => prop_assert!(delta > 0.0),
                FlowCategory::Slow => prop_assert!(delta < 0.0),
                FlowCategory::Stopped => {
                    prop_assert_eq!(cpm, 0);
                    prop_assert_eq!(delta, policy.stopped_delta);
                }
            }
        }

        #[test]
        fn delta_is_monotonic_in_cpm(a in 0u32..500, b in 0u32..500) {
            let policy = ThresholdPolicy::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(policy.gauge_delta(lo) <= policy.gauge_delta(hi));
        }
    }
}
