use serde::{Deserialize, Serialize};

pub const GAUGE_MIN: f64 = 0.0;
pub const GAUGE_MAX: f64 = 100.0;

/// Engagement gauge, always within `[GAUGE_MIN, GAUGE_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gauge(f64);

/// Before/after values of a single gauge update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeStep {
    pub before: f64,
    pub after: f64,
}

impl GaugeStep {
    /// True when this step drained the gauge from a positive value.
    pub fn depleted(&self) -> bool {
        self.before > GAUGE_MIN && self.after <= GAUGE_MIN
    }
}

impl Gauge {
    pub fn new(value: f64) -> Self {
        Self(clamp(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn set(&mut self, value: f64) {
        self.0 = clamp(value);
    }

    pub fn apply(&mut self, delta: f64) -> GaugeStep {
        let before = self.0;
        self.0 = clamp(before + delta);
        GaugeStep {
            before,
            after: self.0,
        }
    }
}

fn clamp(value: f64) -> f64 {
    if value.is_nan() {
        return GAUGE_MIN;
    }
    value.clamp(GAUGE_MIN, GAUGE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamps_on_construction() {
        assert_eq!(Gauge::new(150.0).value(), 100.0);
        assert_eq!(Gauge::new(-3.0).value(), 0.0);
    }

    #[test]
    fn depletion_only_reported_on_crossing() {
        let mut gauge = Gauge::new(5.0);
        assert!(gauge.apply(-8.0).depleted());
        assert!(!gauge.apply(-8.0).depleted());
        assert!(!gauge.apply(1.5).depleted());
    }

    proptest! {
        #[test]
        fn always_within_bounds(
            start in -50.0f64..150.0,
            deltas in proptest::collection::vec(-200.0f64..200.0, 0..64),
        ) {
            let mut gauge = Gauge::new(start);
            for delta in deltas {
                gauge.apply(delta);
                prop_assert!(gauge.value() >= GAUGE_MIN && gauge.value() <= GAUGE_MAX);
            }
        }
    }
}
