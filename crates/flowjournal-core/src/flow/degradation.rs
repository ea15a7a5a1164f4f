//! Fade countdown and recovery.
//!
//! ## State Transitions
//!
//! ```text
//! Inactive -> CountingDown -> Inactive  (enough typing: Recovered)
//!                          -> Expired   (countdown hit zero: TimedOut)
//! ```
//!
//! Leaving `CountingDown` and producing the signal happen in one step, so a
//! single activation yields exactly one signal. Once recovered, the
//! countdown is gone and a later `tick()` is a no-op; once expired, input is
//! ignored.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeConfig {
    /// Seconds from fade start until the session is lost.
    pub countdown_secs: u32,
    /// Characters that must be typed during the fade to recover.
    pub recovery_chars: usize,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            recovery_chars: 8,
        }
    }
}

/// Dimming applied to the workspace while fading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadeOpacity {
    Full,
    Medium,
    Low,
}

impl FadeOpacity {
    pub fn level(&self) -> f64 {
        match self {
            FadeOpacity::Full => 1.0,
            FadeOpacity::Medium => 0.5,
            FadeOpacity::Low => 0.2,
        }
    }

    fn for_remaining(remaining: u32, countdown_secs: u32) -> Self {
        if remaining >= countdown_secs {
            FadeOpacity::Full
        } else if remaining >= 2 {
            FadeOpacity::Medium
        } else {
            FadeOpacity::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DegradationState {
    Inactive,
    CountingDown { remaining_secs: u32, typed_chars: usize },
    /// The countdown ran out. Stays here until reset or re-entered.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationSignal {
    Recovered,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct DegradationController {
    config: FadeConfig,
    state: DegradationState,
}

impl DegradationController {
    pub fn new(config: FadeConfig) -> Self {
        Self {
            config: FadeConfig {
                countdown_secs: config.countdown_secs.max(1),
                recovery_chars: config.recovery_chars.max(1),
            },
            state: DegradationState::Inactive,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> DegradationState {
        self.state
    }

    pub fn config(&self) -> FadeConfig {
        self.config
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DegradationState::CountingDown { .. })
    }

    /// Seconds left on the countdown. Full countdown while inactive, zero once expired.
    pub fn remaining_secs(&self) -> u32 {
        match self.state {
            DegradationState::Inactive => self.config.countdown_secs,
            DegradationState::CountingDown { remaining_secs, .. } => remaining_secs,
            DegradationState::Expired => 0,
        }
    }

    pub fn typed_chars(&self) -> usize {
        match self.state {
            DegradationState::CountingDown { typed_chars, .. } => typed_chars,
            _ => 0,
        }
    }

    pub fn opacity(&self) -> FadeOpacity {
        match self.state {
            DegradationState::Inactive => FadeOpacity::Full,
            DegradationState::CountingDown { remaining_secs, .. } => {
                FadeOpacity::for_remaining(remaining_secs, self.config.countdown_secs)
            }
            DegradationState::Expired => FadeOpacity::Low,
        }
    }

    /// 0.0 .. 100.0 progress toward recovery.
    pub fn recovery_progress_pct(&self) -> f64 {
        let pct = self.typed_chars() as f64 / self.config.recovery_chars as f64 * 100.0;
        pct.min(100.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown. Returns false if one is already running.
    pub fn enter(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = DegradationState::CountingDown {
            remaining_secs: self.config.countdown_secs,
            typed_chars: 0,
        };
        debug!(countdown_secs = self.config.countdown_secs, "fade countdown started");
        true
    }

    /// Count characters typed during the fade.
    pub fn record_input(&mut self, chars_delta: usize) -> Option<DegradationSignal> {
        let DegradationState::CountingDown {
            remaining_secs,
            typed_chars,
        } = self.state
        else {
            return None;
        };

        let typed_chars = typed_chars + chars_delta;
        if typed_chars >= self.config.recovery_chars {
            self.state = DegradationState::Inactive;
            debug!(typed_chars, remaining_secs, "fade recovered");
            return Some(DegradationSignal::Recovered);
        }

        self.state = DegradationState::CountingDown {
            remaining_secs,
            typed_chars,
        };
        None
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> Option<DegradationSignal> {
        let DegradationState::CountingDown {
            remaining_secs,
            typed_chars,
        } = self.state
        else {
            return None;
        };

        let remaining_secs = remaining_secs.saturating_sub(1);
        if remaining_secs == 0 {
            self.state = DegradationState::Expired;
            debug!(typed_chars, "fade countdown expired");
            return Some(DegradationSignal::TimedOut);
        }

        self.state = DegradationState::CountingDown {
            remaining_secs,
            typed_chars,
        };
        None
    }

    /// Drop back to `Inactive` without emitting anything.
    pub fn reset(&mut self) {
        self.state = DegradationState::Inactive;
    }
}

impl Default for DegradationController {
    fn default() -> Self {
        Self::new(FadeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_ignores_input_and_ticks() {
        let mut fade = DegradationController::default();
        assert_eq!(fade.record_input(50), None);
        assert_eq!(fade.tick(), None);
        assert_eq!(fade.state(), DegradationState::Inactive);
    }

    #[test]
    fn enter_is_idempotent() {
        let mut fade = DegradationController::default();
        assert!(fade.enter());
        fade.record_input(3);
        fade.tick();
        assert!(!fade.enter());
        assert_eq!(fade.remaining_secs(), 2);
        assert_eq!(fade.typed_chars(), 3);
    }

    #[test]
    fn countdown_expires_after_configured_seconds() {
        let mut fade = DegradationController::default();
        fade.enter();
        assert_eq!(fade.opacity(), FadeOpacity::Full);
        assert_eq!(fade.tick(), None);
        assert_eq!(fade.opacity(), FadeOpacity::Medium);
        assert_eq!(fade.tick(), None);
        assert_eq!(fade.opacity(), FadeOpacity::Low);
        assert_eq!(fade.tick(), Some(DegradationSignal::TimedOut));
        assert_eq!(fade.state(), DegradationState::Expired);
        assert_eq!(fade.remaining_secs(), 0);
        // no second signal
        assert_eq!(fade.tick(), None);
    }

    #[test]
    fn reaching_threshold_recovers_once() {
        let mut fade = DegradationController::default();
        fade.enter();
        assert_eq!(fade.record_input(5), None);
        assert_eq!(fade.recovery_progress_pct(), 62.5);
        assert_eq!(fade.record_input(3), Some(DegradationSignal::Recovered));
        assert_eq!(fade.state(), DegradationState::Inactive);
        assert_eq!(fade.typed_chars(), 0);
        assert_eq!(fade.record_input(8), None);
    }

    #[test]
    fn recovery_on_last_second_preempts_timeout() {
        let mut fade = DegradationController::default();
        fade.enter();
        fade.tick();
        fade.tick();
        assert_eq!(fade.remaining_secs(), 1);
        assert_eq!(fade.record_input(8), Some(DegradationSignal::Recovered));
        // the cancelled countdown can't fire afterwards
        assert_eq!(fade.tick(), None);
    }

    #[test]
    fn input_after_expiry_is_ignored() {
        let mut fade = DegradationController::default();
        fade.enter();
        for _ in 0..3 {
            fade.tick();
        }
        assert_eq!(fade.record_input(100), None);
        assert_eq!(fade.state(), DegradationState::Expired);
    }

    #[test]
    fn reset_is_silent() {
        let mut fade = DegradationController::default();
        fade.enter();
        fade.record_input(4);
        fade.reset();
        assert_eq!(fade.state(), DegradationState::Inactive);
        assert_eq!(fade.tick(), None);
        assert_eq!(fade.remaining_secs(), 3);
    }

    #[test]
    fn re_entering_after_recovery_starts_fresh() {
        let mut fade = DegradationController::default();
        fade.enter();
        fade.tick();
        fade.record_input(8);
        assert!(fade.enter());
        assert_eq!(fade.remaining_secs(), 3);
        assert_eq!(fade.typed_chars(), 0);
    }
}
