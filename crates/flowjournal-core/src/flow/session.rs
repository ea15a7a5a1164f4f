//! Flow session controller.
//!
//! Owns the phase, the gauge and the statistics, and wires the session
//! timer, rate estimator, threshold policy and fade countdown together.
//! Sub-components never touch this state; they hand back values and
//! signals that are applied here.
//!
//! ## State Transitions
//!
//! ```text
//! Start -> Writing -> Fading -> Writing   (recovered)
//!                            -> Ended     (fade ran out)
//!          Writing | Fading  -> Ended     (manual end)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = FlowSession::default();
//! session.start_session();
//! // whenever the text changes:
//! session.handle_text_change("Once upon a time");
//! // once per wall-clock second:
//! session.tick();
//! for event in session.drain_events() { /* render */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::degradation::{DegradationController, DegradationSignal, DegradationState};
use super::gauge::Gauge;
use super::policy::{FlowBand, FlowCategory};
use super::rate::RateEstimator;
use super::stats::{EndReason, SessionStats, StatsAccumulator};
use super::timer::SessionTimer;
use super::FlowConfig;
use crate::error::ValidationError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session yet.
    Start,
    Writing,
    /// Gauge is empty and the fade countdown is running.
    Fading,
    Ended,
}

impl SessionPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionPhase::Writing | SessionPhase::Fading)
    }
}

/// Fade overlay state for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeSnapshot {
    pub active: bool,
    pub countdown_secs: u32,
    pub opacity: f64,
    pub recovery_progress_pct: f64,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub phase: SessionPhase,
    pub gauge: f64,
    pub category: FlowCategory,
    pub fade: FadeSnapshot,
    pub cpm: u32,
    pub cpm_history: Vec<u32>,
    pub elapsed_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SessionStats>,
}

/// State the timer's tick handler operates on.
#[derive(Debug)]
struct SessionCore {
    config: FlowConfig,
    phase: SessionPhase,
    text: String,
    text_len: usize,
    gauge: Gauge,
    category: FlowCategory,
    rate: RateEstimator,
    fade: DegradationController,
    stats: StatsAccumulator,
    final_stats: Option<SessionStats>,
    events: Vec<Event>,
}

#[derive(Debug)]
pub struct FlowSession {
    timer: SessionTimer<SessionCore>,
    core: SessionCore,
}

impl FlowSession {
    pub fn new(config: FlowConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: FlowConfig) -> Self {
        let mut timer = SessionTimer::new();
        timer.set_handler(|core: &mut SessionCore, _elapsed| core.on_tick());
        Self {
            timer,
            core: SessionCore::new(config),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &FlowConfig {
        &self.core.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.core.phase
    }

    pub fn text(&self) -> &str {
        &self.core.text
    }

    pub fn gauge(&self) -> f64 {
        self.core.gauge.value()
    }

    pub fn category(&self) -> FlowCategory {
        self.core.category
    }

    pub fn cpm(&self) -> u32 {
        self.core.rate.current()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn fade_state(&self) -> DegradationState {
        self.core.fade.state()
    }

    pub fn fade_recoveries(&self) -> u32 {
        self.core.stats.fade_recoveries()
    }

    /// Statistics emitted when the last session ended.
    pub fn final_stats(&self) -> Option<&SessionStats> {
        self.core.final_stats.as_ref()
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        let fade = &self.core.fade;
        FlowSnapshot {
            phase: self.core.phase,
            gauge: self.core.gauge.value(),
            category: self.core.category,
            fade: FadeSnapshot {
                active: fade.state() != DegradationState::Inactive,
                countdown_secs: fade.remaining_secs(),
                opacity: fade.opacity().level(),
                recovery_progress_pct: fade.recovery_progress_pct(),
            },
            cpm: self.core.rate.current(),
            cpm_history: self.core.rate.history(),
            elapsed_secs: self.timer.elapsed_secs(),
            stats: self.core.final_stats.clone(),
        }
    }

    /// Take all events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.core.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh session, discarding everything from the previous one.
    pub fn start_session(&mut self) {
        self.timer.reset();
        self.core.reset();
        self.core.set_phase(SessionPhase::Writing);
        self.core.events.push(Event::SessionStarted {
            gauge: self.core.gauge.value(),
            at: Utc::now(),
        });
        self.timer.start();
        info!(gauge = self.core.gauge.value(), "session started");
    }

    /// Replace the text with `new_text`.
    pub fn handle_text_change(&mut self, new_text: impl Into<String>) {
        let new_text = new_text.into();
        let new_len = new_text.chars().count();
        let added = new_len.saturating_sub(self.core.text_len);

        self.core.rate.record_input(new_len);
        self.core.text = new_text;
        self.core.text_len = new_len;

        if self.core.phase == SessionPhase::Fading {
            if let Some(signal) = self.core.fade.record_input(added) {
                self.apply_fade_signal(signal);
            }
        }
    }

    /// Deliver one wall-clock second.
    ///
    /// The fade countdown is advanced before the session timer, so a fade
    /// entered during this tick first counts down on the next one.
    pub fn tick(&mut self) {
        if self.core.fade.is_active() {
            match self.core.fade.tick() {
                Some(signal) => self.apply_fade_signal(signal),
                None => self.core.events.push(Event::FadeCountdown {
                    remaining_secs: self.core.fade.remaining_secs(),
                    opacity: self.core.fade.opacity(),
                    at: Utc::now(),
                }),
            }
        }
        self.timer.fire(&mut self.core);
    }

    /// End the session by hand. Returns `None` if it already ended.
    pub fn end_session(&mut self) -> Option<SessionStats> {
        if self.core.phase == SessionPhase::Ended {
            return None;
        }
        self.timer.pause();
        self.core.fade.reset();
        Some(self.core.finish(EndReason::Manual))
    }

    fn apply_fade_signal(&mut self, signal: DegradationSignal) {
        match signal {
            DegradationSignal::TimedOut => {
                self.timer.pause();
                self.core.finish(EndReason::FadeDeath);
            }
            DegradationSignal::Recovered => self.core.recover(),
        }
    }
}

impl Default for FlowSession {
    fn default() -> Self {
        Self::from_valid(FlowConfig::default())
    }
}

impl SessionCore {
    fn new(config: FlowConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Start,
            text: String::new(),
            text_len: 0,
            gauge: Gauge::new(config.gauge_initial),
            category: FlowCategory::Stopped,
            rate: RateEstimator::new(config.rate),
            fade: DegradationController::new(config.fade),
            stats: StatsAccumulator::new(),
            final_stats: None,
            events: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.text.clear();
        self.text_len = 0;
        self.gauge = Gauge::new(self.config.gauge_initial);
        self.category = FlowCategory::Stopped;
        self.rate.reset();
        self.fade.reset();
        self.stats = StatsAccumulator::new();
        self.final_stats = None;
    }

    fn set_phase(&mut self, to: SessionPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        debug!(?from, ?to, "phase changed");
        self.events.push(Event::PhaseChanged {
            from,
            to,
            at: Utc::now(),
        });
    }

    fn on_tick(&mut self) {
        if !self.phase.is_active() {
            return;
        }

        let policy = self.config.thresholds;
        let cpm = self.rate.tick();
        let band = policy.band(cpm);
        self.stats.record_tick(cpm, band == FlowBand::Flow);
        self.category = band.category();

        // While fading, the countdown owns the session; only stats move.
        let depleted = if self.phase == SessionPhase::Writing {
            self.gauge.apply(policy.delta_for(band)).depleted()
        } else {
            false
        };

        debug!(cpm, ?band, gauge = self.gauge.value(), "tick");
        self.events.push(Event::Tick {
            elapsed_secs: self.stats.tick_count(),
            cpm,
            gauge: self.gauge.value(),
            category: self.category,
            at: Utc::now(),
        });

        if depleted {
            self.set_phase(SessionPhase::Fading);
            if self.fade.enter() {
                info!(countdown_secs = self.fade.remaining_secs(), "gauge empty, fading");
                self.events.push(Event::FadeStarted {
                    countdown_secs: self.fade.remaining_secs(),
                    at: Utc::now(),
                });
            }
        }
    }

    fn recover(&mut self) {
        self.set_phase(SessionPhase::Writing);
        self.gauge.set(self.config.gauge_recovery);
        self.stats.record_recovery();
        info!(
            fade_recoveries = self.stats.fade_recoveries(),
            "recovered from fade"
        );
        self.events.push(Event::FadeRecovered {
            gauge: self.gauge.value(),
            fade_recoveries: self.stats.fade_recoveries(),
            at: Utc::now(),
        });
    }

    fn finish(&mut self, reason: EndReason) -> SessionStats {
        let now = Utc::now();
        let stats = self.stats.finalize(&self.text, reason, now);
        self.set_phase(SessionPhase::Ended);
        info!(
            end_reason = %reason,
            total_chars = stats.total_chars,
            avg_cpm = stats.avg_cpm,
            "session ended"
        );
        self.final_stats = Some(stats.clone());
        self.events.push(Event::SessionEnded {
            stats: stats.clone(),
            at: now,
        });
        stats
    }
}
