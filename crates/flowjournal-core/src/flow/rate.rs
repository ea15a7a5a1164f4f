//! Characters-per-minute estimator over a short sliding window.
//!
//! Input arrives as the *total* text length whenever the text changes;
//! the estimator turns that into a non-negative per-second count and, on
//! each `tick()`, projects the window sum to a per-minute rate.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Seconds of input the CPM figure is averaged over.
    pub window_secs: usize,
    /// Number of CPM samples kept for display.
    pub history_len: usize,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            window_secs: 2,
            history_len: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateEstimator {
    config: RateConfig,
    window: VecDeque<usize>,
    pending: usize,
    last_len: usize,
    current: u32,
    history: VecDeque<u32>,
}

impl RateEstimator {
    pub fn new(config: RateConfig) -> Self {
        Self {
            config: RateConfig {
                window_secs: config.window_secs.max(1),
                history_len: config.history_len,
            },
            window: VecDeque::new(),
            pending: 0,
            last_len: 0,
            current: 0,
            history: VecDeque::new(),
        }
    }

    /// Record the new total text length. Shrinking text counts as zero input.
    ///
    /// Returns the number of characters added since the last call.
    pub fn record_input(&mut self, total_len: usize) -> usize {
        let delta = total_len.saturating_sub(self.last_len);
        self.pending += delta;
        self.last_len = total_len;
        delta
    }

    /// Close the current second and return the CPM over the window.
    pub fn tick(&mut self) -> u32 {
        self.window.push_back(self.pending);
        while self.window.len() > self.config.window_secs {
            self.window.pop_front();
        }
        self.pending = 0;

        let seconds = self.window.len().min(self.config.window_secs);
        let cpm = if seconds == 0 {
            0
        } else {
            let total: usize = self.window.iter().sum();
            (total as f64 / seconds as f64 * 60.0).round() as u32
        };

        self.current = cpm;
        self.history.push_back(cpm);
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }
        cpm
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.pending = 0;
        self.last_len = 0;
        self.current = 0;
        self.history.clear();
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn history(&self) -> Vec<u32> {
        self.history.iter().copied().collect()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(RateConfig::default())
    }
}
