//! Per-session statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// The fade countdown ran out.
    FadeDeath,
    /// The writer ended the session.
    Manual,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::FadeDeath => "fade-death",
            EndReason::Manual => "manual",
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final statistics, emitted once when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_chars: usize,
    pub total_words: usize,
    pub avg_cpm: u32,
    pub max_cpm: u32,
    /// Seconds spent in the flow band.
    pub flow_time_secs: u64,
    /// Counted in session ticks, not timer seconds.
    pub total_time_secs: u64,
    pub fade_recoveries: u32,
    pub end_reason: EndReason,
    pub ended_at: DateTime<Utc>,
}

impl SessionStats {
    /// Share of the session spent in flow, 0.0 .. 100.0.
    pub fn flow_ratio_pct(&self) -> f64 {
        if self.total_time_secs == 0 {
            return 0.0;
        }
        (self.flow_time_secs as f64 / self.total_time_secs as f64 * 100.0).min(100.0)
    }
}

/// Running aggregates, updated once per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsAccumulator {
    max_cpm: u32,
    flow_time_secs: u64,
    cpm_sum: u64,
    tick_count: u64,
    fade_recoveries: u32,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&mut self, cpm: u32, in_flow: bool) {
        self.max_cpm = self.max_cpm.max(cpm);
        self.cpm_sum += u64::from(cpm);
        self.tick_count += 1;
        if in_flow {
            self.flow_time_secs += 1;
        }
    }

    pub fn record_recovery(&mut self) {
        self.fade_recoveries += 1;
    }

    pub fn avg_cpm(&self) -> u32 {
        if self.tick_count == 0 {
            return 0;
        }
        (self.cpm_sum as f64 / self.tick_count as f64).round() as u32
    }

    pub fn max_cpm(&self) -> u32 {
        self.max_cpm
    }

    pub fn flow_time_secs(&self) -> u64 {
        self.flow_time_secs
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn fade_recoveries(&self) -> u32 {
        self.fade_recoveries
    }

    pub fn finalize(&self, text: &str, end_reason: EndReason, ended_at: DateTime<Utc>) -> SessionStats {
        SessionStats {
            total_chars: text.chars().count(),
            total_words: word_count(text),
            avg_cpm: self.avg_cpm(),
            max_cpm: self.max_cpm,
            flow_time_secs: self.flow_time_secs,
            total_time_secs: self.tick_count,
            fade_recoveries: self.fade_recoveries,
            end_reason,
            ended_at,
        }
    }
}

/// Whitespace-separated, non-empty tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_rounded_mean_of_ticks() {
        let mut acc = StatsAccumulator::new();
        acc.record_tick(100, true);
        acc.record_tick(0, false);
        acc.record_tick(61, false);
        // 161 / 3 = 53.67
        assert_eq!(acc.avg_cpm(), 54);
        assert_eq!(acc.max_cpm(), 100);
        assert_eq!(acc.flow_time_secs(), 1);
        assert_eq!(acc.tick_count(), 3);
    }

    #[test]
    fn empty_session_averages_zero() {
        assert_eq!(StatsAccumulator::new().avg_cpm(), 0);
    }

    #[test]
    fn word_count_ignores_whitespace_runs() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("  one\t two\n\nthree  "), 3);
    }

    #[test]
    fn finalize_copies_aggregates() {
        let mut acc = StatsAccumulator::new();
        acc.record_tick(120, true);
        acc.record_recovery();
        let at = Utc::now();
        let stats = acc.finalize("héllo world", EndReason::Manual, at);
        assert_eq!(stats.total_chars, 11);
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.total_time_secs, 1);
        assert_eq!(stats.fade_recoveries, 1);
        assert_eq!(stats.flow_ratio_pct(), 100.0);
        assert_eq!(stats.ended_at, at);
    }

    #[test]
    fn end_reason_labels() {
        assert_eq!(EndReason::FadeDeath.to_string(), "fade-death");
        assert_eq!(
            serde_json::to_string(&EndReason::FadeDeath).unwrap(),
            "\"fade-death\""
        );
        let parsed: EndReason = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(parsed, EndReason::Manual);
    }
}
