//! One-second session clock.
//!
//! Like the rest of the engine this does not own a thread: the host calls
//! [`SessionTimer::fire`] once per wall-clock second. The tick handler lives
//! in a replaceable slot and receives the owner's state by `&mut`, so the
//! handler invoked is always the one registered most recently.

use std::fmt;

type TickHandler<C> = Box<dyn FnMut(&mut C, u64) + Send>;

pub struct SessionTimer<C> {
    running: bool,
    elapsed_secs: u64,
    handler: Option<TickHandler<C>>,
}

impl<C> SessionTimer<C> {
    pub fn new() -> Self {
        Self {
            running: false,
            elapsed_secs: 0,
            handler: None,
        }
    }

    /// Replace the tick handler. Takes effect on the next `fire()`.
    pub fn set_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut C, u64) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Returns false if the timer was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Stop ticking, keep elapsed time.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stop ticking and zero elapsed time.
    pub fn reset(&mut self) {
        self.running = false;
        self.elapsed_secs = 0;
    }

    /// Deliver one second. Returns the new elapsed count, or `None` when stopped.
    pub fn fire(&mut self, ctx: &mut C) -> Option<u64> {
        if !self.running {
            return None;
        }
        self.elapsed_secs += 1;
        if let Some(handler) = self.handler.as_mut() {
            handler(ctx, self.elapsed_secs);
        }
        Some(self.elapsed_secs)
    }
}

impl<C> Default for SessionTimer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for SessionTimer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTimer")
            .field("running", &self.running)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_does_not_tick() {
        let mut timer: SessionTimer<Vec<u64>> = SessionTimer::new();
        let mut seen = Vec::new();
        timer.set_handler(|seen: &mut Vec<u64>, n| seen.push(n));
        assert_eq!(timer.fire(&mut seen), None);
        assert!(seen.is_empty());
    }

    #[test]
    fn start_is_idempotent() {
        let mut timer: SessionTimer<()> = SessionTimer::new();
        assert!(timer.start());
        assert!(!timer.start());
        timer.fire(&mut ());
        timer.fire(&mut ());
        assert_eq!(timer.elapsed_secs(), 2);
    }

    #[test]
    fn pause_keeps_elapsed_reset_zeroes_it() {
        let mut timer: SessionTimer<()> = SessionTimer::new();
        timer.start();
        timer.fire(&mut ());
        timer.pause();
        assert_eq!(timer.fire(&mut ()), None);
        assert_eq!(timer.elapsed_secs(), 1);
        timer.start();
        timer.fire(&mut ());
        assert_eq!(timer.elapsed_secs(), 2);
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed_secs(), 0);
    }

    #[test]
    fn replaced_handler_is_used_on_next_tick() {
        let mut timer: SessionTimer<Vec<&'static str>> = SessionTimer::new();
        let mut log = Vec::new();
        timer.set_handler(|log: &mut Vec<&'static str>, _| log.push("first"));
        timer.start();
        timer.fire(&mut log);
        timer.set_handler(|log: &mut Vec<&'static str>, _| log.push("second"));
        timer.fire(&mut log);
        assert_eq!(log, vec!["first", "second"]);
    }
}
