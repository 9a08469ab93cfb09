use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Frames have been seen within the timeout.
    Live,
    /// Nothing extracted for longer than the timeout.
    Stale,
}

/// Outcome of one watchdog check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one frame in this pass.
    Live,
    /// Silent, but within the timeout.
    Waiting,
    /// Silent for too long: the buffer should be cleared.
    Reset,
}

/// Tracks the time since the last extracted frame.
pub struct Watchdog {
    timeout: Duration,
    last_seen: Instant,
    state: Liveness,
}

impl Watchdog {
    pub fn new(timeout: Duration, now: Instant) -> Watchdog {
        Watchdog {
            timeout,
            last_seen: now,
            state: Liveness::Live,
        }
    }

    pub fn state(&self) -> Liveness {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time since the last frame (or the last reset).
    pub fn silence(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    /// Feed the number of frames extracted in this pass.
    ///
    /// The timer restarts both on frames and on a reset, so a dead stream is reset once per
    /// timeout period.
    pub fn observe(&mut self, frames: usize, now: Instant) -> Verdict {
        if frames > 0 {
            self.last_seen = now;
            self.state = Liveness::Live;
            Verdict::Live
        } else if self.silence(now) > self.timeout {
            self.last_seen = now;
            self.state = Liveness::Stale;
            Verdict::Reset
        } else {
            Verdict::Waiting
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_after_timeout() {
        let t0 = Instant::now();
        let mut w = Watchdog::new(Duration::from_secs(10), t0);

        assert_eq!(w.observe(0, t0 + Duration::from_secs(5)), Verdict::Waiting);
        assert_eq!(w.observe(0, t0 + Duration::from_secs(10)), Verdict::Waiting);
        assert_eq!(w.state(), Liveness::Live);

        assert_eq!(w.observe(0, t0 + Duration::from_secs(11)), Verdict::Reset);
        assert_eq!(w.state(), Liveness::Stale);

        // timer was restarted by the reset
        assert_eq!(w.observe(0, t0 + Duration::from_secs(15)), Verdict::Waiting);
        assert_eq!(w.observe(0, t0 + Duration::from_secs(22)), Verdict::Reset);
    }

    #[test]
    fn frames_keep_it_alive() {
        let t0 = Instant::now();
        let mut w = Watchdog::new(Duration::from_secs(10), t0);

        for s in (0..60).step_by(5) {
            assert_eq!(w.observe(1, t0 + Duration::from_secs(s)), Verdict::Live);
        }
        assert_eq!(w.silence(t0 + Duration::from_secs(60)), Duration::from_secs(5));
    }

    #[test]
    fn stale_to_live() {
        let t0 = Instant::now();
        let mut w = Watchdog::new(Duration::from_secs(1), t0);
        assert_eq!(w.observe(0, t0 + Duration::from_secs(2)), Verdict::Reset);
        assert_eq!(w.state(), Liveness::Stale);

        assert_eq!(w.observe(3, t0 + Duration::from_secs(3)), Verdict::Live);
        assert_eq!(w.state(), Liveness::Live);
    }
}
