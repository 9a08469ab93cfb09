//! Accumulates raw chunks and cuts them into sentences.
//!
//! [`Stream`] is the state carried by the read loop between passes: the text buffer, the
//! liveness watchdog and the counters. Everything here is plain buffer mutation, nothing
//! blocks.
use std::time::Instant;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::{Config, Stats};

mod extract;
mod watchdog;

pub use extract::{extract, scan, Frame, Frames, Span};
pub use watchdog::{Liveness, Verdict, Watchdog};

/// Text seen on the bus but not yet resolved into frames.
pub struct Accumulator {
    buf: String,
    ceiling: usize,
    trim: usize,
}

impl Accumulator {
    pub fn new(ceiling: usize, trim: usize) -> Accumulator {
        Accumulator {
            buf: String::with_capacity(ceiling),
            ceiling,
            trim: trim.min(ceiling),
        }
    }

    /// Append the ASCII part of `chunk`. Other bytes are dropped.
    pub fn ingest(&mut self, chunk: &[u8]) {
        self.buf
            .extend(chunk.iter().filter(|b| b.is_ascii()).map(|&b| b as char));
    }

    /// Keep only the most recent `trim` bytes if the buffer has grown past the ceiling.
    /// Returns whether anything was dropped.
    pub fn overflow_guard(&mut self) -> bool {
        if self.buf.len() > self.ceiling {
            let cut = self.buf.len() - self.trim;
            debug!(
                "gps: buffer too large ({} > {}), dropping {} bytes",
                self.buf.len(),
                self.ceiling,
                cut
            );
            self.buf.drain(..cut);
            true
        } else {
            false
        }
    }

    /// Split off and return `buf[..end]`.
    pub(crate) fn take_front(&mut self, end: usize) -> String {
        let rest = self.buf.split_off(end);
        core::mem::replace(&mut self.buf, rest)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}

pub struct Stream {
    acc: Accumulator,
    watchdog: Watchdog,
    stats: Stats,
}

impl Stream {
    pub fn new(config: &Config, now: Instant) -> Stream {
        Stream {
            acc: Accumulator::new(config.overflow_ceiling, config.overflow_trim),
            watchdog: Watchdog::new(config.watchdog_timeout(), now),
            stats: Stats::default(),
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;
        self.acc.ingest(chunk);
    }

    /// Extract all complete frames, then apply the overflow guard and the watchdog.
    pub fn pass(&mut self, now: Instant) -> Frames {
        let frames = extract(&mut self.acc);
        self.stats.frames += frames.len() as u64;

        if self.acc.overflow_guard() {
            self.stats.overflow_trims += 1;
        }

        if self.watchdog.observe(frames.len(), now) == Verdict::Reset {
            debug!(
                "gps: no sentence for {:?}, clearing {} bytes",
                self.watchdog.timeout(),
                self.acc.len()
            );
            self.acc.clear();
            self.stats.watchdog_resets += 1;
        }

        frames
    }

    pub fn buffer(&self) -> &Accumulator {
        &self.acc
    }

    pub fn liveness(&self) -> Liveness {
        self.watchdog.state()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}
