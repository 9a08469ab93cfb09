//! The read loop.
//!
//! One iteration collects chunks for an aggregation window (`aggregate_ms`, one read every
//! `poll_ms`), then extracts, decodes and dispatches every complete sentence and lets the
//! watchdog have a look at the buffer. The stop flag is checked between every read.
use embedded_hal::blocking::delay::DelayMs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::dispatch::{dispatch, Report};
use crate::sentence::decode;
use crate::source::{ChunkSource, Retry};
use crate::stream::Stream;
use crate::{Config, Stats};

pub struct Reader<S: ChunkSource, D: DelayMs<u32>> {
    config: Config,
    source: Retry<S, D>,
    stream: Stream,
    decode_failures: u64,
    reports: u64,
}

impl<S: ChunkSource, D: DelayMs<u32>> Reader<S, D> {
    pub fn new(source: S, delay: D, config: Config) -> Reader<S, D> {
        let source = Retry::new(source, delay, config.chunk_size, config.backoff_ms);
        let stream = Stream::new(&config, Instant::now());

        Reader {
            config,
            source,
            stream,
            decode_failures: 0,
            reports: 0,
        }
    }

    /// Read chunks for one aggregation window into the stream. Returns the number of bytes
    /// collected.
    pub fn poll_window(&mut self, running: &AtomicBool) -> usize {
        let mut collected = 0;

        for _ in 0..self.config.polls_per_window() {
            if !running.load(Ordering::Relaxed) {
                break;
            }

            let chunk = self.source.read_chunk(self.config.chunk_size);

            if !chunk.is_empty() {
                if self.config.raw_debug {
                    trace!("gps: raw chunk: {:?}", String::from_utf8_lossy(chunk));
                }

                collected += chunk.len();
                self.stream.push(chunk);
            }

            self.source.delay_ms(self.config.poll_ms);
        }

        collected
    }

    /// Extract and handle every complete sentence in the buffer. Returns the number of
    /// reports handed to `sink`.
    pub fn process(&mut self, now: Instant, sink: &mut impl FnMut(Report)) -> usize {
        let frames = self.stream.pass(now);
        let mut n = 0;

        for frame in frames.iter() {
            match decode(&frame) {
                Ok(msg) => {
                    if let Some(r) = dispatch(&msg) {
                        sink(r);
                        n += 1;
                    }
                }
                Err(e) => {
                    self.decode_failures += 1;
                    debug!(
                        "gps: {} (checksum {})",
                        e,
                        if frame.checksum_matches() {
                            "ok"
                        } else {
                            "mismatch"
                        }
                    );
                }
            }
        }

        self.reports += n as u64;
        n
    }

    /// One full iteration: a window of reads followed by processing.
    pub fn step(&mut self, running: &AtomicBool, sink: &mut impl FnMut(Report)) -> usize {
        self.poll_window(running);
        self.process(Instant::now(), sink)
    }

    /// Run until `running` is cleared.
    pub fn run(&mut self, running: &AtomicBool, mut sink: impl FnMut(Report)) {
        info!(
            "gps: reading {} byte chunks from {:#04x}, every {} ms, parsing every {} ms",
            self.config.chunk_size, self.config.address, self.config.poll_ms, self.config.aggregate_ms
        );

        while running.load(Ordering::Relaxed) {
            self.step(running, &mut sink);
        }

        info!("gps: stopping read loop");
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn stats(&self) -> Stats {
        Stats {
            read_errors: self.source.errors(),
            decode_failures: self.decode_failures,
            reports: self.reports,
            ..*self.stream.stats()
        }
    }

    /// Stop reading and give back the source and delay.
    pub fn release(self) -> (S, D) {
        self.source.into_inner()
    }
}
