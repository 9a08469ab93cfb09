//! Reassembly and decoding of the NMEA stream of a GNSS receiver polled over I2C.
//!
//! The receiver (XA1110 and friends) hands out its output in fixed-size I2C reads that do
//! not respect sentence boundaries. Bytes are accumulated into a text buffer, complete
//! sentences are cut out of it, decoded and turned into [`dispatch::Report`]s.
//!
//! ```text
//! source -> stream (accumulate, extract) -> sentence (decode) -> dispatch
//!                     ^-- watchdog
//! ```
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

pub mod config;
pub mod dispatch;
pub mod reader;
pub mod sentence;
pub mod source;
pub mod stream;

pub use config::Config;
pub use dispatch::Report;
pub use reader::Reader;
pub use sentence::Message;
pub use stream::{Frame, Stream};

/// Counters kept by the read loop, logged when it stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub chunks: u64,
    pub bytes: u64,
    pub read_errors: u64,
    pub frames: u64,
    pub decode_failures: u64,
    pub reports: u64,
    pub overflow_trims: u64,
    pub watchdog_resets: u64,
}

impl Stats {
    pub fn log(&self) {
        info!(
            "chunks: {}, bytes: {}, read errors: {}, frames: {}, decode failures: {}, reports: {}, overflow trims: {}, watchdog resets: {}",
            self.chunks,
            self.bytes,
            self.read_errors,
            self.frames,
            self.decode_failures,
            self.reports,
            self.overflow_trims,
            self.watchdog_resets
        );
    }
}
