//! Chunked reads from the receiver.
//!
//! The receiver has no notion of a message length on I2C: every read returns exactly as many
//! bytes as requested, padded with `\n` when its output buffer is empty. Reads may fail
//! transiently when the bus is busy or the receiver is clock-stretching.
use core::fmt::Debug;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::Read;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Something that yields raw bytes in bounded chunks.
pub trait ChunkSource {
    type Error: Debug;

    /// Fill (part of) `buf`, returning the number of bytes read.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Reads chunks from a device at a fixed bus address.
pub struct I2cChunks<I2C: Read> {
    i2c: I2C,
    address: u8,
}

impl<I2C: Read> I2cChunks<I2C> {
    pub fn new(i2c: I2C, address: u8) -> I2cChunks<I2C> {
        I2cChunks { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> ChunkSource for I2cChunks<I2C>
where
    I2C: Read,
    I2C::Error: Debug,
{
    type Error = I2C::Error;

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.i2c.read(self.address, buf)?;
        Ok(buf.len())
    }
}

/// Wraps a [`ChunkSource`] so that failed reads are logged, followed by a short backoff, and
/// turned into empty chunks. The read loop never sees a transport error.
pub struct Retry<S: ChunkSource, D: DelayMs<u32>> {
    source: S,
    delay: D,
    backoff_ms: u32,
    buf: Vec<u8>,
    errors: u64,
}

impl<S: ChunkSource, D: DelayMs<u32>> Retry<S, D> {
    pub fn new(source: S, delay: D, capacity: usize, backoff_ms: u32) -> Retry<S, D> {
        Retry {
            source,
            delay,
            backoff_ms,
            buf: vec![0u8; capacity],
            errors: 0,
        }
    }

    /// Read up to `capacity` bytes (clamped to the scratch buffer). Empty on error.
    pub fn read_chunk(&mut self, capacity: usize) -> &[u8] {
        let capacity = capacity.min(self.buf.len());

        match self.source.read_chunk(&mut self.buf[..capacity]) {
            Ok(n) => &self.buf[..n.min(capacity)],
            Err(e) => {
                self.errors += 1;
                warn!("gps: i2c read error: {:?}, backing off {} ms", e, self.backoff_ms);
                self.delay.delay_ms(self.backoff_ms);
                &[]
            }
        }
    }

    /// Wait using the wrapped delay.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Failed reads so far.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn into_inner(self) -> (S, D) {
        (self.source, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Script {
        reads: Vec<Result<&'static [u8], ()>>,
    }

    impl ChunkSource for Script {
        type Error = ();

        fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            let r = self.reads.remove(0)?;
            let n = r.len().min(buf.len());
            buf[..n].copy_from_slice(&r[..n]);
            Ok(n)
        }
    }

    #[derive(Default)]
    struct Sleeps(Vec<u32>);

    impl DelayMs<u32> for Sleeps {
        fn delay_ms(&mut self, ms: u32) {
            self.0.push(ms);
        }
    }

    #[test]
    fn error_becomes_empty_chunk() {
        let s = Script {
            reads: vec![Ok(b"$GP"), Err(()), Ok(b"GGA")],
        };
        let mut r = Retry::new(s, Sleeps::default(), 8, 200);

        assert_eq!(r.read_chunk(8), b"$GP");
        assert_eq!(r.read_chunk(8), b"");
        assert_eq!(r.read_chunk(8), b"GGA");
        assert_eq!(r.errors(), 1);

        let (_, sleeps) = r.into_inner();
        assert_eq!(sleeps.0, vec![200]);
    }

    #[test]
    fn capacity_is_clamped() {
        let s = Script {
            reads: vec![Ok(b"0123456789")],
        };
        let mut r = Retry::new(s, Sleeps::default(), 4, 200);
        assert_eq!(r.read_chunk(128), b"0123");
    }

    struct Bus {
        addr: Option<u8>,
    }

    impl Read for Bus {
        type Error = ();

        fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), ()> {
            self.addr = Some(address);
            buffer.fill(b'\n');
            Ok(())
        }
    }

    #[test]
    fn i2c_read_fills_chunk() {
        let mut c = I2cChunks::new(Bus { addr: None }, 0x10);
        let mut buf = [0u8; 16];
        assert_eq!(c.read_chunk(&mut buf).unwrap(), 16);
        assert_eq!(buf, [b'\n'; 16]);
        assert_eq!(c.release().addr, Some(0x10));
    }
}
