#[macro_use]
extern crate log;

use anyhow::Context;
use argh::FromArgs;
use env_logger::Env;
use linux_embedded_hal::{Delay, I2cdev};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gnss_i2c::source::I2cChunks;
use gnss_i2c::{Config, Reader, Report};

#[derive(FromArgs)]
/// Read and decode NMEA sentences from an I2C GNSS receiver.
struct GnssReader {
    /// configuration file.
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// i2c device, e.g. /dev/i2c-1.
    #[argh(option, short = 'd')]
    device: Option<PathBuf>,

    /// bus address of the receiver (decimal or 0x-prefixed hex).
    #[argh(option, short = 'a', from_str_fn(parse_address))]
    address: Option<u8>,

    /// print reports as JSON, one per line.
    #[argh(switch)]
    json: bool,

    /// verbose diagnostics, including raw chunks.
    #[argh(switch)]
    debug: bool,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let r = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };

    r.map_err(|e| format!("invalid address {:?}: {}", s, e))
}

fn print_report(r: &Report, json: bool) {
    if json {
        match serde_json::to_string(r) {
            Ok(s) => println!("{}", s),
            Err(e) => error!("could not serialize report: {}", e),
        }
    } else {
        println!("{}", r);
    }
}

fn main() -> anyhow::Result<()> {
    let args: GnssReader = argh::from_env();

    let filter = if args.debug {
        "info,gnss_i2c=trace,gnss_reader=debug"
    } else {
        "warn,gnss_i2c=info,gnss_reader=info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    let mut config = match &args.config {
        Some(p) => Config::from_path(p).with_context(|| format!("loading {:?}", p))?,
        None => Config::default(),
    };

    if let Some(device) = args.device {
        config.device = device;
    }

    if let Some(address) = args.address {
        config.address = address;
    }

    config.raw_debug |= args.debug;
    config.validate()?;

    debug!("config: {:#?}", config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("could not install Ctrl-C handler")?;

    info!("opening {:?}", config.device);
    let i2c = I2cdev::new(&config.device)
        .with_context(|| format!("could not open {:?}", config.device))?;

    eprintln!(
        "reading GPS at {:#04x} on {:?}, aggregating {} ms. Ctrl-C to stop.",
        config.address, config.device, config.aggregate_ms
    );

    let chunks = I2cChunks::new(i2c, config.address);
    let json = args.json;
    let mut reader = Reader::new(chunks, Delay, config);

    reader.run(&running, |r| print_report(&r, json));

    reader.stats().log();

    let (chunks, _) = reader.release();
    drop(chunks.release());
    info!("i2c device closed");

    eprintln!("stopped.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses() {
        assert_eq!(parse_address("0x10"), Ok(0x10));
        assert_eq!(parse_address("0X42"), Ok(0x42));
        assert_eq!(parse_address("16"), Ok(16));
        assert!(parse_address("0x100").is_err());
        assert!(parse_address("gps").is_err());
    }
}
