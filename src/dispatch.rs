//! Turns decoded messages into output lines.
use chrono::NaiveTime;
use core::fmt;
use serde::Serialize;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::sentence::Message;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Report {
    #[serde(rename = "fix")]
    Fix {
        time: Option<NaiveTime>,
        lat: Option<f64>,
        lon: Option<f64>,
        quality: Option<String>,
        satellites: Option<u32>,
    },

    #[serde(rename = "velocity")]
    Velocity {
        sentence: &'static str,
        time: Option<NaiveTime>,
        /// knots
        speed: Option<f32>,
        /// degrees, true north
        course: Option<f32>,
    },
}

/// Prints `None` for a missing value, otherwise the value with the caller's precision.
struct Opt<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Opt<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("None"),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Fix {
                lat,
                lon,
                quality,
                satellites,
                ..
            } => write!(
                f,
                "GGA - lat: {:.6}, lon: {:.6}, quality: {}, satellites: {}",
                Opt(lat),
                Opt(lon),
                Opt(quality),
                Opt(satellites)
            ),
            Report::Velocity {
                sentence,
                speed,
                course,
                ..
            } => write!(
                f,
                "{} - speed: {:.1} knots, course: {:.1} deg",
                sentence,
                Opt(speed),
                Opt(course)
            ),
        }
    }
}

/// Route a message by kind. Unhandled sentence types give nothing.
pub fn dispatch(msg: &Message) -> Option<Report> {
    match msg {
        Message::Fix {
            time,
            latitude,
            longitude,
            quality,
            satellites,
            ..
        } => {
            if latitude.is_none() || longitude.is_none() {
                debug!("gps: no position yet, {} satellites", Opt(satellites));
            }

            Some(Report::Fix {
                time: *time,
                lat: *latitude,
                lon: *longitude,
                quality: quality.as_ref().map(|q| format!("{:?}", q)),
                satellites: *satellites,
            })
        }
        Message::Velocity {
            sentence,
            time,
            speed_knots,
            course,
        } => Some(Report::Velocity {
            sentence: *sentence,
            time: *time,
            speed: *speed_knots,
            course: *course,
        }),
        Message::Other(kind) => {
            trace!("gps: ignoring {}", kind);
            None
        }
    }
}
