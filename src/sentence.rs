//! Decoding of single frames with the `nmea` parser.
use chrono::NaiveTime;
use core::fmt;
use nmea::sentences::FixType;
use nmea::ParseResult;

use crate::stream::Frame;

/// A decoded sentence, reduced to what the dispatcher needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `GGA`: position, quality and satellites.
    Fix {
        time: Option<NaiveTime>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        quality: Option<FixType>,
        satellites: Option<u32>,
        hdop: Option<f32>,
        altitude: Option<f32>,
    },

    /// `RMC` or `VTG`: speed over ground (knots) and true course (degrees).
    Velocity {
        sentence: &'static str,
        time: Option<NaiveTime>,
        speed_knots: Option<f32>,
        course: Option<f32>,
    },

    /// Anything else the parser understands, by sentence type.
    Other(&'static str),
}

/// A frame the parser refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub sentence: String,
    pub reason: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse {:?}: {}", self.sentence, self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// Decode one complete frame.
pub fn decode(frame: &Frame<'_>) -> Result<Message, DecodeError> {
    let s = frame.as_str();

    let parsed = nmea::parse_str(s).map_err(|e| DecodeError {
        sentence: s.to_string(),
        reason: e.to_string(),
    })?;

    Ok(match parsed {
        ParseResult::GGA(gga) => Message::Fix {
            time: gga.fix_time,
            latitude: gga.latitude,
            longitude: gga.longitude,
            quality: gga.fix_type,
            satellites: gga.fix_satellites,
            hdop: gga.hdop,
            altitude: gga.altitude,
        },
        ParseResult::RMC(rmc) => Message::Velocity {
            sentence: "RMC",
            time: rmc.fix_time,
            speed_knots: rmc.speed_over_ground,
            course: rmc.true_course,
        },
        ParseResult::VTG(vtg) => Message::Velocity {
            sentence: "VTG",
            time: None,
            speed_knots: vtg.speed_over_ground,
            course: vtg.true_course,
        },
        ParseResult::GSA(_) => Message::Other("GSA"),
        ParseResult::GSV(_) => Message::Other("GSV"),
        ParseResult::GLL(_) => Message::Other("GLL"),
        ParseResult::TXT(_) => Message::Other("TXT"),
        _ => Message::Other("other"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{extract, Accumulator};
    use approx::assert_abs_diff_eq;

    fn decode_str(s: &str) -> Result<Message, DecodeError> {
        let mut acc = Accumulator::new(4096, 1024);
        acc.ingest(s.as_bytes());
        let frames = extract(&mut acc);
        assert_eq!(frames.len(), 1, "not a single frame: {:?}", s);
        decode(&frames.get(0).unwrap())
    }

    #[test]
    fn decode_gga() {
        let m = decode_str(
            "$GPGGA,092750.000,5321.6802,N,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*76\r\n",
        )
        .unwrap();

        match m {
            Message::Fix {
                time,
                latitude,
                longitude,
                quality,
                satellites,
                hdop,
                altitude,
            } => {
                assert_eq!(time, NaiveTime::from_hms_opt(9, 27, 50));
                assert_abs_diff_eq!(latitude.unwrap(), 53.361336, epsilon = 1e-5);
                assert_abs_diff_eq!(longitude.unwrap(), -6.505620, epsilon = 1e-5);
                assert_eq!(quality, Some(FixType::Gps));
                assert_eq!(satellites, Some(8));
                assert_abs_diff_eq!(hdop.unwrap(), 1.03, epsilon = 1e-4);
                assert_abs_diff_eq!(altitude.unwrap(), 61.7, epsilon = 1e-4);
            }
            m => panic!("expected fix: {:?}", m),
        }
    }

    #[test]
    fn decode_rmc() {
        let m = decode_str(
            "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
        )
        .unwrap();

        match m {
            Message::Velocity {
                sentence,
                speed_knots,
                course,
                ..
            } => {
                assert_eq!(sentence, "RMC");
                assert_abs_diff_eq!(speed_knots.unwrap(), 22.4, epsilon = 1e-4);
                assert_abs_diff_eq!(course.unwrap(), 84.4, epsilon = 1e-4);
            }
            m => panic!("expected velocity: {:?}", m),
        }
    }

    #[test]
    fn decode_vtg() {
        let m = decode_str("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48").unwrap();

        match m {
            Message::Velocity {
                sentence,
                speed_knots,
                course,
                ..
            } => {
                assert_eq!(sentence, "VTG");
                assert_abs_diff_eq!(speed_knots.unwrap(), 5.5, epsilon = 1e-4);
                assert_abs_diff_eq!(course.unwrap(), 54.7, epsilon = 1e-4);
            }
            m => panic!("expected velocity: {:?}", m),
        }
    }

    #[test]
    fn other_sentences_are_passed_through() {
        let m = decode_str(
            "$GPGSV,3,1,11,03,03,111,00,04,15,270,00,06,01,010,00,13,06,292,00*74",
        )
        .unwrap();
        assert_eq!(m, Message::Other("GSV"));
    }

    #[test]
    fn wrong_checksum_is_a_decode_error() {
        // Framing accepts it, the parser does not.
        let e = decode_str("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*00")
            .unwrap_err();
        assert!(e.sentence.ends_with("*00"));
        assert!(!e.reason.is_empty());
    }

    #[test]
    fn garbage_frames_are_decode_errors() {
        assert!(decode_str("$GPRMC,abc*07").is_err());
        assert!(decode_str("$*00").is_err());
    }
}
