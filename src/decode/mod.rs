//! Navigation message decoders.
//!
//! Each decoder turns the raw words of one navigation message into an
//! [Ephemeris](crate::prelude::Ephemeris) or an [Almanac](crate::almanac::Almanac).
//! Parity (or CRC) must be verified beforehand. Structural failures
//! (wrong subframe, page type or string number, unknown signal) are
//! reported as errors, while internal consistency failures of the
//! broadcast data only clear the `valid` flag.
mod almanac;
mod beidou;
mod galileo;
mod glonass;
mod gps;

pub use almanac::{AlmanacHealth, AlmanacRefWeek};
pub use beidou::{BDS_D1_PREAMBLE, BDS_FIT_INTERVAL};
pub use galileo::{decode_sisa, GAL_FIT_INTERVAL, GAL_INAV_CONTENT_BYTES};
pub use glonass::{GloNavFrame, GloString, GloStringCheck, GLO_NAV_STR_BITS};
