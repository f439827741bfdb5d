//! GPS time keeping: week number and time of week.
use std::cmp::Ordering;

use hifitime::{Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DAY_SECS, GPS_WEEK_REFERENCE, WEEK_SECS},
    prelude::Error,
};

mod calendar;
mod glonass;
mod utc;

pub use calendar::{date_to_mjd, days_in_month, is_leap_year, Date};
pub use glonass::GloTime;
pub use utc::{UtcParams, UtcTm};

/// Last week number considered plausible by [GpsTime::current_valid]
pub const GPS_MAX_WEEK: i32 = 2899;

/// Unix time of the GPS epoch (6th of January 1980)
pub const GPS_EPOCH_UNIX: i64 = 315_964_800;

/// Two times closer than this are considered equal.
const EQUALITY_EPS: f64 = 1.0E-12;

const WEEK: f64 = WEEK_SECS as f64;
pub(crate) const DAY: f64 = DAY_SECS as f64;

/// [GpsTime] is a point in GPS time expressed as a week counter and
/// a number of seconds within that week. The week may be unknown, in which case
/// only the time of week is meaningful and comparisons assume both
/// times lie within half a week of each other.
#[derive(Debug, Default, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsTime {
    wn: Option<i32>,
    tow: f64,
}

impl GpsTime {
    /// Builds a new [GpsTime], carrying whole weeks of `tow` into the week counter.
    pub fn new(wn: i32, tow: f64) -> Self {
        let mut t = Self { wn: Some(wn), tow };
        t.normalize();
        t
    }

    /// Builds a [GpsTime] with unknown week number. `tow` is wrapped into a single week.
    pub fn from_tow(tow: f64) -> Self {
        let mut t = Self { wn: None, tow };
        t.normalize();
        t
    }

    /// Week number, if known.
    pub fn week(&self) -> Option<i32> {
        self.wn
    }

    /// Seconds within the week
    pub fn tow(&self) -> f64 {
        self.tow
    }

    /// Copies self, replacing the week number.
    pub fn with_week(&self, wn: i32) -> Self {
        Self::new(wn, self.tow)
    }

    /// True when the week is known and positive and the time of week lies within [0, 1 week).
    pub fn valid(&self) -> bool {
        self.tow.is_finite()
            && self.tow >= 0.0
            && self.tow < WEEK
            && self.wn.is_some_and(|wn| wn >= 0)
    }

    /// True when [Self::valid] and the week lies within the current GPS week cycle.
    pub fn current_valid(&self) -> bool {
        self.valid()
            && self
                .wn
                .is_some_and(|wn| wn >= GPS_WEEK_REFERENCE as i32 && wn < GPS_MAX_WEEK)
    }

    fn normalize(&mut self) {
        if !self.tow.is_finite() {
            return;
        }

        match self.wn.as_mut() {
            None => {
                self.tow = self.tow.rem_euclid(WEEK);
                if self.tow >= WEEK {
                    self.tow -= WEEK;
                }
            },
            Some(wn) => {
                let weeks = (self.tow / WEEK).floor();
                self.tow -= weeks * WEEK;
                *wn += weeks as i32;

                while self.tow < 0.0 {
                    self.tow += WEEK;
                    *wn -= 1;
                }
                while self.tow >= WEEK {
                    self.tow -= WEEK;
                    *wn += 1;
                }
            },
        }
    }

    /// Adds (or subtracts) seconds, carrying into the week number.
    pub fn add_secs(&mut self, secs: f64) {
        self.tow += secs;
        self.normalize();
    }

    /// Time difference `self - rhs` in seconds.
    /// When either week is unknown, the result is folded into ±half a week.
    pub fn difftime(&self, rhs: &Self) -> f64 {
        let mut dt = self.tow - rhs.tow;
        match (self.wn, rhs.wn) {
            (Some(wn), Some(rhs_wn)) => {
                dt += (wn - rhs_wn) as f64 * WEEK;
            },
            _ => {
                if dt > WEEK / 2.0 {
                    dt -= WEEK;
                }
                if dt < -WEEK / 2.0 {
                    dt += WEEK;
                }
            },
        }
        dt
    }

    /// Fills in an unknown week number from `reference`, assuming
    /// both times are less than half a week apart.
    pub fn match_weeks(&mut self, reference: &Self) {
        let Some(ref_wn) = reference.wn else {
            return;
        };

        let dt = self.tow - reference.tow;

        self.wn = Some(if dt > WEEK / 2.0 {
            ref_wn - 1
        } else if dt < -WEEK / 2.0 {
            ref_wn + 1
        } else {
            ref_wn
        });
    }

    /// True if `begin <= self <= end`
    pub fn in_range(&self, begin: &Self, end: &Self) -> bool {
        let since_begin = self.difftime(begin);
        if since_begin < 0.0 {
            return false;
        }
        since_begin <= end.difftime(begin)
    }

    /// Rounds to the nearest solution epoch, for a solution rate in Hz.
    pub fn round_to_epoch(&self, soln_freq: f64) -> Self {
        let mut t = *self;
        t.tow = (self.tow * soln_freq).round() / soln_freq;
        t.normalize();
        t
    }

    /// Rounds down to the previous solution epoch, for a solution rate in Hz.
    pub fn floor_to_epoch(&self, soln_freq: f64) -> Self {
        let mut t = *self;
        t.tow = (self.tow * soln_freq).floor() / soln_freq;
        t.normalize();
        t
    }

    /// Converts to Unix time, applying the leap second table.
    pub fn to_unix(&self) -> Result<i64, Error> {
        let wn = self.wn.ok_or(Error::UnknownWeek)?;
        if !self.valid() {
            return Err(Error::InvalidDate);
        }

        let leap = self.gps_utc_offset(None) as i64;
        Ok(GPS_EPOCH_UNIX - leap + WEEK_SECS as i64 * wn as i64 + self.tow as i64)
    }

    /// Builds a [GpsTime] from a Unix timestamp already expressed in GPS time
    /// (no leap second correction).
    pub fn from_unix_gpst(t_unix: i64) -> Result<Self, Error> {
        let since_epoch = t_unix - GPS_EPOCH_UNIX;
        if since_epoch < 0 {
            return Err(Error::InvalidDate);
        }

        let wn = since_epoch / WEEK_SECS as i64;
        let tow = since_epoch - wn * WEEK_SECS as i64;
        Ok(Self::new(wn as i32, tow as f64))
    }

    /// Day of year (0 = 1st of January), in UTC.
    pub fn day_of_year(&self) -> Result<u16, Error> {
        Ok(self.to_utc(None)?.year_day - 1)
    }
}

/// Recovers the absolute week number from a week counter broadcast modulo 1024.
/// The result is never earlier than `wn_ref`.
pub fn adjust_week_cycle(wn_raw: u16, wn_ref: u16) -> u16 {
    if wn_raw >= wn_ref {
        return wn_raw;
    }
    wn_raw + 1024 * ((wn_ref + 1023 - wn_raw) / 1024)
}

/// Recovers the absolute week number from a week counter broadcast modulo 256.
/// The result is never earlier than `wn_ref`.
pub fn adjust_week_cycle256(wn_raw: u16, wn_ref: u16) -> u16 {
    if wn_raw >= wn_ref {
        return wn_raw;
    }
    wn_raw + 256 * ((wn_ref + 255 - wn_raw) / 256)
}

impl PartialEq for GpsTime {
    fn eq(&self, other: &Self) -> bool {
        if self.wn.is_none() != other.wn.is_none() {
            return false;
        }
        self.difftime(other).abs() < EQUALITY_EPS
    }
}

impl PartialOrd for GpsTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        self.difftime(other).partial_cmp(&0.0)
    }
}

impl std::ops::Add<f64> for GpsTime {
    type Output = Self;
    fn add(mut self, secs: f64) -> Self {
        self.add_secs(secs);
        self
    }
}

impl std::ops::Sub<f64> for GpsTime {
    type Output = Self;
    fn sub(mut self, secs: f64) -> Self {
        self.add_secs(-secs);
        self
    }
}

impl std::ops::AddAssign<f64> for GpsTime {
    fn add_assign(&mut self, secs: f64) {
        self.add_secs(secs);
    }
}

impl std::fmt::Display for GpsTime {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.wn {
            Some(wn) => write!(fmt, "{}:{:.3}", wn, self.tow),
            None => write!(fmt, "????:{:.3}", self.tow),
        }
    }
}

impl TryFrom<GpsTime> for Epoch {
    type Error = Error;
    fn try_from(t: GpsTime) -> Result<Self, Self::Error> {
        let wn = t.wn.ok_or(Error::UnknownWeek)?;
        if !t.valid() {
            return Err(Error::InvalidDate);
        }

        let nanos = (t.tow * 1.0E9).round() as u64;
        Ok(Epoch::from_time_of_week(wn as u32, nanos, TimeScale::GPST))
    }
}

impl From<Epoch> for GpsTime {
    fn from(epoch: Epoch) -> Self {
        let (week, nanos) = epoch.to_time_scale(TimeScale::GPST).to_time_of_week();
        let secs = (nanos / 1_000_000_000) as f64;
        let frac = (nanos % 1_000_000_000) as f64 * 1.0E-9;
        Self::new(week as i32, secs + frac)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::init_logger;
    use rand::{prelude::*, rngs::SmallRng, SeedableRng};
    use rstest::rstest;

    fn unknown(tow: f64) -> GpsTime {
        GpsTime::from_tow(tow)
    }

    #[test]
    fn difftime() {
        init_logger();

        let cases = [
            (GpsTime::new(1234, 567890.0), GpsTime::new(1234, 567890.0), 0.0),
            (GpsTime::new(1234, 567890.0), GpsTime::new(1234, 0.0), 567890.0),
            (unknown(567890.0), GpsTime::new(1234, 0.0), -36910.0),
            (GpsTime::new(2222, 222222.0), unknown(2222.0), 220000.0),
            (unknown(444444.0), unknown(2222.0), -162578.0),
            (GpsTime::new(1000, 604578.0), GpsTime::new(1001, 222.222), -444.222),
            (GpsTime::new(1001, 604578.0), GpsTime::new(1000, 222.222), 1209155.778),
            (GpsTime::new(5120, 0.0), GpsTime::new(1024, 0.0), 2477260800.0),
        ];

        for (a, b, expected) in cases {
            let dt = a.difftime(&b);
            assert!(
                (dt - expected).abs() < 1.0E-6,
                "{} - {}: got {}, expected {}",
                a,
                b,
                dt,
                expected
            );
        }
    }

    #[test]
    fn difftime_antisymmetry() {
        init_logger();

        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let a = GpsTime::new(rng.random_range(0..3000), rng.random_range(0.0..WEEK));
            let b = GpsTime::new(rng.random_range(0..3000), rng.random_range(0.0..WEEK));
            assert_eq!(a.difftime(&b), -b.difftime(&a));
        }
    }

    #[rstest]
    #[case(0.0, 1234, 0.0, 1234)]
    #[case(-1.0, 1234, WEEK - 1.0, 1233)]
    #[case(WEEK, 1234, 0.0, 1235)]
    #[case(WEEK * 2.0 + 10.0, 1234, 10.0, 1236)]
    #[case(-WEEK * 3.0 + 1.0, 1234, 1.0, 1231)]
    #[case(1.0E-9, 1234, 1.0E-9, 1234)]
    fn normalization(#[case] tow: f64, #[case] wn: i32, #[case] exp_tow: f64, #[case] exp_wn: i32) {
        init_logger();
        let t = GpsTime::new(wn, tow);
        assert_eq!(t.week(), Some(exp_wn));
        assert!((t.tow() - exp_tow).abs() < 1.0E-9);
        assert!(t.valid());
    }

    #[test]
    fn unknown_week_normalization() {
        init_logger();
        let t = GpsTime::from_tow(WEEK + 5.0);
        assert_eq!(t.week(), None);
        assert_eq!(t.tow(), 5.0);
        assert!(!t.valid());

        let t = GpsTime::from_tow(-5.0);
        assert_eq!(t.tow(), WEEK - 5.0);
    }

    #[rstest]
    #[case(unknown(0.0), GpsTime::new(1234, 0.0), Some(1234))]
    #[case(unknown(WEEK - 1.0), GpsTime::new(1234, 0.0), Some(1233))]
    #[case(unknown(0.0), GpsTime::new(1234, WEEK - 1.0), Some(1235))]
    #[case(unknown(WEEK - 1.0), GpsTime::new(1234, WEEK - 1.0), Some(1234))]
    #[case(unknown(2.0 * DAY), GpsTime::new(1234, 5.0 * DAY), Some(1234))]
    #[case(unknown(5.0 * DAY), GpsTime::new(1234, 2.0 * DAY), Some(1234))]
    #[case(unknown(0.0), GpsTime::new(1234, WEEK / 2.0), Some(1234))]
    #[case(unknown(WEEK / 2.0), GpsTime::new(1234, 0.0), Some(1234))]
    #[case(unknown(WEEK / 2.0 + 1.0), GpsTime::new(1234, 0.0), Some(1233))]
    #[case(unknown(0.0), GpsTime::new(1234, WEEK / 2.0 + 1.0), Some(1235))]
    #[case(unknown(DAY), unknown(2.0 * DAY), None)]
    #[case(unknown(DAY), unknown(6.0 * DAY), None)]
    fn week_matching(#[case] t: GpsTime, #[case] reference: GpsTime, #[case] expected: Option<i32>) {
        init_logger();
        let mut matched = t;
        matched.match_weeks(&reference);
        assert_eq!(matched.week(), expected);
        assert_eq!(matched.tow(), t.tow());
    }

    #[rstest]
    #[case(0, 2048)]
    #[case(1023, 2047)]
    #[case(GPS_WEEK_REFERENCE % 1024, GPS_WEEK_REFERENCE)]
    #[case(GPS_WEEK_REFERENCE % 1024 + 1, GPS_WEEK_REFERENCE + 1)]
    #[case(GPS_WEEK_REFERENCE % 1024 - 1, GPS_WEEK_REFERENCE + 1023)]
    #[case(GPS_WEEK_REFERENCE, GPS_WEEK_REFERENCE)]
    #[case(GPS_WEEK_REFERENCE + 1, GPS_WEEK_REFERENCE + 1)]
    fn week_cycle(#[case] raw: u16, #[case] expected: u16) {
        init_logger();
        let wn = adjust_week_cycle(raw, GPS_WEEK_REFERENCE);
        assert_eq!(wn, expected);
        assert!(wn >= GPS_WEEK_REFERENCE);
    }

    #[test]
    fn week_cycle256() {
        init_logger();
        for raw in 0..256 {
            let wn = adjust_week_cycle256(raw, GPS_WEEK_REFERENCE);
            assert!(wn >= GPS_WEEK_REFERENCE);
            assert!(wn < GPS_WEEK_REFERENCE + 256);
            assert_eq!(wn % 256, raw);
        }
    }

    #[test]
    fn range() {
        init_logger();
        let begin = GpsTime::new(1234, WEEK - 10.0);
        let end = GpsTime::new(1235, 10.0);

        assert!(GpsTime::new(1234, WEEK - 10.0).in_range(&begin, &end));
        assert!(GpsTime::new(1235, 0.0).in_range(&begin, &end));
        assert!(GpsTime::new(1235, 10.0).in_range(&begin, &end));
        assert!(!GpsTime::new(1235, 10.1).in_range(&begin, &end));
        assert!(!GpsTime::new(1234, WEEK - 10.1).in_range(&begin, &end));
    }

    #[rstest]
    #[case(GpsTime::new(1234, 567890.01), GpsTime::new(1234, 567890.0), GpsTime::new(1234, 567890.0))]
    #[case(GpsTime::new(1234, 567890.0501), GpsTime::new(1234, 567890.1), GpsTime::new(1234, 567890.0))]
    #[case(GpsTime::new(1234, 604799.96), GpsTime::new(1235, 0.0), GpsTime::new(1234, 604799.9))]
    fn epoch_rounding(#[case] t: GpsTime, #[case] rounded: GpsTime, #[case] floored: GpsTime) {
        init_logger();
        assert!(t.round_to_epoch(10.0).difftime(&rounded).abs() < 1.0E-9);
        assert!(t.floor_to_epoch(10.0).difftime(&floored).abs() < 1.0E-9);
    }

    #[test]
    fn equality_and_ordering() {
        init_logger();
        let a = GpsTime::new(1939, 42.0);
        assert_eq!(a, GpsTime::new(1938, WEEK + 42.0));
        assert_ne!(a, GpsTime::from_tow(42.0));
        assert!(a < GpsTime::new(1939, 42.5));
        assert!(a > GpsTime::new(1938, 604000.0));
        assert_eq!(a + 10.0, GpsTime::new(1939, 52.0));
        assert_eq!(a - 43.0, GpsTime::new(1938, WEEK - 1.0));
        assert_eq!(a.to_string(), "1939:42.000");
    }

    #[test]
    fn hifitime_conversion() {
        init_logger();

        let t = GpsTime::new(1939, 42.5);
        let epoch = Epoch::try_from(t).unwrap();
        assert_eq!(epoch.time_scale, TimeScale::GPST);
        assert_eq!(GpsTime::from(epoch), t);

        assert!(Epoch::try_from(GpsTime::from_tow(1.0)).is_err());

        // GPS epoch
        let epoch = Epoch::from_gregorian(1980, 1, 6, 0, 0, 0, 0, TimeScale::GPST);
        assert_eq!(GpsTime::from(epoch), GpsTime::new(0, 0.0));
    }

    #[test]
    fn unix_conversion() {
        init_logger();

        let t = GpsTime::new(1939, 42.0);
        let unix = t.to_unix().unwrap();
        assert_eq!(unix, GPS_EPOCH_UNIX - 18 + 1939 * 604800 + 42);

        let back = GpsTime::from_unix_gpst(unix + 18).unwrap();
        assert_eq!(back, t);

        assert!(GpsTime::from_tow(1.0).to_unix().is_err());
        assert!(GpsTime::from_unix_gpst(0).is_err());
    }
}
