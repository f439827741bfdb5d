//! GLONASS time (Moscow time, four year cycles).
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DAY_SECS, HOUR_SECS, MINUTE_SECS},
    prelude::Error,
    time::{
        calendar::{days_in_month, is_leap_year},
        utc::utc_gps_offset,
        GpsTime, UtcParams,
    },
};

/// Moscow time is UTC + 3 hours
const UTC_SU_OFFSET_HOURS: u8 = 3;

const GLO_EPOCH_YEAR: u16 = 1996;
const GLO_EPOCH_WN: i32 = 834;
const GLO_EPOCH_TOW: f64 = 75610.0;

const GLO_N4_MIN: u8 = 1;
const GLO_N4_MAX: u8 = 31;

const GPS_EPOCH_YEAR: i32 = 1980;
/// Days of 1980 that follow the GPS epoch
const YEAR_1980_GPS_DAYS: i64 = 361;

fn year_days(year: i32) -> u16 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// GLONASS time, as broadcast in the navigation strings.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GloTime {
    /// Day number within the four year interval (1..=1461)
    pub nt: u16,
    /// Four year interval number, starting from 1996 (1..=31)
    pub n4: u8,
    pub h: u8,
    pub m: u8,
    /// Seconds, 60 and above during a leap second
    pub s: f64,
}

impl GloTime {
    pub fn new(nt: u16, n4: u8, h: u8, m: u8, s: f64) -> Self {
        Self { nt, n4, h, m, s }
    }

    /// Converts to GPS time. An ongoing leap second (`s >= 60`) is preserved.
    pub fn to_gps(&self, params: Option<&UtcParams>) -> Result<GpsTime, Error> {
        if !(GLO_N4_MIN..=GLO_N4_MAX).contains(&self.n4) {
            return Err(Error::InvalidDate);
        }

        let (year_of_cycle, day_of_year) = match self.nt {
            1..=366 => (1, self.nt),
            367..=731 => (2, self.nt - 366),
            732..=1096 => (3, self.nt - 366 - 365),
            1097..=1461 => (4, self.nt - 366 - 365 * 2),
            _ => return Err(Error::InvalidDate),
        };

        let glo_year = GLO_EPOCH_YEAR as i32 + 4 * (self.n4 as i32 - 1) + (year_of_cycle - 1);

        let mut days = YEAR_1980_GPS_DAYS + day_of_year as i64 - 1;
        for year in GPS_EPOCH_YEAR + 1..glo_year {
            days += year_days(year) as i64;
        }

        // an ongoing leap second is removed, then restored after conversion
        let leap_second = self.s >= 60.0;
        let s = if leap_second { self.s - 1.0 } else { self.s };

        // UTC, expressed as week and tow
        let tow = (days % 7) as f64 * DAY_SECS as f64
            + (self.h as f64 - UTC_SU_OFFSET_HOURS as f64) * HOUR_SECS as f64
            + self.m as f64 * MINUTE_SECS as f64
            + s;

        let t_utc = GpsTime::new((days / 7) as i32, tow);
        let wn = t_utc.week().ok_or(Error::UnknownWeek)?;

        let d_utc = utc_gps_offset(&t_utc, params);

        let mut correction = -d_utc;

        // leap second during this week
        let week_start = GpsTime::new(wn, 0.0);
        if utc_gps_offset(&week_start, params) < d_utc - 1.0 {
            correction += 1.0;
        }

        if leap_second {
            correction += 1.0;
        }

        Ok(t_utc + correction)
    }

    /// Converts a GPS time into GLONASS time. Times prior to the GLONASS epoch are rejected.
    pub fn from_gps(t: &GpsTime, params: Option<&UtcParams>) -> Result<Self, Error> {
        let epoch = GpsTime::new(GLO_EPOCH_WN, GLO_EPOCH_TOW);
        if t.difftime(&epoch) < 0.0 {
            return Err(Error::InvalidDate);
        }

        let mut u = t.to_utc(params)?;

        u.hour += UTC_SU_OFFSET_HOURS;

        if u.hour >= 24 {
            u.month_day += 1;
            u.week_day += 1;
            u.year_day += 1;
            u.hour -= 24;

            if u.week_day > 7 {
                u.week_day = 1;
            }

            if u.month_day > days_in_month(u.year as i32, u.month) {
                u.month += 1;
                u.month_day = 1;
                if u.month > 12 {
                    u.year += 1;
                    u.month = 1;
                    u.year_day = 1;
                }
            }
        }

        let n4 = (u.year - GLO_EPOCH_YEAR) / 4 + 1;

        let cycle_start = GLO_EPOCH_YEAR + (n4 - 1) * 4;
        let nt = u.year_day
            + (cycle_start..u.year)
                .map(|year| year_days(year as i32))
                .sum::<u16>();

        Ok(Self {
            nt,
            n4: n4 as u8,
            h: u.hour,
            m: u.minute,
            s: u.seconds(),
        })
    }
}
