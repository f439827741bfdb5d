//! Civil calendar and modified julian day conversions.
//!
//! These conversions ignore leap seconds and may be off by up to
//! one second on the day (or week) of a leap second.
use crate::{
    constants::{DAY_SECS, HOUR_SECS, MINUTE_SECS},
    prelude::Error,
    time::{
        utc::{utc_gps_offset, MJD_JAN_6_1980},
        GpsTime, UtcTm, DAY,
    },
};

const DAYS_IN_MONTH: [u8; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in this month (1 = January). Returns 0 for invalid months.
pub fn days_in_month(year: i32, month: u8) -> u8 {
    if month == 2 && is_leap_year(year) {
        return 29;
    }
    DAYS_IN_MONTH.get(month as usize).copied().unwrap_or(0)
}

/// Modified julian day of a gregorian date, valid from the 17th of November 1858.
pub fn date_to_mjd(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: f64) -> f64 {
    let full_days = 367 * year - 7 * (year + (month + 9) / 12) / 4
        - 3 * ((year + (month - 9) / 7) / 100 + 1) / 4
        + 275 * month / 9
        + day
        + 1721028
        - 2400000;

    let frac_days = hour as f64 / 24.0 + minute as f64 / (24.0 * 60.0) + second / DAY;
    full_days as f64 + frac_days
}

/// Gregorian date and time of day
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Date {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: f64,
}

impl Date {
    pub fn new(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: f64) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Gregorian date from modified julian day (Fliegel and van Flandern).
    pub fn from_mjd(mjd: f64) -> Self {
        let mut j = (mjd + 2400001.0 + 68569.0) as i32;
        let c = 4 * j / 146097;
        j -= (146097 * c + 3) / 4;
        let y = 4000 * (j + 1) / 1461001;
        j = j - 1461 * y / 4 + 31;
        let m = 80 * j / 2447;
        let day = j - 2447 * m / 80;
        j = m / 11;
        let month = m + 2 - 12 * j;
        let year = 100 * (c - 49) + y + j;

        let frac = mjd.fract();
        let hour = (frac * 24.0) as i32;
        let minute = ((frac - hour as f64 / 24.0) * 24.0 * 60.0) as i32;
        let second = (frac - hour as f64 / 24.0 - minute as f64 / 24.0 / 60.0) * DAY;

        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn to_mjd(&self) -> f64 {
        date_to_mjd(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
    }
}

impl From<&UtcTm> for Date {
    fn from(utc: &UtcTm) -> Self {
        Self::new(
            utc.year as i32,
            utc.month as i32,
            utc.month_day as i32,
            utc.hour as i32,
            utc.minute as i32,
            utc.seconds(),
        )
    }
}

/// Splits days since the GPS epoch into a (week, tow) pair.
fn days_to_week_tow(days: f64) -> GpsTime {
    let wn = (days / 7.0) as i32;
    GpsTime::new(wn, (days - wn as f64 * 7.0) * DAY)
}

impl UtcTm {
    pub fn from_mjd(mjd: f64) -> Self {
        let t = days_to_week_tow(mjd - MJD_JAN_6_1980 as f64);
        Self::from_week_tow(t.week().unwrap_or_default(), t.tow())
    }

    pub fn to_mjd(&self) -> f64 {
        Date::from(self).to_mjd()
    }

    pub fn from_date(year: i32, month: i32, day: i32, hour: i32, minute: i32, second: f64) -> Self {
        Self::from_mjd(date_to_mjd(year, month, day, hour, minute, second))
    }

    /// Greenwich mean sidereal time (rad, within [0, 2π)).
    /// `ut1_utc` is the UT1-UTC offset in seconds.
    pub fn gmst(&self, ut1_utc: f64) -> f64 {
        let mjd_2000 = date_to_mjd(2000, 1, 1, 12, 0, 0.0);

        let ut1 = Date::from_mjd(self.to_mjd() + ut1_utc / DAY);
        let midnight = date_to_mjd(ut1.year, ut1.month, ut1.day, 0, 0, 0.0);

        let ut = (ut1.hour as u32 * HOUR_SECS + ut1.minute as u32 * MINUTE_SECS) as f64 + ut1.second;

        let t1 = (midnight - mjd_2000) / 36525.0;
        let t2 = t1 * t1;
        let t3 = t2 * t1;

        let gmst0 = 24110.54841 + 8640184.812866 * t1 + 0.093104 * t2 - 6.2E-6 * t3;
        let gmst = gmst0 + 1.002737909350795 * ut;

        (gmst % DAY) * std::f64::consts::PI / (DAY_SECS / 2) as f64
    }
}

impl GpsTime {
    /// GPS time from a UTC modified julian day.
    pub fn from_mjd(mjd: f64) -> Self {
        let utc = days_to_week_tow(mjd - MJD_JAN_6_1980 as f64);
        let leap = utc_gps_offset(&utc, None);
        utc - leap
    }

    /// UTC modified julian day of this GPS time.
    pub fn to_mjd(&self) -> Result<f64, Error> {
        Ok(self.to_utc(None)?.to_mjd())
    }

    /// GPS time from a UTC gregorian date.
    pub fn from_date(date: &Date) -> Self {
        Self::from_mjd(date.to_mjd())
    }

    /// UTC gregorian date of this GPS time.
    pub fn to_date(&self) -> Result<Date, Error> {
        Ok(Date::from(&self.to_utc(None)?))
    }
}
