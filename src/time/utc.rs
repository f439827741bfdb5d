//! UTC offsets and broken down UTC time.
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bits::{sign_extend, word_bits},
    constants::{C_1_2P30, C_1_2P50, DAY_SECS, GPS_WEEK_REFERENCE, HOUR_SECS, MINUTE_SECS},
    prelude::Error,
    time::{adjust_week_cycle256, calendar::is_leap_year, GpsTime, DAY},
};

/// Modified julian day of the GPS epoch
pub(crate) const MJD_JAN_6_1980: i64 = 44244;

/// Modified julian day of the 1st of January 1601
const MJD_JAN_1_1601: i64 = -94187;

const YEAR_DAYS: i64 = 365;
const FOUR_YEARS_DAYS: i64 = 4 * YEAR_DAYS + 1;
const HUNDRED_YEARS_DAYS: i64 = 24 * FOUR_YEARS_DAYS + 4 * YEAR_DAYS;
const FOUR_HUNDRED_YEARS_DAYS: i64 = 3 * HUNDRED_YEARS_DAYS + 25 * FOUR_YEARS_DAYS;

/// Cumulated days at the end of each month, for regular and leap years.
const DAYS_AFTER_MONTH: [[u16; 13]; 2] = [
    [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365],
    [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335, 366],
];

/// Start of every positive leap second event `(week, tow, GPS-UTC offset after the event)`.
#[rustfmt::skip]
const UTC_LEAPS: [(i32, u32, i8); 18] = [
    (77, 259200, 1),      // 01-07-1981
    (129, 345601, 2),     // 01-07-1982
    (181, 432002, 3),     // 01-07-1983
    (286, 86403, 4),      // 01-07-1985
    (416, 432004, 5),     // 01-01-1988
    (521, 86405, 6),      // 01-01-1990
    (573, 172806, 7),     // 01-01-1991
    (651, 259207, 8),     // 01-07-1992
    (703, 345608, 9),     // 01-07-1993
    (755, 432009, 10),    // 01-07-1994
    (834, 86410, 11),     // 01-01-1996
    (912, 172811, 12),    // 01-07-1997
    (990, 432012, 13),    // 01-01-1999
    (1356, 13, 14),       // 01-01-2006
    (1512, 345614, 15),   // 01-01-2009
    (1695, 15, 16),       // 01-07-2012
    (1851, 259216, 17),   // 01-07-2015
    (1930, 17, 18),       // 01-01-2017
];

/// Week number until which the leap second table is known to be correct.
pub const UTC_LEAPS_EXPIRY_WEEK: i32 = 2425;

const UTC_SF_TOT: f64 = 4096.0;
const UTC_DATA_ID_BLOCK_II: u32 = 1;
const UTC_SVID: u32 = 56;
const UTC_MIN_DN: u32 = 1;
const UTC_MAX_DN: u32 = 7;

/// GPS to UTC conversion parameters, as broadcast in the GPS navigation message.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtcParams {
    /// Modulo one second offset from GPS to UTC (s)
    pub a0: f64,
    /// Drift of the offset (s/s)
    pub a1: f64,
    /// Drift rate of the offset (s/s²)
    pub a2: f64,
    /// Reference time of the parameters
    pub tot: GpsTime,
    /// Start of the leap second event
    pub t_lse: GpsTime,
    /// Leap second delta before the event (s)
    pub dt_ls: i8,
    /// Leap second delta after the event (s)
    pub dt_lsf: i8,
}

impl UtcParams {
    /// Parameters are usable once the leap second event time is known.
    pub fn valid(&self) -> bool {
        self.t_lse.week().is_some_and(|wn| wn > 0)
    }

    /// Decodes the UTC parameters from words 3 to 10 of LNAV subframe 4 page 18.
    /// `t_lse` is set to the exact GPS time the leap second event starts.
    pub fn decode(words: &[u32; 8]) -> Result<Self, Error> {
        let word = |n: usize| words[n - 3];

        let data_id = word_bits(word(3), 1, 2);
        let sv_id = word_bits(word(3), 3, 8);

        if data_id != UTC_DATA_ID_BLOCK_II || sv_id != UTC_SVID {
            return Err(Error::Decoding("not a utc parameters page"));
        }

        let a1 = sign_extend(word_bits(word(6), 1, 24), 24) as f64 * C_1_2P50;
        let a0 = ((word_bits(word(7), 1, 24) << 8) | word_bits(word(8), 1, 8)) as i32 as f64
            * C_1_2P30;

        let tot = word_bits(word(8), 9, 16) as f64 * UTC_SF_TOT;
        let wn_t = adjust_week_cycle256(word_bits(word(8), 17, 24) as u16, GPS_WEEK_REFERENCE);

        let dt_ls = word_bits(word(9), 1, 8) as u8 as i8;
        let wn_lsf = adjust_week_cycle256(word_bits(word(9), 9, 16) as u16, GPS_WEEK_REFERENCE);

        let dn = word_bits(word(9), 17, 24);
        if !(UTC_MIN_DN..=UTC_MAX_DN).contains(&dn) {
            debug!("utc parameters: invalid day number {}", dn);
            return Err(Error::Decoding("invalid leap second day number"));
        }

        let dt_lsf = word_bits(word(10), 1, 8) as u8 as i8;

        let tot = GpsTime::new(wn_t as i32, tot);

        // midnight close to the event, moved to the start of the event
        let mut t_lse = GpsTime::new(wn_lsf as i32, (dn * DAY_SECS) as f64);
        let correction = dt_ls as f64 + a0 + a1 * t_lse.difftime(&tot);
        t_lse.add_secs(correction);

        Ok(Self {
            a0,
            a1,
            a2: 0.0,
            tot,
            t_lse,
            dt_ls,
            dt_lsf,
        })
    }
}

/// Broken down UTC time
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UtcTm {
    /// Four digit year
    pub year: u16,
    /// Day of year (1..=366)
    pub year_day: u16,
    /// Month (1 = January)
    pub month: u8,
    /// Day of month (1..=31)
    pub month_day: u8,
    /// Day of week (1 = Monday, 7 = Sunday)
    pub week_day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Integer seconds (0..=60)
    pub second_int: u8,
    /// Fractional seconds
    pub second_frac: f64,
}

impl UtcTm {
    /// Breaks a (week, tow) pair into calendar components, ignoring leap seconds.
    pub fn from_week_tow(wn: i32, tow: f64) -> Self {
        let day_secs = tow % DAY;

        let mut second_int = day_secs.floor() as u32;
        let second_frac = day_secs % 1.0;
        let hour = second_int / HOUR_SECS;
        second_int -= hour * HOUR_SECS;
        let minute = second_int / MINUTE_SECS;
        second_int -= minute * MINUTE_SECS;

        let mjd = MJD_JAN_6_1980 + wn as i64 * 7 + (tow / DAY).floor() as i64;
        let days_since_1601 = mjd - MJD_JAN_1_1601;

        let num_400 = days_since_1601 / FOUR_HUNDRED_YEARS_DAYS;
        let mut days_left = days_since_1601 - num_400 * FOUR_HUNDRED_YEARS_DAYS;

        let num_100 =
            days_left / HUNDRED_YEARS_DAYS - days_left / (FOUR_HUNDRED_YEARS_DAYS - 1);
        days_left -= num_100 * HUNDRED_YEARS_DAYS;

        let num_4 = days_left / FOUR_YEARS_DAYS;
        days_left -= num_4 * FOUR_YEARS_DAYS;

        let num_regular = days_left / YEAR_DAYS - days_left / (FOUR_YEARS_DAYS - 1);

        let year = 1601 + num_400 * 400 + num_100 * 100 + num_4 * 4 + num_regular;
        let year_day = days_left - num_regular * YEAR_DAYS + 1;

        let table = &DAYS_AFTER_MONTH[is_leap_year(year as i32) as usize];

        let guess = (year_day as f64 * 0.032) as usize;
        let correction = (year_day - table[guess + 1] as i64 > 0) as usize;

        // 1st of January 1601 was a Monday
        let week_day = days_since_1601 % 7 + 1;

        Self {
            year: year as u16,
            year_day: year_day as u16,
            month: (guess + correction + 1) as u8,
            month_day: (year_day - table[guess + correction] as i64) as u8,
            week_day: week_day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second_int: second_int as u8,
            second_frac,
        }
    }

    /// Total seconds within the minute
    pub fn seconds(&self) -> f64 {
        self.second_int as f64 + self.second_frac
    }
}

impl GpsTime {
    /// GPS to UTC offset (s) at this GPS time. Uses the broadcast parameters
    /// when valid ones are provided, the leap second table otherwise.
    pub fn gps_utc_offset(&self, params: Option<&UtcParams>) -> f64 {
        if let Some(params) = params.filter(|p| p.valid()) {
            let dt = self.difftime(&params.tot);
            let mut dt_utc = params.a0 + params.a1 * dt + params.a2 * dt * dt;

            // new offset applies one second after the start of the event
            if self.difftime(&params.t_lse) >= 1.0 {
                dt_utc += params.dt_lsf as f64;
            } else {
                dt_utc += params.dt_ls as f64;
            }
            return dt_utc;
        }

        UTC_LEAPS
            .iter()
            .rev()
            .find(|(wn, tow, _)| self.difftime(&GpsTime::new(*wn, *tow as f64)) >= 1.0)
            .map_or(0.0, |(_, _, offset)| *offset as f64)
    }

    /// True while a positive leap second is being inserted.
    pub fn is_leap_second_event(&self, params: Option<&UtcParams>) -> bool {
        if let Some(params) = params.filter(|p| p.valid()) {
            let dt = self.difftime(&params.t_lse);
            return (0.0..1.0).contains(&dt);
        }

        for (wn, tow, _) in UTC_LEAPS.iter().rev() {
            let dt = self.difftime(&GpsTime::new(*wn, *tow as f64));
            if dt > 1.0 {
                return false;
            }
            if (0.0..1.0).contains(&dt) {
                return true;
            }
        }
        false
    }

    /// Converts to broken down UTC time. During a leap second event
    /// the returned time reads 23:59:60.
    pub fn to_utc(&self, params: Option<&UtcParams>) -> Result<UtcTm, Error> {
        let wn = self.week().ok_or(Error::UnknownWeek)?;
        if !self.valid() {
            return Err(Error::InvalidDate);
        }

        let dt_utc = self.gps_utc_offset(params);
        let leap_event = self.is_leap_second_event(params);

        let mut tow_utc = self.tow() - dt_utc;
        if leap_event {
            // 23:59:59 for now, the extra second is restored below
            tow_utc -= 1.0;
        }

        let t_utc = GpsTime::new(wn, tow_utc);
        let mut utc = UtcTm::from_week_tow(t_utc.week().unwrap_or(wn), t_utc.tow());

        if leap_event {
            utc.second_int += 1;
        }
        Ok(utc)
    }
}

/// UTC to GPS offset (s) for a UTC instant expressed as week and time of week.
pub fn utc_gps_offset(utc: &GpsTime, params: Option<&UtcParams>) -> f64 {
    if let Some(params) = params.filter(|p| p.valid()) {
        let dt = utc.difftime(&params.tot) + params.dt_ls as f64;
        let mut dt_utc = params.a0 + params.a1 * dt + params.a2 * dt * dt;

        if utc.difftime(&params.t_lse) >= -(params.dt_ls as f64) - dt_utc {
            dt_utc += params.dt_lsf as f64;
        } else {
            dt_utc += params.dt_ls as f64;
        }
        return -dt_utc;
    }

    UTC_LEAPS
        .iter()
        .rev()
        .find(|(wn, tow, offset)| {
            utc.difftime(&GpsTime::new(*wn, *tow as f64)) >= -(*offset as f64) + 1.0
        })
        .map_or(0.0, |(_, _, offset)| -(*offset as f64))
}
