//! GPS LNAV almanac pages, IS-GPS-200 20.3.3.5
use log::debug;

use crate::{
    almanac::{Almanac, AlmanacData, KeplerAlmanac},
    bits::{sign_extend, word_bits},
    constants::{
        C_1_2P11, C_1_2P19, C_1_2P20, C_1_2P21, C_1_2P23, C_1_2P38, GPS_PI, GPS_WEEK_REFERENCE,
        HOUR_SECS,
    },
    prelude::{Error, SignalId},
    signal::Code,
    time::{adjust_week_cycle256, GpsTime},
};

const SF_TOA: f64 = 4096.0;
const INC_OFFSET: f64 = 0.3;

/// Block II and later data ID
const DATA_ID_BLOCK_II: u32 = 1;

const MIN_PRN: u32 = 1;
const MAX_PRN: u32 = 32;

/// Subframe 5 page 25: reference week and health of SV 1 to 24
const SVID_WEEK: u32 = 51;
const SVID_HEALTH_5: u32 = SVID_WEEK;
/// Subframe 4 page 25: health of SV 25 to 32
const SVID_HEALTH_4: u32 = 63;

/// Almanacs are fit over at least 140 hours
const ALMANAC_FIT_INTERVAL: u32 = 140 * HOUR_SECS;

/// Almanac URE at normal operation [m]
const ALMANAC_URA: f64 = 900.0;

/// Data ID and SV ID of a page, word 3 bits 1-2 and 3-8.
fn page_id(words: &[u32; 8]) -> (u32, u32) {
    (word_bits(words[0], 1, 2), word_bits(words[0], 3, 8))
}

fn signed(word: u32, first: u32, last: u32) -> f64 {
    sign_extend(word_bits(word, first, last), last - first + 1) as f64
}

/// [AlmanacRefWeek] of the almanacs broadcast in subframes 4 and 5.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlmanacRefWeek {
    /// Week number, rollovers resolved
    pub wna: u16,
    /// Reference time of week [s]
    pub toa: u32,
}

impl AlmanacRefWeek {
    /// Decodes words 3 to 10 of subframe 5 page 25.
    pub fn decode(words: &[u32; 8]) -> Result<Self, Error> {
        if page_id(words) != (DATA_ID_BLOCK_II, SVID_WEEK) {
            return Err(Error::Decoding("not an almanac reference week page"));
        }

        let toa = word_bits(words[0], 9, 16) * SF_TOA as u32;
        let wna = adjust_week_cycle256(word_bits(words[0], 17, 24) as u16, GPS_WEEK_REFERENCE);

        debug!("almanac reference week {} toa {}", wna, toa);
        Ok(Self { wna, toa })
    }
}

/// Six bit health words of SV 1 to 32, as broadcast on page 25 of
/// subframes 4 and 5.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AlmanacHealth {
    /// Bit `sv - 1` is set when the health of `sv` was decoded
    pub health_bits_valid: u32,
    /// Indexed by `sv - 1`
    pub health_bits: [u8; 32],
}

impl AlmanacHealth {
    /// Decodes words 3 to 10 of page 25 of either subframe 4 or 5.
    pub fn decode(words: &[u32; 8]) -> Result<Self, Error> {
        let mut health = Self::default();

        match page_id(words) {
            (DATA_ID_BLOCK_II, SVID_HEALTH_4) => {
                // SV 25 in word 8, SV 26-29 in word 9, SV 30-32 in word 10
                health.health_bits[24] = word_bits(words[5], 19, 24) as u8;
                for i in 0..4 {
                    let first = 1 + 6 * i as u32;
                    health.health_bits[25 + i] = word_bits(words[6], first, first + 5) as u8;
                }
                for i in 0..3 {
                    let first = 1 + 6 * i as u32;
                    health.health_bits[29 + i] = word_bits(words[7], first, first + 5) as u8;
                }
                health.health_bits_valid = 0xFF00_0000;
            },
            (DATA_ID_BLOCK_II, SVID_HEALTH_5) => {
                // SV 1-24 in words 4 to 9
                for (w, word) in words[1..7].iter().enumerate() {
                    for i in 0..4 {
                        let first = 1 + 6 * i as u32;
                        health.health_bits[4 * w + i] = word_bits(*word, first, first + 5) as u8;
                    }
                }
                health.health_bits_valid = 0x00FF_FFFF;
            },
            _ => return Err(Error::Decoding("not an almanac health page")),
        }

        Ok(health)
    }

    /// Health word of `sv` (1 to 32), if decoded.
    pub fn get(&self, sv: u8) -> Option<u8> {
        let index = (sv as usize).checked_sub(1)?;
        if index >= 32 || self.health_bits_valid & (1 << index) == 0 {
            return None;
        }
        Some(self.health_bits[index])
    }

    /// Merges the health words decoded from the other subframe.
    pub fn merge(&mut self, other: &Self) {
        for index in 0..32 {
            if other.health_bits_valid & (1 << index) != 0 {
                self.health_bits[index] = other.health_bits[index];
            }
        }
        self.health_bits_valid |= other.health_bits_valid;
    }
}

impl Almanac {
    /// Decodes words 3 to 10 of an almanac page of subframe 4 or 5,
    /// 30 bit words right aligned. The reference week is unknown until
    /// [Almanac::set_week] is called with the [AlmanacRefWeek].
    pub fn decode_gps(words: &[u32; 8]) -> Result<Self, Error> {
        let (data_id, sv_id) = page_id(words);
        if data_id != DATA_ID_BLOCK_II || !(MIN_PRN..=MAX_PRN).contains(&sv_id) {
            return Err(Error::Decoding("not an almanac page"));
        }

        let word = |n: usize| words[n - 3];

        let toa = GpsTime::from_tow(word_bits(word(4), 1, 8) as f64 * SF_TOA);
        let health_bits = word_bits(word(5), 17, 24) as u8;

        let ecc = word_bits(word(3), 9, 24) as f64 * C_1_2P21;
        let inc = (signed(word(4), 9, 24) * C_1_2P19 + INC_OFFSET) * GPS_PI;
        let omegadot = signed(word(5), 1, 16) * (C_1_2P38 * GPS_PI);
        let sqrta = word_bits(word(6), 1, 24) as f64 * C_1_2P11;
        let omega0 = signed(word(7), 1, 24) * (C_1_2P23 * GPS_PI);
        let w = signed(word(8), 1, 24) * (C_1_2P23 * GPS_PI);
        let m0 = signed(word(9), 1, 24) * (C_1_2P23 * GPS_PI);

        // 8 MSBs then 3 LSBs, around af1
        let af0_raw = (word_bits(word(10), 1, 8) << 3) | word_bits(word(10), 20, 22);
        let af0 = sign_extend(af0_raw, 11) as f64 * C_1_2P20;
        let af1 = signed(word(10), 9, 19) * C_1_2P38;

        let sid = SignalId::new(Code::GpsL1ca, sv_id as u16);
        debug!("{} almanac toa {} health 0x{:02x}", sid, toa, health_bits);

        Ok(Self {
            sid,
            toa,
            ura: ALMANAC_URA,
            fit_interval: ALMANAC_FIT_INTERVAL,
            valid: true,
            health_bits,
            data: AlmanacData::Kepler(KeplerAlmanac {
                m0,
                ecc,
                sqrta,
                omega0,
                omegadot,
                w,
                inc,
                af0,
                af1,
            }),
        })
    }
}
