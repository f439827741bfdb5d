//! Galileo I/NAV ephemeris, word types 1 to 5 (Galileo OS SIS ICD 4.3.5)
use log::{debug, warn};

use crate::{
    bits::{getbits, getbitu},
    constants::{
        C_1_2P19, C_1_2P29, C_1_2P31, C_1_2P32, C_1_2P33, C_1_2P34, C_1_2P43, C_1_2P46,
        C_1_2P5, C_1_2P59, GAL_WEEK_TO_GPS_WEEK, GPS_PI, HOUR_SECS,
    },
    ephemeris::{EphemerisData, EphemerisSource, KeplerEphemeris, INVALID_URA_VALUE},
    prelude::{Constellation, Ephemeris, Error, SignalId},
    signal::Code,
    time::GpsTime,
};

/// Data bytes of one I/NAV word (128 bits)
pub const GAL_INAV_CONTENT_BYTES: usize = 16;

/// Curve fit interval applied to I/NAV ephemerides [s]
pub const GAL_FIT_INTERVAL: u32 = 4 * HOUR_SECS;

const SF_TOE: f64 = 60.0;
const SF_TOC: f64 = 60.0;

/// Signal in space accuracy [m] from its broadcast index.
/// Spare and "no accuracy prediction" indexes map to [INVALID_URA_VALUE].
pub fn decode_sisa(index: u8) -> f64 {
    let n = index as f64;
    match index {
        0..=49 => n * 0.01,
        50..=74 => 0.5 + (n - 50.0) * 0.02,
        75..=99 => 1.0 + (n - 75.0) * 0.04,
        100..=125 => 2.0 + (n - 100.0) * 0.16,
        _ => INVALID_URA_VALUE,
    }
}

impl Ephemeris {
    /// Decodes I/NAV word types 1 to 5, in this order. The satellite number
    /// is taken from the broadcast SVID.
    ///
    /// `health_bits` packs E1-B HS (bits 0-1), E1-B DVS (bit 2),
    /// E5b HS (bits 3-4) and E5b DVS (bit 5).
    pub fn decode_gal_inav(
        code: Code,
        words: &[[u8; GAL_INAV_CONTENT_BYTES]; 5],
    ) -> Result<Self, Error> {
        if code.constellation() != Constellation::Galileo {
            return Err(Error::UnsupportedConstellation);
        }

        for (i, word) in words.iter().enumerate() {
            let word_type = getbitu(word, 0, 6) as usize;
            if word_type != i + 1 {
                debug!("galileo: word type {} found at position {}", word_type, i + 1);
                return Err(Error::Decoding("unexpected galileo word type"));
            }
        }

        let [w1, w2, w3, w4, w5] = words;

        // Word type 1
        let toe_tow = getbitu(w1, 16, 14) as f64 * SF_TOE;
        let m0 = getbits(w1, 30, 32) as f64 * (C_1_2P31 * GPS_PI);
        let ecc = getbitu(w1, 62, 32) as f64 * C_1_2P33;
        let sqrta = getbitu(w1, 94, 32) as f64 * C_1_2P19;

        // Word type 2
        let omega0 = getbits(w2, 16, 32) as f64 * (C_1_2P31 * GPS_PI);
        let inc = getbits(w2, 48, 32) as f64 * (C_1_2P31 * GPS_PI);
        let w = getbits(w2, 80, 32) as f64 * (C_1_2P31 * GPS_PI);
        let inc_dot = getbits(w2, 112, 14) as f64 * (C_1_2P43 * GPS_PI);

        // Word type 3
        let omegadot = getbits(w3, 16, 24) as f64 * (C_1_2P43 * GPS_PI);
        let dn = getbits(w3, 40, 16) as f64 * (C_1_2P43 * GPS_PI);
        let cuc = getbits(w3, 56, 16) as f64 * C_1_2P29;
        let cus = getbits(w3, 72, 16) as f64 * C_1_2P29;
        let crc = getbits(w3, 88, 16) as f64 * C_1_2P5;
        let crs = getbits(w3, 104, 16) as f64 * C_1_2P5;
        let sisa = getbitu(w3, 120, 8) as u8;

        // Word type 4
        let svid = getbitu(w4, 16, 6) as u16;
        let cic = getbits(w4, 22, 16) as f64 * C_1_2P29;
        let cis = getbits(w4, 38, 16) as f64 * C_1_2P29;
        let toc_tow = getbitu(w4, 54, 14) as f64 * SF_TOC;
        let af0 = getbits(w4, 68, 31) as f64 * C_1_2P34;
        let af1 = getbits(w4, 99, 21) as f64 * C_1_2P46;
        let af2 = getbits(w4, 120, 6) as f64 * C_1_2P59;

        // Word type 5
        let bgd_e1e5a = getbits(w5, 47, 10) as f64 * C_1_2P32;
        let bgd_e1e5b = getbits(w5, 57, 10) as f64 * C_1_2P32;
        let e5b_hs = getbitu(w5, 67, 2) as u8;
        let e1b_hs = getbitu(w5, 69, 2) as u8;
        let e5b_dvs = getbitu(w5, 71, 1) as u8;
        let e1b_dvs = getbitu(w5, 72, 1) as u8;
        let wn = getbitu(w5, 73, 12) as i32 + GAL_WEEK_TO_GPS_WEEK as i32;
        let tow = getbitu(w5, 85, 20) as f64;

        let sid = SignalId::new(code, svid);

        let iods = [w1, w2, w3, w4].map(|word| getbitu(word, 6, 10) as u16);
        let iod = iods[0];

        let iod_valid = iods.iter().all(|i| *i == iod);
        if !iod_valid {
            warn!("{} inconsistent iod_nav {:?}, invalidating ephemeris", sid, iods);
        }

        let dvs_valid = e1b_dvs == 0 && e5b_dvs == 0;
        if !dvs_valid {
            warn!(
                "{} data validity status e1b={} e5b={}, invalidating ephemeris",
                sid, e1b_dvs, e5b_dvs
            );
        }

        let tot = GpsTime::new(wn, tow);

        let mut toe = GpsTime::from_tow(toe_tow);
        toe.match_weeks(&tot);

        let mut toc = GpsTime::from_tow(toc_tow);
        toc.match_weeks(&tot);

        Ok(Self {
            sid,
            toe,
            ura: decode_sisa(sisa),
            fit_interval: GAL_FIT_INTERVAL,
            valid: iod_valid && dvs_valid && sid.valid(),
            health_bits: e1b_hs | (e1b_dvs << 2) | (e5b_hs << 3) | (e5b_dvs << 5),
            source: EphemerisSource::Inav,
            data: EphemerisData::Kepler(KeplerEphemeris {
                tgd: [bgd_e1e5a, bgd_e1e5b],
                crc,
                crs,
                cuc,
                cus,
                cic,
                cis,
                dn,
                m0,
                ecc,
                sqrta,
                omega0,
                omegadot,
                w,
                inc,
                inc_dot,
                af0,
                af1,
                af2,
                toc,
                iodc: iod,
                iode: iod,
            }),
        })
    }
}
