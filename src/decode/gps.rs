//! GPS and QZSS legacy navigation message (LNAV), IS-GPS-200 20.3.3
use log::{debug, warn};

use crate::{
    bits::{sign_extend, word_bits},
    constants::{
        C_1_2P19, C_1_2P29, C_1_2P31, C_1_2P33, C_1_2P43, C_1_2P5, C_1_2P55, GPS_PI,
        GPS_WEEK_REFERENCE, WEEK_SECS,
    },
    ephemeris::{
        decode_fit_interval, decode_ura_index, EphemerisData, EphemerisSource, KeplerEphemeris,
    },
    prelude::{Constellation, Ephemeris, Error, SignalId},
    time::{adjust_week_cycle, GpsTime},
};

const SF_TOE: f64 = 16.0;
const SF_TOC: f64 = 16.0;

/// Concatenates bits 17..=24 of `hi` with bits 1..=24 of `lo`.
fn split_word(hi: u32, lo: u32) -> u32 {
    (word_bits(hi, 17, 24) << 24) | word_bits(lo, 1, 24)
}

fn signed(word: u32, first: u32, last: u32) -> f64 {
    sign_extend(word_bits(word, first, last), last - first + 1) as f64
}

impl Ephemeris {
    /// Decodes words 3 to 10 of LNAV subframes 1, 2 and 3, 30 bit words
    /// right aligned. `tot_tow` is the time of week the frames were
    /// transmitted at, which resolves week rollovers of the reference time.
    pub fn decode_gps_lnav(
        sid: SignalId,
        frame_words: &[[u32; 8]; 3],
        tot_tow: f64,
    ) -> Result<Self, Error> {
        if !matches!(sid.constellation(), Constellation::GPS | Constellation::QZSS) {
            return Err(Error::InvalidSignal(sid));
        }

        let [sf1, sf2, sf3] = frame_words;
        let word = |sf: &[u32; 8], n: usize| sf[n - 3];

        // Subframe 1
        let wn = adjust_week_cycle(word_bits(word(sf1, 3), 1, 10) as u16, GPS_WEEK_REFERENCE);

        let toe_tow = word_bits(word(sf2, 10), 1, 16) as f64 * SF_TOE;
        let toe_valid = toe_tow < WEEK_SECS as f64;

        let toe = if toe_valid {
            // next week's ephemeris may still carry the current week number
            let mut toe = GpsTime::from_tow(toe_tow);
            toe.match_weeks(&GpsTime::new(wn as i32, tot_tow));
            toe
        } else {
            warn!(
                "{} faulty toe: wn {}, tow {}, invalidating ephemeris",
                sid, wn, toe_tow
            );
            GpsTime::new(wn as i32, 0.0)
        };

        let ura_index = word_bits(word(sf1, 3), 13, 16) as u8;
        let ura = decode_ura_index(ura_index);
        debug!("{} ura index {} ({} m)", sid, ura_index, ura);

        let health_bits = word_bits(word(sf1, 3), 17, 22) as u8;
        debug!("{} health bits 0x{:02x}", sid, health_bits);

        let tgd = signed(word(sf1, 7), 17, 24) * C_1_2P31;

        let iodc = ((word_bits(word(sf1, 3), 23, 24) << 8) | word_bits(word(sf1, 8), 1, 8)) as u16;

        let toc_tow = word_bits(word(sf1, 8), 9, 24) as f64 * SF_TOC;
        let toc = match toe.week() {
            Some(wn) => GpsTime::new(wn, toc_tow),
            None => GpsTime::from_tow(toc_tow),
        };

        let af2 = signed(word(sf1, 9), 1, 8) * C_1_2P55;
        let af1 = signed(word(sf1, 9), 9, 24) * C_1_2P43;
        let af0 = signed(word(sf1, 10), 1, 22) * C_1_2P31;

        // Subframe 2
        let iode_sf2 = word_bits(word(sf2, 3), 1, 8) as u16;
        let crs = signed(word(sf2, 3), 9, 24) * C_1_2P5;
        let dn = signed(word(sf2, 4), 1, 16) * (C_1_2P43 * GPS_PI);
        let m0 = split_word(word(sf2, 4), word(sf2, 5)) as i32 as f64 * (C_1_2P31 * GPS_PI);
        let cuc = signed(word(sf2, 6), 1, 16) * C_1_2P29;
        let ecc = split_word(word(sf2, 6), word(sf2, 7)) as f64 * C_1_2P33;
        let cus = signed(word(sf2, 8), 1, 16) * C_1_2P29;
        let sqrta = split_word(word(sf2, 8), word(sf2, 9)) as f64 * C_1_2P19;

        let fit_interval_flag = word_bits(word(sf2, 10), 17, 17) == 1;
        let fit_interval = decode_fit_interval(fit_interval_flag, iodc);
        debug!("{} fit interval {} s", sid, fit_interval);

        // Subframe 3
        let cic = signed(word(sf3, 3), 1, 16) * C_1_2P29;
        let omega0 = split_word(word(sf3, 3), word(sf3, 4)) as i32 as f64 * (C_1_2P31 * GPS_PI);
        let cis = signed(word(sf3, 5), 1, 16) * C_1_2P29;
        let inc = split_word(word(sf3, 5), word(sf3, 6)) as i32 as f64 * (C_1_2P31 * GPS_PI);
        let crc = signed(word(sf3, 7), 1, 16) * C_1_2P5;
        let w = split_word(word(sf3, 7), word(sf3, 8)) as i32 as f64 * (C_1_2P31 * GPS_PI);
        let omegadot = signed(word(sf3, 9), 1, 24) * (C_1_2P43 * GPS_PI);
        let iode = word_bits(word(sf3, 10), 1, 8) as u16;
        let inc_dot = signed(word(sf3, 10), 9, 22) * (C_1_2P43 * GPS_PI);

        // both IODEs and the 8 LSBs of IODC must match
        let iode_valid = iode_sf2 == iode && iode == (iodc & 0xFF);
        if !iode_valid {
            warn!(
                "{} iodc/iode mismatch (iodc=0x{:03X} iode=0x{:02X}/0x{:02X}), invalidating ephemeris",
                sid, iodc, iode_sf2, iode
            );
        }

        Ok(Self {
            sid,
            toe,
            ura,
            fit_interval,
            valid: iode_valid && toe_valid,
            health_bits,
            source: EphemerisSource::Lnav,
            data: EphemerisData::Kepler(KeplerEphemeris {
                // L1/L5 group delay is only broadcast in CNAV
                tgd: [tgd, 0.0],
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
                iodc,
                iode,
            }),
        })
    }
}
