//! BeiDou D1 navigation message, subframes 1 to 3 (BDS-SIS-ICD-2.0 5.2.4)
use log::{debug, warn};

use crate::{
    bits::{getbits, getbitu, setbitu},
    constants::{
        BDS_WEEK_TO_GPS_WEEK, C_1_2P19, C_1_2P31, C_1_2P33, C_1_2P43, C_1_2P50, C_1_2P6,
        C_1_2P66, GPS_PI, HOUR_SECS, WEEK_SECS,
    },
    ephemeris::{decode_ura_index, EphemerisData, EphemerisSource, KeplerEphemeris},
    prelude::{Constellation, Ephemeris, Error, SignalId},
    time::GpsTime,
};

/// Subframe preamble (11 bits)
pub const BDS_D1_PREAMBLE: u32 = 0x712;

/// Curve fit interval applied to D1 ephemerides [s]
pub const BDS_FIT_INTERVAL: u32 = 3 * HOUR_SECS;

/// Information bits of one subframe: 26 from the first word, 22 from the others
const SUBFRAME_BITS: usize = 26 + 9 * 22;

/// Broadcast data starts after preamble, subframe ID and SOW
const DATA_START: usize = 38;

const SF_TOC: f64 = 8.0;
const SF_TOE: f64 = 8.0;
const SF_TGD: f64 = 0.1E-9;

/// Issue of data derived from a reference time, BeiDou does not broadcast one.
fn iod_from_time(tow: f64) -> u16 {
    ((tow as u32 / 720) % 240) as u16
}

/// Strips the parity bits of the ten 30 bit words of one subframe
/// into a contiguous MSB first buffer.
fn pack_subframe(words: &[u32; 10]) -> [u8; SUBFRAME_BITS / 8] {
    let mut buf = [0u8; SUBFRAME_BITS / 8];
    setbitu(&mut buf, 0, 26, (words[0] >> 4) & 0x3FF_FFFF);
    for (i, word) in words.iter().skip(1).enumerate() {
        setbitu(&mut buf, 26 + 22 * i, 22, (word >> 8) & 0x3F_FFFF);
    }
    buf
}

/// Subframe fields, read sequentially from [DATA_START].
struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: DATA_START,
        }
    }

    fn unsigned(&mut self, len: usize) -> u32 {
        let value = getbitu(self.buf, self.pos, len);
        self.pos += len;
        value
    }

    fn signed(&mut self, len: usize) -> f64 {
        let value = getbits(self.buf, self.pos, len);
        self.pos += len;
        value as f64
    }

    fn skip(&mut self, len: usize) {
        self.pos += len;
    }
}

impl Ephemeris {
    /// Decodes BeiDou D1 subframes 1, 2 and 3, 30 bit words right aligned.
    /// Reference times are kept in BDT seconds of week, weeks are expressed
    /// as GPS weeks.
    pub fn decode_bds_d1(sid: SignalId, words: &[[u32; 10]; 3]) -> Result<Self, Error> {
        if sid.constellation() != Constellation::BeiDou {
            return Err(Error::InvalidSignal(sid));
        }

        let subframes = words.map(|sf| pack_subframe(&sf));

        for (i, sf) in subframes.iter().enumerate() {
            let preamble = getbitu(sf, 0, 11);
            let fraid = getbitu(sf, 15, 3) as usize;
            if preamble != BDS_D1_PREAMBLE || fraid != i + 1 {
                debug!("{} preamble 0x{:03x} subframe {}", sid, preamble, fraid);
                return Err(Error::Decoding("unexpected beidou d1 subframe"));
            }
        }

        // Subframe 1
        let mut sf1 = FieldReader::new(&subframes[0]);
        let sat_h1 = sf1.unsigned(1) as u8;
        sf1.skip(5); // AODC
        let urai = sf1.unsigned(4) as u8;
        let wn = sf1.unsigned(13) as u16 + BDS_WEEK_TO_GPS_WEEK;
        let toc_tow = sf1.unsigned(17) as f64 * SF_TOC;
        let tgd1 = sf1.signed(10) * SF_TGD;
        let tgd2 = sf1.signed(10) * SF_TGD;
        sf1.skip(64); // ionospheric model
        let af2 = sf1.signed(11) * C_1_2P66;
        let af0 = sf1.signed(24) * C_1_2P33;
        let af1 = sf1.signed(22) * C_1_2P50;

        // Subframe 2
        let mut sf2 = FieldReader::new(&subframes[1]);
        let dn = sf2.signed(16) * (C_1_2P43 * GPS_PI);
        let cuc = sf2.signed(18) * C_1_2P31;
        let m0 = sf2.signed(32) * (C_1_2P31 * GPS_PI);
        let ecc = sf2.unsigned(32) as f64 * C_1_2P33;
        let cus = sf2.signed(18) * C_1_2P31;
        let crc = sf2.signed(18) * C_1_2P6;
        let crs = sf2.signed(18) * C_1_2P6;
        let sqrta = sf2.unsigned(32) as f64 * C_1_2P19;
        let toe_msb = sf2.unsigned(2);

        // Subframe 3
        let mut sf3 = FieldReader::new(&subframes[2]);
        let toe_lsb = sf3.unsigned(15);
        let inc = sf3.signed(32) * (C_1_2P31 * GPS_PI);
        let cic = sf3.signed(18) * C_1_2P31;
        let omegadot = sf3.signed(24) * (C_1_2P43 * GPS_PI);
        let cis = sf3.signed(18) * C_1_2P31;
        let inc_dot = sf3.signed(14) * (C_1_2P43 * GPS_PI);
        let omega0 = sf3.signed(32) * (C_1_2P31 * GPS_PI);
        let w = sf3.signed(32) * (C_1_2P31 * GPS_PI);

        let toe_tow = ((toe_msb << 15) | toe_lsb) as f64 * SF_TOE;

        let valid = toe_tow < WEEK_SECS as f64 && toc_tow < WEEK_SECS as f64;
        if !valid {
            warn!(
                "{} faulty toe {} / toc {}, invalidating ephemeris",
                sid, toe_tow, toc_tow
            );
        }

        Ok(Self {
            sid,
            toe: GpsTime::new(wn as i32, toe_tow),
            ura: decode_ura_index(urai),
            fit_interval: BDS_FIT_INTERVAL,
            valid,
            health_bits: sat_h1,
            source: EphemerisSource::D1D2,
            data: EphemerisData::Kepler(KeplerEphemeris {
                tgd: [tgd1, tgd2],
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
                toc: GpsTime::new(wn as i32, toc_tow),
                iodc: iod_from_time(toc_tow),
                iode: iod_from_time(toe_tow),
            }),
        })
    }
}
