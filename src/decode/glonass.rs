//! GLONASS FDMA navigation strings 1 to 5 (GLONASS ICD edition 5.1)
use log::{debug, warn};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{C_1_2P11, C_1_2P20, C_1_2P30, C_1_2P40, HOUR_SECS, MINUTE_SECS},
    ephemeris::{EphemerisData, EphemerisSource, GloEphemeris, INVALID_URA_VALUE},
    prelude::{Constellation, Ephemeris, Error, SignalId},
    signal::{slot_is_valid, Code, GloFcnMap},
    time::{GloTime, GpsTime, UtcParams},
};

/// Bits per navigation string, Hamming code included
pub const GLO_NAV_STR_BITS: u16 = 85;

/// Margin added to the fit interval, so the next ephemeris can be decoded
/// before the current one expires [s]
const FIT_INTERVAL_MARGIN: u32 = 10 * MINUTE_SECS;

// Parameter limits, ICD table 4.5
const POS_MAX_M: f64 = 2.7E4 * 1E3;
const VEL_MAX_M_S: f64 = 4.3 * 1E3;
const ACC_MAX_M_S2: f64 = 6.2E-9 * 1E3;
const TK_MAX_HOURS: u8 = 23;
const TK_MAX_MINS: u8 = 59;
const TB_MIN_S: u32 = 15 * MINUTE_SECS;
const TB_MAX_S: u32 = 1425 * MINUTE_SECS;
const GAMMA_MAX: f64 = 9.313225746154785E-10;
const TAU_MAX_S: f64 = 0.001953125;
const D_TAU_MAX_S: f64 = 13.97E-9;
const NT_MAX_DAYS: u16 = 1461;
// ICD table 4.9
const TAU_GPS_MAX_S: f64 = 1.9E-3;

/// Accuracy of measurements (word Ft) [m], ICD table 4.4
const FT_TABLE: [f64; 16] = [
    1.0,
    2.0,
    2.5,
    4.0,
    5.0,
    7.0,
    10.0,
    12.0,
    14.0,
    16.0,
    32.0,
    64.0,
    128.0,
    256.0,
    512.0,
    INVALID_URA_VALUE,
];

/// Interval between adjacent values of tb (word P1) [min], ICD table 4.3
const P1_MINUTES: [u32; 4] = [0, 30, 45, 60];

/// Hamming code masks over data bits 9..=85, ICD table 4.13
const HAMMING_MASKS: [[u32; 3]; 7] = [
    [0xaaad5b00, 0x55555556, 0xaaaab],
    [0x33366d00, 0x9999999b, 0xccccd],
    [0xc3c78e00, 0xe1e1e1e3, 0x10f0f1],
    [0xfc07f000, 0xfe01fe03, 0xff01],
    [0xfff80000, 0xfffe0003, 0x1f0001],
    [0, 0xfffffffc, 1],
    [0, 0, 0x1ffffe],
];

fn parity(word: u32) -> bool {
    word.count_ones() % 2 == 1
}

/// Outcome of the Hamming code verification of a [GloString]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GloStringCheck {
    /// No error
    Good,
    /// Single error, the bit at this position (9..=85) must be inverted
    Correctable(u16),
    /// Multiple errors, the string must be dropped
    Bad,
}

/// One GLONASS navigation string. Bit `n` (1..=85, ICD numbering)
/// is bit `(n - 1) % 32` of `words[(n - 1) / 32]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GloString {
    pub words: [u32; 3],
}

impl GloString {
    pub fn new(words: [u32; 3]) -> Self {
        Self { words }
    }

    /// Reads `len` (1..=32) bits starting at bit `index` (1..=85).
    pub fn bits(&self, index: u16, len: u8) -> u32 {
        let string = self.words[0] as u128
            | (self.words[1] as u128) << 32
            | (self.words[2] as u128) << 64;
        let mask = (1u128 << len) - 1;
        ((string >> (index - 1)) & mask) as u32
    }

    /// Sign and magnitude value of `len` bits, sign bit following the magnitude.
    fn sign_magnitude(&self, index: u16, len: u8) -> f64 {
        let magnitude = self.bits(index, len) as f64;
        if self.bits(index + len as u16, 1) == 1 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// String number (bits 81..=84)
    pub fn number(&self) -> u8 {
        self.bits(81, 4) as u8
    }

    /// Hamming code verification, ICD 4.7
    pub fn check(&self) -> GloStringCheck {
        let mut c = 0u16;
        let mut bits_set = 0u8;
        let mut k = 0u16;

        for (i, mask) in HAMMING_MASKS.iter().enumerate() {
            let beta = self.bits(i as u16 + 1, 1) == 1;
            let p = beta
                ^ parity(self.bits(1, 32) & mask[0])
                ^ parity(self.bits(33, 32) & mask[1])
                ^ parity(self.bits(65, 32) & mask[2]);

            if p {
                c |= 1 << i;
                bits_set += 1;
                k = i as u16 + 1;
            }
        }

        let c_sum = parity(self.bits(1, 8))
            ^ parity(self.bits(1, 32) & 0xffffff00)
            ^ parity(self.bits(33, 32))
            ^ parity(self.bits(65, 32));

        match (bits_set, c_sum) {
            (0, false) | (1, true) => GloStringCheck::Good,
            (n, true) if n > 1 => {
                let bit = (c & 0x7f) + 8 - k;
                if bit > GLO_NAV_STR_BITS {
                    GloStringCheck::Bad
                } else {
                    GloStringCheck::Correctable(bit)
                }
            },
            _ => GloStringCheck::Bad,
        }
    }
}

/// Position, velocity and acceleration component carried by strings 1, 2 and 3.
fn decode_motion(
    sid: &SignalId,
    string: &GloString,
    axis: char,
) -> Result<(f64, f64, f64), Error> {
    let pos = string.sign_magnitude(9, 26) * C_1_2P11 * 1000.0;
    let vel = string.sign_magnitude(41, 23) * C_1_2P20 * 1000.0;
    let acc = string.sign_magnitude(36, 4) * C_1_2P30 * 1000.0;

    for (name, value, max) in [
        ("pos", pos, POS_MAX_M),
        ("vel", vel, VEL_MAX_M_S),
        ("acc", acc, ACC_MAX_M_S2),
    ] {
        if value.abs() > max {
            debug!("{} {}_{}={} out of range", sid, name, axis, value);
            return Err(Error::Decoding("glonass state vector out of range"));
        }
    }

    Ok((pos, vel, acc))
}

fn in_range(sid: &SignalId, name: &str, value: f64, max: f64) -> Result<f64, Error> {
    if value.abs() > max {
        debug!("{} {}={} out of range", sid, name, value);
        return Err(Error::Decoding("glonass parameter out of range"));
    }
    Ok(value)
}

/// Content of GLONASS strings 1 to 5
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GloNavFrame {
    pub ephemeris: Ephemeris,
    /// Start of the frame
    pub tk: GpsTime,
    /// Fractional offset between GLONASS and GPS time [s]
    pub tau_gps: f64,
    /// Age of the ephemeris data [days]
    pub age_of_data: u8,
}

impl GloNavFrame {
    /// Decodes strings 1 to 5, in this order. The slot is taken from string 4,
    /// the frequency channel from `glo_map` (0 when unknown).
    pub fn decode(
        code: Code,
        strings: &[GloString; 5],
        glo_map: &GloFcnMap,
        utc_params: Option<&UtcParams>,
    ) -> Result<Self, Error> {
        if code.constellation() != Constellation::Glonass {
            return Err(Error::UnsupportedConstellation);
        }

        // slot is not known until string 4
        let mut sid = SignalId::new(code, 0);

        for (i, string) in strings.iter().enumerate() {
            if string.number() as usize != i + 1 {
                return Err(Error::Decoding("unexpected glonass string number"));
            }
            let check = string.check();
            if check != GloStringCheck::Good {
                debug!("{} string {}: {:?}", sid, i + 1, check);
                return Err(Error::Decoding("glonass string checksum mismatch"));
            }
        }

        let [s1, s2, s3, s4, s5] = strings;

        // String 4: slot first, for the logs
        let slot = s4.bits(11, 5) as u16;
        if !slot_is_valid(slot) {
            debug!("{} slot {}", sid, slot);
            return Err(Error::InvalidSlot(slot));
        }
        sid.sat = slot;

        let tau = in_range(&sid, "tau", s4.sign_magnitude(59, 21) * C_1_2P30, TAU_MAX_S)?;
        let d_tau = in_range(&sid, "d_tau", s4.sign_magnitude(54, 4) * C_1_2P30, D_TAU_MAX_S)?;
        let age_of_data = s4.bits(49, 5) as u8;
        let ura = FT_TABLE[s4.bits(30, 4) as usize];

        let nt = s4.bits(16, 11) as u16;
        if nt > NT_MAX_DAYS {
            debug!("{} nt={} days", sid, nt);
            return Err(Error::Decoding("glonass parameter out of range"));
        }

        if s4.bits(9, 2) == 0 {
            warn!("{} non GLONASS-M satellite", sid);
        }

        // String 1
        let (x, vx, ax) = decode_motion(&sid, s1, 'x')?;

        let tk_h = s1.bits(72, 5) as u8;
        let tk_m = s1.bits(66, 6) as u8;
        if tk_h > TK_MAX_HOURS || tk_m > TK_MAX_MINS {
            debug!("{} tk={}h{}", sid, tk_h, tk_m);
            return Err(Error::Decoding("glonass parameter out of range"));
        }
        let tk_s = if s1.bits(65, 1) == 1 {
            (MINUTE_SECS / 2) as f64
        } else {
            0.0
        };

        let fit_interval = match P1_MINUTES[s1.bits(77, 2) as usize] {
            // unknown interval: assume the largest
            0 => 60 * MINUTE_SECS + FIT_INTERVAL_MARGIN,
            minutes => minutes * MINUTE_SECS + FIT_INTERVAL_MARGIN,
        };

        // String 2
        let (y, vy, ay) = decode_motion(&sid, s2, 'y')?;

        let bn = s2.bits(80, 1) as u8;

        let tb = s2.bits(70, 7) * 15 * MINUTE_SECS;
        if !(TB_MIN_S..=TB_MAX_S).contains(&tb) {
            debug!("{} tb={} s", sid, tb);
            return Err(Error::Decoding("glonass parameter out of range"));
        }

        // String 3
        let (z, vz, az) = decode_motion(&sid, s3, 'z')?;

        let gamma = in_range(&sid, "gamma", s3.sign_magnitude(69, 10) * C_1_2P40, GAMMA_MAX)?;
        let ln = s3.bits(65, 1) as u8;

        // String 5
        let n4 = s5.bits(32, 5) as u8;
        if n4 == 0 {
            debug!("{} n4=0", sid);
            return Err(Error::Decoding("glonass parameter out of range"));
        }

        let tau_gps = in_range(&sid, "tau_gps", s5.sign_magnitude(10, 21) * C_1_2P30, TAU_GPS_MAX_S)?;

        let toe = GloTime::new(
            nt,
            n4,
            (tb / HOUR_SECS) as u8,
            ((tb % HOUR_SECS) / MINUTE_SECS) as u8,
            (tb % MINUTE_SECS) as f64,
        )
        .to_gps(utc_params)?;

        let tk = GloTime::new(nt, n4, tk_h, tk_m, tk_s).to_gps(utc_params)?;

        let fcn = glo_map.get_fcn(slot).unwrap_or_else(|| {
            warn!("{} unknown frequency channel", sid);
            0
        });

        let ephemeris = Ephemeris {
            sid,
            toe,
            ura,
            fit_interval,
            valid: true,
            health_bits: bn | ln,
            source: EphemerisSource::Fdma,
            data: EphemerisData::Glo(GloEphemeris {
                gamma,
                tau,
                d_tau,
                pos: Vector3::new(x, y, z),
                vel: Vector3::new(vx, vy, vz),
                acc: Vector3::new(ax, ay, az),
                fcn,
                iod: (tb & 0x7f) as u8,
            }),
        };

        Ok(Self {
            ephemeris,
            tk,
            tau_gps,
            age_of_data,
        })
    }
}
