//! Broadcast ephemeris: validity, health and satellite state.
use log::{error, info};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{GAL_E1_HZ, GLO_L1_DELTA_HZ, GLO_L2_DELTA_HZ, GPS_L1_HZ, SPEED_OF_LIGHT_M_S},
    coords::ecef_to_azel,
    prelude::{Constellation, Error, SignalId},
    signal::{fcn_is_valid, Code, GLO_FCN_OFFSET},
    time::GpsTime,
};

mod glonass;
mod health;
mod kepler;
mod sbas;

pub use glonass::GloEphemeris;
pub use health::{
    check_6bit_health, check_6bit_health_word, check_8bit_health_word,
    check_alma_page25_health_word, check_nav_dhi, decode_fit_interval, decode_shi_ephemeris,
    decode_ura_index, encode_ura, HealthState, INVALID_URA_VALUE, MAX_ALLOWED_GPS_URA_IDX,
};
pub use kepler::{KeplerEphemeris, OrbitType};
pub use sbas::XyzEphemeris;

/// Largest GPS issue of data clock (10 bits)
pub const GPS_IODC_MAX: u16 = 1023;
/// Largest GPS issue of data ephemeris (8 bits)
pub const GPS_IODE_MAX: u16 = 255;
/// Largest Galileo issue of data (10 bits)
pub const GAL_IOD_NAV_MAX: u16 = 1023;
pub const BDS_IODC_MAX: u16 = 1023;
pub const BDS_IODE_MAX: u16 = 255;

/// [EphemerisStatus] tells whether an [Ephemeris] may be used, and why not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EphemerisStatus {
    Valid,
    /// No ephemeris
    Null,
    /// Ephemeris flagged as invalid by its decoder
    Invalid,
    /// Ephemeris was never time stamped
    WeekZero,
    FitIntervalZero,
    Unhealthy,
    /// Inconsistent issue of data
    InvalidIod,
    /// Orbit data does not match the constellation of the signal
    InvalidSid,
    /// Requested instant lies outside the validity window
    TooOld,
}

impl std::fmt::Display for EphemerisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Null => write!(f, "null"),
            Self::Invalid => write!(f, "invalid"),
            Self::WeekZero => write!(f, "wn == 0"),
            Self::FitIntervalZero => write!(f, "fit_interval == 0"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::InvalidIod => write!(f, "invalid iod"),
            Self::InvalidSid => write!(f, "invalid sid"),
            Self::TooOld => write!(f, "too old"),
        }
    }
}

/// Navigation message the [Ephemeris] was decoded from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EphemerisSource {
    #[default]
    Unknown,
    /// GPS and QZSS legacy navigation message
    Lnav,
    /// Galileo I/NAV
    Inav,
    /// BeiDou D1 and D2
    D1D2,
    /// GLONASS FDMA navigation strings
    Fdma,
    /// SBAS messages
    Sbas,
}

/// Orbit and clock parameters, one variant per orbit model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EphemerisData {
    /// GPS, Galileo, BeiDou and QZSS
    Kepler(KeplerEphemeris),
    /// SBAS
    Xyz(XyzEphemeris),
    /// GLONASS
    Glo(GloEphemeris),
}

impl Default for EphemerisData {
    fn default() -> Self {
        Self::Kepler(KeplerEphemeris::default())
    }
}

/// [Ephemeris] of one satellite, as broadcast on signal `sid`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ephemeris {
    pub sid: SignalId,
    /// Reference time
    pub toe: GpsTime,
    /// User range accuracy [m]
    pub ura: f64,
    /// Curve fit interval [s]
    pub fit_interval: u32,
    /// Set by the decoder when all consistency checks passed
    pub valid: bool,
    /// Satellite health, constellation dependent
    pub health_bits: u8,
    pub source: EphemerisSource,
    pub data: EphemerisData,
}

/// Satellite state, at one instant
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatState {
    /// ECEF position [m]
    pub pos: Vector3<f64>,
    /// ECEF velocity [m/s]
    pub vel: Vector3<f64>,
    /// ECEF acceleration [m/s²]
    pub acc: Vector3<f64>,
    /// Clock error [s]
    pub clock_err: f64,
    /// Clock drift [s/s]
    pub clock_rate_err: f64,
    pub iodc: u16,
    /// Issue of data ephemeris, 8 LSB only: the 10 bit Galileo IODnav
    /// is truncated. Use [Ephemeris::iod_or_iodcrc] for the complete value.
    pub iode: u8,
}

/// BeiDou-3 signals, which follow the GPS issue of data rules
fn is_bds3(code: Code) -> bool {
    matches!(
        code,
        Code::Bds3B1ci
            | Code::Bds3B1cq
            | Code::Bds3B1cx
            | Code::Bds3B5i
            | Code::Bds3B5q
            | Code::Bds3B5x
            | Code::Bds3B7i
            | Code::Bds3B7q
            | Code::Bds3B7x
            | Code::Bds3B3i
            | Code::Bds3B3q
            | Code::Bds3B3x
    )
}

/// True if `t` lies within `[begin, end]` and, when provided,
/// so does a time stamped clock reference time `toc`.
pub fn ephemeris_params_valid(
    begin: &GpsTime,
    end: &GpsTime,
    toc: Option<&GpsTime>,
    t: &GpsTime,
) -> bool {
    if !t.in_range(begin, end) {
        return false;
    }
    match toc {
        Some(toc) => toc.week() != Some(0) && toc.in_range(begin, end),
        None => true,
    }
}

/// Status of a possibly missing ephemeris at `t`, see [Ephemeris::status_at].
pub fn ephemeris_status(eph: Option<&Ephemeris>, t: &GpsTime) -> EphemerisStatus {
    match eph {
        Some(eph) => eph.status_at(t),
        None => {
            error!("null ephemeris at {}", t);
            EphemerisStatus::Null
        },
    }
}

impl Ephemeris {
    pub fn constellation(&self) -> Constellation {
        self.sid.constellation()
    }

    pub fn kepler(&self) -> Option<&KeplerEphemeris> {
        match &self.data {
            EphemerisData::Kepler(k) => Some(k),
            _ => None,
        }
    }

    pub fn glo(&self) -> Option<&GloEphemeris> {
        match &self.data {
            EphemerisData::Glo(g) => Some(g),
            _ => None,
        }
    }

    /// True if the orbit model suits the constellation of `sid`.
    fn data_matches_sid(&self) -> bool {
        match (&self.data, self.constellation()) {
            (EphemerisData::Glo(_), Constellation::Glonass) => true,
            (EphemerisData::Xyz(_), Constellation::SBAS) => true,
            (EphemerisData::Kepler(_), c) => matches!(
                c,
                Constellation::GPS
                    | Constellation::QZSS
                    | Constellation::Galileo
                    | Constellation::BeiDou
            ),
            _ => false,
        }
    }

    /// Time independent status of this ephemeris.
    pub fn status(&self) -> EphemerisStatus {
        if !self.sid.valid() || !self.data_matches_sid() {
            return EphemerisStatus::InvalidSid;
        }
        if !self.valid {
            return EphemerisStatus::Invalid;
        }
        if self.toe.week() == Some(0) {
            return EphemerisStatus::WeekZero;
        }
        if self.fit_interval == 0 {
            return EphemerisStatus::FitIntervalZero;
        }
        if !self.healthy(self.sid.code) {
            return EphemerisStatus::Unhealthy;
        }
        if !self.iod_valid() {
            return EphemerisStatus::InvalidIod;
        }
        EphemerisStatus::Valid
    }

    /// Status of this ephemeris at `t`. Abnormal conditions are logged.
    pub fn status_at(&self, t: &GpsTime) -> EphemerisStatus {
        let status = self.status();

        match status {
            EphemerisStatus::Valid => {},
            EphemerisStatus::Invalid | EphemerisStatus::Unhealthy => {
                info!(
                    "{} ephemeris {} (v:{} fi:{} toe:{}) at {}",
                    self.sid, status, self.valid, self.fit_interval, self.toe, t
                );
            },
            _ => {
                error!(
                    "{} ephemeris {} (v:{} fi:{} toe:{}) at {}",
                    self.sid, status, self.valid, self.fit_interval, self.toe, t
                );
            },
        }

        if status != EphemerisStatus::Valid {
            return status;
        }

        if !self.valid_at_time(t) {
            return EphemerisStatus::TooOld;
        }

        EphemerisStatus::Valid
    }

    /// True if this ephemeris may be used at `t`. Nothing gets logged.
    pub fn valid_at(&self, t: &GpsTime) -> bool {
        self.status() == EphemerisStatus::Valid && self.valid_at_time(t)
    }

    /// Validity window: centered on `toe` for GPS, QZSS and GLONASS,
    /// starting at `toe` otherwise.
    pub fn validity_window(&self) -> (GpsTime, GpsTime) {
        match self.constellation() {
            Constellation::GPS | Constellation::QZSS | Constellation::Glonass => {
                let half = (self.fit_interval / 2) as f64;
                (self.toe - half, self.toe + half)
            },
            _ => (self.toe, self.toe + self.fit_interval as f64),
        }
    }

    fn valid_at_time(&self, t: &GpsTime) -> bool {
        if self.constellation() == Constellation::SBAS {
            return true;
        }

        let mut t = *t;
        t.match_weeks(&self.toe);

        let (begin, end) = self.validity_window();
        let toc = self.kepler().map(|k| &k.toc);

        ephemeris_params_valid(&begin, &end, toc, &t)
    }

    /// Health of signal `code` according to this ephemeris.
    /// An ephemeris flagged invalid is considered healthy: there is nothing to tell.
    pub fn healthy(&self, code: Code) -> bool {
        if !self.valid {
            return true;
        }

        match self.constellation() {
            Constellation::GPS => {
                let ura_ok = matches!(encode_ura(self.ura), Some(index) if index <= MAX_ALLOWED_GPS_URA_IDX);
                ura_ok && check_6bit_health_word(self.health_bits, code)
            },
            Constellation::Glonass | Constellation::BeiDou | Constellation::Galileo => {
                self.ura >= 0.0 && self.health_bits == 0
            },
            _ => self.health_bits == 0,
        }
    }

    /// Issue of data consistency.
    pub fn iod_valid(&self) -> bool {
        let Some(k) = self.kepler() else {
            return true;
        };

        match self.constellation() {
            Constellation::GPS | Constellation::QZSS => {
                k.iodc <= GPS_IODC_MAX && k.iode <= GPS_IODE_MAX && (k.iodc & 0xFF) == k.iode
            },
            Constellation::Galileo => k.iodc == k.iode && k.iodc <= GAL_IOD_NAV_MAX,
            Constellation::BeiDou => {
                if is_bds3(self.sid.code) {
                    k.iodc <= BDS_IODC_MAX && k.iode <= BDS_IODE_MAX && (k.iodc & 0xFF) == k.iode
                } else {
                    k.iodc <= BDS_IODC_MAX && k.iode <= BDS_IODE_MAX
                }
            },
            _ => true,
        }
    }

    /// Group delay [s] to apply to the clock of signal `sid`.
    pub fn tgd_correction(&self, sid: &SignalId) -> Result<f64, Error> {
        if sid.constellation() != self.constellation() {
            return Err(Error::InvalidSignal(*sid));
        }

        match &self.data {
            EphemerisData::Kepler(k) => match self.constellation() {
                Constellation::GPS | Constellation::QZSS => match sid.code {
                    Code::GpsL5i
                    | Code::GpsL5q
                    | Code::GpsL5x
                    | Code::QzsL5i
                    | Code::QzsL5q
                    | Code::QzsL5x => Ok(k.tgd[1]),
                    code => {
                        let gamma = (GPS_L1_HZ / code.carrier_frequency_hz()).powi(2);
                        Ok(k.tgd[0] * gamma)
                    },
                },
                Constellation::BeiDou => match sid.code {
                    Code::Bds2B1 | Code::Bds3B1ci | Code::Bds3B1cq | Code::Bds3B1cx => Ok(k.tgd[0]),
                    Code::Bds3B3i | Code::Bds3B3q | Code::Bds3B3x => Ok(0.0),
                    _ => Ok(k.tgd[1]),
                },
                Constellation::Galileo => {
                    let gamma = (GAL_E1_HZ / sid.code.carrier_frequency_hz()).powi(2);
                    match sid.code {
                        Code::GalE5i | Code::GalE5q | Code::GalE5x => Ok(gamma * k.tgd[0]),
                        _ => Ok(gamma * k.tgd[1]),
                    }
                },
                _ => Err(Error::UnsupportedConstellation),
            },
            EphemerisData::Glo(g) => match sid.code {
                Code::GloL2of | Code::GloL2p => Ok(g.d_tau),
                _ => Ok(0.0),
            },
            EphemerisData::Xyz(_) => Ok(0.0),
        }
    }

    /// Issue of data identifying this data set: IODE, GLONASS IOD,
    /// or the IODCRC for BeiDou.
    pub fn iod_or_iodcrc(&self) -> Result<u32, Error> {
        match (&self.data, self.constellation()) {
            (EphemerisData::Kepler(k), Constellation::BeiDou) => Ok(k.iodcrc()),
            (EphemerisData::Kepler(k), _) => Ok(k.iode as u32),
            (EphemerisData::Glo(g), _) => Ok(g.iod as u32),
            (EphemerisData::Xyz(_), _) => Err(Error::UnsupportedConstellation),
        }
    }

    /// Satellite state at `t` (time of transmission), once validity has been verified.
    pub fn sat_state(&self, t: &GpsTime) -> Result<SatState, Error> {
        match self.status_at(t) {
            EphemerisStatus::Valid => self.sat_state_unchecked(t),
            status => Err(Error::Ephemeris(status)),
        }
    }

    /// Satellite state at `t` without any validity verification.
    pub fn sat_state_unchecked(&self, t: &GpsTime) -> Result<SatState, Error> {
        if !self.data_matches_sid() {
            return Err(Error::Ephemeris(EphemerisStatus::InvalidSid));
        }

        let tgd = self.tgd_correction(&self.sid)?;

        match &self.data {
            EphemerisData::Kepler(k) => {
                let constellation = self.constellation();
                let orbit = if constellation == Constellation::BeiDou {
                    OrbitType::from_bds_prn(self.sid.sat)
                } else {
                    OrbitType::Meo
                };
                k.state(constellation, orbit, &self.toe, tgd, t)
            },
            EphemerisData::Glo(g) => Ok(g.state(&self.toe, tgd, t)),
            EphemerisData::Xyz(x) => Ok(x.state(&self.toe, t)),
        }
    }

    /// Azimuth and elevation [rad] of the satellite seen from `ref_pos` (ECEF).
    pub fn az_el(
        &self,
        t: &GpsTime,
        ref_pos: &Vector3<f64>,
        check_validity: bool,
    ) -> Result<(f64, f64), Error> {
        let state = if check_validity {
            self.sat_state(t)?
        } else {
            self.sat_state_unchecked(t)?
        };
        Ok(ecef_to_azel(&state.pos, ref_pos))
    }

    /// Carrier frequency [Hz] of `sid`, GLONASS channels are taken from the ephemeris.
    pub fn carrier_frequency(&self) -> f64 {
        let base = self.sid.code.carrier_frequency_hz();
        let Some(g) = self.glo().filter(|g| fcn_is_valid(g.fcn)) else {
            return base;
        };
        let channel = g.fcn as f64 - GLO_FCN_OFFSET as f64;
        match self.sid.code {
            Code::GloL1of => base + channel * GLO_L1_DELTA_HZ,
            Code::GloL2of => base + channel * GLO_L2_DELTA_HZ,
            _ => base,
        }
    }

    /// Doppler [Hz] of the satellite seen by a receiver at `ref_pos` moving at `ref_vel`.
    /// Positive when the range increases.
    pub fn doppler(
        &self,
        t: &GpsTime,
        ref_pos: &Vector3<f64>,
        ref_vel: &Vector3<f64>,
    ) -> Result<f64, Error> {
        let state = self.sat_state(t)?;

        let los = state.pos - ref_pos;
        let rel_vel = state.vel - ref_vel;

        let radial_vel = los.dot(&rel_vel) / los.norm();

        Ok(self.carrier_frequency() * radial_vel / SPEED_OF_LIGHT_M_S)
    }
}
