//! Broadcast almanac: coarse orbits used to predict satellite visibility.
use log::warn;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    coords::ecef_to_azel,
    ephemeris::{
        check_6bit_health_word, check_nav_dhi, EphemerisData, EphemerisSource, KeplerEphemeris,
        SatState, XyzEphemeris,
    },
    prelude::{Constellation, Ephemeris, Error, SignalId},
    time::GpsTime,
};

/// NAV data health indications (IS-GPS-200 Table 20-VII)
/// which do not affect the almanac content
const NAV_DHI_TLM_HOW_ERR: u8 = 2;
const NAV_DHI_ZCOUNT_ERR: u8 = 3;
const NAV_DHI_SUB123_ERR: u8 = 4;

const IGNORED_NAV_DHI: u8 =
    (1 << NAV_DHI_TLM_HOW_ERR) | (1 << NAV_DHI_ZCOUNT_ERR) | (1 << NAV_DHI_SUB123_ERR);

/// Keplerian almanac (GPS). Angles in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeplerAlmanac {
    /// Mean anomaly at reference time
    pub m0: f64,
    pub ecc: f64,
    /// Square root of the semi major axis [m^1/2]
    pub sqrta: f64,
    /// Longitude of ascending node at weekly epoch
    pub omega0: f64,
    /// Rate of right ascension [rad/s]
    pub omegadot: f64,
    /// Argument of perigee
    pub w: f64,
    /// Inclination, including the 0.3 semi-circle offset
    pub inc: f64,
    /// Clock bias [s]
    pub af0: f64,
    /// Clock drift [s/s]
    pub af1: f64,
}

/// SBAS almanac: ECEF state of the geostationary satellite at `toa`
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XyzAlmanac {
    pub pos: Vector3<f64>,
    pub vel: Vector3<f64>,
    pub acc: Vector3<f64>,
}

/// GLONASS almanac (GLONASS ICD 4.5). Angles in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GloAlmanac {
    /// Longitude of the first ascending node
    pub lambda: f64,
    /// Time of the first ascending node passage [s]
    pub t_lambda: f64,
    /// Inclination at `t_lambda`
    pub i: f64,
    /// Draconian period [s]
    pub t: f64,
    /// Rate of change of the draconian period [s/orbit²]
    pub t_dot: f64,
    pub epsilon: f64,
    /// Argument of perigee
    pub omega: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlmanacData {
    Kepler(KeplerAlmanac),
    Xyz(XyzAlmanac),
    Glo(GloAlmanac),
}

impl Default for AlmanacData {
    fn default() -> Self {
        Self::Kepler(KeplerAlmanac::default())
    }
}

/// [Almanac] of one satellite.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Almanac {
    pub sid: SignalId,
    /// Reference time, week unknown until time stamped
    pub toa: GpsTime,
    /// User range accuracy [m]
    pub ura: f64,
    /// Curve fit interval [s]
    pub fit_interval: u32,
    pub valid: bool,
    /// NAV data health (3 MSB) and signal health (5 LSB)
    pub health_bits: u8,
    pub data: AlmanacData,
}

impl Almanac {
    pub fn constellation(&self) -> Constellation {
        self.sid.constellation()
    }

    /// Sets the week of the reference time.
    pub fn set_week(&mut self, wn: i32) {
        self.toa = self.toa.with_week(wn);
    }

    /// Health according to the 8 bit almanac health word.
    /// Errors in the TLM/HOW, Z-count or subframes 1 to 3 are ignored.
    pub fn healthy(&self) -> bool {
        check_nav_dhi(self.health_bits, IGNORED_NAV_DHI)
            && check_6bit_health_word(self.health_bits & 0x1F, self.sid.code)
    }

    /// True if this almanac may be used at `t`.
    pub fn valid_at(&self, t: &GpsTime) -> bool {
        if !self.valid || !self.healthy() {
            return false;
        }

        if self.fit_interval == 0 {
            warn!("{} almanac with null fit interval", self.sid);
            return false;
        }

        // never time stamped
        if matches!(self.toa.week(), None | Some(0)) {
            return false;
        }

        t.difftime(&self.toa).abs() <= (self.fit_interval / 2) as f64
    }

    /// Equivalent [Ephemeris]: harmonic corrections, group delays and
    /// issues of data are all null.
    pub fn to_ephemeris(&self) -> Result<Ephemeris, Error> {
        let data = match &self.data {
            AlmanacData::Kepler(k) => EphemerisData::Kepler(KeplerEphemeris {
                m0: k.m0,
                ecc: k.ecc,
                sqrta: k.sqrta,
                omega0: k.omega0,
                omegadot: k.omegadot,
                w: k.w,
                inc: k.inc,
                af0: k.af0,
                af1: k.af1,
                toc: self.toa,
                ..Default::default()
            }),
            AlmanacData::Xyz(x) => EphemerisData::Xyz(XyzEphemeris {
                pos: x.pos,
                vel: x.vel,
                acc: x.acc,
                ..Default::default()
            }),
            AlmanacData::Glo(_) => return Err(Error::UnsupportedConstellation),
        };

        Ok(Ephemeris {
            sid: self.sid,
            toe: self.toa,
            ura: self.ura,
            fit_interval: self.fit_interval,
            valid: self.valid,
            health_bits: self.health_bits,
            source: EphemerisSource::Unknown,
            data,
        })
    }

    /// Satellite state at `t`. GLONASS almanacs are not supported.
    pub fn sat_state(&self, t: &GpsTime) -> Result<SatState, Error> {
        if !self.valid_at(t) {
            return Err(Error::AlmanacNotValid);
        }
        self.to_ephemeris()?.sat_state_unchecked(t)
    }

    /// Azimuth and elevation [rad] of the satellite seen from `ref_pos` (ECEF).
    pub fn az_el(&self, t: &GpsTime, ref_pos: &Vector3<f64>) -> Result<(f64, f64), Error> {
        let state = self.sat_state(t)?;
        Ok(ecef_to_azel(&state.pos, ref_pos))
    }

    /// Doppler [Hz] seen from static `ref_pos`, positive when the range increases.
    pub fn doppler(&self, t: &GpsTime, ref_pos: &Vector3<f64>) -> Result<f64, Error> {
        let state = self.sat_state(t)?;

        let los = state.pos - ref_pos;
        let radial_vel = los.dot(&state.vel) / los.norm();

        Ok(self.sid.code.carrier_frequency_hz() * radial_vel / SPEED_OF_LIGHT_M_S)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        signal::Code,
        tests::{gps_alm, gps_eph, init_logger},
    };

    #[test]
    fn validity() {
        init_logger();

        let alm = gps_alm();
        let half = (alm.fit_interval / 2) as f64;

        assert!(alm.valid_at(&alm.toa));
        assert!(alm.valid_at(&(alm.toa + half)));
        assert!(alm.valid_at(&(alm.toa - half)));
        assert!(!alm.valid_at(&(alm.toa + half + 1.0)));

        let mut invalid = alm;
        invalid.valid = false;
        assert!(!invalid.valid_at(&alm.toa));

        let mut no_fit = alm;
        no_fit.fit_interval = 0;
        assert!(!no_fit.valid_at(&alm.toa));

        let mut unstamped = alm;
        unstamped.toa = GpsTime::from_tow(alm.toa.tow());
        assert!(!unstamped.valid_at(&alm.toa));

        unstamped.set_week(1916);
        assert!(unstamped.valid_at(&alm.toa));

        assert_eq!(
            no_fit.sat_state(&alm.toa),
            Err(Error::AlmanacNotValid)
        );
    }

    #[test]
    fn health() {
        init_logger();

        let mut alm = gps_alm();
        assert!(alm.healthy());

        // parity errors are fatal
        alm.health_bits = 1 << 5;
        assert!(!alm.healthy());

        // subframe 1 to 3 errors don't affect the almanac
        alm.health_bits = NAV_DHI_SUB123_ERR << 5;
        assert!(alm.healthy());
        alm.health_bits = NAV_DHI_TLM_HOW_ERR << 5;
        assert!(alm.healthy());

        // L1 C signal dead
        alm.health_bits = 11;
        assert!(!alm.healthy());
        assert!(!alm.valid_at(&alm.toa));

        // L2 C only
        alm.health_bits = 14;
        assert!(alm.healthy());
        alm.sid.code = Code::GpsL2cm;
        assert!(!alm.healthy());
    }

    #[test]
    fn state_close_to_ephemeris() {
        init_logger();

        let alm = gps_alm();
        let eph = gps_eph();

        for dt in [-3600.0, 0.0, 3600.0, 7200.0] {
            let t = alm.toa + dt;
            let a = alm.sat_state(&t).unwrap();
            let e = eph.sat_state_unchecked(&t).unwrap();

            let dpos = (a.pos - e.pos).norm();
            assert!(dpos < 2.0E3, "dt={} dpos={}", dt, dpos);

            let dvel = (a.vel - e.vel).norm();
            assert!(dvel < 1.0, "dt={} dvel={}", dt, dvel);

            assert!((a.clock_err - e.clock_err).abs() < 1.0E-6);
            assert_eq!((a.iodc, a.iode), (0, 0));
        }
    }

    #[test]
    fn visibility() {
        init_logger();

        let alm = gps_alm();
        let state = alm.sat_state(&alm.toa).unwrap();

        let ref_pos = state.pos.normalize() * 6_378_137.0;
        let (_, el) = alm.az_el(&alm.toa, &ref_pos).unwrap();
        assert!(el > 1.5, "el={}", el);

        let (_, el) = alm.az_el(&alm.toa, &(-ref_pos)).unwrap();
        assert!(el < 0.0);

        let doppler = alm.doppler(&alm.toa, &ref_pos).unwrap();
        let los = (state.pos - ref_pos).normalize();
        let expected = 1.57542E9 * los.dot(&state.vel) / SPEED_OF_LIGHT_M_S;
        assert!((doppler - expected).abs() < 1.0E-6);
        assert!(doppler.abs() < 5000.0);
    }

    #[test]
    fn unsupported_orbits() {
        init_logger();

        let mut alm = gps_alm();
        alm.sid = SignalId::new(Code::GloL1of, 1);
        alm.data = AlmanacData::Glo(GloAlmanac::default());
        assert_eq!(alm.to_ephemeris(), Err(Error::UnsupportedConstellation));
        assert_eq!(alm.sat_state(&alm.toa), Err(Error::UnsupportedConstellation));
    }

    #[test]
    fn sbas_almanac() {
        init_logger();

        let alm = Almanac {
            sid: SignalId::new(Code::SbasL1ca, 131),
            toa: GpsTime::new(1916, 12288.0),
            ura: 900.0,
            fit_interval: 140 * 3600,
            valid: true,
            health_bits: 0,
            data: AlmanacData::Xyz(XyzAlmanac {
                pos: Vector3::new(-32_000.0E3, -27_000.0E3, 0.0),
                vel: Vector3::new(1.0, -1.0, 0.0),
                acc: Vector3::zeros(),
            }),
        };

        let state = alm.sat_state(&(alm.toa + 100.0)).unwrap();
        let expected = Vector3::new(-32_000.0E3 + 100.0, -27_000.0E3 - 100.0, 0.0);
        assert!((state.pos - expected).norm() < 1.0E-6);
        assert_eq!(state.clock_err, 0.0);
    }

    #[test]
    fn equality() {
        init_logger();

        let a = gps_alm();
        let mut b = a;
        assert_eq!(a, b);

        if let AlmanacData::Kepler(k) = &mut b.data {
            k.ecc += 1.0E-9;
        }
        assert_ne!(a, b);

        let mut c = a;
        c.health_bits = 1;
        assert_ne!(a, c);

        let mut d = a;
        d.data = AlmanacData::Xyz(XyzAlmanac::default());
        assert_ne!(a, d);
    }
}
