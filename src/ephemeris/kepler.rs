//! Keplerian orbits (GPS, Galileo, BeiDou, QZSS)
use nalgebra::{Rotation3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        BDS_GM, BDS_OMEGAE_DOT, BDS_SECOND_TO_GPS_SECOND, D2R, GAL_GM, GPS_GM, GPS_OMEGAE_DOT,
        SPEED_OF_LIGHT_M_S,
    },
    ephemeris::SatState,
    prelude::{Constellation, Error},
    time::GpsTime,
};

/// Maximal number of Newton iterations solving Kepler's equation
const KEPLER_MAX_ITER: usize = 6;

/// Kepler's equation is solved once the eccentric anomaly moves less than this
const KEPLER_TOLERANCE: f64 = 1.0E-14;

/// Inclination of the BeiDou GEO reference frame
const BDS_GEO_INCLINATION_DEG: f64 = -5.0;

/// Orbit family, which selects the ECEF conversion
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrbitType {
    /// Medium earth and inclined geosynchronous orbits
    #[default]
    Meo,
    /// BeiDou geostationary orbits, broadcast in an inclined frame
    Geo,
}

impl OrbitType {
    /// BeiDou PRN 1 to 5 and 59 to 63 are geostationary.
    pub fn from_bds_prn(prn: u16) -> Self {
        if (1..=5).contains(&prn) || (59..=63).contains(&prn) {
            Self::Geo
        } else {
            Self::Meo
        }
    }
}

/// Broadcast Keplerian orbit and clock parameters.
/// Angles in radians, angular rates in radians per second.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeplerEphemeris {
    /// Group delays [s]
    pub tgd: [f64; 2],
    /// Amplitude of the cosine harmonic correction to the orbit radius [m]
    pub crc: f64,
    /// Amplitude of the sine harmonic correction to the orbit radius [m]
    pub crs: f64,
    /// Amplitude of the cosine harmonic correction to the argument of latitude
    pub cuc: f64,
    /// Amplitude of the sine harmonic correction to the argument of latitude
    pub cus: f64,
    /// Amplitude of the cosine harmonic correction to the inclination
    pub cic: f64,
    /// Amplitude of the sine harmonic correction to the inclination
    pub cis: f64,
    /// Mean motion difference
    pub dn: f64,
    /// Mean anomaly at reference time
    pub m0: f64,
    /// Eccentricity
    pub ecc: f64,
    /// Square root of the semi major axis [m^1/2]
    pub sqrta: f64,
    /// Longitude of ascending node at weekly epoch
    pub omega0: f64,
    /// Rate of right ascension
    pub omegadot: f64,
    /// Argument of perigee
    pub w: f64,
    /// Inclination at reference time
    pub inc: f64,
    /// Rate of inclination
    pub inc_dot: f64,
    /// Clock bias [s]
    pub af0: f64,
    /// Clock drift [s/s]
    pub af1: f64,
    /// Clock drift rate [s/s²]
    pub af2: f64,
    /// Clock reference time
    pub toc: GpsTime,
    /// Issue of data clock
    pub iodc: u16,
    /// Issue of data ephemeris
    pub iode: u16,
}

fn gravitational_constant(constellation: Constellation) -> Result<f64, Error> {
    match constellation {
        Constellation::GPS | Constellation::QZSS => Ok(GPS_GM),
        Constellation::BeiDou => Ok(BDS_GM),
        Constellation::Galileo => Ok(GAL_GM),
        _ => Err(Error::UnsupportedConstellation),
    }
}

impl KeplerEphemeris {
    /// Satellite state at `t`, following IS-GPS-200 Table 20-IV.
    /// `tgd` is the group delay of the signal the clock is corrected for.
    pub(crate) fn state(
        &self,
        constellation: Constellation,
        orbit: OrbitType,
        toe: &GpsTime,
        tgd: f64,
        t: &GpsTime,
    ) -> Result<SatState, Error> {
        let gm = gravitational_constant(constellation)?;

        let dt = t.difftime(&self.toc);
        let mut clock_err = self.af0 + dt * (self.af1 + dt * self.af2) - tgd;
        let clock_rate_err = self.af1 + 2.0 * dt * self.af2;

        let dt = t.difftime(toe) - clock_err;

        let a = self.sqrta * self.sqrta;
        let ma_dot = (gm / (a * a * a)).sqrt() + self.dn;
        let ma = self.m0 + ma_dot * dt;

        let ecc = self.ecc;
        let mut ea = ma;
        let mut temp = 1.0;
        for _ in 0..KEPLER_MAX_ITER {
            let ea_old = ea;
            temp = 1.0 - ecc * ea_old.cos();
            ea += (ma - ea_old + ecc * ea_old.sin()) / temp;
            if (ea - ea_old).abs() <= KEPLER_TOLERANCE {
                break;
            }
        }

        let (sin_ea, cos_ea) = ea.sin_cos();

        let ea_dot = ma_dot / temp;
        let ea_acc = -ea_dot * ea_dot * ecc * sin_ea / temp;

        // argument of latitude
        let temp2 = (1.0 - ecc * ecc).sqrt();
        let al = (temp2 * sin_ea).atan2(cos_ea - ecc) + self.w;
        let al_dot = temp2 * ea_dot / temp;
        let al_acc = 2.0 * al_dot * ea_acc / ea_dot;
        let al_dot_sqr = al_dot * al_dot;

        let (sin2al, cos2al) = (2.0 * al).sin_cos();

        let dal = self.cus * sin2al + self.cuc * cos2al;
        let dal_dot = 2.0 * al_dot * (self.cus * cos2al - self.cuc * sin2al);
        let dal_acc = -4.0 * al_dot_sqr * dal + al_acc / al_dot * dal_dot;

        let cal = al + dal;
        let cal_dot = al_dot + dal_dot;
        let cal_acc = al_acc + dal_acc;

        let dr = self.crs * sin2al + self.crc * cos2al;
        let dr_dot = 2.0 * al_dot * (self.crs * cos2al - self.crc * sin2al);
        let dr_acc = -4.0 * al_dot_sqr * dr + al_acc / al_dot * dr_dot;

        let r = a * temp + dr;
        let r_dot = a * ecc * sin_ea * ea_dot + dr_dot;
        let r_acc = a * ecc * ea_dot * ea_dot * cos_ea + a * ecc * ea_acc * sin_ea + dr_acc;

        // relativistic correction, x.v = r.r_dot
        clock_err -= 2.0 * r * r_dot / SPEED_OF_LIGHT_M_S / SPEED_OF_LIGHT_M_S;

        let dinc = self.cis * sin2al + self.cic * cos2al;
        let dinc_dot = 2.0 * al_dot * (self.cis * cos2al - self.cic * sin2al);
        let dinc_acc = -4.0 * al_dot_sqr * dinc + al_acc / al_dot * dinc_dot;

        let inc = self.inc + self.inc_dot * dt + dinc;
        let inc_dot = self.inc_dot + dinc_dot;
        let inc_acc = dinc_acc;

        // orbital plane
        let (sin_cal, cos_cal) = cal.sin_cos();
        let x = r * cos_cal;
        let y = r * sin_cal;
        let x_dot = r_dot * cos_cal - y * cal_dot;
        let y_dot = r_dot * sin_cal + x * cal_dot;
        let cal_dot_sqr = cal_dot * cal_dot;
        let x_acc = -cal_dot_sqr * x - cal_acc * y - 2.0 * cal_dot * r_dot * sin_cal + r_acc * cos_cal;
        let y_acc = -cal_dot_sqr * y + cal_acc * x + 2.0 * cal_dot * r_dot * cos_cal + r_acc * sin_cal;

        // corrected longitude of ascending node
        let (om_dot, om) = match (constellation, orbit) {
            (Constellation::BeiDou, OrbitType::Geo) => {
                let om = self.omega0 + dt * self.omegadot
                    - BDS_OMEGAE_DOT * (toe.tow() - BDS_SECOND_TO_GPS_SECOND);
                (self.omegadot, om)
            },
            (Constellation::BeiDou, OrbitType::Meo) => {
                let om_dot = self.omegadot - BDS_OMEGAE_DOT;
                let om = self.omega0 + dt * om_dot
                    - BDS_OMEGAE_DOT * (toe.tow() - BDS_SECOND_TO_GPS_SECOND);
                (om_dot, om)
            },
            _ => {
                let om_dot = self.omegadot - GPS_OMEGAE_DOT;
                let om = self.omega0 + dt * om_dot - GPS_OMEGAE_DOT * toe.tow();
                (om_dot, om)
            },
        };

        let (sin_om, cos_om) = om.sin_cos();
        let (sin_inc, cos_inc) = inc.sin_cos();

        let pos = Vector3::new(
            x * cos_om - y * cos_inc * sin_om,
            x * sin_om + y * cos_inc * cos_om,
            y * sin_inc,
        );

        let temp = y_dot * cos_inc - y * sin_inc * inc_dot;
        let vel = Vector3::new(
            -om_dot * pos[1] + x_dot * cos_om - temp * sin_om,
            om_dot * pos[0] + x_dot * sin_om + temp * cos_om,
            y * cos_inc * inc_dot + y_dot * sin_inc,
        );

        let acc_common_1 = vel[2] * inc_dot - om_dot * x_dot + y * inc_acc * sin_inc
            - y_acc * cos_inc
            + inc_dot * y_dot * sin_inc;
        let acc_common_2 = x_acc + y * om_dot * inc_dot * sin_inc - om_dot * y_dot * cos_inc;

        let acc = Vector3::new(
            -om_dot * vel[1] + sin_om * acc_common_1 + cos_om * acc_common_2,
            om_dot * vel[0] - cos_om * acc_common_1 + sin_om * acc_common_2,
            sin_inc * (-y * inc_dot * inc_dot + y_acc) + cos_inc * (y * inc_acc + 2.0 * inc_dot * y_dot),
        );

        let (pos, vel, acc) = if constellation == Constellation::BeiDou && orbit == OrbitType::Geo {
            geo_to_ecef(&pos, &vel, &acc, dt)
        } else {
            (pos, vel, acc)
        };

        Ok(SatState {
            pos,
            vel,
            acc,
            clock_err,
            clock_rate_err,
            iodc: self.iodc,
            iode: self.iode as u8,
        })
    }
}

/// Size of the re-packed BeiDou orbit parameters, 416 bits
const IODCRC_BUF_LEN: usize = 52;

impl KeplerEphemeris {
    /// BeiDou IODCRC: CRC-24Q of the orbit and clock parameters re-packed
    /// into their broadcast representation.
    pub fn iodcrc(&self) -> u32 {
        use crate::bits::{crc24q, setbits, setbitu};
        use std::f64::consts::PI;

        let mut buf = [0u8; IODCRC_BUF_LEN];

        let signed = [
            (14, self.inc_dot / PI * 2f64.powi(43)),
            (11, self.af2 * 2f64.powi(66)),
            (22, self.af1 * 2f64.powi(50)),
            (24, self.af0 * 2f64.powi(33)),
            (18, self.crs * 2f64.powi(6)),
            (16, self.dn / PI * 2f64.powi(43)),
            (32, self.m0 / PI * 2f64.powi(31)),
            (18, self.cuc * 2f64.powi(31)),
        ];

        let mut pos = 0;
        for (len, value) in signed {
            setbits(&mut buf, pos, len, value as i32);
            pos += len;
        }

        setbitu(&mut buf, pos, 32, (self.ecc * 2f64.powi(33)) as u32);
        pos += 32;
        setbits(&mut buf, pos, 18, (self.cus * 2f64.powi(31)) as i32);
        pos += 18;
        setbitu(&mut buf, pos, 32, (self.sqrta * 2f64.powi(19)) as u32);
        pos += 32;

        let signed = [
            (18, self.cic * 2f64.powi(31)),
            (32, self.omega0 / PI * 2f64.powi(31)),
            (18, self.cis * 2f64.powi(31)),
            (32, self.inc / PI * 2f64.powi(31)),
            (18, self.crc * 2f64.powi(6)),
            (32, self.w / PI * 2f64.powi(31)),
            (24, self.omegadot / PI * 2f64.powi(43)),
        ];

        for (len, value) in signed {
            setbits(&mut buf, pos, len, value as i32);
            pos += len;
        }

        // 5 trailing zero bits complete the last byte
        crc24q(&buf, 0)
    }
}

/// Rotates a BeiDou GEO state from its inclined user frame into ECEF
/// (BDS-SIS-ICD 5.2.4.12), `tk` seconds from the reference time.
fn geo_to_ecef(
    pos: &Vector3<f64>,
    vel: &Vector3<f64>,
    acc: &Vector3<f64>,
    tk: f64,
) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let w = BDS_OMEGAE_DOT;

    let rot_x = Rotation3::from_axis_angle(&Vector3::x_axis(), -BDS_GEO_INCLINATION_DEG * D2R);
    let rot_z = Rotation3::from_axis_angle(&Vector3::z_axis(), -w * tk);
    let rot = rot_z * rot_x;

    let p = rot * pos;
    let v_rot = rot * vel;
    let a_rot = rot * acc;

    let v = Vector3::new(v_rot[0] + w * p[1], v_rot[1] - w * p[0], v_rot[2]);

    let a = Vector3::new(
        a_rot[0] + 2.0 * w * v_rot[1] - w * w * p[0],
        a_rot[1] - 2.0 * w * v_rot[0] - w * w * p[1],
        a_rot[2],
    );

    (p, v, a)
}
