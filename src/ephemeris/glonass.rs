//! GLONASS orbits, integrated from the broadcast state vector.
use nalgebra::{Vector3, Vector6};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{GLO_A_E, GLO_GM, GLO_J02, GLO_OMEGAE_DOT},
    ephemeris::SatState,
    time::GpsTime,
};

/// Longest Runge-Kutta integration step [s]
const GLO_MAX_STEP_LENGTH: f64 = 30.0;

/// Maximal number of Runge-Kutta integration steps
const GLO_MAX_STEP_NUM: u32 = 30;

/// GLONASS ephemeris: satellite state vector at `toe` in PZ-90 ECEF.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GloEphemeris {
    /// Relative frequency bias
    pub gamma: f64,
    /// Clock correction [s]
    pub tau: f64,
    /// Equipment delay between L1 and L2 [s]
    pub d_tau: f64,
    /// Position [m]
    pub pos: Vector3<f64>,
    /// Velocity [m/s]
    pub vel: Vector3<f64>,
    /// Luni-solar acceleration [m/s²]
    pub acc: Vector3<f64>,
    /// Frequency channel, offset by 8 (1..=14), 0 when unknown
    pub fcn: u16,
    /// Issue of data
    pub iod: u8,
}

/// Time derivative of the (position, velocity) state vector,
/// PZ-90 central field with J2 and the broadcast luni-solar term
/// (GLONASS ICD A.3.1.2).
fn derivatives(pos: &Vector3<f64>, vel: &Vector3<f64>, acc: &Vector3<f64>) -> Vector6<f64> {
    let r = pos.norm();

    let m_r3 = GLO_GM / (r * r * r);
    let inv_r2 = 1.0 / (r * r);

    let g_term = 3.0 / 2.0 * GLO_J02 * m_r3 * GLO_A_E * GLO_A_E * inv_r2;
    let lg_term = 1.0 - 5.0 * pos[2] * pos[2] * inv_r2;

    let omega_sqr = GLO_OMEGAE_DOT * GLO_OMEGAE_DOT;

    Vector6::new(
        vel[0],
        vel[1],
        vel[2],
        -m_r3 * pos[0] - g_term * pos[0] * lg_term
            + omega_sqr * pos[0]
            + 2.0 * GLO_OMEGAE_DOT * vel[1]
            + acc[0],
        -m_r3 * pos[1] - g_term * pos[1] * lg_term + omega_sqr * pos[1]
            - 2.0 * GLO_OMEGAE_DOT * vel[0]
            + acc[1],
        -m_r3 * pos[2] - g_term * pos[2] * (2.0 + lg_term) + acc[2],
    )
}

fn split(y: &Vector6<f64>) -> (Vector3<f64>, Vector3<f64>) {
    (y.fixed_rows::<3>(0).into(), y.fixed_rows::<3>(3).into())
}

impl GloEphemeris {
    /// Satellite state at `t`, fourth order Runge-Kutta integration from `toe`.
    pub(crate) fn state(&self, toe: &GpsTime, tgd: f64, t: &GpsTime) -> SatState {
        let mut dt = t.difftime(toe);

        let clock_err = -self.tau + self.gamma * dt - tgd;
        let clock_rate_err = self.gamma;

        dt -= clock_err;

        let num_steps = ((dt.abs() / GLO_MAX_STEP_LENGTH).ceil() as u32).min(GLO_MAX_STEP_NUM);

        let (pos, vel) = if num_steps > 0 {
            let h = dt / num_steps as f64;

            let mut y = Vector6::new(
                self.pos[0],
                self.pos[1],
                self.pos[2],
                self.vel[0],
                self.vel[1],
                self.vel[2],
            );

            let f = |y: &Vector6<f64>| {
                let (p, v) = split(y);
                derivatives(&p, &v, &self.acc)
            };

            for _ in 0..num_steps {
                let k1 = f(&y);
                let k2 = f(&(y + h / 2.0 * k1));
                let k3 = f(&(y + h / 2.0 * k2));
                let k4 = f(&(y + h * k3));
                y += h / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
            }

            split(&y)
        } else {
            (self.pos, self.vel)
        };

        let acc = derivatives(&pos, &vel, &self.acc).fixed_rows::<3>(3).into();

        SatState {
            pos,
            vel,
            acc,
            clock_err,
            clock_rate_err,
            iodc: self.iod as u16,
            iode: self.iod,
        }
    }
}
