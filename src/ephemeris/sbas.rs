//! SBAS orbits: quadratic extrapolation of the broadcast ECEF state.
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ephemeris::SatState, time::GpsTime};

/// SBAS ephemeris, ECEF state at `toe` (WAAS FAA-E-2892b 4.4.11)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XyzEphemeris {
    /// Position [m]
    pub pos: Vector3<f64>,
    /// Velocity [m/s]
    pub vel: Vector3<f64>,
    /// Acceleration [m/s²]
    pub acc: Vector3<f64>,
    /// Clock bias [s]
    pub a_gf0: f64,
    /// Clock drift [s/s]
    pub a_gf1: f64,
}

impl XyzEphemeris {
    pub(crate) fn state(&self, toe: &GpsTime, t: &GpsTime) -> SatState {
        let mut dt = t.difftime(toe);

        let clock_err = self.a_gf0 + dt * self.a_gf1;
        dt -= clock_err;

        SatState {
            pos: self.pos + self.vel * dt + 0.5 * self.acc * dt * dt,
            vel: self.vel + self.acc * dt,
            acc: self.acc,
            clock_err,
            clock_rate_err: self.a_gf1,
            // no issue of data for SBAS
            iodc: 0,
            iode: 0,
        }
    }
}
