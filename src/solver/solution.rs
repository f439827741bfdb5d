use nalgebra::{Matrix4, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    coords::{ecef_to_llh, ecef_to_ned},
    solver::{dop::Dops, lsq::LsqSolution, SolverError},
    time::GpsTime,
};

/// Solutions below this altitude are rejected (m)
const MIN_ALTITUDE_M: f64 = -1.0E3;

/// Solutions above this altitude are rejected (m)
const MAX_ALTITUDE_M: f64 = 1.0E6;

/// Solutions with a GDOP above this value are rejected
const MAX_GDOP: f64 = 20.0;

/// 1000 knots (m/s). Faster solutions must not be reported.
const MAX_VELOCITY_M_S: f64 = 0.514444444 * 1000.0;

/// [Solution] of the single epoch solver
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solution {
    /// Receiver position, ECEF (m)
    pub pos_ecef: Vector3<f64>,
    /// Receiver position: latitude (rad), longitude (rad), height (m)
    pub pos_llh: Vector3<f64>,
    /// Receiver velocity, ECEF (m/s)
    pub vel_ecef: Vector3<f64>,
    /// Receiver velocity, North East Down (m/s)
    pub vel_ned: Vector3<f64>,
    /// Receiver clock offset (s)
    pub clock_offset: f64,
    /// Receiver clock offset variance (s²)
    pub clock_offset_var: f64,
    /// Receiver clock drift (s/s)
    pub clock_drift: f64,
    /// Receiver clock drift variance (s²/s²)
    pub clock_drift_var: f64,
    /// Position covariance, upper triangle (xx, xy, xz, yy, yz, zz),
    /// followed by the GDOP
    pub err_cov: [f64; 7],
    /// Velocity covariance, same layout as [Self::err_cov]
    pub vel_cov: [f64; 7],
    /// Solution time: time of reception corrected by the clock offset
    pub time: GpsTime,
    /// Number of satellites contributing to the solution
    pub n_sats_used: u8,
    /// Number of signals contributing to the solution
    pub n_sigs_used: u8,
    pub valid: bool,
    pub velocity_valid: bool,
}

/// Upper triangle of the 3x3 position (or velocity) block, followed by the GDOP.
fn covariance_layout(cov: &Matrix4<f64>, gdop: f64) -> [f64; 7] {
    [
        cov[(0, 0)],
        cov[(0, 1)],
        cov[(0, 2)],
        cov[(1, 1)],
        cov[(1, 2)],
        cov[(2, 2)],
        gdop,
    ]
}

impl Solution {
    /// Builds a [Solution] from the least squares results.
    /// Velocity is reported (and marked valid) only when `velocity` is set.
    pub(crate) fn new(lsq: &LsqSolution, dops: &Dops, tor: &GpsTime, velocity: bool) -> Self {
        let pos_ecef = lsq.position();

        let mut solution = Self {
            pos_ecef,
            pos_llh: ecef_to_llh(&pos_ecef),
            err_cov: covariance_layout(&lsq.cov, dops.gdop),
            clock_offset: lsq.x[3] / SPEED_OF_LIGHT_M_S,
            clock_offset_var: lsq.cov[(3, 3)] / SPEED_OF_LIGHT_M_S / SPEED_OF_LIGHT_M_S,
            time: *tor - lsq.x[3] / SPEED_OF_LIGHT_M_S,
            ..Default::default()
        };

        if velocity {
            let vel_ecef = lsq.velocity();

            solution.vel_ecef = vel_ecef;
            solution.vel_ned = ecef_to_ned(&vel_ecef, &pos_ecef);
            solution.vel_cov = covariance_layout(&lsq.vel_cov, dops.gdop);
            solution.clock_drift = lsq.v[3] / SPEED_OF_LIGHT_M_S;
            solution.clock_drift_var = lsq.vel_cov[(3, 3)] / SPEED_OF_LIGHT_M_S / SPEED_OF_LIGHT_M_S;
        }

        solution
    }

    /// Rejects solutions with a poor geometry, an unlikely altitude
    /// or a forbidden velocity.
    pub(crate) fn validate(&self, dops: &Dops) -> Result<(), SolverError> {
        if dops.gdop > MAX_GDOP {
            return Err(SolverError::PdopTooHigh);
        }

        if self.pos_llh[2] < MIN_ALTITUDE_M || self.pos_llh[2] > MAX_ALTITUDE_M {
            return Err(SolverError::BadAltitude);
        }

        // must not be modified: export regulations
        if self.vel_ecef.norm() >= MAX_VELOCITY_M_S {
            return Err(SolverError::VelocityLockout);
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{coords::llh_to_ecef, constants::D2R, tests::init_logger};
    use nalgebra::{DVector, Vector4};

    fn lsq(pos: Vector3<f64>, vel: Vector3<f64>) -> LsqSolution {
        LsqSolution {
            x: Vector4::new(pos[0], pos[1], pos[2], 299_792.458),
            v: Vector4::new(vel[0], vel[1], vel[2], -29.9792458),
            h: Matrix4::identity(),
            cov: Matrix4::from_diagonal(&Vector4::new(1.0, 2.0, 3.0, 4.0)),
            vel_cov: Matrix4::from_diagonal(&Vector4::new(0.1, 0.2, 0.3, 0.4)),
            omp_range: DVector::zeros(5),
            omp_doppler: DVector::zeros(5),
        }
    }

    #[test]
    fn clock_and_covariances() {
        init_logger();

        let pos = llh_to_ecef(&Vector3::new(37.0 * D2R, -122.0 * D2R, 50.0));
        let lsq = lsq(pos, Vector3::new(1.0, 2.0, 3.0));
        let dops = Dops::new(&lsq.h, &pos);

        let tor = GpsTime::new(1939, 42.0);
        let solution = Solution::new(&lsq, &dops, &tor, true);

        assert!((solution.clock_offset - 1.0E-3).abs() < 1.0E-12);
        assert!((solution.clock_drift + 1.0E-7).abs() < 1.0E-15);
        assert!((solution.time.tow() - 41.999).abs() < 1.0E-9);
        assert_eq!(solution.time.week(), Some(1939));

        assert_eq!(solution.err_cov, [1.0, 0.0, 0.0, 2.0, 0.0, 3.0, 2.0]);
        assert_eq!(solution.vel_cov, [0.1, 0.0, 0.0, 0.2, 0.0, 0.3, 2.0]);

        assert!((solution.pos_llh[2] - 50.0).abs() < 1.0E-6);
        assert!((solution.vel_ned.norm() - solution.vel_ecef.norm()).abs() < 1.0E-9);
        assert!(solution.validate(&dops).is_ok());

        // velocity is not reported
        let solution = Solution::new(&lsq, &dops, &tor, false);
        assert_eq!(solution.vel_ecef, Vector3::zeros());
        assert_eq!(solution.vel_cov, [0.0; 7]);
        assert_eq!(solution.clock_drift, 0.0);
    }

    #[test]
    fn sanity_filter() {
        init_logger();

        let pos = llh_to_ecef(&Vector3::new(45.0 * D2R, 5.0 * D2R, 200.0));
        let dops = Dops::new(&Matrix4::identity(), &pos);
        let tor = GpsTime::new(1939, 42.0);

        let valid = Solution::new(&lsq(pos, Vector3::zeros()), &dops, &tor, true);
        assert!(valid.validate(&dops).is_ok());

        let mut poor = dops;
        poor.gdop = 20.5;
        assert_eq!(valid.validate(&poor), Err(SolverError::PdopTooHigh));

        for height in [-1500.0, 1.5E6] {
            let pos = llh_to_ecef(&Vector3::new(45.0 * D2R, 5.0 * D2R, height));
            let solution = Solution::new(&lsq(pos, Vector3::zeros()), &dops, &tor, true);
            assert_eq!(solution.validate(&dops), Err(SolverError::BadAltitude));
        }

        let fast = Solution::new(&lsq(pos, Vector3::new(300.0, 300.0, 300.0)), &dops, &tor, true);
        assert_eq!(fast.validate(&dops), Err(SolverError::VelocityLockout));

        // not reported, not verified
        let fast = Solution::new(&lsq(pos, Vector3::new(300.0, 300.0, 300.0)), &dops, &tor, false);
        assert!(fast.validate(&dops).is_ok());
    }
}
