//! Iterative least squares: position and clock bias first,
//! then a single velocity and clock drift step.
use log::{debug, warn};
use nalgebra::{DVector, Matrix4, MatrixXx4, RowVector4, Vector3, Vector4};

use crate::{
    constants::{GPS_OMEGAE_DOT, SPEED_OF_LIGHT_M_S},
    error::Error,
    linalg::weighted_least_squares,
    measurement::NavigationMeasurement,
    prelude::SignalId,
    solver::noise::{measurement_noises, Noise},
};

/// Dimension of the position and clock state
pub(crate) const N_STATE: usize = 4;

const PVT_MAX_ITERATIONS: usize = 10;

/// Iteration stops once the position correction is below this value (m)
const PVT_CONVERGENCE_THRESHOLD: f64 = 0.001;

/// A measurement retained by the selection stage, along with its carrier wavelength.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Observation<'a> {
    pub meas: &'a NavigationMeasurement,
    /// Carrier wavelength (m)
    pub lambda: f64,
}

impl<'a> Observation<'a> {
    pub fn sid(&self) -> SignalId {
        self.meas.sid
    }

    pub fn noises(&self) -> Noise {
        measurement_noises(self.meas)
    }

    /// Doppler variance, converted to (m/s)²
    pub fn doppler_variance_m_s(&self) -> f64 {
        self.noises().doppler * self.lambda * self.lambda
    }

    /// Observed minus predicted pseudorange (m)
    pub fn range_residual(&self, x: &Vector4<f64>) -> f64 {
        let (predicted, _) = predicted_pseudorange(x, &self.meas.sat_pos);
        self.meas.pseudorange - predicted
    }

    /// Observed minus predicted range rate (m/s)
    pub fn doppler_residual(&self, x: &Vector4<f64>, v: &Vector4<f64>) -> f64 {
        -self.meas.measured_doppler * self.lambda - predicted_doppler(x, v, self.meas)
    }
}

/// Rotates a satellite vector about the Z axis by the Earth rotation during
/// the time of flight `tau`. The ECEF frame rotates with the Earth,
/// so the rotation is through -ωτ (small angle approximation, below 1 mm).
pub(crate) fn sagnac_rotation(v: &Vector3<f64>, tau: f64) -> Vector3<f64> {
    let we_tau = GPS_OMEGAE_DOT * tau;
    Vector3::new(v[0] + we_tau * v[1], v[1] - we_tau * v[0], v[2])
}

/// Predicted pseudorange (m) from the state `x` (position and clock bias),
/// and the line of sight unit vector from the receiver to the satellite.
pub(crate) fn predicted_pseudorange(
    x: &Vector4<f64>,
    sat_pos: &Vector3<f64>,
) -> (f64, Vector3<f64>) {
    let user_pos = x.fixed_rows::<3>(0).into_owned();

    let tau = (user_pos - sat_pos).norm() / SPEED_OF_LIGHT_M_S;
    let sat_pos = sagnac_rotation(sat_pos, tau);

    let los = sat_pos - user_pos;
    let range = los.norm();

    (range + x[3], los / range)
}

/// Predicted range rate (m/s): relative velocity projected on the line of sight,
/// plus the clock drift.
pub(crate) fn predicted_doppler(
    x: &Vector4<f64>,
    v: &Vector4<f64>,
    meas: &NavigationMeasurement,
) -> f64 {
    let user_pos = x.fixed_rows::<3>(0).into_owned();
    let user_vel = v.fixed_rows::<3>(0).into_owned();

    let los = meas.sat_pos - user_pos;
    let tau = los.norm() / SPEED_OF_LIGHT_M_S;

    let sat_vel = sagnac_rotation(&meas.sat_vel, tau);

    los.normalize().dot(&(sat_vel - user_vel)) + v[3]
}

/// Least squares results and intermediate quantities.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LsqSolution {
    /// Position (m) and clock bias (m)
    pub x: Vector4<f64>,
    /// Velocity (m/s) and clock drift (m/s)
    pub v: Vector4<f64>,
    /// Unweighted (GᵀG)⁻¹, for dilution of precision
    pub h: Matrix4<f64>,
    /// Position and clock covariance (m²)
    pub cov: Matrix4<f64>,
    /// Velocity and drift covariance ((m/s)²)
    pub vel_cov: Matrix4<f64>,
    /// Observed minus predicted pseudoranges (m)
    pub omp_range: DVector<f64>,
    /// Observed minus predicted range rates (m/s)
    pub omp_doppler: DVector<f64>,
}

impl LsqSolution {
    fn new(n: usize) -> Self {
        Self {
            x: Vector4::zeros(),
            v: Vector4::zeros(),
            h: Matrix4::zeros(),
            cov: Matrix4::zeros(),
            vel_cov: Matrix4::zeros(),
            omp_range: DVector::zeros(n),
            omp_doppler: DVector::zeros(n),
        }
    }

    pub fn position(&self) -> Vector3<f64> {
        self.x.fixed_rows::<3>(0).into_owned()
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.v.fixed_rows::<3>(0).into_owned()
    }
}

fn inverse_variance(variance: f64) -> f64 {
    if variance > 0.0 {
        1.0 / variance
    } else {
        1.0
    }
}

/// Single step velocity solution, reusing the geometry of the converged position.
fn velocity_step(
    obs: &[Observation],
    g: &MatrixXx4<f64>,
    sol: &mut LsqSolution,
) -> Result<(), Error> {
    let w = DVector::from_iterator(
        obs.len(),
        obs.iter().map(|ob| inverse_variance(ob.doppler_variance_m_s())),
    );

    for (j, ob) in obs.iter().enumerate() {
        sol.omp_doppler[j] = ob.doppler_residual(&sol.x, &sol.v);
    }

    let (v, vel_cov) = weighted_least_squares(g, &sol.omp_doppler, &w)?;
    sol.v = v;
    sol.vel_cov = vel_cov;

    // residuals against the solved velocity
    for (j, ob) in obs.iter().enumerate() {
        sol.omp_doppler[j] = ob.doppler_residual(&sol.x, &sol.v);
    }

    Ok(())
}

/// One Newton-Raphson step. Returns true once the solution has converged.
fn pvt_step(obs: &[Observation], velocity: bool, sol: &mut LsqSolution) -> Result<bool, Error> {
    let n = obs.len();

    // jacobian of the pseudoranges with respect to (x, y, z, clock bias)
    let mut g = MatrixXx4::<f64>::zeros(n);
    let mut w = DVector::<f64>::zeros(n);

    for (j, ob) in obs.iter().enumerate() {
        let (predicted, los) = predicted_pseudorange(&sol.x, &ob.meas.sat_pos);

        sol.omp_range[j] = ob.meas.pseudorange - predicted;

        let variance = ob.noises().pseudorange;
        w[j] = if variance != 0.0 { 1.0 / variance } else { 1.0 };

        g.set_row(j, &RowVector4::new(-los[0], -los[1], -los[2], 1.0));
    }

    let (dx, cov) = weighted_least_squares(&g, &sol.omp_range, &w)?;

    sol.x += dx;
    sol.cov = cov;

    if dx.fixed_rows::<3>(0).norm() > PVT_CONVERGENCE_THRESHOLD {
        return Ok(false);
    }

    if velocity {
        velocity_step(obs, &g, sol)?;
    } else {
        sol.v = Vector4::zeros();
        sol.vel_cov = Matrix4::zeros();
        sol.omp_doppler.fill(0.0);
    }

    let (_, h) = weighted_least_squares(&g, &sol.omp_range, &DVector::from_element(n, 1.0))?;
    sol.h = h;

    Ok(true)
}

/// Iterates from the Earth center until the solution converges.
/// Returns None if the system can't be solved or did not converge
/// within the iteration budget.
pub(crate) fn pvt_iter(obs: &[Observation], velocity: bool) -> Option<LsqSolution> {
    let mut sol = LsqSolution::new(obs.len());

    for iter in 0..PVT_MAX_ITERATIONS {
        match pvt_step(obs, velocity, &mut sol) {
            Ok(true) => {
                debug!("pvt converged after {} iteration(s)", iter + 1);
                return Some(sol);
            },
            Ok(false) => {},
            Err(e) => {
                warn!("pvt iteration failure: {} (n_used={})", e, obs.len());
                return None;
            },
        }
    }

    debug!("pvt did not converge (n_used={})", obs.len());
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        prelude::SignalId,
        signal::Code,
        tests::{init_logger, synthetic_measurements, synthetic_position, SYNTHETIC_CLOCK_BIAS},
    };

    fn observations(meas: &[NavigationMeasurement]) -> Vec<Observation<'_>> {
        meas.iter()
            .map(|meas| Observation {
                meas,
                lambda: SPEED_OF_LIGHT_M_S / meas.sid.code.carrier_frequency_hz(),
            })
            .collect()
    }

    #[test]
    fn sagnac() {
        init_logger();

        let v = Vector3::new(20.0E6, 10.0E6, 5.0E6);
        assert_eq!(sagnac_rotation(&v, 0.0), v);

        let rotated = sagnac_rotation(&v, 0.07);
        assert_eq!(rotated[2], v[2]);

        // eastward earth rotation moves the satellite westward in ECEF
        let we_tau = GPS_OMEGAE_DOT * 0.07;
        assert!((rotated[0] - v[0] - we_tau * v[1]).abs() < 1.0E-9);
        assert!((rotated[1] - v[1] + we_tau * v[0]).abs() < 1.0E-9);
    }

    #[test]
    fn prediction() {
        init_logger();

        let sat_pos = Vector3::new(0.0, 0.0, 26_000.0E3);
        let x = Vector4::new(0.0, 0.0, 6_400.0E3, 100.0);

        let (range, los) = predicted_pseudorange(&x, &sat_pos);
        assert!((range - 19_600.0E3 - 100.0).abs() < 1.0E-6);
        assert!((los - Vector3::z()).norm() < 1.0E-12);

        let meas = NavigationMeasurement::new(
            SignalId::new(Code::GpsL1ca, 1),
            Default::default(),
            range,
            sat_pos,
        )
        .with_sat_vel(Vector3::new(0.0, 0.0, -500.0));

        // receiver climbing at 10 m/s, 2 m/s drift
        let v = Vector4::new(0.0, 0.0, 10.0, 2.0);
        let rate = predicted_doppler(&x, &v, &meas);
        assert!((rate - (-510.0 + 2.0)).abs() < 1.0E-9);
    }

    #[test]
    fn noise_free_convergence() {
        init_logger();

        let meas = synthetic_measurements();
        let obs = observations(&meas);

        let sol = pvt_iter(&obs, true).unwrap();

        assert!((sol.position() - synthetic_position()).norm() < 1.0E-3);
        assert!((sol.x[3] - SYNTHETIC_CLOCK_BIAS).abs() < 1.0E-3);
        assert!(sol.omp_range.amax() < 1.0E-3);

        // DOP matrix is symmetric
        assert!((sol.h - sol.h.transpose()).amax() < 1.0E-9);
    }

    #[test]
    fn under_determined() {
        init_logger();

        let meas = synthetic_measurements();
        let obs = observations(&meas[..3]);
        assert!(pvt_iter(&obs, false).is_none());
    }

    #[test]
    fn position_only() {
        init_logger();

        let meas = synthetic_measurements();
        let obs = observations(&meas);

        let sol = pvt_iter(&obs, false).unwrap();
        assert_eq!(sol.v, Vector4::zeros());
        assert_eq!(sol.omp_doppler, DVector::zeros(obs.len()));
        assert!((sol.position() - synthetic_position()).norm() < 1.0E-3);
    }
}
