//! WGS84 coordinate conversions.
//!
//! Geodetic coordinates are expressed as `(latitude [rad], longitude [rad], height [m])`,
//! cartesian coordinates as ECEF meters.
use nalgebra::{Matrix3, Vector3};

use crate::constants::{WGS84_A, WGS84_E};

const ECEF2LLH_MAX_ITER: usize = 20;

/// Geodetic to ECEF conversion.
pub fn llh_to_ecef(llh: &Vector3<f64>) -> Vector3<f64> {
    let (lat, lon, h) = (llh[0], llh[1], llh[2]);
    let e2 = WGS84_E * WGS84_E;

    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + h) * cos_lat * cos_lon,
        (n + h) * cos_lat * sin_lon,
        (n * (1.0 - e2) + h) * sin_lat,
    )
}

/// ECEF to geodetic conversion.
pub fn ecef_to_llh(ecef: &Vector3<f64>) -> Vector3<f64> {
    let (x, y, z) = (ecef[0], ecef[1], ecef[2]);
    let e2 = WGS84_E * WGS84_E;

    let p = x.hypot(y);
    let lon = y.atan2(x);

    let mut lat = z.atan2(p * (1.0 - e2));

    for _ in 0..ECEF2LLH_MAX_ITER {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + e2 * n * sin_lat).atan2(p);

        let converged = (next - lat).abs() < 1.0E-15;
        lat = next;

        if converged {
            break;
        }
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let h = p * cos_lat + z * sin_lat - WGS84_A * (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Vector3::new(lat, lon, h)
}

/// Rotation matrix from ECEF to the local North East Down frame at `ref_ecef`.
pub fn ecef_to_ned_matrix(ref_ecef: &Vector3<f64>) -> Matrix3<f64> {
    let llh = ecef_to_llh(ref_ecef);

    let (sin_lat, cos_lat) = llh[0].sin_cos();
    let (sin_lon, cos_lon) = llh[1].sin_cos();

    Matrix3::new(
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        -sin_lon,
        cos_lon,
        0.0,
        -cos_lat * cos_lon,
        -cos_lat * sin_lon,
        -sin_lat,
    )
}

/// Rotates an ECEF vector (a velocity for example) into the NED frame at `ref_ecef`.
pub fn ecef_to_ned(v: &Vector3<f64>, ref_ecef: &Vector3<f64>) -> Vector3<f64> {
    ecef_to_ned_matrix(ref_ecef) * v
}

/// NED coordinates of the `ecef` point relative to `ref_ecef`.
pub fn ecef_to_ned_d(ecef: &Vector3<f64>, ref_ecef: &Vector3<f64>) -> Vector3<f64> {
    ecef_to_ned(&(ecef - ref_ecef), ref_ecef)
}

/// Azimuth and elevation [rad] of `ecef` as seen from `ref_ecef`.
/// Azimuth is within [0, 2π), elevation within [-π/2, π/2].
pub fn ecef_to_azel(ecef: &Vector3<f64>, ref_ecef: &Vector3<f64>) -> (f64, f64) {
    let ned = ecef_to_ned_d(ecef, ref_ecef);

    let mut azimuth = ned[1].atan2(ned[0]);
    if azimuth < 0.0 {
        azimuth += 2.0 * std::f64::consts::PI;
    }

    let norm = ned.norm();
    let elevation = if norm > 0.0 {
        (-ned[2] / norm).clamp(-1.0, 1.0).asin()
    } else {
        0.0
    };

    (azimuth, elevation)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        constants::{D2R, WGS84_B},
        tests::init_logger,
    };
    use rand::{prelude::*, rngs::SmallRng, SeedableRng};

    #[test]
    fn llh_roundtrip() {
        init_logger();

        let mut rng = SmallRng::seed_from_u64(1234);

        for _ in 0..10_000 {
            let llh = Vector3::new(
                rng.random_range(-90.0..90.0) * D2R,
                rng.random_range(-180.0..180.0) * D2R,
                rng.random_range(-1000.0..40_000_000.0),
            );

            let back = ecef_to_llh(&llh_to_ecef(&llh));

            assert!((back[0] - llh[0]).abs() < 1e-10, "latitude error");
            assert!((back[1] - llh[1]).abs() < 1e-10, "longitude error");
            assert!((back[2] - llh[2]).abs() < 1e-4, "height error");
        }
    }

    #[test]
    fn poles_and_equator() {
        init_logger();

        let north = ecef_to_llh(&Vector3::new(0.0, 0.0, WGS84_B));
        assert!((north[0] - 90.0 * D2R).abs() < 1e-12);
        assert!(north[2].abs() < 1e-6);

        let south = ecef_to_llh(&Vector3::new(0.0, 0.0, -WGS84_B - 10.0));
        assert!((south[0] + 90.0 * D2R).abs() < 1e-12);
        assert!((south[2] - 10.0).abs() < 1e-6);

        let equator = ecef_to_llh(&Vector3::new(WGS84_A + 100.0, 0.0, 0.0));
        assert!(equator[0].abs() < 1e-12);
        assert!(equator[1].abs() < 1e-12);
        assert!((equator[2] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn azimuth_elevation() {
        init_logger();

        let reference = llh_to_ecef(&Vector3::new(37.0 * D2R, -122.0 * D2R, 10.0));

        let up = llh_to_ecef(&Vector3::new(37.0 * D2R, -122.0 * D2R, 20_000_000.0));
        let (_, el) = ecef_to_azel(&up, &reference);
        assert!((el - 90.0 * D2R).abs() < 1e-6);

        let north = llh_to_ecef(&Vector3::new(37.01 * D2R, -122.0 * D2R, 10.0));
        let (az, el) = ecef_to_azel(&north, &reference);
        assert!(az < 1e-3 || az > 2.0 * std::f64::consts::PI - 1e-3);
        assert!(el < 0.0 && el > -1.0 * D2R);

        let west = llh_to_ecef(&Vector3::new(37.0 * D2R, -122.01 * D2R, 10.0));
        let (az, _) = ecef_to_azel(&west, &reference);
        assert!((az - 270.0 * D2R).abs() < 1e-2);
    }

    #[test]
    fn ned_rotation() {
        init_logger();

        let reference = llh_to_ecef(&Vector3::new(45.0 * D2R, 10.0 * D2R, 0.0));
        let m = ecef_to_ned_matrix(&reference);

        let identity = m * m.transpose();
        assert!((identity - Matrix3::identity()).amax() < 1e-12);

        // local vertical points down in NED
        let ned = ecef_to_ned(&(reference / reference.norm()), &reference);
        assert!(ned[2] < -0.99);
    }
}
