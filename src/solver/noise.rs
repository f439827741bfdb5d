//! Measurement noise model
use log::error;

use crate::{constants::D2R, measurement::NavigationMeasurement, signal::Code};

const PSEUDORANGE_CN0_COEFFICIENT: f64 = 780.0;
const PSEUDORANGE_CN0_DIVISOR: f64 = 6.5;
const PSEUDORANGE_ELE_COEFFICIENT: f64 = 0.1;

/// Nominal pseudorange variances (m²). Signals other than GPS L1 are
/// given larger values to absorb the unmodeled inter signal biases.
const GPS_L1CA_PSEUDORANGE_VARIANCE: f64 = 0.4;
const GPS_L2CM_PSEUDORANGE_VARIANCE: f64 = 1.0;
const GLO_PSEUDORANGE_VARIANCE: f64 = 8.0;
const BDS_PSEUDORANGE_VARIANCE: f64 = 0.5;
const GAL_PSEUDORANGE_VARIANCE: f64 = 0.4;
const QZS_PSEUDORANGE_VARIANCE: f64 = 1.0;

/// Doppler noise (Hz²), common to all constellations
const DOPPLER_NOMINAL_VARIANCE: f64 = 0.1;
const DOPPLER_CN0_COEFFICIENT: f64 = 700.0;

/// Variance multiplier when the carrier is not phase locked
const NO_PLL_MULTIPLIER: f64 = 16.0;

/// Freshly (re)acquired signals are penalized during this period (s)
const TRACK_TIME_THRESHOLD_S: f64 = 4.0;
const SHORT_TRACK_TIME_MULTIPLIER: f64 = 4.0;

/// Measurement variances
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Noise {
    /// Pseudorange variance (m²)
    pub pseudorange: f64,
    /// Measured doppler variance (Hz²)
    pub doppler: f64,
}

fn nominal_pseudorange_variance(code: Code) -> Option<f64> {
    match code {
        Code::GpsL1ca | Code::GpsL1p => Some(GPS_L1CA_PSEUDORANGE_VARIANCE),
        Code::GpsL2cm
        | Code::GpsL2cl
        | Code::GpsL2cx
        | Code::GpsL2p
        | Code::GpsL5i
        | Code::GpsL5q
        | Code::GpsL5x => Some(GPS_L2CM_PSEUDORANGE_VARIANCE),
        Code::GloL1of | Code::GloL2of => Some(GLO_PSEUDORANGE_VARIANCE),
        Code::Bds2B1
        | Code::Bds2B2
        | Code::Bds3B1ci
        | Code::Bds3B1cq
        | Code::Bds3B1cx
        | Code::Bds3B3i
        | Code::Bds3B3q
        | Code::Bds3B3x
        | Code::Bds3B5i
        | Code::Bds3B5q
        | Code::Bds3B5x
        | Code::Bds3B7i
        | Code::Bds3B7q
        | Code::Bds3B7x => Some(BDS_PSEUDORANGE_VARIANCE),
        Code::GalE1b
        | Code::GalE1c
        | Code::GalE1x
        | Code::GalE7i
        | Code::GalE7q
        | Code::GalE7x
        | Code::GalE5i
        | Code::GalE5q
        | Code::GalE5x => Some(GAL_PSEUDORANGE_VARIANCE),
        Code::QzsL1ca
        | Code::QzsL2cm
        | Code::QzsL2cl
        | Code::QzsL2cx
        | Code::QzsL5i
        | Code::QzsL5q
        | Code::QzsL5x => Some(QZS_PSEUDORANGE_VARIANCE),
        _ => None,
    }
}

/// Derives the pseudorange and doppler variances of this measurement,
/// from its elevation, CN0 and tracking state.
pub(crate) fn measurement_noises(meas: &NavigationMeasurement) -> Noise {
    let cn0_term = (-meas.cn0 / PSEUDORANGE_CN0_DIVISOR).exp();

    // sin(el) is floored to avoid dividing by zero
    let el_term = 1.0 / (meas.elevation * D2R).sin().max(1.0E-3);

    let mut pseudorange = match nominal_pseudorange_variance(meas.sid.code) {
        Some(nominal) => {
            nominal
                + PSEUDORANGE_CN0_COEFFICIENT * cn0_term
                + PSEUDORANGE_ELE_COEFFICIENT * el_term * el_term
        },
        None => {
            error!("{} unsupported code in noise model", meas.sid);
            0.0
        },
    };

    let mut doppler = DOPPLER_NOMINAL_VARIANCE + DOPPLER_CN0_COEFFICIENT * cn0_term;

    if !meas.phase_valid() {
        pseudorange *= NO_PLL_MULTIPLIER;
        doppler *= NO_PLL_MULTIPLIER;
    }

    if meas.lock_time < TRACK_TIME_THRESHOLD_S {
        // from MULTIPLIER at 0 s down to 1 at the threshold
        let coef = SHORT_TRACK_TIME_MULTIPLIER
            - (SHORT_TRACK_TIME_MULTIPLIER - 1.0) * meas.lock_time / TRACK_TIME_THRESHOLD_S;
        pseudorange *= coef;
        doppler *= coef;
    }

    Noise {
        pseudorange,
        doppler,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{prelude::SignalId, tests::init_logger, time::GpsTime};
    use nalgebra::Vector3;
    use rstest::rstest;

    fn meas(code: Code, elevation: f64, cn0: f64, lock_time: f64) -> NavigationMeasurement {
        NavigationMeasurement::new(
            SignalId::new(code, 1),
            GpsTime::new(1939, 42.0),
            20.0E6,
            Vector3::new(20.0E6, 0.0, 0.0),
        )
        .with_carrier_phase(0.0, lock_time)
        .with_cn0(cn0)
        .with_elevation_azimuth(elevation, 0.0)
    }

    #[rstest]
    #[case(Code::GpsL1ca, 0.4)]
    #[case(Code::GpsL1p, 0.4)]
    #[case(Code::GpsL2cm, 1.0)]
    #[case(Code::GpsL5q, 1.0)]
    #[case(Code::GloL1of, 8.0)]
    #[case(Code::Bds2B1, 0.5)]
    #[case(Code::Bds3B5x, 0.5)]
    #[case(Code::GalE1b, 0.4)]
    #[case(Code::GalE5q, 0.4)]
    #[case(Code::QzsL1ca, 1.0)]
    fn nominal_variances(#[case] code: Code, #[case] nominal: f64) {
        init_logger();

        // zenith, strong signal, long locked
        let noise = measurement_noises(&meas(code, 90.0, 200.0, 10.0));
        assert!((noise.pseudorange - nominal - 0.1).abs() < 1.0E-9);
        assert!((noise.doppler - DOPPLER_NOMINAL_VARIANCE).abs() < 1.0E-9);
    }

    #[test]
    fn elevation_and_cn0_terms() {
        init_logger();

        let noise = measurement_noises(&meas(Code::GpsL1ca, 30.0, 39.0, 5.0));
        let cn0_term = (-39.0_f64 / 6.5).exp();
        let expected = 0.4 + 780.0 * cn0_term + 0.1 * 4.0;
        assert!((noise.pseudorange - expected).abs() < 1.0E-9);
        assert!((noise.doppler - (0.1 + 700.0 * cn0_term)).abs() < 1.0E-9);

        // horizon is floored
        let noise = measurement_noises(&meas(Code::GpsL1ca, 0.0, 0.0, 5.0));
        assert!((noise.pseudorange - (0.4 + 780.0 + 1.0E5)).abs() < 1.0E-6);

        // lower elevation, lower weight
        let high = measurement_noises(&meas(Code::GpsL1ca, 60.0, 45.0, 5.0));
        let low = measurement_noises(&meas(Code::GpsL1ca, 10.0, 45.0, 5.0));
        assert!(low.pseudorange > high.pseudorange);
    }

    #[test]
    fn tracking_penalties() {
        init_logger();

        let locked = measurement_noises(&meas(Code::GpsL1ca, 45.0, 40.0, 10.0));

        let mut unlocked = meas(Code::GpsL1ca, 45.0, 40.0, 10.0);
        unlocked.flags.remove(crate::measurement::MeasurementFlags::PHASE_VALID);
        let unlocked = measurement_noises(&unlocked);
        assert!((unlocked.pseudorange - 16.0 * locked.pseudorange).abs() < 1.0E-9);
        assert!((unlocked.doppler - 16.0 * locked.doppler).abs() < 1.0E-9);

        let fresh = measurement_noises(&meas(Code::GpsL1ca, 45.0, 40.0, 0.0));
        assert!((fresh.pseudorange - 4.0 * locked.pseudorange).abs() < 1.0E-9);

        let halfway = measurement_noises(&meas(Code::GpsL1ca, 45.0, 40.0, 2.0));
        assert!((halfway.doppler - 2.5 * locked.doppler).abs() < 1.0E-9);

        let settled = measurement_noises(&meas(Code::GpsL1ca, 45.0, 40.0, 4.0));
        assert_eq!(settled, locked);
    }

    #[test]
    fn unsupported_code() {
        init_logger();
        let noise = measurement_noises(&meas(Code::SbasL1ca, 45.0, 40.0, 10.0));
        assert_eq!(noise.pseudorange, 0.0);
        assert!(noise.doppler > 0.0);
    }
}
