//! Single epoch measurement sets.
//! Every measurement is received at [tor], 77 ms after transmission.
use nalgebra::Vector3;

use crate::{
    constants::{GPS_OMEGAE_DOT, R2D, SPEED_OF_LIGHT_M_S},
    coords::ecef_to_azel,
    measurement::{MeasurementFlags, NavigationMeasurement},
    prelude::SignalId,
    signal::{Code, GloFcnMap},
    time::GpsTime,
};

/// Time of reception
pub fn tor() -> GpsTime {
    GpsTime::new(1939, 42.0)
}

fn tot() -> GpsTime {
    tor() - 0.077
}

/// Code, doppler and phase locked measurement, zero doppler, zero elevation.
fn locked(code: Code, sat: u16, pseudorange: f64, sat_pos: [f64; 3], cn0: f64) -> NavigationMeasurement {
    NavigationMeasurement::new(
        SignalId::new(code, sat),
        tot(),
        pseudorange,
        Vector3::from(sat_pos),
    )
    .with_doppler(0.0)
    .with_carrier_phase(0.0, 5.0)
    .with_cn0(cn0)
}

const NM1_PR: f64 = 23946993.888943646;
const NM1_POS: [f64; 3] = [-19477278.087422125, -7649508.9457812719, 16674633.163554827];

const NM2_PR: f64 = 22932174.156858064;
const NM2_POS: [f64; 3] = [-9680013.5408340245, -15286326.354385279, 19429449.383770257];

const NM3_PR: f64 = 24373231.648055989;
const NM3_POS: [f64; 3] = [-19858593.085281931, -3109845.8288993631, 17180320.439503901];

const NM4_PR: f64 = 24779663.252316438;
const NM4_POS: [f64; 3] = [6682497.8716542246, -14006962.389166718, 21410456.275678463];

const NM5_PR: f64 = 26948717.022331879;
const NM5_POS: [f64; 3] = [7415370.9916331079, -24974079.044485383, -3836019.0262199985];

const NM6_PR: f64 = 23327405.435463827;
const NM6_POS: [f64; 3] = [-2833466.1648670658, -22755197.793894723, 13160322.082875408];

const NM7_PR: f64 = 27371419.016328193;
const NM7_POS: [f64; 3] = [14881660.383624561, -5825253.4316490609, 21204679.68313824];

const NM8_PR: f64 = 26294221.697782904;
const NM8_POS: [f64; 3] = [12246530.477279386, -22184711.955107089, 7739084.2855069181];

const NM9_PR: f64 = 25781999.479948733;
const NM9_POS: [f64; 3] = [-25360766.249484103, -1659033.490658124, 7821492.0398916304];

pub fn nm1() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 9, NM1_PR, NM1_POS, 41.0)
}

/// [nm1] without doppler nor phase lock
pub fn nm1_no_doppler() -> NavigationMeasurement {
    let mut meas = NavigationMeasurement::new(
        SignalId::new(Code::GpsL1ca, 9),
        tot(),
        NM1_PR,
        Vector3::from(NM1_POS),
    )
    .with_cn0(39.0);
    meas.lock_time = 5.0;
    meas.flags = MeasurementFlags::CODE_VALID;
    meas
}

pub fn nm2() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 1, NM2_PR, NM2_POS, 43.0)
}

pub fn nm3() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 2, NM3_PR, NM3_POS, 35.0)
}

pub fn nm4() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 3, NM4_PR, NM4_POS, 27.0)
}

pub fn nm5() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 4, NM5_PR, NM5_POS, 39.0)
}

pub fn nm6() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 5, NM6_PR, NM6_POS, 38.0)
}

/// [nm6] with a grossly wrong doppler
pub fn nm6b() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 5, NM6_PR, NM6_POS, 40.0).with_doppler(10000.0)
}

pub fn nm7() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 6, NM7_PR, NM7_POS, 42.3)
}

pub fn nm8() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 7, NM8_PR, NM8_POS, 45.1)
}

pub fn nm9() -> NavigationMeasurement {
    locked(Code::GpsL1ca, 8, NM9_PR, NM9_POS, 37.3)
}

/// Second frequency of [nm9]
pub fn nm10() -> NavigationMeasurement {
    locked(Code::GpsL2cm, 8, NM9_PR, NM9_POS, 41.0)
}

/// [nm10] with a 30 km error
pub fn nm10b() -> NavigationMeasurement {
    locked(Code::GpsL2cm, 8, NM9_PR + 30000.0, NM9_POS, 39.2)
}

/// [nm9] geometry, seen on another satellite
pub fn nm11() -> NavigationMeasurement {
    locked(Code::GpsL2cm, 11, NM9_PR, NM9_POS, 45.4)
}

/// [nm1] transmitted by Galileo
pub fn gal1() -> NavigationMeasurement {
    locked(Code::GalE1b, 9, NM1_PR, NM1_POS, 41.0)
}

/// [nm2] transmitted by Galileo
pub fn gal2() -> NavigationMeasurement {
    locked(Code::GalE1b, 1, NM2_PR, NM2_POS, 43.0)
}

/// [nm5] transmitted by Galileo
pub fn ge5() -> NavigationMeasurement {
    locked(Code::GalE1b, 4, NM5_PR, NM5_POS, 39.0)
}

/// [nm6] transmitted by Galileo
pub fn ge6() -> NavigationMeasurement {
    locked(Code::GalE1b, 5, NM6_PR, NM6_POS, 38.0)
}

/// Synthetic receiver clock bias (m)
pub const SYNTHETIC_CLOCK_BIAS: f64 = 1500.0;

/// Synthetic receiver clock drift (m/s)
pub const SYNTHETIC_CLOCK_DRIFT: f64 = 3.0;

/// Synthetic receiver position (ECEF)
pub fn synthetic_position() -> Vector3<f64> {
    Vector3::new(-2704347.0, -4263198.0, 3884705.0)
}

/// Synthetic receiver velocity (ECEF)
pub fn synthetic_velocity() -> Vector3<f64> {
    Vector3::new(10.0, -5.0, 2.0)
}

/// Noise free measurements of the synthetic receiver, with the geometry
/// of [nm2] to [nm9]. Pseudoranges and dopplers are derived from the
/// receiver state, with the earth rotation during the time of flight.
pub fn synthetic_measurements() -> Vec<NavigationMeasurement> {
    synthetic_glonass_measurements(0, &GloFcnMap::new())
}

/// [synthetic_measurements] where the first `n_glo` satellites are GLONASS slots
/// `1..=n_glo`, transmitting L1OF on the channel `glo_map` gives them.
/// Dopplers of unmapped slots are computed on the center frequency.
pub fn synthetic_glonass_measurements(
    n_glo: usize,
    glo_map: &GloFcnMap,
) -> Vec<NavigationMeasurement> {
    let user_pos = synthetic_position();
    let user_vel = synthetic_velocity();

    [NM2_POS, NM3_POS, NM4_POS, NM5_POS, NM6_POS, NM7_POS, NM8_POS, NM9_POS]
        .iter()
        .enumerate()
        .map(|(i, sat_pos)| {
            let sid = if i < n_glo {
                SignalId::new(Code::GloL1of, i as u16 + 1)
            } else {
                SignalId::new(Code::GpsL1ca, i as u16 + 1)
            };

            let lambda = sid.lambda(glo_map).unwrap_or_else(|_| {
                SPEED_OF_LIGHT_M_S / sid.code.carrier_frequency_hz()
            });

            let sat_pos = Vector3::from(*sat_pos);
            let sat_vel = Vector3::new(100.0 * (i + 1) as f64, -200.0, 3000.0 - 100.0 * i as f64);

            let tau = (sat_pos - user_pos).norm() / SPEED_OF_LIGHT_M_S;
            let we_tau = GPS_OMEGAE_DOT * tau;

            let rotated = Vector3::new(
                sat_pos[0] + we_tau * sat_pos[1],
                sat_pos[1] - we_tau * sat_pos[0],
                sat_pos[2],
            );

            let pseudorange = (rotated - user_pos).norm() + SYNTHETIC_CLOCK_BIAS;

            let rotated_vel = Vector3::new(
                sat_vel[0] + we_tau * sat_vel[1],
                sat_vel[1] - we_tau * sat_vel[0],
                sat_vel[2],
            );

            let los = (sat_pos - user_pos).normalize();
            let range_rate = los.dot(&(rotated_vel - user_vel)) + SYNTHETIC_CLOCK_DRIFT;

            let (azimuth, elevation) = ecef_to_azel(&sat_pos, &user_pos);

            NavigationMeasurement::new(sid, tot(), pseudorange, sat_pos)
                .with_sat_vel(sat_vel)
                .with_doppler(-range_rate / lambda)
                .with_carrier_phase(0.0, 10.0)
                .with_cn0(45.0)
                .with_elevation_azimuth(elevation * R2D, azimuth * R2D)
        })
        .collect()
}
