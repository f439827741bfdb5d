//! Navigation measurements: one signal observed at one epoch.
use bitflags::bitflags;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{prelude::SignalId, time::GpsTime};

bitflags! {
    /// Advertises which fields of a [NavigationMeasurement] may be used.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct MeasurementFlags: u16 {
        /// Pseudorange is valid
        const CODE_VALID = 0x01;
        /// Carrier phase is valid
        const PHASE_VALID = 0x02;
        /// Doppler measured by the tracking loop is valid
        const MEAS_DOPPLER_VALID = 0x04;
        /// Doppler derived from carrier phase differences is valid
        const COMP_DOPPLER_VALID = 0x08;
        /// Carrier phase half cycle ambiguity is resolved
        const HALF_CYCLE_KNOWN = 0x10;
        /// CN0 estimate is valid
        const CN0_VALID = 0x20;
        /// Measurement was rejected by the integrity monitor
        const RAIM_EXCLUSION = 0x40;
    }
}

/// Largest value of the 4 bit lock time indicator
const LOCK_TIME_MAX_INDEX: u8 = 15;

/// [NavigationMeasurement] gathers everything the solver needs to know about one signal:
/// the raw and corrected observables and the state of the emitting satellite at the
/// time of transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigationMeasurement {
    /// Signal identifier
    pub sid: SignalId,
    /// Time of transmission
    pub tot: GpsTime,
    /// Time of flight multiplied by the speed of light (m)
    pub raw_pseudorange: f64,
    /// Corrected pseudorange (m)
    pub pseudorange: f64,
    /// Raw carrier phase (cycles)
    pub raw_carrier_phase: f64,
    /// Corrected carrier phase (cycles)
    pub carrier_phase: f64,
    /// Doppler from the tracking loop (Hz)
    pub raw_measured_doppler: f64,
    /// Corrected measured doppler (Hz)
    pub measured_doppler: f64,
    /// Doppler from carrier phase time differences (Hz)
    pub raw_computed_doppler: f64,
    /// Corrected computed doppler (Hz)
    pub computed_doppler: f64,
    /// Time difference used for the computed doppler (s)
    pub computed_doppler_dt: f64,
    /// Satellite ECEF position (m)
    pub sat_pos: Vector3<f64>,
    /// Satellite ECEF velocity (m/s)
    pub sat_vel: Vector3<f64>,
    /// Satellite ECEF acceleration (m/s²)
    pub sat_acc: Vector3<f64>,
    /// Issue of data ephemeris
    pub iode: u8,
    /// Issue of data clock
    pub iodc: u16,
    /// Satellite clock error (s)
    pub sat_clock_err: f64,
    /// Satellite clock error rate (s/s)
    pub sat_clock_err_rate: f64,
    /// Carrier to noise density ratio (dB-Hz)
    pub cn0: f64,
    /// Phase lock time (s)
    pub lock_time: f64,
    /// Satellite elevation (°)
    pub elevation: f64,
    /// Satellite azimuth (°)
    pub azimuth: f64,
    pub flags: MeasurementFlags,
}

impl Default for NavigationMeasurement {
    fn default() -> Self {
        Self {
            sid: SignalId::default(),
            tot: GpsTime::default(),
            raw_pseudorange: 0.0,
            pseudorange: 0.0,
            raw_carrier_phase: 0.0,
            carrier_phase: 0.0,
            raw_measured_doppler: 0.0,
            measured_doppler: 0.0,
            raw_computed_doppler: 0.0,
            computed_doppler: 0.0,
            computed_doppler_dt: 0.0,
            sat_pos: Vector3::zeros(),
            sat_vel: Vector3::zeros(),
            sat_acc: Vector3::zeros(),
            iode: 0,
            iodc: 0,
            sat_clock_err: 0.0,
            sat_clock_err_rate: 0.0,
            cn0: 0.0,
            lock_time: 0.0,
            elevation: 0.0,
            azimuth: 0.0,
            flags: MeasurementFlags::empty(),
        }
    }
}

impl NavigationMeasurement {
    /// Builds a code measurement for this signal. Both raw and corrected
    /// pseudoranges are set.
    pub fn new(sid: SignalId, tot: GpsTime, pseudorange: f64, sat_pos: Vector3<f64>) -> Self {
        Self {
            sid,
            tot,
            raw_pseudorange: pseudorange,
            pseudorange,
            sat_pos,
            flags: MeasurementFlags::CODE_VALID,
            ..Default::default()
        }
    }

    /// Copies and returns [NavigationMeasurement] with measured doppler (Hz).
    pub fn with_doppler(&self, doppler: f64) -> Self {
        let mut s = *self;
        s.raw_measured_doppler = doppler;
        s.measured_doppler = doppler;
        s.flags |= MeasurementFlags::MEAS_DOPPLER_VALID;
        s
    }

    /// Copies and returns [NavigationMeasurement] with satellite velocity (m/s).
    pub fn with_sat_vel(&self, sat_vel: Vector3<f64>) -> Self {
        let mut s = *self;
        s.sat_vel = sat_vel;
        s
    }

    /// Copies and returns [NavigationMeasurement] with carrier phase (cycles).
    pub fn with_carrier_phase(&self, phase: f64, lock_time: f64) -> Self {
        let mut s = *self;
        s.raw_carrier_phase = phase;
        s.carrier_phase = phase;
        s.lock_time = lock_time;
        s.flags |= MeasurementFlags::PHASE_VALID;
        s
    }

    /// Copies and returns [NavigationMeasurement] with CN0 (dB-Hz).
    pub fn with_cn0(&self, cn0: f64) -> Self {
        let mut s = *self;
        s.cn0 = cn0;
        s.flags |= MeasurementFlags::CN0_VALID;
        s
    }

    /// Copies and returns [NavigationMeasurement] with satellite elevation and azimuth (°).
    pub fn with_elevation_azimuth(&self, elevation: f64, azimuth: f64) -> Self {
        let mut s = *self;
        s.elevation = elevation;
        s.azimuth = azimuth;
        s
    }

    /// Code measurement that was not rejected by the integrity monitor.
    pub fn pseudorange_valid(&self) -> bool {
        self.flags.contains(MeasurementFlags::CODE_VALID)
            && !self.flags.contains(MeasurementFlags::RAIM_EXCLUSION)
    }

    pub fn doppler_valid(&self) -> bool {
        self.flags.contains(MeasurementFlags::MEAS_DOPPLER_VALID)
    }

    pub fn phase_valid(&self) -> bool {
        self.flags.contains(MeasurementFlags::PHASE_VALID)
    }
}

/// Sorts measurements by [SignalId].
pub fn sort_measurements(meas: &mut [NavigationMeasurement]) {
    meas.sort_by(|a, b| a.sid.cmp(&b.sid));
}

/// Encodes a lock time (s) into the 4 bit lock time indicator
/// (RTCM 3 DF402): 0 below 32 ms, then the smallest `i` such that
/// the lock time does not exceed `2^(i+5)` ms.
pub fn encode_lock_time(lock_time: f64) -> u8 {
    // saturating float to int conversion
    let ms = (lock_time * 1000.0) as u32;

    if ms < 32 {
        return 0;
    }

    (0..=LOCK_TIME_MAX_INDEX)
        .find(|i| ms as u64 <= 1u64 << (i + 5))
        .unwrap_or(LOCK_TIME_MAX_INDEX)
}

/// Decodes the 4 bit lock time indicator into the minimal lock time (s).
/// The most significant nibble is reserved and ignored.
pub fn decode_lock_time(indicator: u8) -> f64 {
    let indicator = indicator & 0x0F;
    if indicator == 0 {
        return 0.0;
    }
    (1u32 << (indicator + 4)) as f64 / 1000.0
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{signal::Code, tests::init_logger};
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.05, 1)]
    #[case(0.1, 2)]
    #[case(0.2, 3)]
    #[case(0.5, 4)]
    #[case(1.0, 5)]
    #[case(2.0, 6)]
    #[case(4.0, 7)]
    #[case(5.0, 8)]
    #[case(10.0, 9)]
    #[case(20.0, 10)]
    #[case(50.0, 11)]
    #[case(100.0, 12)]
    #[case(200.0, 13)]
    #[case(500.0, 14)]
    #[case(1000.0, 15)]
    #[case(f64::MAX, 15)]
    fn lock_time_encoding(#[case] lock_time: f64, #[case] expected: u8) {
        init_logger();
        assert_eq!(encode_lock_time(lock_time), expected);
    }

    #[test]
    fn lock_time_decoding() {
        init_logger();
        assert_eq!(decode_lock_time(0), 0.0);
        assert_eq!(decode_lock_time(0xF0), 0.0);
        assert_eq!(decode_lock_time(1), 0.032);
        assert_eq!(decode_lock_time(0xF1), 0.032);
        assert_eq!(decode_lock_time(15), 524.288);

        // decoded values sit on the upper bound of the previous indicator
        for indicator in 1..16u8 {
            let lock_time = decode_lock_time(indicator);
            assert_eq!(encode_lock_time(lock_time), indicator - 1);
        }
    }

    #[test]
    fn validity() {
        init_logger();

        let sid = SignalId::new(Code::GpsL1ca, 1);
        let mut meas = NavigationMeasurement::new(sid, GpsTime::new(1939, 42.0), 2.0E7, Vector3::zeros());
        assert!(meas.pseudorange_valid());
        assert!(!meas.doppler_valid());

        meas = meas.with_doppler(-1200.0).with_cn0(45.0);
        assert!(meas.doppler_valid());
        assert!(meas.flags.contains(MeasurementFlags::CN0_VALID));

        meas.flags |= MeasurementFlags::RAIM_EXCLUSION;
        assert!(!meas.pseudorange_valid());

        let empty = NavigationMeasurement::default();
        assert!(!empty.pseudorange_valid());
    }

    #[test]
    fn sorting() {
        init_logger();

        let t = GpsTime::new(1939, 42.0);
        let mut meas = [
            NavigationMeasurement::new(SignalId::new(Code::GalE1b, 3), t, 0.0, Vector3::zeros()),
            NavigationMeasurement::new(SignalId::new(Code::GpsL2cm, 1), t, 0.0, Vector3::zeros()),
            NavigationMeasurement::new(SignalId::new(Code::GpsL1ca, 9), t, 0.0, Vector3::zeros()),
            NavigationMeasurement::new(SignalId::new(Code::GpsL1ca, 2), t, 0.0, Vector3::zeros()),
        ];

        sort_measurements(&mut meas);

        let sids = meas.iter().map(|m| m.sid.to_string()).collect::<Vec<_>>();
        assert_eq!(sids, vec!["GPS L1CA 2", "GPS L1CA 9", "GPS L2CM 1", "GAL E1B 3"]);
    }
}
