use crate::{
    constants::*,
    prelude::{Constellation, Error},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const NUM_SATS_GPS: u16 = 32;
pub const NUM_SATS_SBAS: u16 = 19;
pub const NUM_SATS_GLO: u16 = 28;
pub const NUM_SATS_BDS: u16 = 37;
pub const NUM_SATS_GAL: u16 = 50;
pub const NUM_SATS_QZS: u16 = 10;

pub const GPS_FIRST_PRN: u16 = 1;
pub const SBAS_FIRST_PRN: u16 = 120;
pub const GLO_FIRST_PRN: u16 = 1;
pub const BDS_FIRST_PRN: u16 = 1;
pub const GAL_FIRST_PRN: u16 = 1;
pub const QZS_FIRST_PRN: u16 = 193;

/// Number of GLONASS frequency channels
pub const GLO_NUM_FCN: u16 = 14;

/// Total number of signal codes
pub const NUM_CODES: usize = 64;

/// Signal code: constellation, frequency band and tracked component.
/// Discriminants are stable and used as compact identifiers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Code {
    /// GPS L1 C/A: BPSK(1)
    #[default]
    GpsL1ca = 0,
    /// GPS L2C: 2 x BPSK(0.5)
    GpsL2cm = 1,
    /// SBAS L1: BPSK(1)
    SbasL1ca = 2,
    /// GLONASS L1OF: FDMA BPSK(0.5)
    GloL1of = 3,
    /// GLONASS L2OF: FDMA BPSK(0.5)
    GloL2of = 4,
    /// GPS L1P(Y): encrypted BPSK(10)
    GpsL1p = 5,
    /// GPS L2P(Y): encrypted BPSK(10)
    GpsL2p = 6,
    GpsL2cl = 7,
    GpsL2cx = 8,
    /// GPS L5: QPSK(10) at 1150*f0
    GpsL5i = 9,
    GpsL5q = 10,
    GpsL5x = 11,
    /// BeiDou-2 B1I: BPSK(2) at 1526*f0
    Bds2B1 = 12,
    /// BeiDou-2 B2I: BPSK(2) at 1180*f0
    Bds2B2 = 13,
    /// Galileo E1: CBOC(1,1) at 1540*f0
    GalE1b = 14,
    GalE1c = 15,
    GalE1x = 16,
    /// Galileo E6: BPSK(5) at 1250*f0
    GalE6b = 17,
    GalE6c = 18,
    GalE6x = 19,
    /// Galileo E5b: QPSK(10) at 1180*f0
    GalE7i = 20,
    GalE7q = 21,
    GalE7x = 22,
    /// Galileo E5 AltBOC(15,10) at 1165*f0
    GalE8i = 23,
    GalE8q = 24,
    GalE8x = 25,
    /// Galileo E5a: QPSK(10) at 1150*f0
    GalE5i = 26,
    GalE5q = 27,
    GalE5x = 28,
    /// GLONASS L1P: encrypted
    GloL1p = 29,
    /// GLONASS L2P: encrypted
    GloL2p = 30,
    /// QZSS L1 C/A: BPSK(1) at 1540*f0
    QzsL1ca = 31,
    /// QZSS L1C: TM-BOC at 1540*f0
    QzsL1ci = 32,
    QzsL1cq = 33,
    QzsL1cx = 34,
    /// QZSS L2C: 2 x BPSK(0.5) at 1200*f0
    QzsL2cm = 35,
    QzsL2cl = 36,
    QzsL2cx = 37,
    /// QZSS L5: QPSK(10) at 1150*f0
    QzsL5i = 38,
    QzsL5q = 39,
    QzsL5x = 40,
    /// SBAS L5 at 1150*f0
    SbasL5i = 41,
    SbasL5q = 42,
    SbasL5x = 43,
    /// BeiDou-3 B1C: TM-BOC at 1540*f0
    Bds3B1ci = 44,
    Bds3B1cq = 45,
    Bds3B1cx = 46,
    /// BeiDou-3 B2a: QPSK(10) at 1150*f0
    Bds3B5i = 47,
    Bds3B5q = 48,
    Bds3B5x = 49,
    /// BeiDou-3 B2b: QPSK(10) at 1180*f0
    Bds3B7i = 50,
    Bds3B7q = 51,
    Bds3B7x = 52,
    /// BeiDou-3 B3I: QPSK(10) at 1240*f0
    Bds3B3i = 53,
    Bds3B3q = 54,
    Bds3B3x = 55,
    /// GPS L1C: TM-BOC at 1540*f0
    GpsL1ci = 56,
    GpsL1cq = 57,
    GpsL1cx = 58,
    /// Auxiliary antenna signals
    AuxGps = 59,
    AuxSbas = 60,
    AuxGal = 61,
    AuxQzs = 62,
    AuxBds = 63,
}

/// Static description of a [Code]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeMetadata {
    pub constellation: Constellation,
    pub name: &'static str,
    /// Number of satellites that may transmit this code
    pub sat_count: u16,
    /// Number of distinct signals (frequency channels for GLONASS FDMA)
    pub sig_count: u16,
    pub first_prn: u16,
    /// Nominal carrier frequency [Hz]
    pub carrier_hz: f64,
    /// Chips per PRN period
    pub chip_count: u32,
    /// Chipping rate [chip/s]
    pub chip_rate: f64,
    pub requires_direct_acq: bool,
    pub prn_period_ms: u16,
    pub doppler_max_hz: f64,
    /// Phase alignment to the band reference signal [cycles]
    pub phase_alignment_cycles: f64,
    pub requires_decoder: bool,
}

#[allow(clippy::too_many_arguments)]
const fn meta(
    constellation: Constellation,
    name: &'static str,
    sat_count: u16,
    sig_count: u16,
    first_prn: u16,
    carrier_hz: f64,
    chip_count: u32,
    chip_rate: f64,
    requires_direct_acq: bool,
    prn_period_ms: u16,
    doppler_max_hz: f64,
    phase_alignment_cycles: f64,
    requires_decoder: bool,
) -> CodeMetadata {
    CodeMetadata {
        constellation,
        name,
        sat_count,
        sig_count,
        first_prn,
        carrier_hz,
        chip_count,
        chip_rate,
        requires_direct_acq,
        prn_period_ms,
        doppler_max_hz,
        phase_alignment_cycles,
        requires_decoder,
    }
}

const GPS: Constellation = Constellation::GPS;
const SBAS: Constellation = Constellation::SBAS;
const GLO: Constellation = Constellation::Glonass;
const BDS: Constellation = Constellation::BeiDou;
const GAL: Constellation = Constellation::Galileo;
const QZS: Constellation = Constellation::QZSS;

const GPS_L2_DOPPLER_MAX_HZ: f64 = GPS_L1_DOPPLER_MAX_HZ * GPS_L2_HZ / GPS_L1_HZ;
const GPS_L5_DOPPLER_MAX_HZ: f64 = GPS_L1_DOPPLER_MAX_HZ * GPS_L5_HZ / GPS_L1_HZ;
const GLO_L2_DOPPLER_MAX_HZ: f64 = GLO_L1_DOPPLER_MAX_HZ * GLO_L2_HZ / GLO_L1_HZ;
const SBAS_L5_DOPPLER_MAX_HZ: f64 = SBAS_L1_DOPPLER_MAX_HZ * SBAS_L5_HZ / SBAS_L1_HZ;
const BDS2_B2_DOPPLER_MAX_HZ: f64 = BDS2_B1_DOPPLER_MAX_HZ * BDS2_B2_HZ / BDS2_B1_HZ;
const BDS3_B3_DOPPLER_MAX_HZ: f64 = BDS2_B1_DOPPLER_MAX_HZ * BDS3_B3_HZ / BDS2_B1_HZ;
const BDS3_B7_DOPPLER_MAX_HZ: f64 = BDS2_B1_DOPPLER_MAX_HZ * BDS3_B7_HZ / BDS2_B1_HZ;
const BDS3_B5_DOPPLER_MAX_HZ: f64 = BDS2_B1_DOPPLER_MAX_HZ * BDS3_B5_HZ / BDS2_B1_HZ;
const GAL_E6_DOPPLER_MAX_HZ: f64 = GAL_E1_DOPPLER_MAX_HZ * GAL_E6_HZ / GAL_E1_HZ;
const GAL_E7_DOPPLER_MAX_HZ: f64 = GAL_E1_DOPPLER_MAX_HZ * GAL_E7_HZ / GAL_E1_HZ;
const GAL_E8_DOPPLER_MAX_HZ: f64 = GAL_E1_DOPPLER_MAX_HZ * GAL_E8_HZ / GAL_E1_HZ;
const GAL_E5_DOPPLER_MAX_HZ: f64 = GAL_E1_DOPPLER_MAX_HZ * GAL_E5_HZ / GAL_E1_HZ;
const QZS_L2_DOPPLER_MAX_HZ: f64 = QZS_L1_DOPPLER_MAX_HZ * QZS_L2_HZ / QZS_L1_HZ;
const QZS_L5_DOPPLER_MAX_HZ: f64 = QZS_L1_DOPPLER_MAX_HZ * QZS_L5_HZ / QZS_L1_HZ;

const GPS_L2C_CHIPPING_RATE: f64 = GPS_CA_CHIPPING_RATE;

#[rustfmt::skip]
static CODE_TABLE: [CodeMetadata; NUM_CODES] = [
    meta(GPS, "GPS L1CA", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L1_HZ, 1023, GPS_CA_CHIPPING_RATE, true, 1, GPS_L1_DOPPLER_MAX_HZ, 0.0, true),
    meta(GPS, "GPS L2CM", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L2_HZ, 20460, GPS_L2C_CHIPPING_RATE, false, 20, GPS_L2_DOPPLER_MAX_HZ, -0.25, true),
    meta(SBAS, "SBAS L1", NUM_SATS_SBAS, NUM_SATS_SBAS, SBAS_FIRST_PRN, SBAS_L1_HZ, 1023, GPS_CA_CHIPPING_RATE, true, 1, SBAS_L1_DOPPLER_MAX_HZ, 0.0, true),
    meta(GLO, "GLO L1OF", NUM_SATS_GLO, GLO_NUM_FCN, GLO_FIRST_PRN, GLO_L1_HZ, 511, GLO_CA_CHIPPING_RATE, true, 1, GLO_L1_DOPPLER_MAX_HZ, 0.0, true),
    meta(GLO, "GLO L2OF", NUM_SATS_GLO, GLO_NUM_FCN, GLO_FIRST_PRN, GLO_L2_HZ, 511, GLO_CA_CHIPPING_RATE, false, 1, GLO_L2_DOPPLER_MAX_HZ, 0.0, true),
    meta(GPS, "GPS L1P", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L1_HZ, 0, 0.0, false, 0, GPS_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(GPS, "GPS L2P", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L2_HZ, 0, 0.0, false, 0, GPS_L2_DOPPLER_MAX_HZ, 0.0, false),
    meta(GPS, "GPS L2CL", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L2_HZ, 1534500, GPS_L2C_CHIPPING_RATE, false, 1500, GPS_L2_DOPPLER_MAX_HZ, -0.25, false),
    meta(GPS, "GPS L2C", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L2_HZ, 0, 0.0, false, 0, GPS_L2_DOPPLER_MAX_HZ, -0.25, false),
    meta(GPS, "GPS L5I", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L5_HZ, 10230, GPS_L5_CHIPPING_RATE, false, 1, GPS_L5_DOPPLER_MAX_HZ, 0.0, false),
    meta(GPS, "GPS L5Q", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L5_HZ, 0, 0.0, false, 0, GPS_L5_DOPPLER_MAX_HZ, -0.25, false),
    meta(GPS, "GPS L5", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L5_HZ, 0, 0.0, false, 0, GPS_L5_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS B1", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS2_B1_HZ, 2046, BDS2_CHIPPING_RATE, true, 1, BDS2_B1_DOPPLER_MAX_HZ, 0.0, true),
    meta(BDS, "BDS B2", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS2_B2_HZ, 2046, BDS2_CHIPPING_RATE, false, 1, BDS2_B2_DOPPLER_MAX_HZ, 0.0, true),
    meta(GAL, "GAL E1B", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E1_HZ, 4092, GAL_E1_CHIPPING_RATE, true, 4, GAL_E1_DOPPLER_MAX_HZ, 0.0, true),
    meta(GAL, "GAL E1C", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E1_HZ, 0, 0.0, false, 0, GAL_E1_DOPPLER_MAX_HZ, 0.5, false),
    meta(GAL, "GAL E1", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E1_HZ, 0, 0.0, false, 0, GAL_E1_DOPPLER_MAX_HZ, 0.0, false),
    meta(GAL, "GAL E6B", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E6_HZ, 5115, GAL_E6_CHIPPING_RATE, false, 1, GAL_E6_DOPPLER_MAX_HZ, 0.0, true),
    meta(GAL, "GAL E6C", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E6_HZ, 0, 0.0, false, 0, GAL_E6_DOPPLER_MAX_HZ, -0.5, false),
    meta(GAL, "GAL E6", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E6_HZ, 0, 0.0, false, 0, GAL_E6_DOPPLER_MAX_HZ, 0.0, false),
    meta(GAL, "GAL E5bI", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E7_HZ, 10230, GAL_E5_CHIPPING_RATE, false, 1, GAL_E7_DOPPLER_MAX_HZ, 0.0, true),
    meta(GAL, "GAL E5bQ", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E7_HZ, 0, 0.0, false, 0, GAL_E7_DOPPLER_MAX_HZ, -0.25, false),
    meta(GAL, "GAL E5b", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E7_HZ, 0, 0.0, false, 0, GAL_E7_DOPPLER_MAX_HZ, 0.0, false),
    meta(GAL, "GAL E8I", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E8_HZ, 0, 0.0, false, 0, GAL_E8_DOPPLER_MAX_HZ, 0.0, false),
    meta(GAL, "GAL E8Q", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E8_HZ, 0, 0.0, false, 0, GAL_E8_DOPPLER_MAX_HZ, -0.25, false),
    meta(GAL, "GAL E8", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E8_HZ, 0, 0.0, false, 0, GAL_E8_DOPPLER_MAX_HZ, 0.0, false),
    meta(GAL, "GAL E5aI", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E5_HZ, 10230, GAL_E5_CHIPPING_RATE, false, 1, GAL_E5_DOPPLER_MAX_HZ, 0.0, true),
    meta(GAL, "GAL E5aQ", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E5_HZ, 0, 0.0, false, 0, GAL_E5_DOPPLER_MAX_HZ, -0.25, false),
    meta(GAL, "GAL E5a", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E5_HZ, 0, 0.0, false, 0, GAL_E5_DOPPLER_MAX_HZ, 0.0, false),
    meta(GLO, "GLO L1P", NUM_SATS_GLO, GLO_NUM_FCN, GLO_FIRST_PRN, GLO_L1_HZ, 0, 0.0, false, 0, GLO_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(GLO, "GLO L2P", NUM_SATS_GLO, GLO_NUM_FCN, GLO_FIRST_PRN, GLO_L2_HZ, 0, 0.0, false, 0, GLO_L2_DOPPLER_MAX_HZ, 0.25, false),
    meta(QZS, "QZS L1CA", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L1_HZ, 1023, GPS_CA_CHIPPING_RATE, true, 1, QZS_L1_DOPPLER_MAX_HZ, 0.0, true),
    meta(QZS, "QZSS L1CI", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L1_HZ, 10230, GPS_CA_CHIPPING_RATE, false, 10, GPS_L1_DOPPLER_MAX_HZ, 0.0, false),
    meta(QZS, "QZSS L1CQ", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L1_HZ, 0, 0.0, false, 0, GPS_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(QZS, "QZSS L1CX", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L1_HZ, 0, 0.0, false, 0, GPS_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(QZS, "QZS L2CM", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L2_HZ, 20460, GPS_CA_CHIPPING_RATE, false, 20, QZS_L2_DOPPLER_MAX_HZ, 0.0, true),
    meta(QZS, "QZS L2CL", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L2_HZ, 1534500, GPS_CA_CHIPPING_RATE, false, 1500, QZS_L2_DOPPLER_MAX_HZ, 0.0, false),
    meta(QZS, "QZS L2C", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L2_HZ, 0, 0.0, false, 0, QZS_L2_DOPPLER_MAX_HZ, 0.0, false),
    meta(QZS, "QZS L5I", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L5_HZ, 0, 0.0, false, 0, QZS_L5_DOPPLER_MAX_HZ, 0.0, false),
    meta(QZS, "QZS L5Q", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L5_HZ, 0, 0.0, false, 0, QZS_L5_DOPPLER_MAX_HZ, -0.25, false),
    meta(QZS, "QZS L5", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L5_HZ, 0, 0.0, false, 0, QZS_L5_DOPPLER_MAX_HZ, 0.0, false),
    meta(SBAS, "SBAS L5I", NUM_SATS_SBAS, NUM_SATS_SBAS, SBAS_FIRST_PRN, SBAS_L5_HZ, 10230, GPS_L5_CHIPPING_RATE, false, 1, SBAS_L5_DOPPLER_MAX_HZ, 0.0, true),
    meta(SBAS, "SBAS L5Q", NUM_SATS_SBAS, NUM_SATS_SBAS, SBAS_FIRST_PRN, SBAS_L5_HZ, 10230, GPS_L5_CHIPPING_RATE, false, 1, SBAS_L5_DOPPLER_MAX_HZ, -0.25, false),
    meta(SBAS, "SBAS L5", NUM_SATS_SBAS, NUM_SATS_SBAS, SBAS_FIRST_PRN, SBAS_L5_HZ, 10230, GPS_L5_CHIPPING_RATE, false, 1, SBAS_L5_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B1CI", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B1C_HZ, 10230, BDS3_B1C_CHIPPING_RATE, false, 10, BDS2_B1_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B1CQ", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B1C_HZ, 0, 0.0, false, 0, BDS2_B1_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B1C", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B1C_HZ, 0, 0.0, false, 0, BDS2_B1_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B5I", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B5_HZ, 10230, BDS3_CHIPPING_RATE, false, 1, BDS3_B5_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B5Q", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B5_HZ, 0, 0.0, false, 0, BDS3_B5_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B5", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B5_HZ, 0, 0.0, false, 0, BDS3_B5_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B7I", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B7_HZ, 10230, BDS3_CHIPPING_RATE, false, 1, BDS3_B7_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B7Q", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B7_HZ, 0, 0.0, false, 0, BDS3_B7_DOPPLER_MAX_HZ, -0.25, false),
    meta(BDS, "BDS3 B7", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B7_HZ, 10230, BDS3_CHIPPING_RATE, false, 1, BDS3_B7_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B3I", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B3_HZ, 10230, BDS3_CHIPPING_RATE, false, 1, BDS3_B3_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS3 B3Q", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B3_HZ, 0, 0.0, false, 0, BDS3_B3_DOPPLER_MAX_HZ, -0.25, false),
    meta(BDS, "BDS3 B3", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS3_B3_HZ, 0, 0.0, false, 0, BDS3_B3_DOPPLER_MAX_HZ, 0.0, false),
    meta(GPS, "GPS L1CI", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L1_HZ, 10230, GPS_CA_CHIPPING_RATE, false, 10, GPS_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(GPS, "GPS L1CQ", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L1_HZ, 0, 0.0, false, 0, GPS_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(GPS, "GPS L1C", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L1_HZ, 0, 0.0, false, 0, GPS_L1_DOPPLER_MAX_HZ, 0.25, false),
    meta(GPS, "GPS AUX", NUM_SATS_GPS, NUM_SATS_GPS, GPS_FIRST_PRN, GPS_L1_HZ, 1023, GPS_CA_CHIPPING_RATE, false, 1, GPS_L1_DOPPLER_MAX_HZ, 0.0, false),
    meta(SBAS, "SBAS AUX", NUM_SATS_SBAS, NUM_SATS_SBAS, SBAS_FIRST_PRN, SBAS_L1_HZ, 1023, GPS_CA_CHIPPING_RATE, false, 1, SBAS_L1_DOPPLER_MAX_HZ, 0.0, false),
    meta(GAL, "GAL AUX", NUM_SATS_GAL, NUM_SATS_GAL, GAL_FIRST_PRN, GAL_E1_HZ, 4092, GAL_E1_CHIPPING_RATE, false, 4, GAL_E1_DOPPLER_MAX_HZ, 0.0, false),
    meta(QZS, "QZS AUX", NUM_SATS_QZS, NUM_SATS_QZS, QZS_FIRST_PRN, QZS_L1_HZ, 1023, GPS_CA_CHIPPING_RATE, false, 1, QZS_L1_DOPPLER_MAX_HZ, 0.0, false),
    meta(BDS, "BDS AUX", NUM_SATS_BDS, NUM_SATS_BDS, BDS_FIRST_PRN, BDS2_B1_HZ, 2046, BDS2_CHIPPING_RATE, false, 1, BDS2_B1_DOPPLER_MAX_HZ, 0.0, false),
];

impl Code {
    /// All codes, in discriminant order
    pub const ALL: [Code; NUM_CODES] = [
        Self::GpsL1ca,
        Self::GpsL2cm,
        Self::SbasL1ca,
        Self::GloL1of,
        Self::GloL2of,
        Self::GpsL1p,
        Self::GpsL2p,
        Self::GpsL2cl,
        Self::GpsL2cx,
        Self::GpsL5i,
        Self::GpsL5q,
        Self::GpsL5x,
        Self::Bds2B1,
        Self::Bds2B2,
        Self::GalE1b,
        Self::GalE1c,
        Self::GalE1x,
        Self::GalE6b,
        Self::GalE6c,
        Self::GalE6x,
        Self::GalE7i,
        Self::GalE7q,
        Self::GalE7x,
        Self::GalE8i,
        Self::GalE8q,
        Self::GalE8x,
        Self::GalE5i,
        Self::GalE5q,
        Self::GalE5x,
        Self::GloL1p,
        Self::GloL2p,
        Self::QzsL1ca,
        Self::QzsL1ci,
        Self::QzsL1cq,
        Self::QzsL1cx,
        Self::QzsL2cm,
        Self::QzsL2cl,
        Self::QzsL2cx,
        Self::QzsL5i,
        Self::QzsL5q,
        Self::QzsL5x,
        Self::SbasL5i,
        Self::SbasL5q,
        Self::SbasL5x,
        Self::Bds3B1ci,
        Self::Bds3B1cq,
        Self::Bds3B1cx,
        Self::Bds3B5i,
        Self::Bds3B5q,
        Self::Bds3B5x,
        Self::Bds3B7i,
        Self::Bds3B7q,
        Self::Bds3B7x,
        Self::Bds3B3i,
        Self::Bds3B3q,
        Self::Bds3B3x,
        Self::GpsL1ci,
        Self::GpsL1cq,
        Self::GpsL1cx,
        Self::AuxGps,
        Self::AuxSbas,
        Self::AuxGal,
        Self::AuxQzs,
        Self::AuxBds,
    ];

    /// Builds a [Code] from its discriminant
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn metadata(&self) -> &'static CodeMetadata {
        &CODE_TABLE[*self as usize]
    }

    pub fn constellation(&self) -> Constellation {
        self.metadata().constellation
    }

    pub fn name(&self) -> &'static str {
        self.metadata().name
    }

    pub fn sat_count(&self) -> u16 {
        self.metadata().sat_count
    }

    pub fn sig_count(&self) -> u16 {
        self.metadata().sig_count
    }

    pub fn first_prn(&self) -> u16 {
        self.metadata().first_prn
    }

    /// Nominal carrier frequency [Hz]. GLONASS FDMA codes
    /// return the channel 0 frequency.
    pub fn carrier_frequency_hz(&self) -> f64 {
        self.metadata().carrier_hz
    }

    pub fn chip_rate(&self) -> f64 {
        self.metadata().chip_rate
    }

    pub fn chip_count(&self) -> u32 {
        self.metadata().chip_count
    }

    pub fn prn_period_ms(&self) -> u16 {
        self.metadata().prn_period_ms
    }

    pub fn requires_direct_acq(&self) -> bool {
        self.metadata().requires_direct_acq
    }

    pub fn requires_decoder(&self) -> bool {
        self.metadata().requires_decoder
    }

    pub fn phase_alignment_cycles(&self) -> f64 {
        self.metadata().phase_alignment_cycles
    }

    /// Maximal satellite induced Doppler [Hz]
    pub fn doppler_max_hz(&self) -> f64 {
        self.metadata().doppler_max_hz
    }

    pub fn doppler_min_hz(&self) -> f64 {
        -self.metadata().doppler_max_hz
    }

    pub fn is_gps(&self) -> bool {
        self.constellation() == Constellation::GPS
    }

    pub fn is_sbas(&self) -> bool {
        self.constellation() == Constellation::SBAS
    }

    pub fn is_glo(&self) -> bool {
        self.constellation() == Constellation::Glonass
    }

    pub fn is_bds(&self) -> bool {
        self.constellation() == Constellation::BeiDou
    }

    pub fn is_gal(&self) -> bool {
        self.constellation() == Constellation::Galileo
    }

    pub fn is_qzss(&self) -> bool {
        self.constellation() == Constellation::QZSS
    }

    /// GLONASS FDMA codes whose carrier depends on the frequency channel
    pub fn is_fdma(&self) -> bool {
        matches!(self, Self::GloL1of | Self::GloL2of)
    }

    /// True when both codes share the same tracking (L1CA with L1P, L2CM with L2P).
    pub fn equivalent(&self, rhs: &Self) -> bool {
        matches!(
            (self, rhs),
            (Self::GpsL1ca, Self::GpsL1p)
                | (Self::GpsL1p, Self::GpsL1ca)
                | (Self::GpsL2cm, Self::GpsL2p)
                | (Self::GpsL2p, Self::GpsL2cm)
        ) || self == rhs
    }

    /// L1 band reference code of a constellation
    pub fn l1_code(constellation: Constellation) -> Option<Self> {
        match constellation {
            Constellation::GPS => Some(Self::GpsL1ca),
            Constellation::SBAS => Some(Self::SbasL1ca),
            Constellation::Glonass => Some(Self::GloL1of),
            Constellation::BeiDou => Some(Self::Bds2B1),
            Constellation::QZSS => Some(Self::QzsL1ca),
            Constellation::Galileo => Some(Self::GalE1b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

impl std::str::FromStr for Code {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .find(|code| code.name() == trimmed)
            .copied()
            .ok_or(Error::UnknownCode(trimmed.to_string()))
    }
}

/// Number of satellites of a constellation.
pub fn constellation_to_sat_count(constellation: Constellation) -> Result<u16, Error> {
    let code = Code::l1_code(constellation).ok_or(Error::UnsupportedConstellation)?;
    Ok(code.sat_count())
}
