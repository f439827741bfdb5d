//! Physical constants, carrier frequencies and broadcast scale factors.

/// Speed of light [m/s]
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Value of pi used in the GPS ICD
pub const GPS_PI: f64 = 3.1415926535898;

pub const D2R: f64 = std::f64::consts::PI / 180.0;
pub const R2D: f64 = 180.0 / std::f64::consts::PI;

/// Earth rotation rate used by GPS, QZSS and Galileo [rad/s]
pub const GPS_OMEGAE_DOT: f64 = 7.2921151467E-5;

/// Earth gravitational constant (GPS, QZSS) [m³/s²]
pub const GPS_GM: f64 = 3.986005E14;

/// Relativistic clock correction constant [s/√m]
pub const GPS_F: f64 = -4.442807633E-10;

pub const BDS_GM: f64 = 3.986004418E14;
pub const BDS_OMEGAE_DOT: f64 = 7.2921150E-5;

pub const GAL_GM: f64 = 3.986004418E14;

/// GLONASS ellipsoid semi major axis [m]
pub const GLO_A_E: f64 = 6378136.0;
/// GLONASS second zonal harmonic
pub const GLO_J02: f64 = 1.08262575E-3;
pub const GLO_GM: f64 = 3.986004418E14;
pub const GLO_OMEGAE_DOT: f64 = 7.292115E-5;

/// WGS84 semi major axis [m]
pub const WGS84_A: f64 = 6378137.0;
/// WGS84 inverse flattening
pub const WGS84_IF: f64 = 298.257223563;
pub const WGS84_F: f64 = 1.0 / WGS84_IF;
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
pub const WGS84_E: f64 = 0.08181919084262149;

// Carrier frequencies [Hz]
pub const GPS_L1_HZ: f64 = 1.57542E9;
pub const GPS_L2_HZ: f64 = 1.22760E9;
pub const GPS_L5_HZ: f64 = 115.0 * 10.23E6;

pub const GLO_L1_HZ: f64 = 1.602E9;
pub const GLO_L2_HZ: f64 = 1.246E9;
pub const GLO_L1_DELTA_HZ: f64 = 5.625E5;
pub const GLO_L2_DELTA_HZ: f64 = 4.375E5;

pub const SBAS_L1_HZ: f64 = 1.023E6 * 1540.0;
pub const SBAS_L5_HZ: f64 = 1.023E6 * 1150.0;

pub const BDS2_B1_HZ: f64 = 1.023E6 * 1526.0;
pub const BDS2_B2_HZ: f64 = 1.023E6 * 1180.0;
pub const BDS3_B1C_HZ: f64 = 154.0 * 10.23E6;
pub const BDS3_B3_HZ: f64 = 124.0 * 10.23E6;
pub const BDS3_B7_HZ: f64 = 118.0 * 10.23E6;
pub const BDS3_B5_HZ: f64 = 115.0 * 10.23E6;

pub const GAL_E1_HZ: f64 = 1.023E6 * 1540.0;
pub const GAL_E6_HZ: f64 = 1.023E6 * 1250.0;
pub const GAL_E7_HZ: f64 = 1.023E6 * 1180.0;
pub const GAL_E8_HZ: f64 = 1.023E6 * 1165.0;
pub const GAL_E5_HZ: f64 = 1.023E6 * 1150.0;

pub const QZS_L1_HZ: f64 = 1.023E6 * 1540.0;
pub const QZS_L2_HZ: f64 = 1.023E6 * 1200.0;
pub const QZS_L5_HZ: f64 = 1.023E6 * 1150.0;

// Chipping rates [chip/s]
pub const GPS_CA_CHIPPING_RATE: f64 = 1.023E6;
pub const GPS_L5_CHIPPING_RATE: f64 = 10.23E6;
pub const GLO_CA_CHIPPING_RATE: f64 = 0.511E6;
pub const BDS2_CHIPPING_RATE: f64 = 2.0 * 1.023E6;
pub const BDS3_B1C_CHIPPING_RATE: f64 = 1.023E6;
pub const BDS3_CHIPPING_RATE: f64 = 10.0 * 1.023E6;
pub const GAL_E1_CHIPPING_RATE: f64 = 1.023E6;
pub const GAL_E6_CHIPPING_RATE: f64 = 5.0 * 1.023E6;
pub const GAL_E5_CHIPPING_RATE: f64 = 10.0 * 1.023E6;

// Maximal satellite Doppler [Hz]
pub const GPS_L1_DOPPLER_MAX_HZ: f64 = 4200.0;
pub const GLO_L1_DOPPLER_MAX_HZ: f64 = 4820.0;
pub const SBAS_L1_DOPPLER_MAX_HZ: f64 = 210.0;
pub const BDS2_B1_DOPPLER_MAX_HZ: f64 = 4200.0;
pub const GAL_E1_DOPPLER_MAX_HZ: f64 = 4000.0;
pub const QZS_L1_DOPPLER_MAX_HZ: f64 = 1200.0;

// Time
pub const MINUTE_SECS: u32 = 60;
pub const HOUR_SECS: u32 = 3600;
pub const DAY_SECS: u32 = 86400;
pub const WEEK_DAYS: u32 = 7;
pub const WEEK_SECS: u32 = WEEK_DAYS * DAY_SECS;

/// Offset between BeiDou and GPS week numbering
pub const BDS_WEEK_TO_GPS_WEEK: u16 = 1356;
/// Offset between BDT and GPST [s]
pub const BDS_SECOND_TO_GPS_SECOND: f64 = 14.0;
/// Offset between Galileo and GPS week numbering
pub const GAL_WEEK_TO_GPS_WEEK: u16 = 1024;

/// Reference week used to resolve broadcast week rollovers
pub const GPS_WEEK_REFERENCE: u16 = 1876;

// Broadcast scale factors
pub const C_1_2P5: f64 = 0.03125;
pub const C_1_2P6: f64 = 0.015625;
pub const C_1_2P11: f64 = 0.00048828125;
pub const C_1_2P19: f64 = 1.9073486328125E-06;
pub const C_1_2P20: f64 = 9.5367431640625E-07;
pub const C_1_2P21: f64 = 4.76837158203125E-07;
pub const C_1_2P23: f64 = 1.1920928955078125E-07;
pub const C_1_2P24: f64 = 5.960464477539063E-08;
pub const C_1_2P29: f64 = 1.862645149230957E-09;
pub const C_1_2P30: f64 = 9.313225746154785E-10;
pub const C_1_2P31: f64 = 4.656612873077393E-10;
pub const C_1_2P32: f64 = 2.3283064365386963E-10;
pub const C_1_2P33: f64 = 1.1641532182693481E-10;
pub const C_1_2P34: f64 = 5.820766091346741E-11;
pub const C_1_2P38: f64 = 3.637978807091713E-12;
pub const C_1_2P40: f64 = 9.094947017729282E-13;
pub const C_1_2P43: f64 = 1.1368683772161603E-13;
pub const C_1_2P46: f64 = 1.4210854715202004E-14;
pub const C_1_2P50: f64 = 8.881784197001252E-16;
pub const C_1_2P55: f64 = 2.7755575615628914E-17;
pub const C_1_2P59: f64 = 1.734723475976807E-18;
pub const C_1_2P66: f64 = 1.3552527156068805E-20;
