//! Broadcast data and measurements shared by the test suites.
use crate::{
    almanac::{Almanac, AlmanacData, KeplerAlmanac},
    ephemeris::{EphemerisData, EphemerisSource, KeplerEphemeris},
    prelude::{Ephemeris, SignalId},
    signal::Code,
    time::GpsTime,
};

mod measurements;
pub use measurements::*;

/// GPS L1CA PRN 1 ephemeris, week 1916
pub fn gps_eph() -> Ephemeris {
    Ephemeris {
        sid: SignalId::new(Code::GpsL1ca, 1),
        toe: GpsTime::new(1916, 14400.0),
        ura: 2.0,
        fit_interval: 14400,
        valid: true,
        health_bits: 0,
        source: EphemerisSource::Lnav,
        data: EphemerisData::Kepler(KeplerEphemeris {
            tgd: [5.122274160385132E-9, 0.0],
            crc: 198.9375,
            crs: 10.28125,
            cuc: 5.327165126800537E-7,
            cus: 9.521842002868652E-6,
            cic: -2.3655593395233154E-7,
            cis: -3.91155481338501E-8,
            dn: 4.5637615275575705E-9,
            m0: 2.167759779416001,
            ecc: 0.005649387603625655,
            sqrta: 5153.644334793091,
            omega0: 1.8718410336467348,
            omegadot: -7.896400345341237E-9,
            w: 0.4837085715349947,
            inc: 0.9649728717477063,
            inc_dot: 6.078824636017362E-10,
            af0: 2.5494489818811417E-5,
            af1: 1.2505552149377763E-12,
            af2: 0.0,
            toc: GpsTime::new(1916, 14400.0),
            iodc: 2,
            iode: 2,
        }),
    }
}

/// GPS PRN 1 almanac, derived from [gps_eph]
pub fn gps_alm() -> Almanac {
    Almanac {
        sid: SignalId::new(Code::GpsL1ca, 1),
        toa: GpsTime::new(1916, 12288.0),
        ura: 900.0,
        fit_interval: 140 * 3600,
        valid: true,
        health_bits: 0,
        data: AlmanacData::Kepler(KeplerAlmanac {
            m0: 1.8597015346164447,
            ecc: 0.005649566650390625,
            sqrta: 5153.64453125,
            omega0: 1.8718411799385428,
            omegadot: -7.897471818543825e-09,
            w: 0.4837084091510879,
            inc: 0.9649721862242944,
            af0: 2.574920654296875e-05,
            af1: 0.0,
        }),
    }
}
