//! Signal identification.
use std::cmp::Ordering;

use crate::{
    constants::{GLO_L1_DELTA_HZ, GLO_L2_DELTA_HZ, SPEED_OF_LIGHT_M_S},
    prelude::{Constellation, Error, SV},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod code;
mod glo_biases;
mod glo_map;

pub use code::{
    constellation_to_sat_count, Code, CodeMetadata, BDS_FIRST_PRN, GAL_FIRST_PRN, GLO_FIRST_PRN,
    GLO_NUM_FCN, GPS_FIRST_PRN, NUM_CODES, NUM_SATS_BDS, NUM_SATS_GAL, NUM_SATS_GLO,
    NUM_SATS_GPS, NUM_SATS_QZS, NUM_SATS_SBAS, QZS_FIRST_PRN, SBAS_FIRST_PRN,
};

pub use glo_biases::{GloBiasMask, GloBiases};

pub use glo_map::{GloFcnMap, GLO_FCN_OFFSET, GLO_MAX_FCN, GLO_MIN_FCN};

pub(crate) use glo_map::{fcn_is_valid, slot_is_valid};

/// Supported constellations, in signal ordering
pub const CONSTELLATIONS: [Constellation; 6] = [
    Constellation::GPS,
    Constellation::SBAS,
    Constellation::Glonass,
    Constellation::BeiDou,
    Constellation::QZSS,
    Constellation::Galileo,
];

/// Position of a supported constellation in [CONSTELLATIONS].
pub(crate) fn constellation_rank(constellation: &Constellation) -> u8 {
    CONSTELLATIONS
        .iter()
        .position(|c| c == constellation)
        .unwrap_or(CONSTELLATIONS.len()) as u8
}

/// Short name of a supported constellation ("?" otherwise)
pub fn constellation_to_str(constellation: &Constellation) -> &'static str {
    match constellation {
        Constellation::GPS => "GPS",
        Constellation::SBAS => "SBAS",
        Constellation::Glonass => "GLO",
        Constellation::BeiDou => "BDS",
        Constellation::QZSS => "QZS",
        Constellation::Galileo => "GAL",
        _ => "?",
    }
}

/// Parses a constellation short name, as printed by [constellation_to_str].
pub fn parse_constellation(s: &str) -> Result<Constellation, Error> {
    let trimmed = s.trim();
    CONSTELLATIONS
        .iter()
        .find(|c| constellation_to_str(c) == trimmed)
        .copied()
        .ok_or(Error::UnknownConstellation(trimmed.to_string()))
}

/// SBAS service provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SbasSystem {
    Waas,
    Egnos,
    Gagan,
    Msas,
}

impl SbasSystem {
    pub const ALL: [SbasSystem; 4] = [Self::Waas, Self::Egnos, Self::Gagan, Self::Msas];

    /// PRNs operated by this system (test and reserve PRNs included)
    pub fn prn_list(&self) -> &'static [u16] {
        match self {
            Self::Waas => &[131, 135, 138],
            Self::Egnos => &[120, 123, 136],
            Self::Gagan => &[127, 128, 132],
            Self::Msas => &[129, 137],
        }
    }

    pub fn constellation(&self) -> Constellation {
        match self {
            Self::Waas => Constellation::WAAS,
            Self::Egnos => Constellation::EGNOS,
            Self::Gagan => Constellation::GAGAN,
            Self::Msas => Constellation::MSAS,
        }
    }
}

/// [SignalId] identifies a signal transmitted by one satellite:
/// the signal [Code] and the satellite number (PRN, or orbital slot for GLONASS).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalId {
    pub code: Code,
    pub sat: u16,
}

impl SignalId {
    pub fn new(code: Code, sat: u16) -> Self {
        Self { code, sat }
    }

    /// Builds the [SignalId] of the `index`-th satellite of this code.
    pub fn from_code_index(code: Code, index: u16) -> Result<Self, Error> {
        let sid = Self::new(code, code.first_prn().saturating_add(index));
        if index < code.sat_count() {
            Ok(sid)
        } else {
            Err(Error::InvalidSignal(sid))
        }
    }

    /// Index of this satellite within its code, see [Self::from_code_index].
    pub fn code_index(&self) -> Result<u16, Error> {
        if self.valid() {
            Ok(self.sat - self.code.first_prn())
        } else {
            Err(Error::InvalidSignal(*self))
        }
    }

    /// True if the satellite number is in range for this code.
    pub fn valid(&self) -> bool {
        let first = self.code.first_prn();
        self.sat >= first && self.sat < first + self.code.sat_count()
    }

    pub fn constellation(&self) -> Constellation {
        self.code.constellation()
    }

    /// Carrier frequency [Hz]. GLONASS FDMA signals require
    /// the frequency channel to be known in `glo_map`.
    pub fn carrier_frequency(&self, glo_map: &GloFcnMap) -> Result<f64, Error> {
        let delta = match self.code {
            Code::GloL1of => GLO_L1_DELTA_HZ,
            Code::GloL2of => GLO_L2_DELTA_HZ,
            _ => return Ok(self.code.carrier_frequency_hz()),
        };

        let fcn = glo_map.get_fcn(self.sat).ok_or(Error::MissingFcn(*self))?;
        let channel = fcn as f64 - GLO_FCN_OFFSET as f64;

        Ok(self.code.carrier_frequency_hz() + channel * delta)
    }

    /// Carrier wavelength [m]
    pub fn lambda(&self, glo_map: &GloFcnMap) -> Result<f64, Error> {
        Ok(SPEED_OF_LIGHT_M_S / self.carrier_frequency(glo_map)?)
    }

    /// SBAS service provider of this SBAS satellite
    pub fn sbas_system(&self) -> Option<SbasSystem> {
        if !self.code.is_sbas() {
            return None;
        }
        SbasSystem::ALL
            .iter()
            .find(|system| system.prn_list().contains(&self.sat))
            .copied()
    }

    /// Converts to a [SV]. SBAS satellites are tagged with their service provider
    /// and numbered as in RINEX (PRN - 100).
    pub fn to_sv(&self) -> Option<SV> {
        if !self.valid() {
            return None;
        }

        let constellation = self.constellation();

        if constellation == Constellation::SBAS {
            let system = self.sbas_system()?;
            Some(SV::new(system.constellation(), (self.sat - 100) as u8))
        } else if constellation == Constellation::QZSS {
            Some(SV::new(constellation, (self.sat - QZS_FIRST_PRN + 1) as u8))
        } else {
            Some(SV::new(constellation, self.sat as u8))
        }
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{} {}", self.code, self.sat)
    }
}

impl Ord for SignalId {
    fn cmp(&self, rhs: &Self) -> Ordering {
        let lhs_key = (constellation_rank(&self.constellation()), self.code.index(), self.sat);
        let rhs_key = (constellation_rank(&rhs.constellation()), rhs.code.index(), rhs.sat);
        lhs_key.cmp(&rhs_key)
    }
}

impl PartialOrd for SignalId {
    fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{constants::GLO_L1_HZ, tests::init_logger};
    use rand::{prelude::*, rngs::SmallRng, SeedableRng};

    #[test]
    fn code_index_roundtrip() {
        init_logger();

        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..1000 {
            let code = Code::ALL[rng.random_range(0..NUM_CODES)];
            let index = rng.random_range(0..code.sat_count());

            let sid = SignalId::from_code_index(code, index).unwrap();
            assert!(sid.valid(), "{} should be valid", sid);
            assert_eq!(sid.code_index().unwrap(), index);
        }

        for code in Code::ALL.iter() {
            assert!(SignalId::from_code_index(*code, code.sat_count()).is_err());
        }
    }

    #[test]
    fn validity() {
        init_logger();
        assert!(SignalId::new(Code::GpsL1ca, 1).valid());
        assert!(SignalId::new(Code::GpsL1ca, 32).valid());
        assert!(!SignalId::new(Code::GpsL1ca, 0).valid());
        assert!(!SignalId::new(Code::GpsL1ca, 33).valid());
        assert!(SignalId::new(Code::SbasL1ca, 120).valid());
        assert!(SignalId::new(Code::SbasL1ca, 138).valid());
        assert!(!SignalId::new(Code::SbasL1ca, 139).valid());
        assert!(SignalId::new(Code::QzsL1ca, 193).valid());
        assert!(!SignalId::new(Code::QzsL1ca, 203).valid());
        assert!(SignalId::new(Code::GloL2of, 28).valid());
        assert!(!SignalId::new(Code::GloL2of, 29).valid());
    }

    #[test]
    fn formatting() {
        init_logger();
        assert_eq!(SignalId::new(Code::GpsL1ca, 9).to_string(), "GPS L1CA 9");
        assert_eq!(SignalId::new(Code::GalE5i, 11).to_string(), "GAL E5aI 11");
        assert_eq!(SignalId::new(Code::SbasL1ca, 131).to_string(), "SBAS L1 131");
        assert_eq!(SignalId::new(Code::GpsL1ca, 0).to_string(), "GPS L1CA 0");
    }

    #[test]
    fn ordering() {
        init_logger();

        // GLO L1OF has a smaller discriminant than GPS L1P,
        // yet all GPS signals sort first
        let gps = SignalId::new(Code::GpsL1p, 32);
        let glo = SignalId::new(Code::GloL1of, 1);
        assert!(gps < glo);

        let sbas = SignalId::new(Code::SbasL5i, 120);
        assert!(gps < sbas && sbas < glo);

        let a = SignalId::new(Code::GpsL1ca, 2);
        let b = SignalId::new(Code::GpsL1ca, 10);
        let c = SignalId::new(Code::GpsL2cm, 1);
        assert!(a < b && b < c);
        assert_eq!(a.cmp(&a), Ordering::Equal);

        let mut sids = vec![
            SignalId::new(Code::GalE1b, 4),
            SignalId::new(Code::GpsL1ca, 5),
            SignalId::new(Code::QzsL1ca, 193),
            SignalId::new(Code::Bds2B1, 7),
        ];
        sids.sort();
        assert_eq!(
            sids.iter().map(|s| s.constellation()).collect::<Vec<_>>(),
            vec![
                Constellation::GPS,
                Constellation::BeiDou,
                Constellation::QZSS,
                Constellation::Galileo,
            ]
        );
    }

    #[test]
    fn glonass_carriers() {
        init_logger();

        let map = GloFcnMap::new();
        let sid = SignalId::new(Code::GloL1of, 3);

        assert_eq!(sid.carrier_frequency(&map), Err(Error::MissingFcn(sid)));

        map.set_slot_fcn(3, GLO_FCN_OFFSET).unwrap();
        assert_eq!(sid.carrier_frequency(&map), Ok(GLO_L1_HZ));

        map.set_slot_fcn(3, GLO_MIN_FCN).unwrap();
        assert_eq!(
            sid.carrier_frequency(&map),
            Ok(GLO_L1_HZ - 7.0 * GLO_L1_DELTA_HZ)
        );

        let gps = SignalId::new(Code::GpsL1ca, 3);
        let lambda = gps.lambda(&map).unwrap();
        assert!((lambda - 0.190293672798365).abs() < 1e-12);
    }

    #[test]
    fn sbas_systems() {
        init_logger();
        assert_eq!(
            SignalId::new(Code::SbasL1ca, 131).sbas_system(),
            Some(SbasSystem::Waas)
        );
        assert_eq!(
            SignalId::new(Code::SbasL1ca, 123).sbas_system(),
            Some(SbasSystem::Egnos)
        );
        assert_eq!(
            SignalId::new(Code::SbasL1ca, 128).sbas_system(),
            Some(SbasSystem::Gagan)
        );
        assert_eq!(
            SignalId::new(Code::SbasL1ca, 137).sbas_system(),
            Some(SbasSystem::Msas)
        );
        assert_eq!(SignalId::new(Code::SbasL1ca, 121).sbas_system(), None);
        assert_eq!(SignalId::new(Code::GpsL1ca, 131).sbas_system(), None);

        let sv = SignalId::new(Code::SbasL1ca, 131).to_sv().unwrap();
        assert_eq!(sv, SV::new(Constellation::WAAS, 31));
    }

    #[test]
    fn constellation_names() {
        init_logger();
        for constellation in CONSTELLATIONS.iter() {
            let name = constellation_to_str(constellation);
            assert_eq!(parse_constellation(name), Ok(*constellation));
        }
        assert!(parse_constellation("IRN").is_err());
    }
}
