use crate::prelude::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Measurement selection strategy: which of the available signals
/// are fed to the least squares and integrity stages.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Only GPS signals, whatever their frequency.
    GpsOnly,

    /// Every signal that has a valid pseudorange.
    #[default]
    AllConstellations,

    /// All GPS L1 C/A signals. Other signals are only picked up when they
    /// bring a new satellite, and until there are enough satellites
    /// to exclude two of them and still perform the integrity check.
    /// Signals left aside are verified against the solution afterwards.
    GpsL1caWhenPossible,

    /// Signals transmitted on the 1575.42 MHz carrier (GPS L1 C/A and Galileo E1B).
    L1Only,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::GpsOnly => write!(fmt, "gps"),
            Self::AllConstellations => write!(fmt, "all"),
            Self::GpsL1caWhenPossible => write!(fmt, "gps-l1ca"),
            Self::L1Only => write!(fmt, "l1"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gps" | "gps-only" => Ok(Self::GpsOnly),
            "all" | "all-constellations" => Ok(Self::AllConstellations),
            "gps-l1ca" | "gps-l1ca-when-possible" => Ok(Self::GpsL1caWhenPossible),
            "l1" | "l1-only" => Ok(Self::L1Only),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}
