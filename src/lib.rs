#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

pub mod almanac;
pub mod constants;
pub mod coords;
pub mod decode;
pub mod ephemeris;
pub mod geoid;
pub mod linalg;
pub mod measurement;
pub mod signal;
pub mod time;

// private modules
mod bits;
mod cfg;
mod error;
mod sid_set;
mod solver;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::almanac::{Almanac, AlmanacData};
    pub use crate::cfg::{Config, Strategy};
    pub use crate::ephemeris::{
        Ephemeris, EphemerisData, EphemerisSource, EphemerisStatus, GloEphemeris,
        KeplerEphemeris, SatState, XyzEphemeris,
    };
    pub use crate::error::Error;
    pub use crate::geoid::GeoidGrid;
    pub use crate::measurement::{MeasurementFlags, NavigationMeasurement};
    pub use crate::sid_set::SidSet;
    pub use crate::signal::{Code, GloBiases, GloFcnMap, SignalId};
    pub use crate::solver::{
        calc_pvt, Dops, Solution, SolutionOk, Solver, SolverError, SolverOutput,
    };
    pub use crate::time::{GpsTime, UtcParams};
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::{Matrix3, Vector3};
}

// pub export
pub use error::Error;
