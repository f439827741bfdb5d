//! Single epoch position, velocity and time solver
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    cfg::{Config, Strategy},
    measurement::NavigationMeasurement,
    sid_set::SidSet,
    signal::{Code, GloFcnMap},
    time::GpsTime,
};

mod dop;
mod lsq;
mod noise;
mod outliers;
mod raim;
mod solution;

pub use dop::Dops;
pub use solution::Solution;

use lsq::{Observation, N_STATE};
use outliers::flag_outliers;
use raim::{solve_raim, RaimStatus, RAIM_MAX_EXCLUSIONS};

/// Solver failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("PDOP too high")]
    PdopTooHigh,
    #[error("Altitude unreasonable")]
    BadAltitude,
    #[error("Velocity >= 1000 kts")]
    VelocityLockout,
    /// Integrity test failed and no exclusion could fix it.
    /// Carries the last signals the search attempted to exclude.
    #[error("RAIM repair attempted, failed")]
    RaimRepairFailed(SidSet),
    #[error("RAIM repair impossible (not enough measurements)")]
    RaimRepairImpossible,
    #[error("Took too long to converge")]
    NotConverged,
    #[error("Not enough measurements for solution (< 4)")]
    NotEnoughMeasurements,
}

impl SolverError {
    /// Legacy status code
    pub fn code(&self) -> i8 {
        match self {
            Self::PdopTooHigh => -1,
            Self::BadAltitude => -2,
            Self::VelocityLockout => -3,
            Self::RaimRepairFailed(_) => -4,
            Self::RaimRepairImpossible => -5,
            Self::NotConverged => -6,
            Self::NotEnoughMeasurements => -7,
        }
    }
}

/// Successful solver outcomes
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionOk {
    /// Integrity was not verified: disabled or not enough measurements
    NoRaim,
    /// Integrity verified once these signals were excluded
    RaimRepaired(SidSet),
    /// Integrity verified
    RaimOk,
}

impl SolutionOk {
    /// Legacy status code
    pub fn code(&self) -> i8 {
        match self {
            Self::NoRaim => 2,
            Self::RaimRepaired(_) => 1,
            Self::RaimOk => 0,
        }
    }

    /// Signals that were excluded, if any
    pub fn excluded(&self) -> Option<&SidSet> {
        match self {
            Self::RaimRepaired(excluded) => Some(excluded),
            _ => None,
        }
    }
}

/// [SolverOutput] gathers the [Solution], its [Dops] and the integrity status.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub status: SolutionOk,
    pub solution: Solution,
    pub dops: Dops,
}

impl SolverOutput {
    /// Signals excluded by the integrity monitoring (empty set when none).
    pub fn excluded(&self) -> SidSet {
        self.status.excluded().copied().unwrap_or_default()
    }
}

/// Measurements the solver can't use at all
fn signal_condition_filter(pool: &mut Vec<Observation>) {
    pool.retain(|ob| {
        if ob.meas.pseudorange_valid() {
            true
        } else {
            debug!("{} missing pseudo range observation", ob.sid());
            false
        }
    })
}

/// Observation mask
fn signal_quality_filter(min_cn0: f64, pool: &mut Vec<Observation>) {
    pool.retain(|ob| {
        if ob.meas.cn0 < min_cn0 {
            debug!("{} rejected: below cn0 mask ({:.1} dB-Hz)", ob.sid(), ob.meas.cn0);
            false
        } else {
            true
        }
    })
}

/// Picks the measurements that go through the least squares, according to the [Strategy].
/// Input order is preserved.
fn select<'a>(pool: &[Observation<'a>], strategy: Strategy) -> Vec<Observation<'a>> {
    match strategy {
        Strategy::AllConstellations => pool.to_vec(),
        Strategy::GpsOnly => pool
            .iter()
            .filter(|ob| ob.sid().code.is_gps())
            .copied()
            .collect(),
        Strategy::L1Only => pool
            .iter()
            .filter(|ob| matches!(ob.sid().code, Code::GpsL1ca | Code::GalE1b))
            .copied()
            .collect(),
        Strategy::GpsL1caWhenPossible => {
            let mut selected = pool
                .iter()
                .map(|ob| ob.sid().code == Code::GpsL1ca)
                .collect::<Vec<_>>();

            let mut sids = pool
                .iter()
                .filter(|ob| ob.sid().code == Code::GpsL1ca)
                .map(|ob| ob.sid())
                .collect::<SidSet>();

            // other signals, as long as they bring a new satellite
            // and we're short of full integrity monitoring
            for (i, ob) in pool.iter().enumerate() {
                if selected[i] || sids.sat_count() > N_STATE + RAIM_MAX_EXCLUSIONS {
                    continue;
                }

                let mut extended = sids;
                extended.insert(ob.sid());

                if extended.sat_count() > sids.sat_count() {
                    selected[i] = true;
                    sids = extended;
                }
            }

            pool.iter()
                .zip(selected)
                .filter_map(|(ob, selected)| if selected { Some(*ob) } else { None })
                .collect()
        },
    }
}

/// [Solver] resolves a position, velocity and time [Solution] from the
/// [NavigationMeasurement]s of a single epoch, verifying their consistency
/// with receiver autonomous integrity monitoring.
#[derive(Debug, Clone, Copy)]
pub struct Solver<'a> {
    /// Solver parametrization
    pub cfg: Config,
    /// Frequency channels of the GLONASS satellites
    glo_map: &'a GloFcnMap,
}

impl Solver<'static> {
    /// Creates a new [Solver] that uses the process wide [GloFcnMap].
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            glo_map: GloFcnMap::global(),
        }
    }
}

impl<'a> Solver<'a> {
    /// Creates a new [Solver] that uses this [GloFcnMap].
    pub fn with_glo_map(cfg: Config, glo_map: &'a GloFcnMap) -> Self {
        Self { cfg, glo_map }
    }

    /// [Solution] resolution attempt.
    /// ## Inputs
    /// - meas: [NavigationMeasurement]s, with the satellite states resolved
    ///   at their respective time of transmission
    /// - tor: time of reception
    pub fn solve(
        &self,
        meas: &[NavigationMeasurement],
        tor: &GpsTime,
    ) -> Result<SolverOutput, SolverError> {
        let mut pool = meas
            .iter()
            .filter_map(|meas| match meas.sid.lambda(self.glo_map) {
                Ok(lambda) => Some(Observation { meas, lambda }),
                Err(e) => {
                    warn!("{} rejected: {}", meas.sid, e);
                    None
                },
            })
            .collect::<Vec<_>>();

        signal_condition_filter(&mut pool);

        if let Some(min_cn0) = self.cfg.cn0_mask {
            signal_quality_filter(min_cn0, &mut pool);
        }

        self.solve_pool(&pool, tor, self.cfg.strategy)
    }

    fn solve_pool(
        &self,
        pool: &[Observation],
        tor: &GpsTime,
        strategy: Strategy,
    ) -> Result<SolverOutput, SolverError> {
        let selected = select(pool, strategy);

        let selected_sids = selected.iter().map(|ob| ob.sid()).collect::<SidSet>();

        if selected_sids.sat_count() < N_STATE {
            return Err(SolverError::NotEnoughMeasurements);
        }

        let velocity =
            !self.cfg.disable_velocity && selected.iter().all(|ob| ob.meas.doppler_valid());

        if !self.cfg.disable_velocity && !velocity {
            debug!("velocity not resolved: missing doppler measurement(s)");
        }

        let raim = solve_raim(&selected, self.cfg.disable_raim, velocity)?;

        let mut removed = raim.removed;

        let used = selected
            .iter()
            .map(|ob| ob.sid())
            .filter(|sid| !removed.contains(sid))
            .collect::<SidSet>();

        let n_sigs_used = selected
            .iter()
            .filter(|ob| !removed.contains(&ob.sid()))
            .count();

        let dops = Dops::new(&raim.lsq.h, &raim.lsq.position());

        let mut solution = Solution::new(&raim.lsq, &dops, tor, velocity);

        solution.n_sigs_used = n_sigs_used as u8;
        solution.n_sats_used = used.sat_count() as u8;

        if let Err(e) = solution.validate(&dops) {
            if e == SolverError::PdopTooHigh && strategy != Strategy::AllConstellations {
                info!("{} (gdop={:.1}): retrying with all signals", e, dops.gdop);
                return self.solve_pool(pool, tor, Strategy::AllConstellations);
            }
            return Err(e);
        }

        solution.valid = true;
        solution.velocity_valid = velocity;

        let mut repaired = raim.status == RaimStatus::Repaired;

        if strategy != Strategy::AllConstellations && !self.cfg.disable_raim {
            // signals left aside by the selection are verified against the solution
            if flag_outliers(
                pool,
                &raim.lsq.x,
                &raim.lsq.v,
                velocity,
                &used,
                &mut removed,
            ) {
                repaired = true;
            }
        }

        let status = if repaired {
            SolutionOk::RaimRepaired(removed)
        } else {
            match raim.status {
                RaimStatus::Unchecked => SolutionOk::NoRaim,
                _ => SolutionOk::RaimOk,
            }
        };

        Ok(SolverOutput {
            status,
            solution,
            dops,
        })
    }
}

/// Resolves a [Solution] with the process wide [GloFcnMap].
/// See [Solver::solve].
pub fn calc_pvt(
    meas: &[NavigationMeasurement],
    tor: &GpsTime,
    cfg: &Config,
) -> Result<SolverOutput, SolverError> {
    Solver::new(*cfg).solve(meas, tor)
}
