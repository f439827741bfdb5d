//! Receiver autonomous integrity monitoring: residual consistency test
//! and exclusion search.
use log::{debug, info};

use crate::{
    sid_set::SidSet,
    solver::{
        lsq::{pvt_iter, LsqSolution, Observation, N_STATE},
        SolverError,
    },
};

/// Maximal number of signals the exclusion search may remove
pub(crate) const RAIM_MAX_EXCLUSIONS: usize = 2;

const RAIM_METRIC_THRESHOLD: f64 = 2.5;

/// Outcome of a successful [solve_raim]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RaimStatus {
    /// Residuals were not checked
    Unchecked,
    /// Residuals passed the test
    Passed,
    /// Residuals passed the test once some signals were removed
    Repaired,
}

#[derive(Debug, Clone)]
pub(crate) struct RaimSolution {
    pub status: RaimStatus,
    pub lsq: LsqSolution,
    /// Signals removed by the exclusion search
    pub removed: SidSet,
}

/// Normalizes the residuals by their expected noise and compares their norm
/// to the threshold, scaled by the degrees of freedom.
/// Returns the test result and the metric, which is infinite when it can't be evaluated.
pub(crate) fn residual_test(obs: &[Observation], sol: &LsqSolution, velocity: bool) -> (bool, f64) {
    if obs.is_empty() || sol.position().iter().all(|x| *x == 0.0) {
        return (false, f64::INFINITY);
    }

    let n = obs.len();

    let (n_meas, n_state) = if velocity {
        (2 * n, 2 * N_STATE)
    } else {
        (n, N_STATE)
    };

    let mut sum_sq = 0.0;

    for (i, ob) in obs.iter().enumerate() {
        let noises = ob.noises();

        let mut residual = sol.omp_range[i];
        if noises.pseudorange != 0.0 {
            residual /= noises.pseudorange.sqrt();
        }
        sum_sq += residual * residual;

        if velocity {
            let mut residual = sol.omp_doppler[i];
            if noises.doppler != 0.0 {
                residual /= noises.doppler.sqrt();
            }
            sum_sq += residual * residual;
        }
    }

    let dof = n_meas as f64 - n_state as f64;

    let metric = sum_sq.sqrt() / dof.sqrt();
    let threshold = RAIM_METRIC_THRESHOLD * (n_meas as f64 / dof).sqrt();

    (metric < threshold, metric)
}

/// Solves with the signals that are not in `removed`, then tests the residuals.
/// The solution is only returned when the test passed. The metric is returned
/// in any case (infinite when it could not be evaluated).
fn solve_masked(
    obs: &[Observation],
    removed: &SidSet,
    velocity: bool,
) -> (Option<LsqSolution>, f64) {
    let subset = obs
        .iter()
        .filter(|ob| !removed.contains(&ob.sid()))
        .copied()
        .collect::<Vec<_>>();

    let used = subset.iter().map(|ob| ob.sid()).collect::<SidSet>();

    if used.sat_count() < N_STATE {
        info!("raim: not enough satellites remaining");
        return (None, f64::INFINITY);
    }

    let sol = match pvt_iter(&subset, velocity) {
        Some(sol) => sol,
        None => return (None, f64::INFINITY),
    };

    let (passed, metric) = residual_test(&subset, &sol, velocity);

    if passed {
        (Some(sol), metric)
    } else {
        (None, metric)
    }
}

/// Last resort: only retain GPS signals.
fn solve_gps_only(
    obs: &[Observation],
    velocity: bool,
    original_metric: f64,
) -> Result<RaimSolution, SolverError> {
    let removed = obs
        .iter()
        .map(|ob| ob.sid())
        .filter(|sid| !sid.code.is_gps())
        .collect::<SidSet>();

    let n_used = obs.len().saturating_sub(removed.sig_count());

    if n_used <= N_STATE {
        info!(
            "raim failed: {} measurements not enough for constellation raim, metric {:.1}",
            n_used, original_metric
        );
        return Err(SolverError::RaimRepairImpossible);
    }

    match solve_masked(obs, &removed, velocity) {
        (Some(lsq), metric) => {
            info!(
                "raim excluded all non-GPS measurements ({} out of {}), metric {:.1} -> {:.1}",
                removed.sig_count(),
                obs.len(),
                original_metric,
                metric
            );
            Ok(RaimSolution {
                status: RaimStatus::Repaired,
                lsq,
                removed,
            })
        },
        (None, metric) => {
            if removed.is_empty() {
                info!(
                    "raim failed: all exclusion candidates out of {} measurements failed, metric {:.1}",
                    obs.len(),
                    original_metric,
                );
            } else {
                info!(
                    "raim failed: tried excluding {} measurement(s) out of {}, metric {:.1} -> {:.1}",
                    removed.sig_count(),
                    obs.len(),
                    original_metric,
                    metric
                );
            }
            Err(SolverError::RaimRepairFailed(removed))
        },
    }
}

/// Exclusion search: removes one signal at a time, up to [RAIM_MAX_EXCLUSIONS].
/// While no single exclusion passes the test, the one that reduces the metric the most
/// is committed and the search goes on.
fn repair(
    obs: &[Observation],
    velocity: bool,
    original_metric: f64,
) -> Result<RaimSolution, SolverError> {
    let n = obs.len();
    let mut removed = SidSet::new();

    while removed.sig_count() < RAIM_MAX_EXCLUSIONS && n - removed.sig_count() - 1 > N_STATE {
        let mut successful = false;
        let mut best: Option<(usize, f64)> = None;

        for (i, ob) in obs.iter().enumerate() {
            let sid = ob.sid();

            if removed.contains(&sid) {
                continue;
            }

            removed.insert(sid);
            let (sol, metric) = solve_masked(obs, &removed, velocity);
            removed.remove(&sid);

            let passed = sol.is_some();

            if passed {
                successful = true;
                debug!("{} raim exclusion successful, metric {:.2}", sid, metric);
            } else {
                debug!("{} raim failed to exclude measurement, metric {:.2}", sid, metric);
            }

            // any improvement is retained until one exclusion passes,
            // then only passing exclusions are retained
            let best_metric = best.map(|(_, m)| m).unwrap_or(f64::INFINITY);

            if metric <= best_metric && (!successful || passed) {
                best = Some((i, metric));
            }
        }

        let (bad, best_metric) = match best {
            Some(best) => best,
            None => {
                debug!("raim failed: all exclusion candidates failed");
                break;
            },
        };

        let bad_ob = &obs[bad];
        removed.insert(bad_ob.sid());

        if successful {
            let (sol, metric) = solve_masked(obs, &removed, velocity);

            if let Some(lsq) = sol {
                let residual = bad_ob.range_residual(&lsq.x);

                if velocity {
                    info!(
                        "{} raim exclusion, residuals {:.0} m, {:.0} m/s",
                        bad_ob.sid(),
                        residual,
                        bad_ob.doppler_residual(&lsq.x, &lsq.v)
                    );
                } else {
                    info!("{} raim exclusion, residual {:.0} m", bad_ob.sid(), residual);
                }

                info!(
                    "raim excluded {} measurement(s) out of {}, metric {:.1} -> {:.1}",
                    removed.sig_count(),
                    n,
                    original_metric,
                    metric
                );

                return Ok(RaimSolution {
                    status: RaimStatus::Repaired,
                    lsq,
                    removed,
                });
            }
        }

        debug!(
            "{} raim: no single exclusion found, looking for more, metric: {:.2}",
            bad_ob.sid(),
            best_metric
        );
    }

    solve_gps_only(obs, velocity, original_metric)
}

/// Solves, checks the residuals and attempts a repair when they do not pass.
pub(crate) fn solve_raim(
    obs: &[Observation],
    disable_raim: bool,
    velocity: bool,
) -> Result<RaimSolution, SolverError> {
    let n = obs.len();
    let sol = pvt_iter(obs, velocity);

    if disable_raim {
        return match sol {
            Some(lsq) => Ok(RaimSolution {
                status: RaimStatus::Unchecked,
                lsq,
                removed: SidSet::new(),
            }),
            None => Err(SolverError::NotConverged),
        };
    }

    match sol {
        Some(lsq) if n <= N_STATE => {
            // not enough measurements to test the residuals
            Ok(RaimSolution {
                status: RaimStatus::Unchecked,
                lsq,
                removed: SidSet::new(),
            })
        },
        None if n <= N_STATE + 1 => {
            // repairing requires at least two measurements more than states
            Err(SolverError::RaimRepairImpossible)
        },
        Some(lsq) => {
            let (passed, metric) = residual_test(obs, &lsq, velocity);
            if passed {
                Ok(RaimSolution {
                    status: RaimStatus::Passed,
                    lsq,
                    removed: SidSet::new(),
                })
            } else {
                repair(obs, velocity, metric)
            }
        },
        None => repair(obs, velocity, f64::INFINITY),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        measurement::NavigationMeasurement,
        prelude::SignalId,
        signal::Code,
        tests::{init_logger, synthetic_measurements},
    };

    fn observations(meas: &[NavigationMeasurement]) -> Vec<Observation<'_>> {
        meas.iter()
            .map(|meas| Observation {
                meas,
                lambda: crate::constants::SPEED_OF_LIGHT_M_S / meas.sid.code.carrier_frequency_hz(),
            })
            .collect()
    }

    #[test]
    fn consistent_residuals() {
        init_logger();

        let meas = synthetic_measurements();
        let obs = observations(&meas);

        for velocity in [false, true] {
            let sol = pvt_iter(&obs, velocity).unwrap();
            let (passed, metric) = residual_test(&obs, &sol, velocity);
            assert!(passed);
            assert!(metric < 0.1);

            let raim = solve_raim(&obs, false, velocity).unwrap();
            assert_eq!(raim.status, RaimStatus::Passed);
            assert!(raim.removed.is_empty());
        }
    }

    #[test]
    fn untested_residuals() {
        init_logger();

        let meas = synthetic_measurements();
        let obs = observations(&meas);

        let sol = pvt_iter(&obs, false).unwrap();
        assert_eq!(residual_test(&[], &sol, false), (false, f64::INFINITY));

        let mut origin = sol.clone();
        origin.x = nalgebra::Vector4::zeros();
        assert!(!residual_test(&obs, &origin, false).0);

        let raim = solve_raim(&obs, true, false).unwrap();
        assert_eq!(raim.status, RaimStatus::Unchecked);

        let raim = solve_raim(&obs[..4], false, false).unwrap();
        assert_eq!(raim.status, RaimStatus::Unchecked);
    }

    #[test]
    fn single_fault_exclusion() {
        init_logger();

        let mut meas = synthetic_measurements();
        meas[3].pseudorange += 5000.0;

        let faulty = meas[3].sid;
        let obs = observations(&meas);

        let raim = solve_raim(&obs, false, true).unwrap();
        assert_eq!(raim.status, RaimStatus::Repaired);
        assert_eq!(raim.removed.sig_count(), 1);
        assert!(raim.removed.contains(&faulty));

        // repaired solution agrees with the remaining signals
        let (passed, _) = residual_test(
            &obs.iter()
                .filter(|ob| ob.sid() != faulty)
                .copied()
                .collect::<Vec<_>>(),
            &raim.lsq,
            true,
        );
        assert!(passed);
    }

    #[test]
    fn gps_only_fallback() {
        init_logger();

        // two non GPS signals with gross errors, among GPS signals
        let mut meas = synthetic_measurements();
        meas[0].sid = SignalId::new(Code::GalE1b, 1);
        meas[0].pseudorange += 3.0E4;
        meas[1].sid = SignalId::new(Code::GalE1b, 2);
        meas[1].pseudorange -= 2.0E4;
        meas[2].sid = SignalId::new(Code::GalE1b, 3);
        meas[2].pseudorange += 1.0E4;

        let obs = observations(&meas);

        let sol = pvt_iter(&obs, false).unwrap();
        let (_, metric) = residual_test(&obs, &sol, false);

        match solve_gps_only(&obs, false, metric) {
            Ok(raim) => {
                assert_eq!(raim.status, RaimStatus::Repaired);
                assert_eq!(raim.removed.sig_count(), 3);
                assert!(raim.removed.iter().all(|sid| sid.code == Code::GalE1b));
            },
            Err(e) => panic!("gps only fallback failed: {}", e),
        }

        // not enough GPS signals left
        assert_eq!(
            solve_gps_only(&obs[..7], false, metric).err(),
            Some(SolverError::RaimRepairImpossible)
        );
    }
}
