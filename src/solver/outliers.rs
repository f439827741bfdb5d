//! Verification of the signals that were left aside by the selection stage.
use std::collections::HashMap;

use log::info;
use nalgebra::Vector4;

use crate::{sid_set::SidSet, signal::Code, solver::lsq::Observation};

/// Pseudorange residual above which a signal is flagged (m)
const RANGE_RESIDUAL_THRESHOLD_M: f64 = 30.0;

/// Residuals beyond this many thresholds do not contribute to the code bias
const BIAS_EXCLUSION_FACTOR: f64 = 10.0;

/// Doppler residual above which a signal is flagged (m/s)
const DOPPLER_RESIDUAL_THRESHOLD_M_S: f64 = 5.0;

/// Running mean of the residuals of one [Code]
#[derive(Debug, Default, Clone, Copy)]
struct CodeBias {
    count: usize,
    mean: f64,
}

impl CodeBias {
    fn push(&mut self, residual: f64) {
        self.count += 1;
        self.mean += (residual - self.mean) / self.count as f64;
    }
}

/// Checks every signal that is neither in `used` nor in `removed` against the
/// solution `(x, v)`. The mean residual of each code is removed beforehand.
/// Flagged signals are added to `removed`. Returns true if any signal was flagged.
pub(crate) fn flag_outliers(
    obs: &[Observation],
    x: &Vector4<f64>,
    v: &Vector4<f64>,
    velocity: bool,
    used: &SidSet,
    removed: &mut SidSet,
) -> bool {
    let candidates = obs
        .iter()
        .filter(|ob| !used.contains(&ob.sid()) && !removed.contains(&ob.sid()))
        .map(|ob| (ob, ob.range_residual(x)))
        .collect::<Vec<_>>();

    let mut biases = HashMap::<Code, CodeBias>::new();

    for (ob, residual) in candidates.iter() {
        if residual.abs() < BIAS_EXCLUSION_FACTOR * RANGE_RESIDUAL_THRESHOLD_M {
            biases.entry(ob.sid().code).or_default().push(*residual);
        }
    }

    let mut flagged = 0;

    for (ob, residual) in candidates {
        let sid = ob.sid();

        let residual = match biases.get(&sid.code) {
            Some(bias) if bias.count > 1 => residual - bias.mean,
            _ => residual,
        };

        if residual.abs() > RANGE_RESIDUAL_THRESHOLD_M {
            if flagged == 0 {
                info!("{} flagging too large pseudorange residual ({:.1} m)", sid, residual);
            }
            removed.insert(sid);
            flagged += 1;
        } else if velocity && ob.meas.doppler_valid() {
            let doppler_residual = ob.doppler_residual(x, v);
            if doppler_residual.abs() > DOPPLER_RESIDUAL_THRESHOLD_M_S {
                if flagged == 0 {
                    info!(
                        "{} flagging too large doppler residual ({:.1} m/s)",
                        sid, doppler_residual
                    );
                }
                removed.insert(sid);
                flagged += 1;
            }
        }
    }

    if flagged > 1 {
        info!("flagged total of {} signals as outliers", flagged);
    }

    flagged > 0
}
