use nalgebra::{Matrix4, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coords::ecef_to_ned_matrix;

/// Dilution of precision of a [crate::prelude::Solution]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dops {
    /// Position DOP
    pub pdop: f64,
    /// Geometric DOP
    pub gdop: f64,
    /// Time DOP
    pub tdop: f64,
    /// Horizontal DOP
    pub hdop: f64,
    /// Vertical DOP
    pub vdop: f64,
}

impl Dops {
    /// Creates new [Dops].
    ///
    /// ## Input
    /// - h: (GᵀG)⁻¹ of the converged geometry, unweighted
    /// - pos_ecef: converged receiver position (m)
    pub(crate) fn new(h: &Matrix4<f64>, pos_ecef: &Vector3<f64>) -> Self {
        let pdop_sq = h[(0, 0)] + h[(1, 1)] + h[(2, 2)];
        let tdop_sq = h[(3, 3)];

        // local down direction, in ECEF
        let ned = ecef_to_ned_matrix(pos_ecef);
        let down = ned.row(2).transpose();

        let h_pos = h.fixed_view::<3, 3>(0, 0);
        let vdop_sq = down.dot(&(h_pos * down));

        Self {
            pdop: pdop_sq.sqrt(),
            gdop: (pdop_sq + tdop_sq).sqrt(),
            tdop: tdop_sq.sqrt(),
            hdop: (pdop_sq - vdop_sq).sqrt(),
            vdop: vdop_sq.sqrt(),
        }
    }
}
