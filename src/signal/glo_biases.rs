//! GLONASS code-phase biases, as advertised by base stations (RTCM 1230).
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::signal::Code;

/// Biases closer than this (m) are considered equal
const BIAS_EQUALITY_EPSILON: f64 = 1.0E-12;

bitflags! {
    /// Signals a [GloBiases] set carries a bias for.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct GloBiasMask: u8 {
        const L2P = 0x01;
        const L2OF = 0x02;
        const L1P = 0x04;
        const L1OF = 0x08;
    }
}

/// Code-phase biases (m) of a GLONASS receiver.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GloBiases {
    pub mask: GloBiasMask,
    pub l1of_m: f64,
    pub l1p_m: f64,
    pub l2of_m: f64,
    pub l2p_m: f64,
}

impl PartialEq for GloBiases {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask
            && (self.l1of_m - other.l1of_m).abs() <= BIAS_EQUALITY_EPSILON
            && (self.l1p_m - other.l1p_m).abs() <= BIAS_EQUALITY_EPSILON
            && (self.l2of_m - other.l2of_m).abs() <= BIAS_EQUALITY_EPSILON
            && (self.l2p_m - other.l2p_m).abs() <= BIAS_EQUALITY_EPSILON
    }
}

impl GloBiases {
    /// Biases of this receiver: null on every signal.
    pub fn local() -> Self {
        Self {
            mask: GloBiasMask::all(),
            ..Default::default()
        }
    }

    /// Bias (m) between this receiver and a base station advertising `base`,
    /// for measurements of `code`. The base station P code bias stands in
    /// for a missing C/A bias. Zero when the base station advertises neither,
    /// or for non GLONASS FDMA codes.
    pub fn relative_bias(&self, code: Code, base: &GloBiases) -> f64 {
        match code {
            Code::GloL1of => {
                if base.mask.contains(GloBiasMask::L1OF) {
                    self.l1of_m - base.l1of_m
                } else if base.mask.contains(GloBiasMask::L1P) {
                    self.l1of_m - base.l1p_m
                } else {
                    0.0
                }
            },
            Code::GloL2of => {
                if base.mask.contains(GloBiasMask::L2OF) {
                    self.l2of_m - base.l2of_m
                } else if base.mask.contains(GloBiasMask::L2P) {
                    self.l2of_m - base.l2p_m
                } else {
                    0.0
                }
            },
            _ => 0.0,
        }
    }
}
