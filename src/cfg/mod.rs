#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod strategy;
pub use strategy::Strategy;

fn default_disable_raim() -> bool {
    false
}

fn default_disable_velocity() -> bool {
    false
}

fn default_strategy() -> Strategy {
    Strategy::AllConstellations
}

fn default_cn0_mask() -> Option<f64> {
    None
}

/// [Config] gathers the knobs of the single epoch solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Skip the residual test and the exclusion search. Solutions
    /// are then reported with [crate::prelude::SolutionOk::NoRaim].
    #[cfg_attr(feature = "serde", serde(default = "default_disable_raim"))]
    pub disable_raim: bool,
    /// Do not solve for velocity and clock drift.
    /// When enabled, every selected measurement must carry
    /// a valid measured doppler, otherwise velocity is not reported.
    #[cfg_attr(feature = "serde", serde(default = "default_disable_velocity"))]
    pub disable_velocity: bool,
    /// Measurement selection [Strategy]
    #[cfg_attr(feature = "serde", serde(default = "default_strategy"))]
    pub strategy: Strategy,
    /// Observation mask: measurements with a CN0 below this
    /// value (dB-Hz) do not contribute to the solution.
    #[cfg_attr(feature = "serde", serde(default = "default_cn0_mask"))]
    pub cn0_mask: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            disable_raim: default_disable_raim(),
            disable_velocity: default_disable_velocity(),
            strategy: default_strategy(),
            cn0_mask: default_cn0_mask(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with desired [Strategy].
    pub fn with_strategy(&self, strategy: Strategy) -> Self {
        let mut s = *self;
        s.strategy = strategy;
        s
    }

    /// Copies and returns [Config] with integrity monitoring turned off.
    pub fn without_raim(&self) -> Self {
        let mut s = *self;
        s.disable_raim = true;
        s
    }

    /// Copies and returns [Config] without velocity solving.
    pub fn without_velocity(&self) -> Self {
        let mut s = *self;
        s.disable_velocity = true;
        s
    }

    /// Copies and returns [Config] with a CN0 observation mask (dB-Hz).
    pub fn with_cn0_mask(&self, cn0: f64) -> Self {
        let mut s = *self;
        s.cn0_mask = Some(cn0);
        s
    }
}
