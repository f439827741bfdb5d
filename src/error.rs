use thiserror::Error;

use crate::{ephemeris::EphemerisStatus, signal::SignalId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Satellite number out of range for this signal code.
    #[error("invalid signal identifier {0}")]
    InvalidSignal(SignalId),

    #[error("unknown signal code \"{0}\"")]
    UnknownCode(String),

    #[error("unknown constellation \"{0}\"")]
    UnknownConstellation(String),

    #[error("unknown measurement selection strategy \"{0}\"")]
    UnknownStrategy(String),

    #[error("non supported constellation for this operation")]
    UnsupportedConstellation,

    /// Carrier frequency of a GLONASS FDMA signal was requested
    /// while no frequency channel is known for this slot.
    #[error("no frequency channel mapped for {0}")]
    MissingFcn(SignalId),

    #[error("invalid glonass frequency channel {0}")]
    InvalidFcn(u16),

    #[error("invalid glonass slot {0}")]
    InvalidSlot(u16),

    #[error("unknown week number")]
    UnknownWeek,

    #[error("invalid calendar date")]
    InvalidDate,

    /// Broadcast data did not pass internal consistency checks.
    #[error("navigation message decoding error: {0}")]
    Decoding(&'static str),

    /// Ephemeris can't be used at requested instant.
    #[error("ephemeris not usable: {0}")]
    Ephemeris(EphemerisStatus),

    #[error("almanac not usable at this instant")]
    AlmanacNotValid,

    #[error("matrix is singular")]
    SingularMatrix,

    #[error("matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("under-determined system ({0} measurements)")]
    UnderDetermined(usize),

    /// Geoid heights don't match the grid spacing.
    #[error("invalid geoid grid: {0}")]
    InvalidGeoidGrid(&'static str),

    #[error("latitude or longitude out of range")]
    InvalidCoordinates,
}
