//! GLONASS slot to frequency channel mapping.
use std::sync::{OnceLock, PoisonError, RwLock};

use log::debug;

use crate::{
    prelude::{Error, SignalId},
    signal::code::{GLO_NUM_FCN, NUM_SATS_GLO},
};

/// Offset applied to frequency channels: channel `k` (-7..=6) is stored as `k + 8`.
pub const GLO_FCN_OFFSET: u16 = 8;

/// Smallest stored frequency channel (channel -7)
pub const GLO_MIN_FCN: u16 = 1;

/// Largest stored frequency channel (channel +6)
pub const GLO_MAX_FCN: u16 = GLO_NUM_FCN;

const NUM_SLOTS: usize = NUM_SATS_GLO as usize + 1;

pub(crate) fn fcn_is_valid(fcn: u16) -> bool {
    (GLO_MIN_FCN..=GLO_MAX_FCN).contains(&fcn)
}

pub(crate) fn slot_is_valid(slot: u16) -> bool {
    slot > 0 && slot <= NUM_SATS_GLO
}

/// [GloFcnMap] associates each GLONASS orbital slot (1..=28)
/// to the frequency channel the satellite transmits on.
/// It is updated as GLONASS navigation strings are decoded and read
/// each time the carrier frequency of a GLONASS FDMA signal is needed.
/// The table is protected by a [RwLock] and can be shared between threads.
#[derive(Debug, Default)]
pub struct GloFcnMap {
    /// Stored channels, index 0 is unused. 0 means unknown.
    slots: RwLock<[u16; NUM_SLOTS]>,
}

impl GloFcnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process wide [GloFcnMap]
    pub fn global() -> &'static GloFcnMap {
        static GLOBAL: OnceLock<GloFcnMap> = OnceLock::new();
        GLOBAL.get_or_init(GloFcnMap::new)
    }

    /// Installs the (offset) frequency channel of this slot.
    pub fn set_slot_fcn(&self, slot: u16, fcn: u16) -> Result<(), Error> {
        if !slot_is_valid(slot) {
            return Err(Error::InvalidSlot(slot));
        }
        if !fcn_is_valid(fcn) {
            return Err(Error::InvalidFcn(fcn));
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots[slot as usize] = fcn;

        debug!("glo slot {} mapped to fcn {}", slot, fcn as i32 - GLO_FCN_OFFSET as i32);
        Ok(())
    }

    /// Returns the (offset) frequency channel of this slot, if known.
    pub fn get_fcn(&self, slot: u16) -> Option<u16> {
        if !slot_is_valid(slot) {
            return None;
        }

        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);

        match slots[slot as usize] {
            0 => None,
            fcn => Some(fcn),
        }
    }

    /// True if a frequency channel is known for this GLONASS signal.
    pub fn valid(&self, sid: &SignalId) -> bool {
        sid.code.is_glo() && self.get_fcn(sid.sat).is_some()
    }

    /// Forgets the frequency channel of this slot.
    pub fn clear(&self, slot: u16) -> Result<(), Error> {
        if !slot_is_valid(slot) {
            return Err(Error::InvalidSlot(slot));
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots[slot as usize] = 0;
        Ok(())
    }

    pub fn clear_all(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        *slots = [0; NUM_SLOTS];
    }

    /// Returns the slots transmitting on this (offset) channel. Antipodal
    /// satellites share a channel, so at most two slots are returned.
    pub fn slots_for_fcn(&self, fcn: u16) -> Vec<u16> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);

        slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, stored)| **stored != 0 && **stored == fcn)
            .map(|(slot, _)| slot as u16)
            .take(2)
            .collect()
    }
}
