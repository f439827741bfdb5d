use itertools::Itertools;
use log::warn;

use crate::{
    prelude::SignalId,
    signal::{constellation_rank, Code, CONSTELLATIONS, NUM_CODES},
};

/// Compact set of [SignalId]s, one satellite bitmask per [Code].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SidSet {
    sats: [u64; NUM_CODES],
}

impl Default for SidSet {
    fn default() -> Self {
        Self {
            sats: [0; NUM_CODES],
        }
    }
}

impl SidSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a signal. Returns false if it was already present
    /// or the identifier is not valid.
    pub fn insert(&mut self, sid: SignalId) -> bool {
        let Ok(index) = sid.code_index() else {
            warn!("{} can't be stored: invalid signal", sid);
            return false;
        };

        let mask = 1u64 << index;
        let slot = &mut self.sats[sid.code.index() as usize];
        let inserted = *slot & mask == 0;
        *slot |= mask;
        inserted
    }

    /// Removes a signal. Returns true if it was present.
    pub fn remove(&mut self, sid: &SignalId) -> bool {
        let Ok(index) = sid.code_index() else {
            return false;
        };

        let mask = 1u64 << index;
        let slot = &mut self.sats[sid.code.index() as usize];
        let present = *slot & mask != 0;
        *slot &= !mask;
        present
    }

    pub fn contains(&self, sid: &SignalId) -> bool {
        match sid.code_index() {
            Ok(index) => self.sats[sid.code.index() as usize] & (1u64 << index) != 0,
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.sats = [0; NUM_CODES];
    }

    pub fn is_empty(&self) -> bool {
        self.sats.iter().all(|mask| *mask == 0)
    }

    /// Number of signals
    pub fn sig_count(&self) -> usize {
        self.sats.iter().map(|mask| mask.count_ones() as usize).sum()
    }

    /// Number of distinct satellites, regardless of how many
    /// signals each one contributes.
    pub fn sat_count(&self) -> usize {
        let mut per_constellation = [0u64; CONSTELLATIONS.len()];

        for code in Code::ALL.iter() {
            let rank = constellation_rank(&code.constellation()) as usize;
            per_constellation[rank] |= self.sats[code.index() as usize];
        }

        per_constellation
            .iter()
            .map(|mask| mask.count_ones() as usize)
            .sum()
    }

    /// Iterates the stored signals in [SignalId] order.
    pub fn iter(&self) -> impl Iterator<Item = SignalId> + '_ {
        let mut codes = Code::ALL;
        codes.sort_by_key(|code| (constellation_rank(&code.constellation()), code.index()));

        codes.into_iter().flat_map(move |code| {
            let mask = self.sats[code.index() as usize];
            (0..64u16)
                .filter(move |bit| mask & (1u64 << bit) != 0)
                .map(move |bit| SignalId::new(code, code.first_prn() + bit))
        })
    }
}

impl Extend<SignalId> for SidSet {
    fn extend<T: IntoIterator<Item = SignalId>>(&mut self, iter: T) {
        for sid in iter {
            self.insert(sid);
        }
    }
}

impl FromIterator<SignalId> for SidSet {
    fn from_iter<T: IntoIterator<Item = SignalId>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl std::fmt::Display for SidSet {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{{{}}}", self.iter().join(", "))
    }
}
