//! Per-slot vote counts for the reveal.

use std::collections::BTreeMap;

/// Counts of `choice index → votes`, per reveal slot.
///
/// There is no per-player dedup: every vote increments. `BTreeMap` keeps
/// the broadcast order stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    slots: BTreeMap<usize, BTreeMap<u32, u64>>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one vote and returns the slot's updated counts.
    pub fn vote(&mut self, slot: usize, choice: u32) -> &BTreeMap<u32, u64> {
        let counts = self.slots.entry(slot).or_default();
        *counts.entry(choice).or_insert(0) += 1;
        counts
    }

    /// Clears every count. Called each time a reveal is built.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
