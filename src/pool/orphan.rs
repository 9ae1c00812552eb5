// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Bounded holding area for proofs that cannot become peers yet.
//!
//! Capacity counts stakes, not proofs. Eviction is strictly FIFO by
//! insertion order, independent of score or id.

use crate::proof::ProofRef;
use crate::types::ProofId;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Something that may accept an orphan proof, usually the peer manager.
pub trait ProofPromoter {
    fn promote(&mut self, proof: &ProofRef) -> bool;
}

impl<F: FnMut(&ProofRef) -> bool> ProofPromoter for F {
    fn promote(&mut self, proof: &ProofRef) -> bool {
        self(proof)
    }
}

#[derive(Debug, Default)]
pub struct RescanOutcome {
    pub promoted: Vec<ProofRef>,
    /// Proofs the promoter refused. They are no longer in the pool.
    pub dropped: Vec<ProofRef>,
}

#[derive(Debug)]
pub struct OrphanProofPool {
    max_stakes: usize,
    next_sequence: u64,
    by_id: FxHashMap<ProofId, (u64, ProofRef)>,
    by_sequence: BTreeMap<u64, ProofId>,
    stake_count: usize,
}

impl OrphanProofPool {
    pub fn new(max_stakes: usize) -> Self {
        Self {
            max_stakes,
            next_sequence: 0,
            by_id: FxHashMap::default(),
            by_sequence: BTreeMap::new(),
            stake_count: 0,
        }
    }

    /// Inserts unless the id is already present, then trims. Returns whether
    /// the proof is in the pool afterwards.
    pub fn add_proof(&mut self, proof: ProofRef) -> bool {
        let id = *proof.id();
        if self.by_id.contains_key(&id) {
            return false;
        }

        let seq = self.next_sequence;
        self.next_sequence += 1;
        self.stake_count += proof.stakes().len();
        self.by_sequence.insert(seq, id);
        self.by_id.insert(id, (seq, proof));

        self.trim_to_maximum_size();
        self.by_id.contains_key(&id)
    }

    /// Evicts oldest-first until the stake total fits.
    pub fn trim_to_maximum_size(&mut self) {
        while self.stake_count > self.max_stakes {
            let Some((_, id)) = self.by_sequence.pop_first() else {
                break;
            };
            if let Some((_, proof)) = self.by_id.remove(&id) {
                self.stake_count -= proof.stakes().len();
            }
        }
    }

    pub fn remove_proof(&mut self, id: &ProofId) -> bool {
        let Some((seq, proof)) = self.by_id.remove(id) else {
            return false;
        };
        self.by_sequence.remove(&seq);
        self.stake_count -= proof.stakes().len();
        true
    }

    pub fn get_proof(&self, id: &ProofId) -> Option<ProofRef> {
        self.by_id.get(id).map(|(_, p)| Arc::clone(p))
    }

    pub fn contains(&self, id: &ProofId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Drains the pool, then offers each proof to `promoter` in insertion
    /// order. Nothing is reinserted: callers re-add proofs they want to keep.
    pub fn rescan(&mut self, promoter: &mut impl ProofPromoter) -> RescanOutcome {
        let order = std::mem::take(&mut self.by_sequence);
        let mut entries = std::mem::take(&mut self.by_id);
        self.stake_count = 0;

        let mut outcome = RescanOutcome::default();
        for id in order.into_values() {
            let Some((_, proof)) = entries.remove(&id) else {
                continue;
            };
            if promoter.promote(&proof) {
                outcome.promoted.push(proof);
            } else {
                outcome.dropped.push(proof);
            }
        }
        outcome
    }

    /// Proofs in insertion order.
    pub fn proofs(&self) -> Vec<ProofRef> {
        self.by_sequence
            .values()
            .filter_map(|id| self.by_id.get(id).map(|(_, p)| Arc::clone(p)))
            .collect()
    }

    pub fn count_proofs(&self) -> usize {
        self.by_id.len()
    }

    pub fn stake_count(&self) -> usize {
        self.stake_count
    }

    pub fn max_stakes(&self) -> usize {
        self.max_stakes
    }
}
