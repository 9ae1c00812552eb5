// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proofs keyed by the outputs they stake. No two proofs share an output.

use crate::proof::{compare_by_score, is_preferred_over, ProofRef};
use crate::types::{OutPoint, ProofId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddProofStatus {
    Succeed,
    /// Conflicts with a proof already present.
    Rejected,
    /// This very proof is already present.
    Duplicated,
}

#[derive(Debug, Default)]
pub struct ProofPool {
    by_utxo: BTreeMap<OutPoint, ProofRef>,
    by_id: FxHashMap<ProofId, ProofRef>,
}

impl ProofPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct proofs sharing an output with `proof`, ordered by id.
    /// `None` means `proof` itself is present.
    fn conflicts(&self, proof: &ProofRef) -> Option<Vec<ProofRef>> {
        let mut found: BTreeMap<ProofId, ProofRef> = BTreeMap::new();
        for ss in proof.stakes() {
            if let Some(existing) = self.by_utxo.get(ss.stake().utxo()) {
                if existing.id() == proof.id() {
                    return None;
                }
                found.entry(*existing.id()).or_insert_with(|| Arc::clone(existing));
            }
        }
        Some(found.into_values().collect())
    }

    fn insert(&mut self, proof: ProofRef) {
        for ss in proof.stakes() {
            self.by_utxo.insert(*ss.stake().utxo(), Arc::clone(&proof));
        }
        self.by_id.insert(*proof.id(), proof);
    }

    /// Adds `proof` when none of its outputs are taken. On rejection the
    /// conflicting proofs are returned alongside.
    pub fn add_proof_if_no_conflict(&mut self, proof: &ProofRef) -> (AddProofStatus, Vec<ProofRef>) {
        match self.conflicts(proof) {
            None => (AddProofStatus::Duplicated, Vec::new()),
            Some(conflicts) if !conflicts.is_empty() => (AddProofStatus::Rejected, conflicts),
            Some(_) => {
                self.insert(Arc::clone(proof));
                (AddProofStatus::Succeed, Vec::new())
            }
        }
    }

    /// Adds `proof` if it is preferred over every conflicting proof, evicting
    /// them. Evicted proofs are returned.
    pub fn add_proof_if_preferred(&mut self, proof: &ProofRef) -> (AddProofStatus, Vec<ProofRef>) {
        let Some(conflicts) = self.conflicts(proof) else {
            return (AddProofStatus::Duplicated, Vec::new());
        };
        if !conflicts.iter().all(|c| is_preferred_over(proof, c)) {
            return (AddProofStatus::Rejected, Vec::new());
        }
        for c in &conflicts {
            self.remove_proof(c.id());
        }
        self.insert(Arc::clone(proof));
        (AddProofStatus::Succeed, conflicts)
    }

    pub fn remove_proof(&mut self, id: &ProofId) -> bool {
        let Some(proof) = self.by_id.remove(id) else {
            return false;
        };
        for ss in proof.stakes() {
            self.by_utxo.remove(ss.stake().utxo());
        }
        true
    }

    pub fn get_proof(&self, id: &ProofId) -> Option<ProofRef> {
        self.by_id.get(id).cloned()
    }

    pub fn get_proof_by_utxo(&self, utxo: &OutPoint) -> Option<ProofRef> {
        self.by_utxo.get(utxo).cloned()
    }

    /// Lowest score, ties to the highest id: the last proof by score order.
    pub fn get_lowest_score_proof(&self) -> Option<ProofRef> {
        self.by_id
            .values()
            .max_by(|a, b| compare_by_score(a, b))
            .cloned()
    }

    pub fn for_each_proof(&self, mut f: impl FnMut(&ProofRef)) {
        for proof in self.by_id.values() {
            f(proof);
        }
    }

    pub fn count_proofs(&self) -> usize {
        self.by_id.len()
    }

    /// Number of outputs held.
    pub fn size(&self) -> usize {
        self.by_utxo.len()
    }
}
