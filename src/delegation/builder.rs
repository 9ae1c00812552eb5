// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use super::{chain_hash, Delegation, DelegationLevel};
use crate::crypto::{PrivKey, PubKey, SchnorrSig};
use crate::proof::Proof;
use crate::types::{DelegationId, ProofId};

/// Builder levels hold `{pubkey_i, sig_i}` where `sig_i` is made by
/// `pubkey_i` to authorize level `i + 1`. The last level is the frontier
/// and carries no signature yet.
pub struct DelegationBuilder {
    proof_id: ProofId,
    proof_master: PubKey,
    dgid: DelegationId,
    levels: Vec<DelegationLevel>,
}

impl DelegationBuilder {
    pub fn from_proof(proof: &Proof) -> Self {
        Self::new(*proof.id(), *proof.master())
    }

    pub fn new(proof_id: ProofId, proof_master: PubKey) -> Self {
        Self {
            proof_id,
            proof_master,
            dgid: DelegationId(proof_id.0),
            levels: vec![DelegationLevel { pubkey: proof_master, sig: SchnorrSig::ZERO }],
        }
    }

    /// Resumes an existing delegation.
    pub fn from_delegation(delegation: &Delegation) -> Self {
        let mut builder = Self::new(*delegation.proof_id(), *delegation.proof_master());
        builder.import_levels(delegation);
        builder
    }

    /// Copies `delegation`'s levels in. Only allowed once, before any level
    /// is added, and only for the same proof.
    pub fn import_delegation(&mut self, delegation: &Delegation) -> bool {
        if *delegation.proof_id() != self.proof_id || self.levels.len() > 1 {
            return false;
        }
        self.import_levels(delegation);
        true
    }

    fn import_levels(&mut self, delegation: &Delegation) {
        for level in delegation.levels() {
            if let Some(frontier) = self.levels.last_mut() {
                frontier.sig = level.sig;
            }
            self.levels.push(DelegationLevel { pubkey: level.pubkey, sig: SchnorrSig::ZERO });
        }
        self.dgid = *delegation.id();
    }

    /// Extends the chain to `next`. `key` must own the current frontier.
    pub fn add_level(&mut self, key: &PrivKey, next: PubKey) -> bool {
        let Some(frontier) = self.levels.last() else {
            return false;
        };
        if key.pub_key() != frontier.pubkey {
            return false;
        }

        let dgid = chain_hash(&self.dgid, &next);
        let sig = key.sign(&dgid.0).unwrap_or(SchnorrSig::ZERO);
        if let Some(frontier) = self.levels.last_mut() {
            frontier.sig = sig;
        }
        self.levels.push(DelegationLevel { pubkey: next, sig: SchnorrSig::ZERO });
        self.dgid = dgid;
        true
    }

    pub fn id(&self) -> &DelegationId {
        &self.dgid
    }

    pub fn build(&self) -> Delegation {
        let levels = self
            .levels
            .windows(2)
            .map(|w| DelegationLevel { pubkey: w[1].pubkey, sig: w[0].sig })
            .collect();
        Delegation::new(self.proof_id, self.proof_master, levels)
    }
}
