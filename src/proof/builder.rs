// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Two-phase proof construction: id first, then signatures over it.

use super::stake::{SignedStake, Stake, StakeCommitment};
use super::{compute_limited_proof_id, compute_proof_id, Proof, ProofFormat, ProofRef};
use crate::config::{MAX_PROOF_STAKES, MAX_STAKE_HEIGHT};
use crate::crypto::{PrivKey, SchnorrSig};
use crate::types::{Amount, OutPoint, ProofId, Script, StakeId};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct ProofBuilder {
    sequence: u64,
    expiration_time: i64,
    master: PrivKey,
    payout_script: Script,
    format: ProofFormat,
    /// Ordered by stake id, which fixes the stake order in the proof.
    stakes: BTreeMap<StakeId, (Stake, PrivKey)>,
}

impl ProofBuilder {
    pub fn new(sequence: u64, expiration_time: i64, master: &PrivKey, payout_script: Script) -> Self {
        Self::with_format(sequence, expiration_time, master.clone(), payout_script, ProofFormat::Standard)
    }

    pub fn legacy(sequence: u64, expiration_time: i64, master: &PrivKey) -> Self {
        Self::with_format(sequence, expiration_time, master.clone(), Script::default(), ProofFormat::Legacy)
    }

    pub fn with_format(
        sequence: u64,
        expiration_time: i64,
        master: PrivKey,
        payout_script: Script,
        format: ProofFormat,
    ) -> Self {
        Self {
            sequence,
            expiration_time,
            master,
            payout_script,
            format,
            stakes: BTreeMap::new(),
        }
    }

    /// Adds a stake signed by `key`. Returns false, leaving the builder
    /// untouched, if the same outpoint and owner is already present, the
    /// stake limit is reached or `height` does not fit the encoded field.
    pub fn add_utxo(&mut self, utxo: OutPoint, amount: Amount, height: u32, is_coinbase: bool, key: PrivKey) -> bool {
        if self.stakes.len() >= MAX_PROOF_STAKES || height > MAX_STAKE_HEIGHT {
            return false;
        }
        let stake = Stake::new(utxo, amount, height, is_coinbase, key.pub_key());
        let id = stake.id();
        if self.stakes.contains_key(&id) {
            return false;
        }
        self.stakes.insert(id, (stake, key));
        true
    }

    pub fn stake_count(&self) -> usize {
        self.stakes.len()
    }

    /// Id the built proof will carry.
    pub fn proof_id(&self) -> ProofId {
        let stakes: Vec<Stake> = self.stakes.values().map(|(s, _)| *s).collect();
        let limited = compute_limited_proof_id(
            self.sequence,
            self.expiration_time,
            &self.payout_script,
            &stakes,
            self.format,
        );
        compute_proof_id(&limited, &self.master.pub_key())
    }

    pub fn build(self) -> ProofRef {
        let commitment = StakeCommitment::new(&self.proof_id());
        let signed: Vec<SignedStake> = self
            .stakes
            .into_values()
            .map(|(stake, key)| SignedStake::sign(stake, &key, &commitment))
            .collect();
        let proof = Proof::from_parts(
            self.sequence,
            self.expiration_time,
            self.master.pub_key(),
            self.payout_script,
            signed,
            self.format,
            SchnorrSig::ZERO,
        );
        Arc::new(proof.signed_by(&self.master))
    }
}
