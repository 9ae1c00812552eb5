// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Delegation chains from a proof's master key to an operating key.
//!
//! Level `i` carries `{pubkey_i, sig_{i-1}}`: the key it hands authority to
//! and the signature, made by the previous key, that authorized the move.
//! Each signature covers `hash(running_id, pubkey_i)`, where the running id
//! starts at the ProofId.

pub mod builder;

pub use builder::DelegationBuilder;

use crate::codec::{ensure_consumed, read_array, read_bytes_with_size, read_compact_size, write_bytes_with_size, write_compact_size};
use crate::config::MAX_DELEGATION_LEVELS;
use crate::crypto::key::SIGNATURE_SIZE;
use crate::crypto::{HashWriter, PubKey, SchnorrSig};
use crate::error::{KernelError, Result};
use crate::proof::Proof;
use crate::types::{DelegationId, ProofId};
use crate::validation::ValidationState;
use std::io::Cursor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DelegationResult {
    #[default]
    None,
    IncorrectProof,
    InvalidSignature,
    TooManyLevels,
}

pub type DelegationState = ValidationState<DelegationResult>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelegationLevel {
    pub pubkey: PubKey,
    pub sig: SchnorrSig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delegation {
    proof_id: ProofId,
    proof_master: PubKey,
    dgid: DelegationId,
    levels: Vec<DelegationLevel>,
}

/// One step of the id chain.
pub(crate) fn chain_hash(running: &DelegationId, next: &PubKey) -> DelegationId {
    let mut w = HashWriter::new();
    w.write(running.as_bytes()).write_bytes_with_size(next.as_bytes());
    DelegationId(w.finalize())
}

fn fold_id(proof_id: &ProofId, levels: &[DelegationLevel]) -> DelegationId {
    levels
        .iter()
        .fold(DelegationId(proof_id.0), |dgid, level| chain_hash(&dgid, &level.pubkey))
}

impl Delegation {
    pub(crate) fn new(proof_id: ProofId, proof_master: PubKey, levels: Vec<DelegationLevel>) -> Self {
        let dgid = fold_id(&proof_id, &levels);
        Self { proof_id, proof_master, dgid, levels }
    }

    pub fn id(&self) -> &DelegationId {
        &self.dgid
    }

    pub fn proof_id(&self) -> &ProofId {
        &self.proof_id
    }

    pub fn proof_master(&self) -> &PubKey {
        &self.proof_master
    }

    pub fn levels(&self) -> &[DelegationLevel] {
        &self.levels
    }

    /// Key holding authority at the end of the chain.
    pub fn delegated_pubkey(&self) -> &PubKey {
        self.levels.last().map_or(&self.proof_master, |l| &l.pubkey)
    }

    /// Walks the chain from the master key. On success `auth` receives the
    /// final level's key.
    pub fn verify(&self, state: &mut DelegationState, auth: &mut PubKey) -> bool {
        if self.levels.len() > MAX_DELEGATION_LEVELS {
            return state.invalid(
                DelegationResult::TooManyLevels,
                "too-many-levels",
                format!("{} > {}", self.levels.len(), MAX_DELEGATION_LEVELS),
            );
        }

        let mut dgid = DelegationId(self.proof_id.0);
        let mut pubkey = self.proof_master;
        for (i, level) in self.levels.iter().enumerate() {
            let next = chain_hash(&dgid, &level.pubkey);
            if !pubkey.verify(&next.0, &level.sig) {
                return state.invalid(
                    DelegationResult::InvalidSignature,
                    "invalid-signature",
                    format!("level {}", i),
                );
            }
            dgid = next;
            pubkey = level.pubkey;
        }

        if dgid != self.dgid {
            return state.invalid(DelegationResult::InvalidSignature, "invalid-delegation-id", dgid.to_string());
        }

        *auth = pubkey;
        true
    }

    /// As [`Delegation::verify`], also requiring the delegation to start from `proof`.
    pub fn verify_for_proof(&self, proof: &Proof, state: &mut DelegationState, auth: &mut PubKey) -> bool {
        if self.proof_id != *proof.id() || self.proof_master != *proof.master() {
            return state.invalid(DelegationResult::IncorrectProof, "wrong-proof", proof.id().to_string());
        }
        self.verify(state, auth)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.proof_id.as_bytes());
        write_bytes_with_size(&mut buf, self.proof_master.as_bytes());
        write_compact_size(&mut buf, self.levels.len() as u64);
        for level in &self.levels {
            write_bytes_with_size(&mut buf, level.pubkey.as_bytes());
            buf.extend_from_slice(&level.sig.0);
        }
        buf
    }

    /// Decodes and recomputes the delegation id from the levels.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let proof_id = ProofId::from_array(read_array::<32>(&mut cursor)?);
        let proof_master = PubKey::from_slice(&read_bytes_with_size(&mut cursor)?)?;
        let count = read_compact_size(&mut cursor)?;
        if count > MAX_DELEGATION_LEVELS as u64 {
            return Err(KernelError::TooManyLevels(count));
        }
        let mut levels = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let pubkey = PubKey::from_slice(&read_bytes_with_size(&mut cursor)?)?;
            let sig = SchnorrSig(read_array::<SIGNATURE_SIZE>(&mut cursor)?);
            levels.push(DelegationLevel { pubkey, sig });
        }
        ensure_consumed(&cursor)?;
        Ok(Self::new(proof_id, proof_master, levels))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        Self::decode(&hex::decode(s)?)
    }
}
