// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Salted short ids summarizing a proof set.
//!
//! Two peers holding the same proofs and salts produce the same short ids
//! and can diff sets in 6-byte units. 48-bit collisions are tolerated as
//! reconciliation false positives.

use super::radix::RadixTree;
use crate::codec::{ensure_consumed, read_compact_size, write_compact_size};
use crate::config::{SHORT_ID_BYTES, SHORT_ID_MASK};
use crate::error::{KernelError, Result};
use crate::proof::{Proof, ProofFormat, ProofRef};
use crate::types::ProofId;
use byteorder::{LittleEndian, ReadBytesExt};
use rustc_hash::FxHashSet;
use siphasher::sip::SipHasher24;
use std::hash::Hasher;
use std::io::Cursor;
use std::sync::Arc;

/// A full proof sent along with the short ids, at `index` in the combined list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefilledProof {
    pub index: u32,
    pub proof: ProofRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactProofs {
    k0: u64,
    k1: u64,
    short_ids: Vec<u64>,
    prefilled: Vec<PrefilledProof>,
}

pub fn short_id(k0: u64, k1: u64, proof_id: &ProofId) -> u64 {
    let mut hasher = SipHasher24::new_with_keys(k0, k1);
    hasher.write(proof_id.as_bytes());
    hasher.finish() & SHORT_ID_MASK
}

impl CompactProofs {
    /// One short id per indexed proof, in index order.
    pub fn new(proofs: &RadixTree<Proof>, k0: u64, k1: u64) -> Self {
        let short_ids = proofs.iter().map(|p| short_id(k0, k1, p.id())).collect();
        Self { k0, k1, short_ids, prefilled: Vec::new() }
    }

    /// Moves the proofs at the given positions of the combined list out of
    /// the short id list and sends them in full. Positions must be ascending.
    pub fn with_prefilled(proofs: &RadixTree<Proof>, k0: u64, k1: u64, positions: &[u32]) -> Self {
        let mut short_ids = Vec::new();
        let mut prefilled = Vec::new();
        let mut wanted = positions.iter().peekable();
        for (i, proof) in proofs.iter().enumerate() {
            if wanted.peek().is_some_and(|p| **p as usize == i) {
                wanted.next();
                prefilled.push(PrefilledProof { index: i as u32, proof: Arc::clone(proof) });
            } else {
                short_ids.push(short_id(k0, k1, proof.id()));
            }
        }
        Self { k0, k1, short_ids, prefilled }
    }

    pub fn keys(&self) -> (u64, u64) {
        (self.k0, self.k1)
    }

    pub fn short_ids(&self) -> &[u64] {
        &self.short_ids
    }

    pub fn prefilled(&self) -> &[PrefilledProof] {
        &self.prefilled
    }

    pub fn get_short_id(&self, proof_id: &ProofId) -> u64 {
        short_id(self.k0, self.k1, proof_id)
    }

    pub fn len(&self) -> usize {
        self.short_ids.len() + self.prefilled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positions in the combined list whose short id matches no proof in `known`.
    pub fn missing_indices(&self, known: &RadixTree<Proof>) -> Vec<u32> {
        let have: FxHashSet<u64> = known.iter().map(|p| self.get_short_id(p.id())).collect();
        let mut missing = Vec::new();
        let mut short_ids = self.short_ids.iter();
        let mut prefilled = self.prefilled.iter().peekable();
        for i in 0..self.len() as u32 {
            if prefilled.peek().is_some_and(|p| p.index == i) {
                prefilled.next();
                continue;
            }
            if let Some(sid) = short_ids.next() {
                if !have.contains(sid) {
                    missing.push(i);
                }
            }
        }
        missing
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.k0.to_le_bytes());
        buf.extend_from_slice(&self.k1.to_le_bytes());
        write_compact_size(&mut buf, self.short_ids.len() as u64);
        for sid in &self.short_ids {
            buf.extend_from_slice(&sid.to_le_bytes()[..SHORT_ID_BYTES]);
        }
        write_compact_size(&mut buf, self.prefilled.len() as u64);
        let mut last: Option<u32> = None;
        for p in &self.prefilled {
            // Indices are sent as gaps from the previous one.
            let delta = match last {
                None => p.index,
                Some(prev) => p.index - prev - 1,
            };
            write_compact_size(&mut buf, delta as u64);
            buf.extend_from_slice(&p.proof.encode());
            last = Some(p.index);
        }
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let k0 = cursor.read_u64::<LittleEndian>()?;
        let k1 = cursor.read_u64::<LittleEndian>()?;

        let count = read_compact_size(&mut cursor)?;
        let mut short_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let low = cursor.read_u32::<LittleEndian>()? as u64;
            let high = cursor.read_u16::<LittleEndian>()? as u64;
            short_ids.push(low | (high << 32));
        }

        let prefilled_count = read_compact_size(&mut cursor)?;
        let mut prefilled = Vec::with_capacity(prefilled_count as usize);
        let mut last: Option<u64> = None;
        for _ in 0..prefilled_count {
            let delta = read_compact_size(&mut cursor)?;
            let index = match last {
                None => delta,
                Some(prev) => prev + delta + 1,
            };
            if index > u32::MAX as u64 {
                return Err(KernelError::InvalidPrefilledIndex(index));
            }
            let proof = Proof::decode_from(&mut cursor, ProofFormat::Standard)?;
            prefilled.push(PrefilledProof { index: index as u32, proof: Arc::new(proof) });
            last = Some(index);
        }
        ensure_consumed(&cursor)?;

        let total = short_ids.len() as u64 + prefilled.len() as u64;
        if let Some(p) = prefilled.iter().find(|p| p.index as u64 >= total) {
            return Err(KernelError::InvalidPrefilledIndex(p.index as u64));
        }

        Ok(Self { k0, k1, short_ids, prefilled })
    }
}
