// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Core value types shared across the kernel.

pub mod id;
pub mod scalar;

pub use id::{
    BlockHash, DelegationId, Hash256, LimitedProofId, NodeId, PeerId, ProofId, StakeContenderId,
    StakeId, TxId, NO_PEER,
};

use core::fmt;
use serde::{Deserialize, Serialize};

/// Amount of coins, in base units.
pub type Amount = u64;

/// Reference to one transaction output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Opaque output script. The kernel never interprets it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Script(pub Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }
}
