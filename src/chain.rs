// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Read-only view of chain state consumed during proof verification.

use crate::crypto::PubKey;
use crate::types::{Amount, BlockHash, OutPoint};
use std::collections::BTreeMap;

/// An unspent output as the chain reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coin {
    pub amount: Amount,
    pub height: u32,
    pub is_coinbase: bool,
    /// Key the output pays to.
    pub pubkey: PubKey,
}

pub trait UtxoView {
    /// Unspent output at `outpoint`, if any.
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin>;
    fn tip_height(&self) -> u32;
    fn tip_hash(&self) -> BlockHash;
    /// Median time of the tip, in seconds.
    fn tip_time(&self) -> i64;
}

/// In-memory chain view for hosts without a full chainstate.
#[derive(Clone, Debug, Default)]
pub struct MemoryUtxoView {
    coins: BTreeMap<OutPoint, Coin>,
    height: u32,
    hash: BlockHash,
    time: i64,
}

impl MemoryUtxoView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coin(&mut self, outpoint: OutPoint, coin: Coin) {
        self.coins.insert(outpoint, coin);
    }

    pub fn spend_coin(&mut self, outpoint: &OutPoint) -> Option<Coin> {
        self.coins.remove(outpoint)
    }

    pub fn set_tip(&mut self, height: u32, hash: BlockHash, time: i64) {
        self.height = height;
        self.hash = hash;
        self.time = time;
    }
}

impl UtxoView for MemoryUtxoView {
    fn coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        self.coins.get(outpoint).copied()
    }

    fn tip_height(&self) -> u32 {
        self.height
    }

    fn tip_hash(&self) -> BlockHash {
        self.hash
    }

    fn tip_time(&self) -> i64 {
        self.time
    }
}
