// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Stake contenders: a proof's candidacy for one block's staking reward.

pub mod cache;

pub use cache::{ContenderStatus, ContenderVote, StakeContenderCache};

use crate::crypto::HashWriter;
use crate::types::{BlockHash, ProofId, StakeContenderId};
use core::cmp::Ordering;

impl StakeContenderId {
    /// Scoped to the block after `prev_block`: the same proof gets a fresh
    /// id at every height.
    pub fn new(prev_block: &BlockHash, proof_id: &ProofId) -> Self {
        let mut w = HashWriter::new();
        w.write(prev_block.as_bytes()).write(proof_id.as_bytes());
        StakeContenderId(w.finalize())
    }

    /// `(256 - log2(id)) / score`. Lower wins. A zero score never wins.
    pub fn compute_proof_reward_rank(&self, score: u32) -> f64 {
        if score == 0 {
            return f64::INFINITY;
        }
        (256.0 - self.0.to_f64().log2()) / score as f64
    }
}

/// Lower rank first, then lower contender id, then lower proof id.
#[derive(Clone, Copy, Debug)]
pub struct RewardRankedContender {
    pub rank: f64,
    pub contender_id: StakeContenderId,
    pub proof_id: ProofId,
}

impl RewardRankedContender {
    pub fn new(prev_block: &BlockHash, proof_id: &ProofId, score: u32) -> Self {
        let contender_id = StakeContenderId::new(prev_block, proof_id);
        Self {
            rank: contender_id.compute_proof_reward_rank(score),
            contender_id,
            proof_id: *proof_id,
        }
    }
}

impl PartialEq for RewardRankedContender {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RewardRankedContender {}

impl PartialOrd for RewardRankedContender {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RewardRankedContender {
    fn cmp(&self, other: &Self) -> Ordering {
        // total_cmp keeps NaN and infinities inside a total order.
        self.rank
            .total_cmp(&other.rank)
            .then_with(|| self.contender_id.cmp(&other.contender_id))
            .then_with(|| self.proof_id.cmp(&other.proof_id))
    }
}
