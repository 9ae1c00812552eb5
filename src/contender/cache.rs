// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Per-block contender bookkeeping for staking reward votes.

use super::RewardRankedContender;
use crate::proof::ProofRef;
use crate::types::{BlockHash, ProofId, Script, StakeContenderId};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Status bits of a contender.
pub struct ContenderStatus;

impl ContenderStatus {
    pub const UNKNOWN: u8 = 0;
    pub const ACCEPTED: u8 = 1 << 0;
    pub const IN_WINNER_SET: u8 = 1 << 1;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContenderVote {
    Accept,
    Reject,
}

impl ContenderVote {
    /// Wire value of the vote: 0 accepts, 1 rejects.
    pub fn as_u32(&self) -> u32 {
        match self {
            ContenderVote::Accept => 0,
            ContenderVote::Reject => 1,
        }
    }
}

#[derive(Clone, Debug)]
struct ContenderEntry {
    prev_block: BlockHash,
    prev_height: u32,
    proof: ProofRef,
    status: u8,
}

#[derive(Clone, Debug)]
struct ManualWinners {
    prev_height: u32,
    payout_scripts: Vec<Script>,
}

#[derive(Debug, Default)]
pub struct StakeContenderCache {
    contenders: BTreeMap<StakeContenderId, ContenderEntry>,
    manual_winners: FxHashMap<BlockHash, ManualWinners>,
    last_promoted_height: Option<u32>,
}

impl StakeContenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `proof` as a contender for the block after `prev_block`.
    /// Returns false if it is already there.
    pub fn add(&mut self, prev_height: u32, prev_block: BlockHash, proof: &ProofRef, status: u8) -> bool {
        let id = StakeContenderId::new(&prev_block, proof.id());
        if self.contenders.contains_key(&id) {
            return false;
        }
        self.contenders.insert(
            id,
            ContenderEntry { prev_block, prev_height, proof: Arc::clone(proof), status },
        );
        true
    }

    fn modify(&mut self, id: &StakeContenderId, f: impl FnOnce(&mut u8)) -> bool {
        match self.contenders.get_mut(id) {
            Some(entry) => {
                f(&mut entry.status);
                true
            }
            None => false,
        }
    }

    pub fn accept(&mut self, id: &StakeContenderId) -> bool {
        self.modify(id, |s| *s |= ContenderStatus::ACCEPTED)
    }

    pub fn reject(&mut self, id: &StakeContenderId) -> bool {
        self.modify(id, |s| *s &= !ContenderStatus::ACCEPTED)
    }

    /// Accepted and in the winner set.
    pub fn finalize(&mut self, id: &StakeContenderId) -> bool {
        self.modify(id, |s| *s |= ContenderStatus::ACCEPTED | ContenderStatus::IN_WINNER_SET)
    }

    /// Rejected and out of the winner set.
    pub fn invalidate(&mut self, id: &StakeContenderId) -> bool {
        self.modify(id, |s| *s &= !(ContenderStatus::ACCEPTED | ContenderStatus::IN_WINNER_SET))
    }

    /// Replaces the manually chosen winners for the block after `prev_block`.
    pub fn set_winners(&mut self, prev_height: u32, prev_block: BlockHash, payout_scripts: Vec<Script>) {
        self.manual_winners.insert(prev_block, ManualWinners { prev_height, payout_scripts });
    }

    /// `None` for an unknown contender. Otherwise the vote and the block it
    /// is scoped to. A contender whose payout script is a manual winner is
    /// accepted whatever its own status.
    pub fn get_vote_status(&self, id: &StakeContenderId) -> Option<(ContenderVote, BlockHash)> {
        let entry = self.contenders.get(id)?;
        if entry.status & ContenderStatus::ACCEPTED != 0 {
            return Some((ContenderVote::Accept, entry.prev_block));
        }
        let manual = self
            .manual_winners
            .get(&entry.prev_block)
            .is_some_and(|w| w.payout_scripts.contains(entry.proof.payout_script()));
        let vote = if manual { ContenderVote::Accept } else { ContenderVote::Reject };
        Some((vote, entry.prev_block))
    }

    /// Manual winners first, then contenders in the winner set by reward
    /// rank. `None` when there are none.
    pub fn get_winners(&self, prev_block: &BlockHash) -> Option<Vec<Script>> {
        let mut winners: Vec<Script> = self
            .manual_winners
            .get(prev_block)
            .map(|w| w.payout_scripts.clone())
            .unwrap_or_default();

        let mut ranked: Vec<(RewardRankedContender, &ProofRef)> = self
            .contenders
            .values()
            .filter(|e| e.prev_block == *prev_block && e.status & ContenderStatus::IN_WINNER_SET != 0)
            .map(|e| (RewardRankedContender::new(prev_block, e.proof.id(), e.proof.score()), &e.proof))
            .collect();
        ranked.sort_by(|a, b| a.0.cmp(&b.0));
        winners.extend(ranked.into_iter().map(|(_, p)| p.payout_script().clone()));

        if winners.is_empty() {
            None
        } else {
            Some(winners)
        }
    }

    /// Re-adds every cached proof that `keep` accepts as a fresh contender
    /// for the block after `block`, and records `height` as promoted.
    pub fn promote_to_block(&mut self, height: u32, block: BlockHash, keep: impl Fn(&ProofId) -> bool) {
        let mut proofs: BTreeMap<ProofId, ProofRef> = BTreeMap::new();
        for entry in self.contenders.values() {
            proofs.entry(*entry.proof.id()).or_insert_with(|| Arc::clone(&entry.proof));
        }
        for (id, proof) in proofs {
            if keep(&id) {
                self.add(height, block, &proof, ContenderStatus::UNKNOWN);
            }
        }
        self.last_promoted_height = Some(height);
    }

    /// Drops contenders and manual winners below `min_height`, never past
    /// the last promoted height. A no-op before the first promotion.
    pub fn cleanup(&mut self, min_height: u32) {
        let Some(promoted) = self.last_promoted_height else {
            return;
        };
        let threshold = min_height.min(promoted);
        self.contenders.retain(|_, e| e.prev_height >= threshold);
        self.manual_winners.retain(|_, w| w.prev_height >= threshold);
    }

    pub fn is_empty(&self) -> bool {
        self.contenders.is_empty() && self.manual_winners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contenders.len()
    }
}
