// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Peers (proof-backed identities) and the nodes (connections) bound to them.

pub mod manager;
pub mod node;

pub use manager::PeerManager;
pub use node::Node;

use crate::proof::ProofRef;
use crate::types::{PeerId, ProofId};
use crate::validation::ValidationState;
use core::time::Duration;

#[derive(Clone, Debug)]
pub struct Peer {
    pub peerid: PeerId,
    pub proof: ProofRef,
    pub node_count: u32,
    /// Position in the selection slots while `node_count > 0`.
    pub index: u32,
    pub registration_time: Duration,
    pub next_possible_conflict_time: Duration,
    pub has_finalized: bool,
}

impl Peer {
    pub fn proof_id(&self) -> &ProofId {
        self.proof.id()
    }

    pub fn score(&self) -> u32 {
        self.proof.score()
    }
}

/// A peer's share `[start, start + score)` of the selection range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub start: u64,
    pub score: u32,
    pub peerid: PeerId,
}

impl Slot {
    pub fn stop(&self) -> u64 {
        self.start + self.score as u64
    }

    pub fn contains(&self, slot: u64) -> bool {
        self.start <= slot && slot < self.stop()
    }

    pub fn precedes(&self, slot: u64) -> bool {
        slot >= self.stop()
    }

    pub fn follows(&self, slot: u64) -> bool {
        self.start > slot
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProofRegistrationResult {
    #[default]
    None,
    AlreadyRegistered,
    /// Stakes not yet on chain or not yet mature. The caller may park it.
    Orphan,
    Invalid,
    /// Lost a UTXO conflict; kept aside in the conflicting pool.
    Conflicting,
    /// Lost a UTXO conflict and not kept.
    Rejected,
    CooldownNotElapsed,
}

pub type ProofRegistrationState = ValidationState<ProofRegistrationResult>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistrationMode {
    #[default]
    Default,
    /// Evict conflicting peers unconditionally.
    ForceAccept,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RejectionMode {
    /// Keep the proof aside as a conflicting candidate.
    #[default]
    Default,
    /// Forget the proof entirely.
    Invalidate,
}
