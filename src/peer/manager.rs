// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Peer manager: proof registration, UTXO conflicts, node binding and
//! score-weighted peer selection.
//!
//! Peers with at least one node own a slot `[start, start + score)` in a
//! contiguous range. Drawing a number in `[0, slot_count)` picks a peer with
//! probability proportional to its score. Freed slots in the middle are
//! tombstoned with `NO_PEER` until `compact` rebuilds the range.

use super::node::Node;
use super::{
    Peer, ProofRegistrationResult, ProofRegistrationState, RegistrationMode, RejectionMode, Slot,
};
use crate::chain::UtxoView;
use crate::config::{PeerManagerConfig, DANGLING_TIMEOUT, SELECT_NODE_MAX_RETRY, SELECT_PEER_MAX_RETRY};
use crate::contender::RewardRankedContender;
use crate::index::RadixTree;
use crate::pool::{AddProofStatus, ProofPool};
use crate::proof::{Proof, ProofRef, ProofValidationState};
use crate::stats::decay_factor;
use crate::types::scalar::FxpScalar;
use crate::types::{BlockHash, NodeId, PeerId, ProofId, Script, NO_PEER};
use core::time::Duration;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Key of the per-peer node schedule.
type ScheduleKey = (PeerId, Duration, NodeId);

fn schedule_range(peerid: PeerId) -> (ScheduleKey, ScheduleKey) {
    (
        (peerid, Duration::ZERO, NodeId(0)),
        (peerid, Duration::MAX, NodeId(u64::MAX)),
    )
}

/// Binary-interpolation search for the slot containing `slot`.
pub fn select_peer_impl(slots: &[Slot], slot: u64, max: u64) -> PeerId {
    let (mut begin, mut end) = (0usize, slots.len());
    let (mut bottom, mut top) = (0u64, max);

    while end - begin > 8 {
        if slot < bottom || slot >= top {
            return NO_PEER;
        }

        let i = begin + ((slot - bottom) as u128 * (end - begin) as u128 / (top - bottom) as u128) as usize;
        if slots[i].contains(slot) {
            return slots[i].peerid;
        }

        if slots[i].precedes(slot) {
            begin = i + 1;
            if begin >= end {
                return NO_PEER;
            }
            bottom = slots[begin].start;
            continue;
        }

        if slots[i].follows(slot) {
            end = i;
            top = slots[end].start;
            continue;
        }

        return NO_PEER;
    }

    slots[begin..end]
        .iter()
        .find(|s| s.contains(slot))
        .map_or(NO_PEER, |s| s.peerid)
}

#[derive(Debug)]
pub struct PeerManager {
    config: PeerManagerConfig,
    decay: FxpScalar,

    valid_proofs: ProofPool,
    conflicting_proofs: ProofPool,

    peers: BTreeMap<PeerId, Peer>,
    peer_by_proof: FxHashMap<ProofId, PeerId>,
    next_peer_id: PeerId,

    nodes: FxHashMap<NodeId, Node>,
    schedule: BTreeSet<ScheduleKey>,
    pending_nodes: BTreeSet<(ProofId, NodeId)>,
    pending_by_node: FxHashMap<NodeId, ProofId>,

    slots: Vec<Slot>,
    slot_count: u64,
    fragmentation: u64,

    total_peers_score: u64,
    connected_peers_score: u64,

    /// Proofs of peers with at least one node.
    shareable_proofs: RadixTree<Proof>,
}

impl PeerManager {
    pub fn new(config: PeerManagerConfig) -> Self {
        let decay = decay_factor(config.stats_refresh_period, config.stats_time_constant);
        Self {
            config,
            decay,
            valid_proofs: ProofPool::new(),
            conflicting_proofs: ProofPool::new(),
            peers: BTreeMap::new(),
            peer_by_proof: FxHashMap::default(),
            next_peer_id: PeerId(0),
            nodes: FxHashMap::default(),
            schedule: BTreeSet::new(),
            pending_nodes: BTreeSet::new(),
            pending_by_node: FxHashMap::default(),
            slots: Vec::new(),
            slot_count: 0,
            fragmentation: 0,
            total_peers_score: 0,
            connected_peers_score: 0,
            shareable_proofs: RadixTree::new(),
        }
    }

    pub fn config(&self) -> &PeerManagerConfig {
        &self.config
    }

    // ---------------------------------------------------------------
    // Proof registration
    // ---------------------------------------------------------------

    /// Verifies `proof` against `chain` and makes it a peer, resolving UTXO
    /// conflicts with existing peers. On failure `state` says why.
    pub fn register_proof(
        &mut self,
        proof: &ProofRef,
        mode: RegistrationMode,
        chain: &dyn UtxoView,
        now: Duration,
        state: &mut ProofRegistrationState,
    ) -> bool {
        let proofid = *proof.id();
        let debug = format!("proofid: {}", proofid);

        if (mode != RegistrationMode::ForceAccept || !self.is_in_conflicting_pool(&proofid)) && self.exists(&proofid) {
            return state.invalid(ProofRegistrationResult::AlreadyRegistered, "proof-already-registered", debug);
        }

        let mut validation = ProofValidationState::default();
        if !proof.verify_with_utxos(
            self.config.dust_threshold,
            chain,
            self.config.stake_utxo_confirmations,
            &mut validation,
        ) {
            if validation.result().is_orphan() {
                return state.invalid(ProofRegistrationResult::Orphan, "orphan-proof", format!("{debug}, {validation}"));
            }
            return state.invalid(ProofRegistrationResult::Invalid, "invalid-proof", format!("{debug}, {validation}"));
        }

        let next_cooldown = now + self.config.conflicting_proof_cooldown;

        let (status, conflicts) = self.valid_proofs.add_proof_if_no_conflict(proof);
        match status {
            AddProofStatus::Succeed => {}
            AddProofStatus::Duplicated => {
                return state.invalid(ProofRegistrationResult::AlreadyRegistered, "proof-already-registered", debug);
            }
            AddProofStatus::Rejected if mode == RegistrationMode::ForceAccept => {
                self.conflicting_proofs.remove_proof(&proofid);
                self.move_to_conflicting_pool(&conflicts);
                self.valid_proofs.add_proof_if_no_conflict(proof);
            }
            AddProofStatus::Rejected => {
                let mut best_conflict_time = Duration::ZERO;
                let mut replaceable = true;
                for conflicting in &conflicts {
                    let Some(peer) = self
                        .peer_by_proof
                        .get(conflicting.id())
                        .and_then(|pid| self.peers.get_mut(pid))
                    else {
                        continue;
                    };
                    best_conflict_time = best_conflict_time.max(peer.next_possible_conflict_time);
                    if now < peer.registration_time + self.config.peer_replacement_cooldown {
                        replaceable = false;
                    }
                    peer.next_possible_conflict_time = peer.next_possible_conflict_time.max(next_cooldown);
                }

                if best_conflict_time > now {
                    return state.invalid(ProofRegistrationResult::CooldownNotElapsed, "cooldown-not-elapsed", debug);
                }

                let replaced = self.config.proof_replacement_enabled && replaceable && {
                    let (status, evicted) = self.valid_proofs.add_proof_if_preferred(proof);
                    if status == AddProofStatus::Succeed {
                        self.move_to_conflicting_pool(&evicted);
                    }
                    status == AddProofStatus::Succeed
                };

                if !replaced {
                    let (status, _) = self.conflicting_proofs.add_proof_if_preferred(proof);
                    return if status == AddProofStatus::Rejected {
                        state.invalid(ProofRegistrationResult::Rejected, "rejected-proof", debug)
                    } else {
                        state.invalid(ProofRegistrationResult::Conflicting, "conflicting-utxos", debug)
                    };
                }
            }
        }

        self.conflicting_proofs.remove_proof(&proofid);

        let peerid = self.next_peer_id;
        self.next_peer_id = peerid.next();
        self.peers.insert(
            peerid,
            Peer {
                peerid,
                proof: Arc::clone(proof),
                node_count: 0,
                index: 0,
                registration_time: now,
                next_possible_conflict_time: next_cooldown,
                has_finalized: false,
            },
        );
        self.peer_by_proof.insert(proofid, peerid);
        self.total_peers_score += proof.score() as u64;

        let waiting: Vec<NodeId> = self
            .pending_nodes
            .range((proofid, NodeId(0))..=(proofid, NodeId(u64::MAX)))
            .map(|(_, nodeid)| *nodeid)
            .collect();
        for nodeid in waiting {
            self.add_or_update_node(peerid, nodeid);
        }

        true
    }

    fn move_to_conflicting_pool(&mut self, proofs: &[ProofRef]) {
        for proof in proofs {
            if let Some(peerid) = self.peer_by_proof.get(proof.id()).copied() {
                self.remove_peer(peerid);
            }
            self.conflicting_proofs.add_proof_if_preferred(proof);
        }
    }

    /// Removes a proof. A bound proof's conflicting candidates get a chance
    /// to register in its place.
    pub fn reject_proof(&mut self, proofid: &ProofId, mode: RejectionMode, chain: &dyn UtxoView, now: Duration) -> bool {
        if !self.exists(proofid) {
            return false;
        }

        if self.conflicting_proofs.get_proof(proofid).is_some() {
            return match mode {
                RejectionMode::Default => true,
                RejectionMode::Invalidate => self.conflicting_proofs.remove_proof(proofid),
            };
        }

        let Some(peerid) = self.peer_by_proof.get(proofid).copied() else {
            return false;
        };
        let Some(proof) = self.peers.get(&peerid).map(|p| Arc::clone(&p.proof)) else {
            return false;
        };
        if !self.remove_peer(peerid) {
            return false;
        }

        for ss in proof.stakes() {
            let Some(conflicting) = self.conflicting_proofs.get_proof_by_utxo(ss.stake().utxo()) else {
                continue;
            };
            self.conflicting_proofs.remove_proof(conflicting.id());
            let mut state = ProofRegistrationState::default();
            self.register_proof(&conflicting, RegistrationMode::Default, chain, now, &mut state);
        }

        if mode == RejectionMode::Default {
            self.conflicting_proofs.add_proof_if_preferred(&proof);
        }

        true
    }

    /// Re-verifies every peer after a tip change. Failing peers are
    /// invalidated. Those failing only for missing or immature stakes are
    /// returned so the caller can park them as orphans.
    pub fn updated_block_tip(&mut self, chain: &dyn UtxoView, now: Duration) -> Vec<ProofRef> {
        let mut invalid = Vec::new();
        let mut orphaned = Vec::new();
        for peer in self.peers.values() {
            let mut state = ProofValidationState::default();
            if !peer.proof.verify_with_utxos(
                self.config.dust_threshold,
                chain,
                self.config.stake_utxo_confirmations,
                &mut state,
            ) {
                if state.result().is_orphan() {
                    orphaned.push(Arc::clone(&peer.proof));
                }
                invalid.push(*peer.proof_id());
            }
        }

        for proofid in &invalid {
            self.reject_proof(proofid, RejectionMode::Invalidate, chain, now);
        }

        orphaned
    }

    pub fn remove_peer(&mut self, peerid: PeerId) -> bool {
        let Some((proofid, node_count, score)) = self.peers.get(&peerid).map(|p| (*p.proof_id(), p.node_count, p.score()))
        else {
            return false;
        };

        self.remove_node_from_peer(peerid, node_count);

        // Bound nodes wait for the proof to come back. They keep their
        // record, request time included, so a rebind cannot overquery them.
        let (low, high) = schedule_range(peerid);
        let bound: Vec<ScheduleKey> = self.schedule.range(low..=high).copied().collect();
        for key in bound {
            let nodeid = key.2;
            self.schedule.remove(&key);
            if let Some(node) = self.nodes.get_mut(&nodeid) {
                node.peerid = NO_PEER;
            }
            self.pending_nodes.insert((proofid, nodeid));
            self.pending_by_node.insert(nodeid, proofid);
        }

        self.valid_proofs.remove_proof(&proofid);
        self.shareable_proofs.remove(proofid.as_bytes());
        self.peer_by_proof.remove(&proofid);
        self.total_peers_score -= score as u64;
        self.peers.remove(&peerid);
        true
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    /// Binds `nodeid` to the peer of `proofid`. If the proof is unknown the
    /// node waits in the pending set and false is returned.
    pub fn add_node(&mut self, nodeid: NodeId, proofid: &ProofId) -> bool {
        let Some(peerid) = self.peer_by_proof.get(proofid).copied() else {
            // A node switching to an unknown proof must not stay active.
            self.remove_node(nodeid);
            self.pending_nodes.insert((*proofid, nodeid));
            self.pending_by_node.insert(nodeid, *proofid);
            return false;
        };
        self.add_or_update_node(peerid, nodeid)
    }

    fn add_or_update_node(&mut self, peerid: PeerId, nodeid: NodeId) -> bool {
        if !self.peers.contains_key(&peerid) {
            return false;
        }

        let old_peer = match self.nodes.get_mut(&nodeid) {
            Some(node) => {
                let old_peer = node.peerid;
                self.schedule.remove(&(old_peer, node.next_request_time, nodeid));
                node.peerid = peerid;
                self.schedule.insert((peerid, node.next_request_time, nodeid));
                Some(old_peer)
            }
            None => {
                self.nodes.insert(nodeid, Node::new(nodeid, peerid, self.decay));
                self.schedule.insert((peerid, Duration::ZERO, nodeid));
                None
            }
        };

        // Add before removing: rebinding to the same peer must keep its slot.
        self.add_node_to_peer(peerid);
        if let Some(old_peer) = old_peer {
            self.remove_node_from_peer(old_peer, 1);
        }

        if let Some(proofid) = self.pending_by_node.remove(&nodeid) {
            self.pending_nodes.remove(&(proofid, nodeid));
        }

        if let Some(peer) = self.peers.get(&peerid) {
            self.shareable_proofs.insert(Arc::clone(&peer.proof));
        }
        true
    }

    fn add_node_to_peer(&mut self, peerid: PeerId) {
        let Some(peer) = self.peers.get_mut(&peerid) else {
            return;
        };
        peer.node_count += 1;
        if peer.node_count > 1 {
            return;
        }

        let score = peer.score();
        peer.index = self.slots.len() as u32;
        self.slots.push(Slot { start: self.slot_count, score, peerid });
        self.slot_count += score as u64;
        self.connected_peers_score += score as u64;
    }

    fn remove_node_from_peer(&mut self, peerid: PeerId, count: u32) -> bool {
        let Some(peer) = self.peers.get_mut(&peerid) else {
            return true;
        };
        if count == 0 {
            return false;
        }

        peer.node_count = peer.node_count.saturating_sub(count);
        if peer.node_count > 0 {
            return true;
        }

        let proofid = *peer.proof_id();
        let i = peer.index as usize;
        self.shareable_proofs.remove(proofid.as_bytes());

        let Some(slot) = self.slots.get(i).copied() else {
            return true;
        };
        self.connected_peers_score -= slot.score as u64;
        if i + 1 == self.slots.len() {
            self.slots.pop();
            self.slot_count = self.slots.last().map_or(0, |s| s.stop());
        } else {
            self.fragmentation += slot.score as u64;
            self.slots[i].peerid = NO_PEER;
        }
        true
    }

    pub fn remove_node(&mut self, nodeid: NodeId) -> bool {
        let was_pending = match self.pending_by_node.remove(&nodeid) {
            Some(proofid) => self.pending_nodes.remove(&(proofid, nodeid)),
            None => false,
        };

        let Some(node) = self.nodes.remove(&nodeid) else {
            return was_pending;
        };
        self.schedule.remove(&(node.peerid, node.next_request_time, nodeid));
        self.remove_node_from_peer(node.peerid, 1);
        true
    }

    pub fn update_next_request_time(&mut self, nodeid: NodeId, time: Duration) -> bool {
        let Some(node) = self.nodes.get_mut(&nodeid) else {
            return false;
        };
        self.schedule.remove(&(node.peerid, node.next_request_time, nodeid));
        node.next_request_time = time;
        // Unbound nodes are not scheduled.
        if node.peerid != NO_PEER {
            self.schedule.insert((node.peerid, time, nodeid));
        }
        true
    }

    /// True only the first time, so proofs are requested once per node.
    pub fn latch_avaproofs_sent(&mut self, nodeid: NodeId) -> bool {
        match self.nodes.get_mut(&nodeid) {
            Some(node) if !node.avaproofs_sent => {
                node.avaproofs_sent = true;
                true
            }
            _ => false,
        }
    }

    pub fn record_poll(&mut self, nodeid: NodeId) -> bool {
        self.nodes.get_mut(&nodeid).map(|n| n.record_poll()).is_some()
    }

    pub fn record_votes(&mut self, nodeid: NodeId, count: u32) -> bool {
        self.nodes.get_mut(&nodeid).map(|n| n.record_votes(count)).is_some()
    }

    /// Closes one statistics period for every node.
    pub fn refresh_statistics(&mut self) {
        for node in self.nodes.values_mut() {
            node.refresh_availability();
        }
    }

    // ---------------------------------------------------------------
    // Peer state
    // ---------------------------------------------------------------

    /// Moves the conflict cooldown forward, never back. True if it now equals `time`.
    pub fn update_next_possible_conflict_time(&mut self, peerid: PeerId, time: Duration) -> bool {
        let Some(peer) = self.peers.get_mut(&peerid) else {
            return false;
        };
        peer.next_possible_conflict_time = peer.next_possible_conflict_time.max(time);
        peer.next_possible_conflict_time == time
    }

    pub fn set_finalized(&mut self, peerid: PeerId) -> bool {
        match self.peers.get_mut(&peerid) {
            Some(peer) => {
                peer.has_finalized = true;
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------

    pub fn select_peer_at(&self, slot: u64) -> PeerId {
        if self.slots.is_empty() || self.slot_count == 0 || slot >= self.slot_count {
            return NO_PEER;
        }
        select_peer_impl(&self.slots, slot, self.slot_count)
    }

    /// Draws a peer weighted by score. `draw(n)` must return a value in `[0, n)`.
    pub fn select_peer(&self, draw: &mut impl FnMut(u64) -> u64) -> PeerId {
        if self.slots.is_empty() || self.slot_count == 0 {
            return NO_PEER;
        }
        for _ in 0..SELECT_PEER_MAX_RETRY {
            let peerid = self.select_peer_at(draw(self.slot_count));
            if peerid != NO_PEER {
                return peerid;
            }
        }
        NO_PEER
    }

    /// A node of a score-weighted peer that may be queried at `now`.
    pub fn select_node(&mut self, now: Duration, draw: &mut impl FnMut(u64) -> u64) -> Option<NodeId> {
        for _ in 0..SELECT_NODE_MAX_RETRY {
            let peerid = self.select_peer(draw);
            if peerid == NO_PEER {
                // Likely fragmentation.
                self.compact();
                continue;
            }

            let (low, _) = schedule_range(peerid);
            if let Some((p, next, nodeid)) = self.schedule.range(low..).next() {
                if *p == peerid && *next <= now {
                    return Some(*nodeid);
                }
            }
        }
        None
    }

    /// Rebuilds the slots without tombstones. Returns the range reclaimed.
    pub fn compact(&mut self) -> u64 {
        if self.fragmentation == 0 {
            return 0;
        }

        let mut slots = Vec::with_capacity(self.peers.len());
        let mut stop = 0u64;
        for peer in self.peers.values_mut().filter(|p| p.node_count > 0) {
            peer.index = slots.len() as u32;
            slots.push(Slot { start: stop, score: peer.score(), peerid: peer.peerid });
            stop += peer.score() as u64;
        }

        let saved = self.slot_count - stop;
        self.slots = slots;
        self.slot_count = stop;
        self.fragmentation = 0;
        saved
    }

    /// Staking reward winner for the block after `prev_block`: the best
    /// ranked finalized peer registered long enough before the block.
    pub fn select_staking_reward_winner(
        &self,
        prev_block: &BlockHash,
        prev_block_time: Duration,
        now: Duration,
    ) -> Option<Script> {
        let max_registration_time = prev_block_time.min(now).saturating_sub(2 * DANGLING_TIMEOUT);
        self.peers
            .values()
            .filter(|p| p.has_finalized && p.registration_time < max_registration_time)
            .map(|p| (RewardRankedContender::new(prev_block, p.proof_id(), p.score()), p))
            .filter(|(c, _)| !c.contender_id.0.is_zero())
            .min_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, p)| p.proof.payout_script().clone())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn exists(&self, proofid: &ProofId) -> bool {
        self.is_bound_to_peer(proofid) || self.is_in_conflicting_pool(proofid)
    }

    pub fn is_bound_to_peer(&self, proofid: &ProofId) -> bool {
        self.peer_by_proof.contains_key(proofid)
    }

    pub fn is_in_conflicting_pool(&self, proofid: &ProofId) -> bool {
        self.conflicting_proofs.get_proof(proofid).is_some()
    }

    pub fn get_proof(&self, proofid: &ProofId) -> Option<ProofRef> {
        self.peer_by_proof
            .get(proofid)
            .and_then(|pid| self.peers.get(pid))
            .map(|p| Arc::clone(&p.proof))
            .or_else(|| self.conflicting_proofs.get_proof(proofid))
    }

    pub fn get_peer(&self, peerid: PeerId) -> Option<&Peer> {
        self.peers.get(&peerid)
    }

    pub fn get_peer_id(&self, proofid: &ProofId) -> Option<PeerId> {
        self.peer_by_proof.get(proofid).copied()
    }

    pub fn get_node(&self, nodeid: NodeId) -> Option<&Node> {
        self.nodes.get(&nodeid)
    }

    pub fn is_pending(&self, nodeid: NodeId) -> bool {
        self.pending_by_node.contains_key(&nodeid)
    }

    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Nodes bound to a peer. Pending nodes are counted separately.
    pub fn node_count(&self) -> usize {
        self.nodes.values().filter(|n| n.peerid != NO_PEER).count()
    }

    pub fn pending_node_count(&self) -> usize {
        self.pending_by_node.len()
    }

    pub fn conflicting_proof_count(&self) -> usize {
        self.conflicting_proofs.count_proofs()
    }

    pub fn slot_count(&self) -> u64 {
        self.slot_count
    }

    pub fn fragmentation(&self) -> u64 {
        self.fragmentation
    }

    pub fn total_peers_score(&self) -> u64 {
        self.total_peers_score
    }

    pub fn connected_peers_score(&self) -> u64 {
        self.connected_peers_score
    }

    pub fn shareable_proofs(&self) -> &RadixTree<Proof> {
        &self.shareable_proofs
    }

    /// Internal consistency of slots, scores, nodes, UTXOs and the shareable index.
    pub fn verify(&self) -> bool {
        let mut prev_stop = 0u64;
        let mut score_from_slots = 0u64;
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.start < prev_stop {
                return false;
            }
            prev_stop = slot.stop();
            if slot.peerid == NO_PEER {
                continue;
            }
            match self.peers.get(&slot.peerid) {
                Some(peer) if peer.index as usize == i => {}
                _ => return false,
            }
            score_from_slots += slot.score as u64;
        }
        if score_from_slots != self.connected_peers_score {
            return false;
        }

        let mut score_from_all = 0u64;
        let mut score_with_nodes = 0u64;
        let mut utxos = FxHashSet::default();
        for peer in self.peers.values() {
            score_from_all += peer.score() as u64;

            if self.peer_by_proof.get(peer.proof_id()) != Some(&peer.peerid) {
                return false;
            }

            for ss in peer.proof.stakes() {
                let utxo = ss.stake().utxo();
                match self.valid_proofs.get_proof_by_utxo(utxo) {
                    Some(p) if Arc::ptr_eq(&p, &peer.proof) => {}
                    _ => return false,
                }
                if !utxos.insert(*utxo) {
                    return false;
                }
            }

            let (low, high) = schedule_range(peer.peerid);
            if self.schedule.range(low..=high).count() != peer.node_count as usize {
                return false;
            }

            let shared = self.shareable_proofs.contains(peer.proof_id().as_bytes());
            if peer.node_count == 0 {
                if shared {
                    return false;
                }
                continue;
            }
            if !shared {
                return false;
            }

            score_with_nodes += peer.score() as u64;
            match self.slots.get(peer.index as usize) {
                Some(slot) if slot.peerid == peer.peerid && slot.score == peer.score() => {}
                _ => return false,
            }
        }

        score_from_all == self.total_peers_score
            && score_with_nodes == self.connected_peers_score
            && self.valid_proofs.size() == utxos.len()
            && self.shareable_proofs.for_each_leaf(|p| self.is_bound_to_peer(p.id()))
    }
}
