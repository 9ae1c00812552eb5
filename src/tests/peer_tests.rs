// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::fixtures::*;
use crate::chain::MemoryUtxoView;
use crate::config::PeerManagerConfig;
use crate::contender::RewardRankedContender;
use crate::peer::manager::{select_peer_impl, PeerManager};
use crate::peer::{ProofRegistrationResult, ProofRegistrationState, RegistrationMode, RejectionMode, Slot};
use crate::proof::ProofRef;
use crate::types::{NodeId, PeerId, Script, NO_PEER};
use core::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

fn register_with(
    pm: &mut PeerManager,
    proof: &ProofRef,
    mode: RegistrationMode,
    chain: &MemoryUtxoView,
    now: Duration,
) -> ProofRegistrationResult {
    let mut state = ProofRegistrationState::default();
    let ok = pm.register_proof(proof, mode, chain, now, &mut state);
    assert_eq!(ok, state.is_valid());
    state.result()
}

fn register(pm: &mut PeerManager, proof: &ProofRef, chain: &MemoryUtxoView, now: Duration) -> ProofRegistrationResult {
    register_with(pm, proof, RegistrationMode::Default, chain, now)
}

fn scored(master: u8, score: u64) -> ProofRef {
    proof_with(master, 1, &[(outpoint(master, 0), score * COIN)])
}

#[test]
fn test_register_and_bind_nodes() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let chain = chain_for(&[&p1], MATURE_TIP);

    assert_eq!(register(&mut pm, &p1, &chain, Duration::ZERO), ProofRegistrationResult::None);
    assert!(pm.exists(p1.id()));
    assert!(pm.is_bound_to_peer(p1.id()));
    assert_eq!(pm.peer_count(), 1);
    assert_eq!(pm.total_peers_score(), 10);
    assert_eq!(pm.connected_peers_score(), 0);
    assert_eq!(pm.slot_count(), 0);
    assert!(pm.shareable_proofs().is_empty());
    assert!(pm.verify());

    let peerid = pm.get_peer_id(p1.id()).unwrap();
    assert!(pm.add_node(NodeId(1), p1.id()));
    assert!(pm.add_node(NodeId(2), p1.id()));
    assert_eq!(pm.get_node(NodeId(1)).map(|n| n.peerid), Some(peerid));
    assert_eq!(pm.get_peer(peerid).map(|p| p.node_count), Some(2));
    assert_eq!(pm.slot_count(), 10);
    assert_eq!(pm.connected_peers_score(), 10);
    assert!(pm.shareable_proofs().contains(p1.id().as_bytes()));
    assert!(pm.verify());

    assert!(pm.remove_node(NodeId(1)));
    assert_eq!(pm.slot_count(), 10);
    assert!(pm.remove_node(NodeId(2)));
    assert!(!pm.remove_node(NodeId(2)));
    assert_eq!(pm.slot_count(), 0);
    assert_eq!(pm.connected_peers_score(), 0);
    assert!(pm.shareable_proofs().is_empty());
    assert!(pm.verify());

    assert_eq!(register(&mut pm, &p1, &chain, Duration::ZERO), ProofRegistrationResult::AlreadyRegistered);
}

#[test]
fn test_registration_failures() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());

    let dust = proof_with(1, 1, &[(outpoint(1, 0), 0)]);
    let chain = chain_for(&[&dust], MATURE_TIP);
    assert_eq!(register(&mut pm, &dust, &chain, Duration::ZERO), ProofRegistrationResult::Invalid);

    let p = scored(2, 10);
    let empty = chain_for(&[], MATURE_TIP);
    assert_eq!(register(&mut pm, &p, &empty, Duration::ZERO), ProofRegistrationResult::Orphan);

    let immature = chain_for(&[&p], MATURE_TIP - 1);
    assert_eq!(register(&mut pm, &p, &immature, Duration::ZERO), ProofRegistrationResult::Orphan);

    assert!(!pm.exists(dust.id()));
    assert!(!pm.exists(p.id()));
    assert_eq!(pm.peer_count(), 0);
}

#[test]
fn test_pending_nodes() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let chain = chain_for(&[&p1], MATURE_TIP);

    assert!(!pm.add_node(NodeId(5), p1.id()));
    assert!(pm.is_pending(NodeId(5)));
    assert_eq!(pm.pending_node_count(), 1);
    assert_eq!(pm.node_count(), 0);

    register(&mut pm, &p1, &chain, Duration::ZERO);
    assert!(!pm.is_pending(NodeId(5)));
    assert_eq!(pm.node_count(), 1);
    assert_eq!(pm.slot_count(), 10);

    let unknown = scored(9, 1);
    assert!(!pm.add_node(NodeId(6), unknown.id()));
    assert!(pm.remove_node(NodeId(6)));
    assert!(!pm.is_pending(NodeId(6)));

    // Losing the peer sends its nodes back to pending.
    let peerid = pm.get_peer_id(p1.id()).unwrap();
    assert!(pm.remove_peer(peerid));
    assert!(!pm.remove_peer(peerid));
    assert!(pm.is_pending(NodeId(5)));
    assert_eq!(pm.node_count(), 0);
    assert_eq!(pm.peer_count(), 0);
    assert_eq!(pm.total_peers_score(), 0);
    assert!(pm.verify());
}

#[test]
fn test_weighted_selection_and_compaction() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let proofs = [scored(1, 10), scored(2, 20), scored(3, 5)];
    let chain = chain_for(&[&proofs[0], &proofs[1], &proofs[2]], MATURE_TIP);
    for (i, p) in proofs.iter().enumerate() {
        register(&mut pm, p, &chain, Duration::ZERO);
        assert!(pm.add_node(NodeId(i as u64 + 1), p.id()));
    }
    let pid: Vec<PeerId> = proofs.iter().map(|p| pm.get_peer_id(p.id()).unwrap()).collect();

    assert_eq!(pm.slot_count(), 35);
    assert_eq!(pm.select_peer_at(0), pid[0]);
    assert_eq!(pm.select_peer_at(9), pid[0]);
    assert_eq!(pm.select_peer_at(10), pid[1]);
    assert_eq!(pm.select_peer_at(29), pid[1]);
    assert_eq!(pm.select_peer_at(34), pid[2]);
    assert_eq!(pm.select_peer_at(35), NO_PEER);

    // A freed slot in the middle becomes a tombstone.
    assert!(pm.remove_node(NodeId(2)));
    assert_eq!(pm.fragmentation(), 20);
    assert_eq!(pm.slot_count(), 35);
    assert_eq!(pm.connected_peers_score(), 15);
    assert_eq!(pm.select_peer_at(15), NO_PEER);
    assert!(pm.verify());

    assert_eq!(pm.compact(), 20);
    assert_eq!(pm.compact(), 0);
    assert_eq!(pm.fragmentation(), 0);
    assert_eq!(pm.slot_count(), 15);
    assert_eq!(pm.select_peer_at(10), pid[2]);
    assert!(pm.verify());

    let picked = pm.select_peer(&mut |n| {
        assert_eq!(n, 15);
        12
    });
    assert_eq!(picked, pid[2]);
}

#[test]
fn test_select_peer_impl_interpolation() {
    let contiguous: Vec<Slot> = (0..20u32)
        .map(|i| Slot { start: i as u64 * 5, score: 5, peerid: PeerId(i) })
        .collect();
    assert_eq!(select_peer_impl(&contiguous, 57, 100), PeerId(11));
    assert_eq!(select_peer_impl(&contiguous, 0, 100), PeerId(0));
    assert_eq!(select_peer_impl(&contiguous, 99, 100), PeerId(19));
    assert_eq!(select_peer_impl(&contiguous, 100, 100), NO_PEER);

    let mut tombstoned = contiguous.clone();
    tombstoned[11].peerid = NO_PEER;
    assert_eq!(select_peer_impl(&tombstoned, 57, 100), NO_PEER);

    let gapped: Vec<Slot> = (0..20u32)
        .map(|i| Slot { start: i as u64 * 10, score: 5, peerid: PeerId(i) })
        .collect();
    assert_eq!(select_peer_impl(&gapped, 52, 200), PeerId(5));
    assert_eq!(select_peer_impl(&gapped, 57, 200), NO_PEER);
    assert_eq!(select_peer_impl(&gapped, 191, 200), PeerId(19));
}

#[test]
fn test_select_node_respects_request_time() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    assert_eq!(pm.select_node(Duration::ZERO, &mut |_| 0), None);

    let p1 = scored(1, 10);
    let chain = chain_for(&[&p1], MATURE_TIP);
    register(&mut pm, &p1, &chain, Duration::ZERO);
    pm.add_node(NodeId(1), p1.id());

    assert_eq!(pm.select_node(Duration::ZERO, &mut |_| 0), Some(NodeId(1)));
    assert!(pm.update_next_request_time(NodeId(1), Duration::from_secs(10)));
    assert_eq!(pm.select_node(Duration::from_secs(5), &mut |_| 0), None);
    assert_eq!(pm.select_node(Duration::from_secs(10), &mut |_| 0), Some(NodeId(1)));

    // The node with the earliest request time is picked.
    pm.add_node(NodeId(2), p1.id());
    assert_eq!(pm.select_node(Duration::from_secs(5), &mut |_| 0), Some(NodeId(2)));
    assert!(!pm.update_next_request_time(NodeId(9), Duration::ZERO));
    assert!(pm.verify());
}

#[test]
fn test_conflict_cooldown_and_rejection() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = proof_with(1, 1, &[(outpoint(1, 0), 10 * COIN)]);
    let p2 = proof_with(2, 1, &[(outpoint(1, 0), 10 * COIN), (outpoint(2, 0), 10 * COIN)]);
    let chain = chain_for(&[&p1, &p2], MATURE_TIP);

    assert_eq!(register(&mut pm, &p1, &chain, Duration::ZERO), ProofRegistrationResult::None);
    assert_eq!(register(&mut pm, &p2, &chain, Duration::ZERO), ProofRegistrationResult::CooldownNotElapsed);
    assert!(!pm.exists(p2.id()));

    assert_eq!(register(&mut pm, &p2, &chain, MINUTE), ProofRegistrationResult::Conflicting);
    assert!(pm.is_in_conflicting_pool(p2.id()));
    assert!(!pm.is_bound_to_peer(p2.id()));
    assert_eq!(pm.conflicting_proof_count(), 1);
    assert_eq!(register(&mut pm, &p2, &chain, MINUTE), ProofRegistrationResult::AlreadyRegistered);

    // Rejecting the peer lets the conflicting proof take over.
    assert!(pm.reject_proof(p1.id(), RejectionMode::Default, &chain, MINUTE));
    assert!(pm.is_bound_to_peer(p2.id()));
    assert!(!pm.is_bound_to_peer(p1.id()));
    assert!(pm.is_in_conflicting_pool(p1.id()));
    assert!(pm.verify());

    assert!(pm.reject_proof(p1.id(), RejectionMode::Invalidate, &chain, MINUTE));
    assert!(!pm.exists(p1.id()));
    assert!(!pm.reject_proof(p1.id(), RejectionMode::Invalidate, &chain, MINUTE));
}

#[test]
fn test_proof_replacement() {
    let config = PeerManagerConfig {
        proof_replacement_enabled: true,
        peer_replacement_cooldown: Duration::ZERO,
        conflicting_proof_cooldown: Duration::ZERO,
        ..PeerManagerConfig::default()
    };
    let mut pm = PeerManager::new(config);
    let p1 = proof_with(1, 1, &[(outpoint(1, 0), 10 * COIN)]);
    let p2 = proof_with(2, 1, &[(outpoint(1, 0), 10 * COIN), (outpoint(2, 0), 10 * COIN)]);
    let chain = chain_for(&[&p1, &p2], MATURE_TIP);

    register(&mut pm, &p1, &chain, Duration::ZERO);
    pm.add_node(NodeId(1), p1.id());

    assert_eq!(register(&mut pm, &p2, &chain, Duration::ZERO), ProofRegistrationResult::None);
    assert!(pm.is_bound_to_peer(p2.id()));
    assert!(pm.is_in_conflicting_pool(p1.id()));
    assert!(pm.is_pending(NodeId(1)));
    assert_eq!(pm.total_peers_score(), 20);
    assert!(pm.verify());

    // The losing proof cannot come back while the winner is preferred.
    assert_eq!(register(&mut pm, &p1, &chain, Duration::ZERO), ProofRegistrationResult::AlreadyRegistered);
}

#[test]
fn test_force_accept() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = proof_with(1, 1, &[(outpoint(1, 0), 10 * COIN)]);
    let p3 = proof_with(3, 1, &[(outpoint(1, 0), 10 * COIN)]);
    let chain = chain_for(&[&p1, &p3], MATURE_TIP);

    register(&mut pm, &p1, &chain, Duration::ZERO);
    let result = register_with(&mut pm, &p3, RegistrationMode::ForceAccept, &chain, Duration::ZERO);
    assert_eq!(result, ProofRegistrationResult::None);
    assert!(pm.is_bound_to_peer(p3.id()));
    assert!(!pm.is_bound_to_peer(p1.id()));
    assert!(pm.is_in_conflicting_pool(p1.id()));

    // A conflicting proof can be forced back in.
    let result = register_with(&mut pm, &p1, RegistrationMode::ForceAccept, &chain, Duration::ZERO);
    assert_eq!(result, ProofRegistrationResult::None);
    assert!(pm.is_bound_to_peer(p1.id()));
    assert!(pm.is_in_conflicting_pool(p3.id()));
    assert!(pm.verify());
}

#[test]
fn test_updated_block_tip_orphans_spent_proofs() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let p2 = scored(2, 10);
    let mut chain = chain_for(&[&p1, &p2], MATURE_TIP);
    register(&mut pm, &p1, &chain, Duration::ZERO);
    register(&mut pm, &p2, &chain, Duration::ZERO);

    assert!(pm.updated_block_tip(&chain, MINUTE).is_empty());

    chain.spend_coin(&outpoint(1, 0));
    let orphaned = pm.updated_block_tip(&chain, MINUTE);
    assert_eq!(orphaned.len(), 1);
    assert_eq!(orphaned[0].id(), p1.id());
    assert!(!pm.exists(p1.id()));
    assert!(pm.is_bound_to_peer(p2.id()));
    assert!(pm.verify());
}

#[test]
fn test_staking_reward_winner() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let p2 = scored(2, 30);
    let chain = chain_for(&[&p1, &p2], MATURE_TIP);
    register(&mut pm, &p1, &chain, Duration::ZERO);
    register(&mut pm, &p2, &chain, Duration::ZERO);
    let prev = block(7);
    let later = 31 * MINUTE;

    // Nobody finalized yet.
    assert_eq!(pm.select_staking_reward_winner(&prev, later, later), None);

    let pid1 = pm.get_peer_id(p1.id()).unwrap();
    assert!(pm.set_finalized(pid1));
    assert_eq!(pm.select_staking_reward_winner(&prev, later, later), Some(Script::new(vec![1])));

    // Registered too recently relative to the block.
    assert_eq!(pm.select_staking_reward_winner(&prev, 30 * MINUTE, later), None);
    assert_eq!(pm.select_staking_reward_winner(&prev, later, 30 * MINUTE), None);

    let pid2 = pm.get_peer_id(p2.id()).unwrap();
    pm.set_finalized(pid2);
    let best = [&p1, &p2]
        .into_iter()
        .min_by(|a, b| {
            RewardRankedContender::new(&prev, a.id(), a.score())
                .cmp(&RewardRankedContender::new(&prev, b.id(), b.score()))
        })
        .unwrap();
    assert_eq!(
        pm.select_staking_reward_winner(&prev, later, later).as_ref(),
        Some(best.payout_script())
    );
}

#[test]
fn test_node_bookkeeping() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let chain = chain_for(&[&p1], MATURE_TIP);
    register(&mut pm, &p1, &chain, Duration::ZERO);
    pm.add_node(NodeId(1), p1.id());

    assert!(pm.latch_avaproofs_sent(NodeId(1)));
    assert!(!pm.latch_avaproofs_sent(NodeId(1)));
    assert!(!pm.latch_avaproofs_sent(NodeId(2)));

    assert!(pm.record_poll(NodeId(1)));
    assert!(pm.record_votes(NodeId(1), 1));
    assert!(!pm.record_poll(NodeId(2)));
    pm.refresh_statistics();
    assert!(pm.get_node(NodeId(1)).map(|n| n.availability().0 > 0).unwrap_or(false));

    let peerid = pm.get_peer_id(p1.id()).unwrap();
    assert!(!pm.update_next_possible_conflict_time(peerid, Duration::from_secs(30)));
    assert!(pm.update_next_possible_conflict_time(peerid, Duration::from_secs(90)));
    assert_eq!(pm.get_peer(peerid).map(|p| p.next_possible_conflict_time), Some(Duration::from_secs(90)));
    assert!(!pm.update_next_possible_conflict_time(PeerId(99), Duration::ZERO));
}

#[test]
fn test_node_state_survives_peer_removal() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let chain = chain_for(&[&p1], MATURE_TIP);
    register(&mut pm, &p1, &chain, Duration::ZERO);
    pm.add_node(NodeId(7), p1.id());

    let busy_until = Duration::from_secs(1000);
    assert!(pm.latch_avaproofs_sent(NodeId(7)));
    assert!(pm.update_next_request_time(NodeId(7), busy_until));
    pm.record_poll(NodeId(7));
    pm.record_votes(NodeId(7), 1);
    pm.refresh_statistics();
    let availability = pm.get_node(NodeId(7)).map(|n| n.availability()).unwrap();
    assert!(availability.0 > 0);

    assert!(pm.reject_proof(p1.id(), RejectionMode::Invalidate, &chain, Duration::ZERO));
    assert!(pm.is_pending(NodeId(7)));
    assert_eq!(pm.node_count(), 0);
    assert_eq!(pm.get_node(NodeId(7)).map(|n| n.peerid), Some(NO_PEER));
    // Unbound nodes stay off the schedule.
    assert!(pm.update_next_request_time(NodeId(7), busy_until));
    assert!(pm.verify());

    assert_eq!(register(&mut pm, &p1, &chain, Duration::ZERO), ProofRegistrationResult::None);
    assert!(!pm.is_pending(NodeId(7)));
    let peerid = pm.get_peer_id(p1.id()).unwrap();
    let node = pm.get_node(NodeId(7)).unwrap();
    assert_eq!(node.peerid, peerid);
    assert_eq!(node.next_request_time, busy_until);
    assert!(node.avaproofs_sent);
    assert_eq!(node.availability(), availability);
    assert!(!pm.latch_avaproofs_sent(NodeId(7)));

    // Still cooling down from before the removal.
    assert_eq!(pm.select_node(Duration::from_secs(1), &mut |_| 0), None);
    assert_eq!(pm.select_node(busy_until, &mut |_| 0), Some(NodeId(7)));
    assert!(pm.verify());

    // Dropping the connection while pending destroys the record.
    pm.remove_peer(peerid);
    assert!(pm.remove_node(NodeId(7)));
    assert!(!pm.is_pending(NodeId(7)));
    assert!(pm.get_node(NodeId(7)).is_none());
    assert!(!pm.remove_node(NodeId(7)));
}

#[test]
fn test_rebind_to_same_peer_keeps_slot() {
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    let p1 = scored(1, 10);
    let p2 = scored(2, 5);
    let chain = chain_for(&[&p1, &p2], MATURE_TIP);
    register(&mut pm, &p1, &chain, Duration::ZERO);
    register(&mut pm, &p2, &chain, Duration::ZERO);
    pm.add_node(NodeId(1), p1.id());
    pm.add_node(NodeId(2), p2.id());
    assert_eq!(pm.slot_count(), 15);

    assert!(pm.add_node(NodeId(1), p1.id()));
    assert_eq!(pm.fragmentation(), 0);
    assert_eq!(pm.slot_count(), 15);
    let peerid = pm.get_peer_id(p1.id()).unwrap();
    assert_eq!(pm.get_peer(peerid).map(|p| p.node_count), Some(1));
    assert_eq!(pm.select_peer_at(0), peerid);
    assert!(pm.verify());

    // Moving the node to another peer frees its old slot.
    assert!(pm.add_node(NodeId(1), p2.id()));
    assert_eq!(pm.fragmentation(), 10);
    assert_eq!(pm.get_peer(peerid).map(|p| p.node_count), Some(0));
    assert!(pm.verify());
}
