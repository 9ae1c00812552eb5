// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Host-facing processor tying the peer manager, the orphan pool and the
//! stake contender cache together behind one lock.

use crate::config::ProcessorConfig;
use crate::errors::{NodeError, NodeResult};
use crate::telemetry::{ORPHAN_STAKES, PEERS, POLLS_SENT, POLLS_TIMED_OUT, PROOFS_ORPHANED, PROOFS_REGISTERED, PROOFS_REJECTED};
use avalanche_kernel::chain::UtxoView;
use avalanche_kernel::contender::cache::{ContenderStatus, ContenderVote, StakeContenderCache};
use avalanche_kernel::crypto::PubKey;
use avalanche_kernel::delegation::{Delegation, DelegationState};
use avalanche_kernel::index::CompactProofs;
use avalanche_kernel::peer::manager::PeerManager;
use avalanche_kernel::peer::{ProofRegistrationResult, ProofRegistrationState, RegistrationMode, RejectionMode};
use avalanche_kernel::pool::OrphanProofPool;
use avalanche_kernel::proof::ProofRef;
use avalanche_kernel::types::{BlockHash, NodeId, ProofId, Script, StakeContenderId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// An outstanding poll awaiting votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Query {
    nodeid: NodeId,
    deadline: Duration,
}

/// Outcome of one event loop pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollCycle {
    /// Nodes whose poll expired during this pass.
    pub timed_out: Vec<NodeId>,
    /// Round id and node polled this pass, if any node was available.
    pub polled: Option<(u64, NodeId)>,
}

/// Point-in-time counters for hosts and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    pub peers: usize,
    pub nodes: usize,
    pub pending_nodes: usize,
    pub conflicting_proofs: usize,
    pub orphan_proofs: usize,
    pub orphan_stakes: usize,
    pub outstanding_queries: usize,
    pub contenders: usize,
}

struct ProcessorState {
    peers: PeerManager,
    orphans: OrphanProofPool,
    contenders: StakeContenderCache,
    queries: BTreeMap<u64, Query>,
    next_round: u64,
    last_stats_refresh: Option<Duration>,
    rng: StdRng,
}

pub struct Processor {
    config: ProcessorConfig,
    chain: Arc<dyn UtxoView + Send + Sync>,
    state: Mutex<ProcessorState>,
    shutdown: AtomicBool,
}

impl Processor {
    pub fn new(config: ProcessorConfig, chain: Arc<dyn UtxoView + Send + Sync>) -> NodeResult<Self> {
        Self::with_rng(config, chain, StdRng::from_entropy())
    }

    /// Deterministic peer selection and salts, for replays and tests.
    pub fn with_seed(config: ProcessorConfig, chain: Arc<dyn UtxoView + Send + Sync>, seed: u64) -> NodeResult<Self> {
        Self::with_rng(config, chain, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ProcessorConfig, chain: Arc<dyn UtxoView + Send + Sync>, rng: StdRng) -> NodeResult<Self> {
        config.validate()?;
        let state = ProcessorState {
            peers: PeerManager::new(config.peer_manager_config()),
            orphans: OrphanProofPool::new(config.max_orphan_stakes),
            contenders: StakeContenderCache::new(),
            queries: BTreeMap::new(),
            next_round: 0,
            last_stats_refresh: None,
            rng,
        };
        tracing::info!("Avalanche processor initialized (max orphan stakes: {})", config.max_orphan_stakes);
        Ok(Self {
            config,
            chain,
            state: Mutex::new(state),
            shutdown: AtomicBool::new(false),
        })
    }

    fn lock(&self) -> NodeResult<MutexGuard<'_, ProcessorState>> {
        self.state.lock().map_err(|_| NodeError::LockPoisoned)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    // ---------------------------------------------------------------
    // Proofs
    // ---------------------------------------------------------------

    /// Registers a proof. Proofs failing only for missing or immature stakes
    /// are parked in the orphan pool and reported as `Orphan`.
    pub fn add_proof(&self, proof: ProofRef, now: Duration) -> NodeResult<ProofRegistrationState> {
        let mut guard = self.lock()?;
        let st = &mut *guard;

        let mut state = ProofRegistrationState::default();
        if st.orphans.contains(proof.id()) {
            state.invalid(
                ProofRegistrationResult::AlreadyRegistered,
                "proof-already-registered",
                format!("proofid: {}", proof.id()),
            );
            return Ok(state);
        }

        if st.peers.register_proof(&proof, RegistrationMode::Default, self.chain.as_ref(), now, &mut state) {
            tracing::debug!("Proof {} registered (score {})", proof.id(), proof.score());
            metrics::increment_counter!(PROOFS_REGISTERED);
        } else if state.result() == ProofRegistrationResult::Orphan {
            let kept = st.orphans.add_proof(Arc::clone(&proof));
            tracing::debug!("Proof {} parked as orphan (kept: {})", proof.id(), kept);
            metrics::increment_counter!(PROOFS_ORPHANED);
        } else {
            tracing::debug!("Proof {} not registered: {}", proof.id(), state);
            metrics::increment_counter!(PROOFS_REJECTED);
        }

        Self::publish_gauges(st);
        Ok(state)
    }

    /// Drops a proof wherever it is held. Conflicting candidates of a bound
    /// proof get a chance to take its place.
    pub fn remove_proof(&self, proofid: &ProofId, now: Duration) -> NodeResult<bool> {
        let mut guard = self.lock()?;
        let st = &mut *guard;
        let removed = st.orphans.remove_proof(proofid)
            || st.peers.reject_proof(proofid, RejectionMode::Invalidate, self.chain.as_ref(), now);
        if removed {
            tracing::debug!("Proof {} removed", proofid);
        }
        Self::publish_gauges(st);
        Ok(removed)
    }

    pub fn get_proof(&self, proofid: &ProofId) -> NodeResult<Option<ProofRef>> {
        let guard = self.lock()?;
        Ok(guard.peers.get_proof(proofid).or_else(|| guard.orphans.get_proof(proofid)))
    }

    pub fn is_orphan(&self, proofid: &ProofId) -> NodeResult<bool> {
        Ok(self.lock()?.orphans.contains(proofid))
    }

    pub fn is_bound_to_peer(&self, proofid: &ProofId) -> NodeResult<bool> {
        Ok(self.lock()?.peers.is_bound_to_peer(proofid))
    }

    /// Retries every orphan against the current chain. Returns the proofs that
    /// became peers.
    pub fn rescan(&self, now: Duration) -> NodeResult<Vec<ProofRef>> {
        let mut guard = self.lock()?;
        let promoted = Self::rescan_locked(&mut guard, self.chain.as_ref(), now);
        Self::publish_gauges(&guard);
        Ok(promoted)
    }

    fn rescan_locked(st: &mut ProcessorState, chain: &dyn UtxoView, now: Duration) -> Vec<ProofRef> {
        let mut still_orphan = Vec::new();
        let outcome = st.orphans.rescan(&mut |proof: &ProofRef| {
            let mut state = ProofRegistrationState::default();
            if st.peers.register_proof(proof, RegistrationMode::Default, chain, now, &mut state) {
                return true;
            }
            if state.result() == ProofRegistrationResult::Orphan {
                still_orphan.push(Arc::clone(proof));
            }
            false
        });

        // Rescan empties the pool; proofs still waiting on their stakes go back.
        for proof in still_orphan {
            st.orphans.add_proof(proof);
        }

        if !outcome.promoted.is_empty() || !outcome.dropped.is_empty() {
            tracing::info!(
                "Orphan rescan: {} promoted, {} dropped, {} still orphan",
                outcome.promoted.len(),
                outcome.dropped.len(),
                st.orphans.count_proofs()
            );
        }
        outcome.promoted
    }

    /// Reacts to a new chain tip: peers that lost their stakes are demoted to
    /// the orphan pool, orphans that matured are promoted, and the contender
    /// cache moves to the new block. Returns the promoted proofs.
    pub fn updated_block_tip(&self, now: Duration) -> NodeResult<Vec<ProofRef>> {
        let chain = self.chain.as_ref();
        let mut guard = self.lock()?;
        let st = &mut *guard;

        let orphaned = st.peers.updated_block_tip(chain, now);
        let promoted = Self::rescan_locked(st, chain, now);
        for proof in orphaned {
            tracing::debug!("Proof {} orphaned by tip {}", proof.id(), chain.tip_hash());
            st.orphans.add_proof(proof);
        }

        let height = chain.tip_height();
        let peers = &st.peers;
        st.contenders
            .promote_to_block(height, chain.tip_hash(), |proofid| peers.is_bound_to_peer(proofid));
        st.contenders.cleanup(height);

        Self::publish_gauges(st);
        Ok(promoted)
    }

    fn publish_gauges(st: &ProcessorState) {
        metrics::gauge!(PEERS, st.peers.peer_count() as f64);
        metrics::gauge!(ORPHAN_STAKES, st.orphans.stake_count() as f64);
    }

    // ---------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------

    pub fn add_node(&self, nodeid: NodeId, proofid: &ProofId) -> NodeResult<bool> {
        let bound = self.lock()?.peers.add_node(nodeid, proofid);
        if !bound {
            tracing::debug!("Node {:?} pending on proof {}", nodeid, proofid);
        }
        Ok(bound)
    }

    pub fn remove_node(&self, nodeid: NodeId) -> NodeResult<bool> {
        let mut guard = self.lock()?;
        let st = &mut *guard;
        st.queries.retain(|_, q| q.nodeid != nodeid);
        Ok(st.peers.remove_node(nodeid))
    }

    /// Verifies a delegation against a known proof and returns the key it
    /// delegates to.
    pub fn verify_delegation(&self, delegation: &Delegation) -> NodeResult<PubKey> {
        let proof = self
            .get_proof(delegation.proof_id())?
            .ok_or(NodeError::UnknownProof(*delegation.proof_id()))?;

        let mut state = DelegationState::default();
        let mut auth = *proof.master();
        if !delegation.verify_for_proof(&proof, &mut state, &mut auth) {
            return Err(NodeError::InvalidDelegation(state.to_string()));
        }
        Ok(auth)
    }

    // ---------------------------------------------------------------
    // Polling
    // ---------------------------------------------------------------

    /// One pass of the poll loop: expires stale queries, refreshes node
    /// statistics on cadence and polls one score-weighted node. Returns
    /// `None` once shutdown was requested.
    pub fn event_loop_tick(&self, now: Duration) -> NodeResult<Option<PollCycle>> {
        if self.is_shutting_down() {
            return Ok(None);
        }

        let mut guard = self.lock()?;
        let st = &mut *guard;
        let mut cycle = PollCycle::default();

        let expired: Vec<u64> = st
            .queries
            .iter()
            .filter(|(_, q)| q.deadline <= now)
            .map(|(round, _)| *round)
            .collect();
        for round in expired {
            if let Some(query) = st.queries.remove(&round) {
                // Expired polls count as non-responses, and the node may be asked again.
                st.peers.update_next_request_time(query.nodeid, now);
                cycle.timed_out.push(query.nodeid);
                metrics::increment_counter!(POLLS_TIMED_OUT);
            }
        }

        let period = self.config.stats_refresh_period();
        match st.last_stats_refresh {
            None => st.last_stats_refresh = Some(now),
            Some(last) if now >= last + period => {
                st.peers.refresh_statistics();
                st.last_stats_refresh = Some(now);
                tracing::debug!("Node statistics refreshed");
            }
            Some(_) => {}
        }

        let rng = &mut st.rng;
        let selected = st.peers.select_node(now, &mut |n| rng.gen_range(0..n));
        if let Some(nodeid) = selected {
            let round = st.next_round;
            st.next_round += 1;
            let deadline = now + self.config.query_timeout();
            st.peers.update_next_request_time(nodeid, deadline);
            st.peers.record_poll(nodeid);
            st.queries.insert(round, Query { nodeid, deadline });
            cycle.polled = Some((round, nodeid));
            metrics::increment_counter!(POLLS_SENT);
        }

        Ok(Some(cycle))
    }

    /// Accounts the answer to poll `round`. False if the round is unknown,
    /// expired or was sent to another node.
    pub fn register_votes(&self, nodeid: NodeId, round: u64, votes: u32, now: Duration) -> NodeResult<bool> {
        let mut guard = self.lock()?;
        let st = &mut *guard;
        match st.queries.get(&round) {
            Some(query) if query.nodeid == nodeid && query.deadline > now => {}
            _ => {
                tracing::warn!("Unexpected response from node {:?} for round {}", nodeid, round);
                return Ok(false);
            }
        }
        st.queries.remove(&round);
        st.peers.record_votes(nodeid, votes);
        st.peers.update_next_request_time(nodeid, now);
        Ok(true)
    }

    /// Compact summary of the shareable proofs under fresh random salts.
    pub fn compact_proofs(&self) -> NodeResult<CompactProofs> {
        let mut guard = self.lock()?;
        let st = &mut *guard;
        let (k0, k1) = (st.rng.gen::<u64>(), st.rng.gen::<u64>());
        Ok(CompactProofs::new(st.peers.shareable_proofs(), k0, k1))
    }

    /// Positions in `compact` of proofs this processor does not share yet.
    pub fn missing_proofs(&self, compact: &CompactProofs) -> NodeResult<Vec<u32>> {
        Ok(compact.missing_indices(self.lock()?.peers.shareable_proofs()))
    }

    // ---------------------------------------------------------------
    // Staking rewards
    // ---------------------------------------------------------------

    /// Registers every peer as a contender for the block after `prev_block`.
    /// The locally selected reward winner is accepted and marked as winner.
    pub fn add_stake_contenders(
        &self,
        prev_height: u32,
        prev_block: BlockHash,
        prev_block_time: Duration,
        now: Duration,
    ) -> NodeResult<usize> {
        let mut guard = self.lock()?;
        let st = &mut *guard;

        let winner = st.peers.select_staking_reward_winner(&prev_block, prev_block_time, now);
        let mut added = 0;
        for peer in st.peers.peers() {
            let status = match &winner {
                Some(script) if script == peer.proof.payout_script() => {
                    ContenderStatus::ACCEPTED | ContenderStatus::IN_WINNER_SET
                }
                _ => ContenderStatus::UNKNOWN,
            };
            if st.contenders.add(prev_height, prev_block, &peer.proof, status) {
                added += 1;
            }
        }
        tracing::debug!("{} stake contenders added for block {}", added, prev_block);
        Ok(added)
    }

    pub fn set_staking_reward_winners(&self, prev_height: u32, prev_block: BlockHash, scripts: Vec<Script>) -> NodeResult<()> {
        self.lock()?.contenders.set_winners(prev_height, prev_block, scripts);
        Ok(())
    }

    pub fn get_staking_reward_winners(&self, prev_block: &BlockHash) -> NodeResult<Option<Vec<Script>>> {
        Ok(self.lock()?.contenders.get_winners(prev_block))
    }

    pub fn get_stake_contender_vote(&self, id: &StakeContenderId) -> NodeResult<Option<(ContenderVote, BlockHash)>> {
        Ok(self.lock()?.contenders.get_vote_status(id))
    }

    pub fn accept_stake_contender(&self, id: &StakeContenderId) -> NodeResult<bool> {
        Ok(self.lock()?.contenders.accept(id))
    }

    pub fn reject_stake_contender(&self, id: &StakeContenderId) -> NodeResult<bool> {
        Ok(self.lock()?.contenders.reject(id))
    }

    pub fn finalize_stake_contender(&self, id: &StakeContenderId) -> NodeResult<bool> {
        Ok(self.lock()?.contenders.finalize(id))
    }

    pub fn invalidate_stake_contender(&self, id: &StakeContenderId) -> NodeResult<bool> {
        Ok(self.lock()?.contenders.invalidate(id))
    }

    /// Marks the peer of `proofid` as having finalized, making it eligible
    /// for staking rewards.
    pub fn set_finalized(&self, proofid: &ProofId) -> NodeResult<bool> {
        let mut guard = self.lock()?;
        let Some(peerid) = guard.peers.get_peer_id(proofid) else {
            return Ok(false);
        };
        Ok(guard.peers.set_finalized(peerid))
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            tracing::info!("Avalanche processor shutting down");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> NodeResult<ProcessorStats> {
        let guard = self.lock()?;
        Ok(ProcessorStats {
            peers: guard.peers.peer_count(),
            nodes: guard.peers.node_count(),
            pending_nodes: guard.peers.pending_node_count(),
            conflicting_proofs: guard.peers.conflicting_proof_count(),
            orphan_proofs: guard.orphans.count_proofs(),
            orphan_stakes: guard.orphans.stake_count(),
            outstanding_queries: guard.queries.len(),
            contenders: guard.contenders.len(),
        })
    }

    /// Runs the peer manager consistency check.
    pub fn verify(&self) -> NodeResult<bool> {
        Ok(self.lock()?.peers.verify())
    }
}
