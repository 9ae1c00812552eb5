// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::fixtures::*;
use crate::config::PeerManagerConfig;
use crate::index::CompactProofs;
use crate::peer::manager::PeerManager;
use crate::peer::{ProofRegistrationState, RegistrationMode};
use crate::proof::ProofRef;
use crate::types::{NodeId, Script};
use core::time::Duration;

/// A simple deterministic RNG for tests.
struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    fn new(seed: u64) -> Self {
        Self { state: seed, inc: 1 }
    }

    fn next_u32(&mut self) -> u32 {
        let oldstate = self.state;
        self.state = oldstate.wrapping_mul(6364136223846793005).wrapping_add(self.inc);
        let xorshifted = (((oldstate >> 18) ^ oldstate) >> 27) as u32;
        let rot = (oldstate >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

fn random_proofs(rng: &mut Pcg32, n: u8) -> Vec<ProofRef> {
    (0..n)
        .map(|i| {
            let stakes = 1 + rng.next_u32() % 3;
            let utxos: Vec<_> = (0..stakes)
                .map(|v| (outpoint(i, v), (1 + rng.next_u32() % 50) as u64 * COIN))
                .collect();
            proof_with(i, 1, &utxos)
        })
        .collect()
}

struct Outcome {
    total_score: u64,
    connected_score: u64,
    compact: CompactProofs,
    winner: Option<Script>,
}

fn run(proofs: &[ProofRef], order: &[usize]) -> Outcome {
    let refs: Vec<&ProofRef> = proofs.iter().collect();
    let chain = chain_for(&refs, MATURE_TIP);
    let mut pm = PeerManager::new(PeerManagerConfig::default());
    for &i in order {
        let mut state = ProofRegistrationState::default();
        assert!(pm.register_proof(&proofs[i], RegistrationMode::Default, &chain, Duration::ZERO, &mut state));
        assert!(pm.add_node(NodeId(i as u64), proofs[i].id()));
        let peerid = pm.get_peer_id(proofs[i].id()).unwrap();
        pm.set_finalized(peerid);
    }
    assert!(pm.verify());

    let later = Duration::from_secs(3600);
    Outcome {
        total_score: pm.total_peers_score(),
        connected_score: pm.connected_peers_score(),
        compact: CompactProofs::new(pm.shareable_proofs(), 11, 13),
        winner: pm.select_staking_reward_winner(&block(42), later, later),
    }
}

#[test]
fn test_insertion_order_independence() {
    let mut rng = Pcg32::new(12345);
    let proofs = random_proofs(&mut rng, 24);

    let forward: Vec<usize> = (0..proofs.len()).collect();
    let mut shuffled = forward.clone();
    for i in (1..shuffled.len()).rev() {
        let j = rng.next_u32() as usize % (i + 1);
        shuffled.swap(i, j);
    }

    let a = run(&proofs, &forward);
    let b = run(&proofs, &shuffled);

    let expected: u64 = proofs.iter().map(|p| p.score() as u64).sum();
    assert_eq!(a.total_score, expected);
    assert_eq!(a.total_score, b.total_score);
    assert_eq!(a.connected_score, b.connected_score);
    assert_eq!(a.compact, b.compact);
    assert_eq!(a.compact.encode(), b.compact.encode());
    assert!(a.winner.is_some());
    assert_eq!(a.winner, b.winner);
}

#[test]
fn test_proof_ids_are_stable() {
    let mut rng_a = Pcg32::new(7);
    let mut rng_b = Pcg32::new(7);
    let a = random_proofs(&mut rng_a, 8);
    let b = random_proofs(&mut rng_b, 8);
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.id(), y.id());
        assert_eq!(x.encode(), y.encode());
    }
}
