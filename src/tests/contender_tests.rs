// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::fixtures::*;
use crate::contender::{ContenderStatus, ContenderVote, RewardRankedContender, StakeContenderCache};
use crate::types::{Script, StakeContenderId};

#[test]
fn test_contender_id_is_block_scoped() {
    let p = proof_with(1, 1, &[(outpoint(1, 0), COIN)]);
    let a = StakeContenderId::new(&block(1), p.id());
    let b = StakeContenderId::new(&block(2), p.id());
    assert_ne!(a, b);
    assert_eq!(a, StakeContenderId::new(&block(1), p.id()));
}

#[test]
fn test_reward_rank() {
    let p = proof_with(1, 1, &[(outpoint(1, 0), COIN)]);
    let id = StakeContenderId::new(&block(1), p.id());
    assert_eq!(id.compute_proof_reward_rank(0), f64::INFINITY);

    let r1 = id.compute_proof_reward_rank(1);
    let r10 = id.compute_proof_reward_rank(10);
    assert!(r1.is_finite() && r1 > 0.0);
    assert!(r10 < r1);
    assert!((r1 / 10.0 - r10).abs() < 1e-9);
}

#[test]
fn test_ranking_is_a_total_order() {
    let prev = block(3);
    let mut ranked: Vec<RewardRankedContender> = (1..=12u8)
        .map(|i| {
            let p = proof_with(i, 1, &[(outpoint(i, 0), (i as u64 % 4 + 1) * COIN)]);
            RewardRankedContender::new(&prev, p.id(), p.score())
        })
        .collect();
    // Zero score contenders sort last.
    let zero = proof_with(50, 1, &[(outpoint(50, 0), 0)]);
    ranked.push(RewardRankedContender::new(&prev, zero.id(), zero.score()));

    for a in &ranked {
        assert_eq!(a.cmp(a), core::cmp::Ordering::Equal);
        for b in &ranked {
            assert_eq!(a.cmp(b), b.cmp(a).reverse());
            for c in &ranked {
                if a <= b && b <= c {
                    assert!(a <= c);
                }
            }
        }
    }

    ranked.sort();
    assert_eq!(ranked.last().map(|c| c.proof_id), Some(*zero.id()));
    assert!(ranked.windows(2).all(|w| w[0].rank <= w[1].rank));
}

#[test]
fn test_vote_status_transitions() {
    let mut cache = StakeContenderCache::new();
    let prev = block(1);
    let p = proof_with(1, 1, &[(outpoint(1, 0), COIN)]);
    let id = StakeContenderId::new(&prev, p.id());

    assert_eq!(cache.get_vote_status(&id), None);
    assert!(cache.add(10, prev, &p, ContenderStatus::UNKNOWN));
    assert!(!cache.add(10, prev, &p, ContenderStatus::ACCEPTED));
    assert_eq!(cache.get_vote_status(&id), Some((ContenderVote::Reject, prev)));

    assert!(cache.accept(&id));
    assert_eq!(cache.get_vote_status(&id), Some((ContenderVote::Accept, prev)));
    assert!(cache.reject(&id));
    assert_eq!(cache.get_vote_status(&id).map(|v| v.0), Some(ContenderVote::Reject));

    assert_eq!(cache.get_winners(&prev), None);
    assert!(cache.finalize(&id));
    assert_eq!(cache.get_vote_status(&id).map(|v| v.0), Some(ContenderVote::Accept));
    assert_eq!(cache.get_winners(&prev), Some(vec![Script::new(vec![1])]));

    assert!(cache.invalidate(&id));
    assert_eq!(cache.get_vote_status(&id).map(|v| v.0), Some(ContenderVote::Reject));
    assert_eq!(cache.get_winners(&prev), None);

    let unknown = StakeContenderId::new(&block(9), p.id());
    assert!(!cache.accept(&unknown));
    assert_eq!(ContenderVote::Accept.as_u32(), 0);
    assert_eq!(ContenderVote::Reject.as_u32(), 1);
}

#[test]
fn test_manual_winners() {
    let mut cache = StakeContenderCache::new();
    let prev = block(1);
    let p1 = proof_with(1, 1, &[(outpoint(1, 0), COIN)]);
    let p2 = proof_with(2, 1, &[(outpoint(2, 0), COIN)]);
    cache.add(10, prev, &p1, ContenderStatus::UNKNOWN);
    cache.add(10, prev, &p2, ContenderStatus::ACCEPTED | ContenderStatus::IN_WINNER_SET);

    cache.set_winners(10, prev, vec![Script::new(vec![1])]);
    let id1 = StakeContenderId::new(&prev, p1.id());
    assert_eq!(cache.get_vote_status(&id1).map(|v| v.0), Some(ContenderVote::Accept));
    assert_eq!(cache.get_winners(&prev), Some(vec![Script::new(vec![1]), Script::new(vec![2])]));

    // Manual winners only apply to their own block.
    assert_eq!(cache.get_winners(&block(2)), None);
}

#[test]
fn test_promote_and_cleanup() {
    let mut cache = StakeContenderCache::new();
    let p1 = proof_with(1, 1, &[(outpoint(1, 0), COIN)]);
    let p2 = proof_with(2, 1, &[(outpoint(2, 0), COIN)]);
    cache.add(10, block(10), &p1, ContenderStatus::ACCEPTED);
    cache.add(10, block(10), &p2, ContenderStatus::ACCEPTED);

    // Nothing is dropped before the first promotion.
    cache.cleanup(100);
    assert_eq!(cache.len(), 2);

    let keep = *p1.id();
    cache.promote_to_block(11, block(11), |id| *id == keep);
    assert_eq!(cache.len(), 3);
    let promoted = StakeContenderId::new(&block(11), p1.id());
    assert_eq!(cache.get_vote_status(&promoted), Some((ContenderVote::Reject, block(11))));
    assert_eq!(cache.get_vote_status(&StakeContenderId::new(&block(11), p2.id())), None);

    // Cleanup never goes past the last promoted height.
    cache.cleanup(100);
    assert_eq!(cache.len(), 1);
    assert!(cache.get_vote_status(&StakeContenderId::new(&block(10), p1.id())).is_none());
    assert!(cache.get_vote_status(&promoted).is_some());
    assert!(!cache.is_empty());
}
