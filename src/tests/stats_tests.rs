// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::fxp::ops::{from_int, to_f64};
use crate::peer::node::Node;
use crate::stats::{decay_factor, DecayedStatistics};
use crate::types::scalar::FxpScalar;
use crate::types::{NodeId, PeerId};
use core::time::Duration;

#[test]
fn test_decay_factor() {
    assert_eq!(decay_factor(Duration::from_secs(600), Duration::ZERO), FxpScalar::ONE);

    // 1 - e^-1
    let d = decay_factor(Duration::from_secs(600), Duration::from_secs(600));
    assert!((to_f64(d) - 0.632_120_558).abs() < 1e-4);

    let slow = decay_factor(Duration::from_secs(60), Duration::from_secs(600));
    assert!(slow < d);
}

#[test]
fn test_full_decay_tracks_last_observation() {
    let mut stats = DecayedStatistics::with_decay(FxpScalar::ONE);
    stats.update_count(7);
    assert_eq!(stats.average(), from_int(7));
    stats.update_count(-3);
    assert_eq!(stats.average(), from_int(-3));
}

#[test]
fn test_average_converges() {
    let mut stats = DecayedStatistics::new(Duration::from_secs(600), Duration::from_secs(600));
    assert_eq!(stats.average(), FxpScalar::ZERO);

    stats.update_count(10);
    let first = to_f64(stats.average());
    assert!(first > 6.0 && first < 6.5);

    for _ in 0..50 {
        stats.update_count(10);
    }
    assert!((to_f64(stats.average()) - 10.0).abs() < 0.01);
}

#[test]
fn test_identical_observations_give_identical_averages() {
    let mut a = DecayedStatistics::new(Duration::from_secs(60), Duration::from_secs(600));
    let mut b = DecayedStatistics::new(Duration::from_secs(60), Duration::from_secs(600));
    for x in [3, -1, 4, 1, -5, 9, 2, -6] {
        a.update_count(x);
        b.update_count(x);
    }
    assert_eq!(a, b);
}

#[test]
fn test_node_availability() {
    let mut responsive = Node::new(NodeId(1), PeerId(0), FxpScalar::ONE);
    let mut silent = Node::new(NodeId(2), PeerId(0), FxpScalar::ONE);
    for _ in 0..4 {
        responsive.record_poll();
        responsive.record_votes(1);
        silent.record_poll();
    }
    responsive.refresh_availability();
    silent.refresh_availability();

    assert_eq!(responsive.availability(), from_int(4));
    assert_eq!(silent.availability(), from_int(-4));

    // Counters restart each period.
    silent.refresh_availability();
    assert_eq!(silent.availability(), FxpScalar::ZERO);
}
