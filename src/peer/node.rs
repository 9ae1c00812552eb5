// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use crate::stats::DecayedStatistics;
use crate::types::scalar::FxpScalar;
use crate::types::{NodeId, PeerId};
use core::time::Duration;

/// One network connection participating in polling.
#[derive(Clone, Debug)]
pub struct Node {
    pub nodeid: NodeId,
    /// `NO_PEER` while the node waits for its proof.
    pub peerid: PeerId,
    pub next_request_time: Duration,
    /// Set once the node has been asked for its proofs.
    pub avaproofs_sent: bool,
    availability: DecayedStatistics,
    polls: u32,
    votes: u32,
}

impl Node {
    pub fn new(nodeid: NodeId, peerid: PeerId, decay: FxpScalar) -> Self {
        Self {
            nodeid,
            peerid,
            next_request_time: Duration::ZERO,
            avaproofs_sent: false,
            availability: DecayedStatistics::with_decay(decay),
            polls: 0,
            votes: 0,
        }
    }

    pub fn record_poll(&mut self) {
        self.polls = self.polls.saturating_add(1);
    }

    pub fn record_votes(&mut self, count: u32) {
        self.votes = self.votes.saturating_add(count);
    }

    /// Folds the period's counters into the average: `2 * votes - polls`,
    /// so a node answering every poll scores positive.
    pub fn refresh_availability(&mut self) {
        let observation = 2 * self.votes as i64 - self.polls as i64;
        self.availability.update_count(observation);
        self.polls = 0;
        self.votes = 0;
    }

    pub fn availability(&self) -> FxpScalar {
        self.availability.average()
    }
}
