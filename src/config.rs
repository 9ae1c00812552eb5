// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Protocol constants and peer manager configuration.

use crate::types::Amount;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Number of fractional bits for Fixed-Point representation (Q16.16).
pub const FRAC_BITS: u32 = 16;

/// Scaling factor for Fixed-Point representation (1 << FRAC_BITS).
pub const SCALE: i32 = 1 << FRAC_BITS;

/// Maximum number of stakes a single proof may carry.
pub const MAX_PROOF_STAKES: usize = 1000;

/// Maximum number of levels in a delegation chain.
pub const MAX_DELEGATION_LEVELS: usize = 20;

/// Highest block height a stake can record: the encoded field keeps one bit
/// for the coinbase flag.
pub const MAX_STAKE_HEIGHT: u32 = u32::MAX >> 1;

/// Amount of stake (in base units) worth one point of score.
pub const SCORE_UNIT: Amount = 1_000_000;

/// Minimum amount a single stake must carry.
pub const DEFAULT_DUST_THRESHOLD: Amount = 1_000_000;

/// Confirmations a staked output needs before the proof can become a peer.
pub const DEFAULT_STAKE_UTXO_CONFIRMATIONS: u32 = 2016;

/// Short proof ids carry 48 bits.
pub const SHORT_ID_BYTES: usize = 6;
pub const SHORT_ID_MASK: u64 = 0xffff_ffff_ffff;

/// A peer without attached nodes for this long is not eligible for rewards.
pub const DANGLING_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub const DEFAULT_CONFLICTING_PROOF_COOLDOWN: Duration = Duration::from_secs(60);
pub const DEFAULT_PEER_REPLACEMENT_COOLDOWN: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_STATS_REFRESH_PERIOD: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_STATS_TIME_CONSTANT: Duration = Duration::from_secs(10 * 60);

/// Retry budget when drawing a peer or a node to poll.
pub const SELECT_PEER_MAX_RETRY: usize = 3;
pub const SELECT_NODE_MAX_RETRY: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerManagerConfig {
    pub dust_threshold: Amount,
    pub stake_utxo_confirmations: u32,
    pub conflicting_proof_cooldown: Duration,
    pub peer_replacement_cooldown: Duration,
    pub proof_replacement_enabled: bool,
    pub stats_refresh_period: Duration,
    pub stats_time_constant: Duration,
}

impl Default for PeerManagerConfig {
    fn default() -> Self {
        Self {
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            stake_utxo_confirmations: DEFAULT_STAKE_UTXO_CONFIRMATIONS,
            conflicting_proof_cooldown: DEFAULT_CONFLICTING_PROOF_COOLDOWN,
            peer_replacement_cooldown: DEFAULT_PEER_REPLACEMENT_COOLDOWN,
            proof_replacement_enabled: false,
            stats_refresh_period: DEFAULT_STATS_REFRESH_PERIOD,
            stats_time_constant: DEFAULT_STATS_TIME_CONSTANT,
        }
    }
}
