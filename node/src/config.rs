// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::errors::{NodeError, NodeResult};
use avalanche_kernel::config::{
    PeerManagerConfig, DEFAULT_CONFLICTING_PROOF_COOLDOWN, DEFAULT_DUST_THRESHOLD, DEFAULT_PEER_REPLACEMENT_COOLDOWN,
    DEFAULT_STAKE_UTXO_CONFIRMATIONS, DEFAULT_STATS_REFRESH_PERIOD, DEFAULT_STATS_TIME_CONSTANT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Processor settings. Every field has a default, so a config file only
/// names what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Outstanding polls older than this count as non-responses.
    pub query_timeout_ms: u64,
    /// Interval the host scheduler drives `event_loop_tick` at.
    pub poll_interval_ms: u64,
    pub conflicting_proof_cooldown_secs: u64,
    pub peer_replacement_cooldown_secs: u64,
    pub proof_replacement_enabled: bool,
    pub dust_threshold: u64,
    pub stake_utxo_confirmations: u32,
    /// Orphan pool capacity, in stakes.
    pub max_orphan_stakes: usize,
    pub stats_refresh_period_secs: u64,
    pub stats_time_constant_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 10_000,
            poll_interval_ms: 100,
            conflicting_proof_cooldown_secs: DEFAULT_CONFLICTING_PROOF_COOLDOWN.as_secs(),
            peer_replacement_cooldown_secs: DEFAULT_PEER_REPLACEMENT_COOLDOWN.as_secs(),
            proof_replacement_enabled: false,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            stake_utxo_confirmations: DEFAULT_STAKE_UTXO_CONFIRMATIONS,
            max_orphan_stakes: 10_000,
            stats_refresh_period_secs: DEFAULT_STATS_REFRESH_PERIOD.as_secs(),
            stats_time_constant_secs: DEFAULT_STATS_TIME_CONSTANT.as_secs(),
        }
    }
}

impl ProcessorConfig {
    pub fn from_json_str(s: &str) -> NodeResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> NodeResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> NodeResult<()> {
        if self.query_timeout_ms == 0 {
            return Err(NodeError::InvalidConfig("query_timeout_ms must be positive".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(NodeError::InvalidConfig("poll_interval_ms must be positive".into()));
        }
        if self.stats_refresh_period_secs == 0 {
            return Err(NodeError::InvalidConfig("stats_refresh_period_secs must be positive".into()));
        }
        if self.max_orphan_stakes == 0 {
            return Err(NodeError::InvalidConfig("max_orphan_stakes must be positive".into()));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stats_refresh_period(&self) -> Duration {
        Duration::from_secs(self.stats_refresh_period_secs)
    }

    pub fn peer_manager_config(&self) -> PeerManagerConfig {
        PeerManagerConfig {
            dust_threshold: self.dust_threshold,
            stake_utxo_confirmations: self.stake_utxo_confirmations,
            conflicting_proof_cooldown: Duration::from_secs(self.conflicting_proof_cooldown_secs),
            peer_replacement_cooldown: Duration::from_secs(self.peer_replacement_cooldown_secs),
            proof_replacement_enabled: self.proof_replacement_enabled,
            stats_refresh_period: self.stats_refresh_period(),
            stats_time_constant: Duration::from_secs(self.stats_time_constant_secs),
        }
    }
}
