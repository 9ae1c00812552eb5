// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! avalanche-kernel: deterministic proof-of-stake identities for Avalanche
//! pre-consensus. Proofs, delegations, the proof index, admission pools,
//! peer binding and stake-contender ranking.

pub mod config;
pub mod error;
pub mod fxp;
pub mod types;
pub mod codec;
pub mod crypto;
pub mod chain;
pub mod validation;
pub mod proof;
pub mod delegation;
pub mod index;
pub mod pool;
pub mod peer;
pub mod contender;
pub mod stats;

#[cfg(test)]
pub mod tests;
