// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof admission pools.

pub mod orphan;
pub mod proof_pool;

pub use orphan::{OrphanProofPool, ProofPromoter, RescanOutcome};
pub use proof_pool::{AddProofStatus, ProofPool};
