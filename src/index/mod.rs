// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof identity index and its compact summary for set reconciliation.

pub mod compact;
pub mod radix;

pub use compact::{CompactProofs, PrefilledProof};
pub use radix::{RadixLeaf, RadixTree};
