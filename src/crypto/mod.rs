// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Hashing and signatures.
//!
//! All identities are BLAKE3 digests. Signatures are Ed25519, a Schnorr
//! family scheme with fixed 64-byte signatures, always over a 32-byte digest.

pub mod hash;
pub mod key;

pub use hash::HashWriter;
pub use key::{PrivKey, PubKey, SchnorrSig};
