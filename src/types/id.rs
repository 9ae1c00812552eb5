// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.
//!
//! 256-bit ids are stored most significant byte first, so the derived
//! ordering is the numeric one.

use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn from_array(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Value as a real number. Precision loss past 53 bits is expected.
    pub fn to_f64(&self) -> f64 {
        self.0.iter().fold(0.0f64, |acc, b| acc * 256.0 + *b as f64)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub Hash256);

        impl $name {
            pub fn from_array(bytes: [u8; 32]) -> Self {
                $name(Hash256(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0 .0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

hash_id!(
    /// Full proof identity, committing to the master key.
    ProofId
);
hash_id!(
    /// Proof identity without the master key.
    LimitedProofId
);
hash_id!(DelegationId);
hash_id!(
    /// Identity of one stake inside a builder: outpoint plus owner key.
    StakeId
);
hash_id!(
    /// A proof's candidacy for the reward of the block following `prev`.
    StakeContenderId
);
hash_id!(BlockHash);
hash_id!(TxId);

/// Network connection identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(pub u64);

/// Logical proof-backed peer identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PeerId(pub u32);

pub const NO_PEER: PeerId = PeerId(u32::MAX);

impl PeerId {
    pub fn next(&self) -> Self {
        PeerId(self.0 + 1)
    }
}
