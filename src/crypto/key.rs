// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Key and signature wrappers over ed25519-dalek.

use crate::error::{KernelError, Result};
use crate::types::Hash256;
use core::fmt;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

pub const PUBKEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PubKey(pub [u8; PUBKEY_SIZE]);

impl PubKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; PUBKEY_SIZE] = bytes.try_into().map_err(|_| KernelError::InvalidKeyLength {
            expected: PUBKEY_SIZE,
            found: bytes.len(),
        })?;
        Ok(PubKey(arr))
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_SIZE] {
        &self.0
    }

    /// False for malformed keys as well as bad signatures.
    pub fn verify(&self, digest: &Hash256, sig: &SchnorrSig) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = Signature::from_bytes(&sig.0);
        key.verify(&digest.0, &sig).is_ok()
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", hex::encode(self.0))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSig(pub [u8; SIGNATURE_SIZE]);

impl SchnorrSig {
    pub const ZERO: SchnorrSig = SchnorrSig([0u8; SIGNATURE_SIZE]);
}

impl Default for SchnorrSig {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for SchnorrSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchnorrSig({})", hex::encode(self.0))
    }
}

/// Private signing key. Never serialized.
#[derive(Clone)]
pub struct PrivKey(SigningKey);

impl PrivKey {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        PrivKey(SigningKey::from_bytes(seed))
    }

    pub fn pub_key(&self) -> PubKey {
        PubKey(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, digest: &Hash256) -> Option<SchnorrSig> {
        Signer::<Signature>::try_sign(&self.0, &digest.0)
            .ok()
            .map(|s| SchnorrSig(s.to_bytes()))
    }
}

impl fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivKey({:?})", self.pub_key())
    }
}
