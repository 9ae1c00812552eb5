// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Stakes and the commitment they are signed against.

use crate::codec::{read_array, read_bytes_with_size, write_bytes_with_size};
use crate::crypto::key::SIGNATURE_SIZE;
use crate::crypto::{HashWriter, PrivKey, PubKey, SchnorrSig};
use crate::error::Result;
use crate::types::{Amount, Hash256, OutPoint, ProofId, StakeId, TxId};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Message-binding context for stake signatures, derived from a ProofId only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StakeCommitment(pub Hash256);

impl StakeCommitment {
    pub fn new(proof_id: &ProofId) -> Self {
        let mut w = HashWriter::new();
        w.write(proof_id.as_bytes());
        StakeCommitment(w.finalize())
    }
}

/// One staked output and the key authorized to spend it. Immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stake {
    utxo: OutPoint,
    amount: Amount,
    /// `height << 1 | is_coinbase`
    height_and_coinbase: u32,
    pubkey: PubKey,
}

impl Stake {
    /// `height` above `MAX_STAKE_HEIGHT` loses its top bit; `ProofBuilder`
    /// refuses such stakes.
    pub fn new(utxo: OutPoint, amount: Amount, height: u32, is_coinbase: bool, pubkey: PubKey) -> Self {
        Self {
            utxo,
            amount,
            height_and_coinbase: (height << 1) | is_coinbase as u32,
            pubkey,
        }
    }

    pub fn utxo(&self) -> &OutPoint {
        &self.utxo
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn height(&self) -> u32 {
        self.height_and_coinbase >> 1
    }

    pub fn is_coinbase(&self) -> bool {
        self.height_and_coinbase & 1 == 1
    }

    pub fn pubkey(&self) -> &PubKey {
        &self.pubkey
    }

    /// Identity used to deduplicate stakes: outpoint plus owner.
    pub fn id(&self) -> StakeId {
        let mut w = HashWriter::new();
        w.write(self.utxo.txid.as_bytes())
            .write_u32(self.utxo.vout)
            .write_bytes_with_size(self.pubkey.as_bytes());
        StakeId(w.finalize())
    }

    /// Digest the stake owner signs.
    pub fn signing_hash(&self, commitment: &StakeCommitment) -> Hash256 {
        let mut w = HashWriter::new();
        w.write(commitment.0.as_bytes());
        self.hash_into(&mut w);
        w.finalize()
    }

    pub(crate) fn hash_into(&self, w: &mut HashWriter) {
        w.write(self.utxo.txid.as_bytes())
            .write_u32(self.utxo.vout)
            .write_u64(self.amount)
            .write_u32(self.height_and_coinbase)
            .write_bytes_with_size(self.pubkey.as_bytes());
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.utxo.txid.as_bytes());
        buf.extend_from_slice(&self.utxo.vout.to_le_bytes());
        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.height_and_coinbase.to_le_bytes());
        write_bytes_with_size(buf, self.pubkey.as_bytes());
    }

    pub fn decode_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let txid = TxId::from_array(read_array::<32>(cursor)?);
        let vout = cursor.read_u32::<LittleEndian>()?;
        let amount = cursor.read_u64::<LittleEndian>()?;
        let height_and_coinbase = cursor.read_u32::<LittleEndian>()?;
        let pubkey = PubKey::from_slice(&read_bytes_with_size(cursor)?)?;
        Ok(Self {
            utxo: OutPoint::new(txid, vout),
            amount,
            height_and_coinbase,
            pubkey,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedStake {
    stake: Stake,
    sig: SchnorrSig,
}

impl SignedStake {
    pub fn new(stake: Stake, sig: SchnorrSig) -> Self {
        Self { stake, sig }
    }

    /// Signs with `key`. A key that cannot sign yields the all-zero
    /// signature; the stake then fails verification later.
    pub fn sign(stake: Stake, key: &PrivKey, commitment: &StakeCommitment) -> Self {
        let sig = key.sign(&stake.signing_hash(commitment)).unwrap_or(SchnorrSig::ZERO);
        Self { stake, sig }
    }

    pub fn stake(&self) -> &Stake {
        &self.stake
    }

    pub fn signature(&self) -> &SchnorrSig {
        &self.sig
    }

    pub fn verify(&self, commitment: &StakeCommitment) -> bool {
        self.stake.pubkey.verify(&self.stake.signing_hash(commitment), &self.sig)
    }

    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        self.stake.encode_into(buf);
        buf.extend_from_slice(&self.sig.0);
    }

    pub fn decode_from(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let stake = Stake::decode_from(cursor)?;
        let sig = SchnorrSig(read_array::<SIGNATURE_SIZE>(cursor)?);
        Ok(Self { stake, sig })
    }
}
