// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Stake-backed proofs: identity, scoring, verification and wire format.

pub mod builder;
pub mod stake;
pub mod validation;

pub use builder::ProofBuilder;
pub use stake::{SignedStake, Stake, StakeCommitment};
pub use validation::{ProofValidationResult, ProofValidationState};

use crate::chain::UtxoView;
use crate::codec::{
    ensure_consumed, read_array, read_bytes_with_size, read_compact_size, write_bytes_with_size,
    write_compact_size,
};
use crate::config::{MAX_PROOF_STAKES, SCORE_UNIT};
use crate::crypto::key::SIGNATURE_SIZE;
use crate::crypto::{HashWriter, PrivKey, PubKey, SchnorrSig};
use crate::error::{KernelError, Result};
use crate::index::radix::RadixLeaf;
use crate::types::{Amount, LimitedProofId, OutPoint, ProofId, Script};
use byteorder::{LittleEndian, ReadBytesExt};
use core::cmp::Ordering;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;

/// Proofs are shared between the index, the pools and peer records.
pub type ProofRef = Arc<Proof>;

/// Legacy proofs leave the payout script out of both the id and the wire encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProofFormat {
    #[default]
    Standard,
    Legacy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    sequence: u64,
    expiration_time: i64,
    master: PubKey,
    payout_script: Script,
    stakes: Vec<SignedStake>,
    format: ProofFormat,
    /// Master key signature over the LimitedProofId. Absent from legacy proofs.
    signature: SchnorrSig,
    limited_id: LimitedProofId,
    proof_id: ProofId,
    score: u32,
}

pub fn amount_to_score(amount: Amount) -> u32 {
    u32::try_from(amount / SCORE_UNIT).unwrap_or(u32::MAX)
}

pub fn compute_limited_proof_id(
    sequence: u64,
    expiration_time: i64,
    payout_script: &Script,
    stakes: &[Stake],
    format: ProofFormat,
) -> LimitedProofId {
    let mut w = HashWriter::new();
    w.write_u64(sequence).write_i64(expiration_time);
    if format == ProofFormat::Standard {
        w.write_bytes_with_size(payout_script.as_bytes());
    }
    w.write_compact_size(stakes.len() as u64);
    for stake in stakes {
        stake.hash_into(&mut w);
    }
    LimitedProofId(w.finalize())
}

pub fn compute_proof_id(limited_id: &LimitedProofId, master: &PubKey) -> ProofId {
    let mut w = HashWriter::new();
    w.write(limited_id.as_bytes()).write_bytes_with_size(master.as_bytes());
    ProofId(w.finalize())
}

impl Proof {
    /// Assembles a proof from already signed stakes and caches its id and score.
    pub fn from_parts(
        sequence: u64,
        expiration_time: i64,
        master: PubKey,
        payout_script: Script,
        stakes: Vec<SignedStake>,
        format: ProofFormat,
        signature: SchnorrSig,
    ) -> Self {
        let unsigned: Vec<Stake> = stakes.iter().map(|s| *s.stake()).collect();
        let limited_id = compute_limited_proof_id(sequence, expiration_time, &payout_script, &unsigned, format);
        let proof_id = compute_proof_id(&limited_id, &master);
        let total: Amount = unsigned.iter().fold(0, |acc, s| acc.saturating_add(s.amount()));
        Self {
            sequence,
            expiration_time,
            master,
            payout_script,
            stakes,
            format,
            signature,
            limited_id,
            proof_id,
            score: amount_to_score(total),
        }
    }

    pub fn id(&self) -> &ProofId {
        &self.proof_id
    }

    pub fn limited_id(&self) -> &LimitedProofId {
        &self.limited_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn expiration_time(&self) -> i64 {
        self.expiration_time
    }

    pub fn master(&self) -> &PubKey {
        &self.master
    }

    pub fn payout_script(&self) -> &Script {
        &self.payout_script
    }

    pub fn stakes(&self) -> &[SignedStake] {
        &self.stakes
    }

    pub fn format(&self) -> ProofFormat {
        self.format
    }

    pub fn signature(&self) -> &SchnorrSig {
        &self.signature
    }

    /// Replaces the master signature with one made by `master` over the
    /// LimitedProofId. Legacy proofs carry no master signature.
    pub fn signed_by(mut self, master: &PrivKey) -> Self {
        if self.format == ProofFormat::Standard {
            self.signature = master.sign(&self.limited_id.0).unwrap_or(SchnorrSig::ZERO);
        }
        self
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn staked_amount(&self) -> Amount {
        self.stakes.iter().fold(0, |acc, s| acc.saturating_add(s.stake().amount()))
    }

    pub fn commitment(&self) -> StakeCommitment {
        StakeCommitment::new(&self.proof_id)
    }

    /// Checks that need no chain state.
    ///
    /// Each check is a separate pass so that, when several problems coexist,
    /// the reported one is fixed: no stake, too many stakes, dust, duplicate
    /// outpoint, stake order, master signature, stake signature.
    pub fn verify(&self, dust_threshold: Amount, state: &mut ProofValidationState) -> bool {
        if self.stakes.is_empty() {
            return state.invalid(ProofValidationResult::NoStake, "no-stake", "");
        }

        if self.stakes.len() > MAX_PROOF_STAKES {
            return state.invalid(
                ProofValidationResult::TooManyStakes,
                "too-many-utxos",
                format!("{} > {}", self.stakes.len(), MAX_PROOF_STAKES),
            );
        }

        if let Some(dust) = self.stakes.iter().find(|s| s.stake().amount() < dust_threshold) {
            return state.invalid(
                ProofValidationResult::DustThreshold,
                "amount-below-dust-threshold",
                format!("{} < {}", dust.stake().amount(), dust_threshold),
            );
        }

        let mut seen: BTreeSet<&OutPoint> = BTreeSet::new();
        if let Some(dup) = self.stakes.iter().find(|s| !seen.insert(s.stake().utxo())) {
            return state.invalid(
                ProofValidationResult::DuplicateStake,
                "duplicated-stake",
                dup.stake().utxo().to_string(),
            );
        }

        if let Some(pair) = self.stakes.windows(2).find(|w| w[1].stake().id() < w[0].stake().id()) {
            return state.invalid(
                ProofValidationResult::WrongStakeOrdering,
                "wrong-stake-ordering",
                pair[1].stake().utxo().to_string(),
            );
        }

        if self.format == ProofFormat::Standard && !self.master.verify(&self.limited_id.0, &self.signature) {
            return state.invalid(ProofValidationResult::InvalidProofSignature, "invalid-proof-signature", "");
        }

        let commitment = self.commitment();
        if let Some(bad) = self.stakes.iter().find(|s| !s.verify(&commitment)) {
            return state.invalid(
                ProofValidationResult::InvalidSignature,
                "invalid-stake-signature",
                bad.stake().utxo().to_string(),
            );
        }

        true
    }

    /// Intrinsic checks, then expiry and every stake against chain state.
    pub fn verify_with_utxos(
        &self,
        dust_threshold: Amount,
        chain: &dyn UtxoView,
        stake_utxo_confirmations: u32,
        state: &mut ProofValidationState,
    ) -> bool {
        if !self.verify(dust_threshold, state) {
            return false;
        }

        if self.expiration_time > 0 && chain.tip_time() >= self.expiration_time {
            return state.invalid(
                ProofValidationResult::Expired,
                "expired-proof",
                format!("expiration {} <= tip time {}", self.expiration_time, chain.tip_time()),
            );
        }

        let tip_height = chain.tip_height() as u64;
        for signed in &self.stakes {
            let stake = signed.stake();
            let utxo = stake.utxo();
            let Some(coin) = chain.coin(utxo) else {
                return state.invalid(ProofValidationResult::MissingUtxo, "utxo-missing-or-spent", utxo.to_string());
            };

            if coin.is_coinbase != stake.is_coinbase() {
                return state.invalid(ProofValidationResult::CoinbaseMismatch, "coinbase-mismatch", utxo.to_string());
            }
            if coin.height != stake.height() {
                return state.invalid(
                    ProofValidationResult::HeightMismatch,
                    "height-mismatch",
                    format!("expected {}, found {}", stake.height(), coin.height),
                );
            }
            if coin.amount != stake.amount() {
                return state.invalid(
                    ProofValidationResult::AmountMismatch,
                    "amount-mismatch",
                    format!("expected {}, found {}", stake.amount(), coin.amount),
                );
            }
            if coin.pubkey != *stake.pubkey() {
                return state.invalid(ProofValidationResult::PubkeyMismatch, "destination-mismatch", utxo.to_string());
            }

            let confirmations = stake_utxo_confirmations.max(1) as u64;
            if stake.height() as u64 + confirmations - 1 > tip_height {
                return state.invalid(
                    ProofValidationResult::ImmatureUtxo,
                    "immature-proof",
                    format!("{} at height {}", utxo, stake.height()),
                );
            }
        }

        true
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.expiration_time.to_le_bytes());
        write_bytes_with_size(&mut buf, self.master.as_bytes());
        write_compact_size(&mut buf, self.stakes.len() as u64);
        for stake in &self.stakes {
            stake.encode_into(&mut buf);
        }
        if self.format == ProofFormat::Standard {
            write_bytes_with_size(&mut buf, self.payout_script.as_bytes());
            buf.extend_from_slice(&self.signature.0);
        }
        buf
    }

    pub fn decode(data: &[u8], format: ProofFormat) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let proof = Self::decode_from(&mut cursor, format)?;
        ensure_consumed(&cursor)?;
        Ok(proof)
    }

    pub fn decode_from(cursor: &mut Cursor<&[u8]>, format: ProofFormat) -> Result<Self> {
        let sequence = cursor.read_u64::<LittleEndian>()?;
        let expiration_time = cursor.read_i64::<LittleEndian>()?;
        let master = PubKey::from_slice(&read_bytes_with_size(cursor)?)?;

        let count = read_compact_size(cursor)?;
        if count > MAX_PROOF_STAKES as u64 {
            return Err(KernelError::TooManyStakes(count));
        }
        let mut stakes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            stakes.push(SignedStake::decode_from(cursor)?);
        }

        let (payout_script, signature) = match format {
            ProofFormat::Standard => {
                let script = Script(read_bytes_with_size(cursor)?);
                (script, SchnorrSig(read_array::<SIGNATURE_SIZE>(cursor)?))
            }
            ProofFormat::Legacy => (Script::default(), SchnorrSig::ZERO),
        };

        Ok(Self::from_parts(sequence, expiration_time, master, payout_script, stakes, format, signature))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    pub fn from_hex(s: &str, format: ProofFormat) -> Result<Self> {
        Self::decode(&hex::decode(s)?, format)
    }
}

impl RadixLeaf for Proof {
    fn radix_key(&self) -> [u8; 32] {
        *self.proof_id.as_bytes()
    }
}

/// Score descending, then ProofId ascending. A strict total order.
pub fn compare_by_score(lhs: &Proof, rhs: &Proof) -> Ordering {
    rhs.score.cmp(&lhs.score).then_with(|| lhs.proof_id.cmp(&rhs.proof_id))
}

/// True when `candidate` should win a UTXO conflict against `reference`.
///
/// Same master: the higher sequence wins. Otherwise the higher score, then
/// fewer stakes, then the lower id.
pub fn is_preferred_over(candidate: &Proof, reference: &Proof) -> bool {
    if candidate.master == reference.master && candidate.sequence != reference.sequence {
        return candidate.sequence > reference.sequence;
    }
    if candidate.score != reference.score {
        return candidate.score > reference.score;
    }
    if candidate.stakes.len() != reference.stakes.len() {
        return candidate.stakes.len() < reference.stakes.len();
    }
    candidate.proof_id < reference.proof_id
}
