// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof validation outcomes.

use crate::validation::ValidationState;

/// Why a proof was rejected. `None` is the only valid value.
///
/// Intrinsic checks run first, in this priority order: `NoStake`,
/// `TooManyStakes`, `DustThreshold`, `DuplicateStake`, `WrongStakeOrdering`,
/// `InvalidProofSignature`, `InvalidSignature`.
/// The remaining kinds come from checking stakes against chain state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProofValidationResult {
    #[default]
    None,
    NoStake,
    TooManyStakes,
    DustThreshold,
    DuplicateStake,
    WrongStakeOrdering,
    InvalidProofSignature,
    InvalidSignature,
    Expired,
    MissingUtxo,
    CoinbaseMismatch,
    HeightMismatch,
    AmountMismatch,
    PubkeyMismatch,
    ImmatureUtxo,
}

impl ProofValidationResult {
    /// Failures that may clear once more blocks arrive.
    pub fn is_orphan(&self) -> bool {
        matches!(self, ProofValidationResult::MissingUtxo | ProofValidationResult::ImmatureUtxo)
    }
}

pub type ProofValidationState = ValidationState<ProofValidationResult>;
