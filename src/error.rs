// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Non-canonical compact size: {0}")]
    NonCanonicalCompactSize(u64),

    #[error("Invalid key length: expected {expected}, found {found}")]
    InvalidKeyLength { expected: usize, found: usize },

    #[error("Field too large: limit {limit}, found {found}")]
    OversizedField { limit: u64, found: u64 },

    #[error("Too many stakes: {0}")]
    TooManyStakes(u64),

    #[error("Too many delegation levels: {0}")]
    TooManyLevels(u64),

    #[error("Invalid prefilled proof index: {0}")]
    InvalidPrefilledIndex(u64),

    #[error("Trailing bytes after payload: {0}")]
    TrailingBytes(usize),
}

pub type Result<T> = std::result::Result<T, KernelError>;
