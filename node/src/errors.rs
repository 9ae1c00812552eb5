// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use avalanche_kernel::error::KernelError;
use avalanche_kernel::types::ProofId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown proof: {0}")]
    UnknownProof(ProofId),
    #[error("Invalid delegation: {0}")]
    InvalidDelegation(String),
    #[error("Processor state lock poisoned")]
    LockPoisoned,
    #[error("Telemetry init failed: {0}")]
    Telemetry(String),
}

pub type NodeResult<T> = Result<T, NodeError>;
