//! Bridge error types
//!
//! One enum per component. Composite operations wrap component errors via
//! `#[from]` so callers can match on the exact failure kind:
//! input validation, authorization (quorum), state conflict, or asset failure.

use bridge_types::ids::{Address, H256};
use thiserror::Error;

use crate::message::WithdrawalMessage;

/// Signature construction and recovery errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Signature scalars out of range")]
    InvalidScalars,

    #[error("Public key recovery failed")]
    RecoveryFailed,

    #[error("Signing failed")]
    SigningFailed,
}

/// Committee authorization errors. All are terminal for the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuorumError {
    #[error("Validator set mismatch: committed {expected}, supplied {actual}")]
    ValidatorSetMismatch { expected: H256, actual: H256 },

    #[error("Signature order mismatch at slot {slot}")]
    SignatureOrderMismatch { slot: usize },

    #[error("Insufficient quorum: signed power {signed}, required {required}")]
    InsufficientQuorum { signed: u64, required: u64 },
}

/// Validator registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Validator set is empty")]
    EmptySet,

    #[error("Length mismatch: {hot} hot, {cold} cold, {powers} powers")]
    LengthMismatch {
        hot: usize,
        cold: usize,
        powers: usize,
    },

    #[error("Duplicate validator address: {0}")]
    DuplicateAddress(Address),

    #[error("Zero validator address at index {index}")]
    ZeroAddress { index: usize },

    #[error("Zero power at index {index}")]
    ZeroPower { index: usize },

    #[error("Total committee power overflows u64")]
    PowerOverflow,

    #[error("Epoch must increase: current {current}, proposed {proposed}")]
    NonMonotonicEpoch { current: u64, proposed: u64 },

    #[error("Unknown epoch: {0}")]
    UnknownEpoch(u64),

    #[error("No validator set committed")]
    NoCommittee,

    #[error("Unauthorized: {caller} is not admin")]
    Unauthorized { caller: Address },
}

/// Locker set and halt-vote errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockerError {
    #[error("No locker set committed")]
    NoLockerSet,

    #[error("Invalid threshold {threshold} for {lockers} lockers")]
    InvalidThreshold { threshold: u32, lockers: usize },

    #[error("Duplicate locker: {0}")]
    DuplicateLocker(Address),

    #[error("Zero locker address at index {index}")]
    ZeroAddress { index: usize },

    #[error("Locker epoch must increase: current {current}, proposed {proposed}")]
    NonMonotonicEpoch { current: u64, proposed: u64 },

    #[error("Not a locker: {0}")]
    NotALocker(Address),

    #[error("Locker {0} already voted")]
    DuplicateVote(Address),

    #[error("Unauthorized: {caller} is not admin")]
    Unauthorized { caller: Address },
}

/// Errors raised by the asset capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Permit expired: deadline {deadline}, now {now}")]
    PermitExpired { deadline: u64, now: u64 },

    #[error("Invalid permit signature")]
    InvalidPermitSignature,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: u64, available: u64 },

    #[error("Zero address")]
    ZeroAddress,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Batch-level deposit errors. Per-item failures are data, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    #[error("Empty batch: no deposits to process")]
    EmptyBatch,

    #[error("Invalid deposit at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("Bridge is paused")]
    Paused,
}

/// Withdrawal lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalError {
    #[error("Invalid withdrawal amount: must be positive")]
    InvalidAmount,

    #[error("Zero address in withdrawal intent")]
    ZeroAddress,

    #[error("Bridge is paused")]
    Paused,

    #[error("Withdrawal already requested: {message}")]
    AlreadyRequested { message: WithdrawalMessage },

    #[error("Withdrawal not requested: {message}")]
    NotRequested { message: WithdrawalMessage },

    #[error("Withdrawal already finalized: {message}")]
    AlreadyFinalized { message: WithdrawalMessage },

    #[error("Dispute period not elapsed: finalizable at {available_at}")]
    NotYetFinalizable { available_at: u64 },

    #[error("Withdrawal halted: {message}")]
    Halted { message: WithdrawalMessage },

    #[error("Quorum error: {0}")]
    Quorum(#[from] QuorumError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Locker error: {0}")]
    Locker(#[from] LockerError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Committee-signed governance errors (rotation, dispute period).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Dispute period {value}s outside [{min}, {max}]")]
    DisputePeriodOutOfRange { value: u64, min: u64, max: u64 },

    #[error("Action already executed: {0}")]
    ActionReplayed(H256),

    #[error("No pending validator set update")]
    NoPendingUpdate,

    #[error("Validator set update not ready: available at {available_at}")]
    UpdateNotReady { available_at: u64 },

    #[error("Validator set update approved by epoch {approved_by_epoch}, current is {current_epoch}")]
    StaleUpdate {
        approved_by_epoch: u64,
        current_epoch: u64,
    },

    #[error("Quorum error: {0}")]
    Quorum(#[from] QuorumError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Role-gated operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Unauthorized: {caller} lacks the required role")]
    Unauthorized { caller: Address },
}

/// Configuration loading and validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Bridge address must be non-zero")]
    ZeroBridgeAddress,

    #[error("Admin address must be non-zero")]
    ZeroAdmin,

    #[error("Chain id must be non-zero")]
    ZeroChainId,

    #[error("Dispute period {value}s outside [{min}, {max}]")]
    DisputePeriodOutOfRange { value: u64, min: u64, max: u64 },
}
