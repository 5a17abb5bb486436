//! Bridge notifications
//!
//! Immutable records appended by bridge operations, in call order. Off-chain
//! observers (the balance ledger, alerting) consume them through
//! `Bridge::drain_events`.

use bridge_types::ids::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::message::WithdrawalMessage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequested {
    pub message: WithdrawalMessage,
    pub user: Address,
    pub destination: Address,
    pub amount: u64,
    pub nonce: u64,
    pub epoch: u64,
    pub requested_at: u64,
}

/// Funds released. Emitted exactly once per message, only on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalFinalized {
    pub user: Address,
    pub destination: Address,
    pub amount: u64,
    pub nonce: u64,
    pub message: WithdrawalMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaltVoted {
    pub message: WithdrawalMessage,
    pub locker: Address,
    pub locker_epoch: u64,
    pub votes: u32,
    pub threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalHalted {
    pub message: WithdrawalMessage,
    pub locker_epoch: u64,
    pub halted_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub user: Address,
    pub amount: u64,
}

/// One failed batch item. `error_code` is a `DepositErrorCode` discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositFailed {
    pub user: Address,
    pub amount: u64,
    pub error_code: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetCommitted {
    pub epoch: u64,
    pub hot_hash: H256,
    pub cold_hash: H256,
    pub total_power: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetUpdateRequested {
    pub epoch: u64,
    pub hot_hash: H256,
    pub cold_hash: H256,
    pub requested_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetUpdateFinalized {
    pub epoch: u64,
    pub hot_hash: H256,
    pub cold_hash: H256,
}

/// A pending rotation dropped because the admin committed `superseded_by`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetUpdateDiscarded {
    pub epoch: u64,
    pub approved_by_epoch: u64,
    pub superseded_by: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerSetCommitted {
    pub epoch: u64,
    pub threshold: u32,
    pub lockers: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputePeriodChanged {
    pub old_seconds: u64,
    pub new_seconds: u64,
}

/// All bridge notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    WithdrawalRequested(WithdrawalRequested),
    WithdrawalFinalized(WithdrawalFinalized),
    HaltVoted(HaltVoted),
    WithdrawalHalted(WithdrawalHalted),
    Deposited(Deposited),
    DepositFailed(DepositFailed),
    ValidatorSetCommitted(ValidatorSetCommitted),
    ValidatorSetUpdateRequested(ValidatorSetUpdateRequested),
    ValidatorSetUpdateFinalized(ValidatorSetUpdateFinalized),
    ValidatorSetUpdateDiscarded(ValidatorSetUpdateDiscarded),
    LockerSetCommitted(LockerSetCommitted),
    DisputePeriodChanged(DisputePeriodChanged),
    Paused { by: Address },
    Unpaused { by: Address },
    PauserGranted { account: Address },
    PauserRevoked { account: Address },
    AdminTransferred { from: Address, to: Address },
}
