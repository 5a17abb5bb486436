//! Batched Deposit Processor
//!
//! Each item runs `permit` then `transfer_from` into custody. A failing item
//! becomes a typed [`DepositOutcome::Failed`] and the loop moves on; it never
//! aborts the batch. Only malformed input (empty batch, zero amount, zero
//! user) rejects the whole call, and it does so before any permit is tried.

use bridge_types::ids::Address;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::asset::AssetCapability;
use crate::errors::{AssetError, DepositError};
use crate::signature::Signature;

/// A user's signed request to move `amount` into custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositIntent {
    pub user: Address,
    pub amount: u64,
    /// Permit deadline
    pub deadline: u64,
    /// Permit signature by `user`
    pub signature: Signature,
}

/// Per-item failure code carried in `DepositFailed` notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DepositErrorCode {
    PermitFailed = 0,
    TransferFailed = 1,
}

impl DepositErrorCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositOutcome {
    Deposited {
        user: Address,
        amount: u64,
    },
    Failed {
        user: Address,
        amount: u64,
        code: DepositErrorCode,
        cause: AssetError,
    },
}

impl DepositOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DepositOutcome::Deposited { .. })
    }
}

/// Outcomes in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DepositOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Indices of failed items.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| !o.is_success())
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of successfully deposited amounts.
    pub fn deposited_total(&self) -> u128 {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DepositOutcome::Deposited { amount, .. } => Some(u128::from(*amount)),
                DepositOutcome::Failed { .. } => None,
            })
            .sum()
    }
}

/// Reject malformed batches before anything touches the asset.
pub fn validate_batch(deposits: &[DepositIntent]) -> Result<(), DepositError> {
    if deposits.is_empty() {
        return Err(DepositError::EmptyBatch);
    }
    for (index, d) in deposits.iter().enumerate() {
        if d.amount == 0 {
            return Err(DepositError::InvalidItem {
                index,
                reason: "zero amount".to_string(),
            });
        }
        if d.user.is_zero() {
            return Err(DepositError::InvalidItem {
                index,
                reason: "zero user address".to_string(),
            });
        }
    }
    Ok(())
}

/// Process `deposits` into `custody`, in list order.
pub fn process_batch<A: AssetCapability>(
    asset: &mut A,
    custody: Address,
    deposits: &[DepositIntent],
    now: u64,
) -> Result<BatchReport, DepositError> {
    validate_batch(deposits)?;

    let outcomes = deposits
        .iter()
        .enumerate()
        .map(|(index, d)| process_one(asset, custody, index, d, now))
        .collect();

    Ok(BatchReport { outcomes })
}

fn process_one<A: AssetCapability>(
    asset: &mut A,
    custody: Address,
    index: usize,
    d: &DepositIntent,
    now: u64,
) -> DepositOutcome {
    let failed = |code: DepositErrorCode, cause: AssetError| {
        warn!(
            index,
            user = %d.user,
            amount = d.amount,
            error_code = code.as_u8(),
            error = %cause,
            "Deposit item failed"
        );
        DepositOutcome::Failed {
            user: d.user,
            amount: d.amount,
            code,
            cause,
        }
    };

    if let Err(e) = asset.permit(d.user, custody, d.amount, d.deadline, &d.signature, now) {
        return failed(DepositErrorCode::PermitFailed, e);
    }
    if let Err(e) = asset.transfer_from(custody, d.user, custody, d.amount) {
        return failed(DepositErrorCode::TransferFailed, e);
    }

    DepositOutcome::Deposited {
        user: d.user,
        amount: d.amount,
    }
}
