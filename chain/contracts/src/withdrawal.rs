//! Withdrawal lifecycle: request, dispute window, halt, finalize
//!
//! ```text
//! Unrequested ──request──▶ Requested ──(now ≥ requested_at + period)──▶ Finalizable ──finalize──▶ Finalized
//!                               │                                              │
//!                               └───────────────── locker halt ────────────────┴──▶ Halted (terminal)
//! ```
//!
//! Records are keyed by `WithdrawalMessage` and never removed. Absence of a
//! record is the `Unrequested` state. `Finalizable` is not stored; it is the
//! time predicate evaluated on each query.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::WithdrawalError;
use crate::message::{WithdrawalIntent, WithdrawalMessage};

/// Lifecycle record of one requested withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub intent: WithdrawalIntent,
    /// Committee epoch that authorized the request
    pub epoch: u64,
    pub requested_at: u64,
    pub finalized_at: Option<u64>,
    pub halted: bool,
    pub halted_at: Option<u64>,
}

impl WithdrawalRecord {
    /// First instant at which finalization may succeed.
    pub fn finalizable_at(&self, dispute_period: u64) -> u64 {
        self.requested_at.saturating_add(dispute_period)
    }

    /// Check if funds were released.
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }
}

/// Derived state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    /// No record exists
    Unrequested,
    /// Inside the dispute window
    Requested,
    /// Window elapsed, not halted, not yet paid
    Finalizable,
    /// Blocked by lockers, permanently
    Halted,
    /// Paid out
    Finalized,
}

/// Message → record map with the transition guards.
#[derive(Debug, Default)]
pub struct WithdrawalLedger {
    records: HashMap<WithdrawalMessage, WithdrawalRecord>,
}

impl WithdrawalLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set the `Requested` record. Never overwrites.
    pub fn insert_requested(
        &mut self,
        message: WithdrawalMessage,
        intent: WithdrawalIntent,
        epoch: u64,
        now: u64,
    ) -> Result<&WithdrawalRecord, WithdrawalError> {
        use std::collections::hash_map::Entry;

        match self.records.entry(message) {
            Entry::Occupied(_) => Err(WithdrawalError::AlreadyRequested { message }),
            Entry::Vacant(slot) => Ok(slot.insert(WithdrawalRecord {
                intent,
                epoch,
                requested_at: now,
                finalized_at: None,
                halted: false,
                halted_at: None,
            })),
        }
    }

    /// Guards of `finalize`, in order: requested, not finalized, not halted,
    /// window elapsed.
    pub fn check_finalizable(
        &self,
        message: &WithdrawalMessage,
        dispute_period: u64,
        now: u64,
    ) -> Result<&WithdrawalRecord, WithdrawalError> {
        let record = self.existing(message)?;
        if record.is_finalized() {
            return Err(WithdrawalError::AlreadyFinalized { message: *message });
        }
        if record.halted {
            return Err(WithdrawalError::Halted { message: *message });
        }
        let available_at = record.finalizable_at(dispute_period);
        if now < available_at {
            return Err(WithdrawalError::NotYetFinalizable { available_at });
        }
        Ok(record)
    }

    pub fn mark_finalized(
        &mut self,
        message: &WithdrawalMessage,
        now: u64,
    ) -> Result<(), WithdrawalError> {
        let record = self
            .records
            .get_mut(message)
            .ok_or(WithdrawalError::NotRequested { message: *message })?;
        record.finalized_at = Some(now);
        Ok(())
    }

    /// A message may be halted while it is requested and unpaid.
    pub fn check_haltable(
        &self,
        message: &WithdrawalMessage,
    ) -> Result<&WithdrawalRecord, WithdrawalError> {
        let record = self.existing(message)?;
        if record.is_finalized() {
            return Err(WithdrawalError::AlreadyFinalized { message: *message });
        }
        if record.halted {
            return Err(WithdrawalError::Halted { message: *message });
        }
        Ok(record)
    }

    pub fn mark_halted(
        &mut self,
        message: &WithdrawalMessage,
        now: u64,
    ) -> Result<(), WithdrawalError> {
        let record = self
            .records
            .get_mut(message)
            .ok_or(WithdrawalError::NotRequested { message: *message })?;
        record.halted = true;
        record.halted_at = Some(now);
        Ok(())
    }

    /// Record stored for `message`.
    pub fn get(&self, message: &WithdrawalMessage) -> Option<&WithdrawalRecord> {
        self.records.get(message)
    }

    /// Derived lifecycle state at `now`.
    pub fn status(
        &self,
        message: &WithdrawalMessage,
        dispute_period: u64,
        now: u64,
    ) -> WithdrawalStatus {
        match self.records.get(message) {
            None => WithdrawalStatus::Unrequested,
            Some(r) if r.is_finalized() => WithdrawalStatus::Finalized,
            Some(r) if r.halted => WithdrawalStatus::Halted,
            Some(r) if now >= r.finalizable_at(dispute_period) => WithdrawalStatus::Finalizable,
            Some(_) => WithdrawalStatus::Requested,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn existing(&self, message: &WithdrawalMessage) -> Result<&WithdrawalRecord, WithdrawalError> {
        self.records
            .get(message)
            .ok_or(WithdrawalError::NotRequested { message: *message })
    }
}
