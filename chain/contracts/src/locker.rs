//! Emergency Halt (Locker) Gate
//!
//! A small, lower-trust committee that can block one pending withdrawal.
//! Votes are one-per-locker (not power weighted) and counted against the
//! locker epoch that was current when the vote was cast. A withdrawal is
//! halted once any epoch's tally for it reaches that epoch's threshold.

use bridge_types::ids::Address;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::errors::LockerError;
use crate::message::WithdrawalMessage;

/// Locker committee for one locker epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockerSet {
    epoch: u64,
    threshold: u32,
    lockers: Vec<Address>,
}

impl LockerSet {
    /// Requires `0 < threshold <= lockers.len()` and unique non-zero lockers.
    pub fn new(epoch: u64, threshold: u32, lockers: Vec<Address>) -> Result<Self, LockerError> {
        if threshold == 0 || threshold as usize > lockers.len() {
            return Err(LockerError::InvalidThreshold {
                threshold,
                lockers: lockers.len(),
            });
        }
        let mut seen = HashSet::with_capacity(lockers.len());
        for (index, locker) in lockers.iter().enumerate() {
            if locker.is_zero() {
                return Err(LockerError::ZeroAddress { index });
            }
            if !seen.insert(*locker) {
                return Err(LockerError::DuplicateLocker(*locker));
            }
        }
        Ok(Self {
            epoch,
            threshold,
            lockers,
        })
    }

    /// Locker epoch of this set.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Distinct votes needed to halt.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Member identities.
    pub fn lockers(&self) -> &[Address] {
        &self.lockers
    }

    /// Check if `who` is a member.
    pub fn contains(&self, who: &Address) -> bool {
        self.lockers.contains(who)
    }
}

/// Tally after a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HaltTally {
    pub locker_epoch: u64,
    pub votes: u32,
    pub threshold: u32,
}

impl HaltTally {
    /// Check if the threshold is met.
    pub fn reached(&self) -> bool {
        self.votes >= self.threshold
    }
}

/// Locker sets by epoch plus the vote book.
#[derive(Debug, Default)]
pub struct LockerGate {
    sets: BTreeMap<u64, LockerSet>,
    votes: HashMap<(WithdrawalMessage, u64), HashSet<Address>>,
}

impl LockerGate {
    /// Create a gate with no locker set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `set` as the current locker committee. Epochs only grow.
    pub fn commit_set(&mut self, set: LockerSet) -> Result<(), LockerError> {
        if let Some(current) = self.sets.keys().next_back().copied() {
            if set.epoch() <= current {
                return Err(LockerError::NonMonotonicEpoch {
                    current,
                    proposed: set.epoch(),
                });
            }
        }
        self.sets.insert(set.epoch(), set);
        Ok(())
    }

    /// Set with the highest locker epoch.
    pub fn current_set(&self) -> Result<&LockerSet, LockerError> {
        self.sets
            .values()
            .next_back()
            .ok_or(LockerError::NoLockerSet)
    }

    /// Set committed for `epoch`.
    pub fn set(&self, epoch: u64) -> Option<&LockerSet> {
        self.sets.get(&epoch)
    }

    /// Count `locker`'s vote to halt `message` under the current set.
    ///
    /// Eligibility of the message itself is checked by the caller.
    pub fn record_vote(
        &mut self,
        locker: Address,
        message: WithdrawalMessage,
    ) -> Result<HaltTally, LockerError> {
        let set = self.current_set()?;
        if !set.contains(&locker) {
            return Err(LockerError::NotALocker(locker));
        }
        let (locker_epoch, threshold) = (set.epoch(), set.threshold());

        let voters = self.votes.entry((message, locker_epoch)).or_default();
        if !voters.insert(locker) {
            return Err(LockerError::DuplicateVote(locker));
        }

        Ok(HaltTally {
            locker_epoch,
            votes: voters.len() as u32,
            threshold,
        })
    }

    /// Votes for `message` under the current locker epoch.
    pub fn votes(&self, message: &WithdrawalMessage) -> u32 {
        let Ok(set) = self.current_set() else {
            return 0;
        };
        self.votes
            .get(&(*message, set.epoch()))
            .map_or(0, |v| v.len() as u32)
    }

    /// Read-only check that `locker` could vote on `message` right now.
    pub fn check_can_vote(
        &self,
        locker: &Address,
        message: &WithdrawalMessage,
    ) -> Result<(), LockerError> {
        let set = self.current_set()?;
        if !set.contains(locker) {
            return Err(LockerError::NotALocker(*locker));
        }
        let already = self
            .votes
            .get(&(*message, set.epoch()))
            .is_some_and(|v| v.contains(locker));
        if already {
            return Err(LockerError::DuplicateVote(*locker));
        }
        Ok(())
    }
}
