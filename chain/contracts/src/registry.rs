//! Validator Registry: per-epoch committee commitments
//!
//! A committee is an ordered list of validators, each with a hot key (signs
//! withdrawals and rotations), a cold key (signs governance) and a voting
//! power. The registry stores only the commitment hashes, one history entry
//! per epoch, never deleted:
//!
//! `keccak256(abi.encode(epoch, address[] keys, uint64[] powers))`
//!
//! computed once over the hot column and once over the cold column. Callers
//! supply the full set with every authorized action; it is checked against
//! the committed hash before any signature is looked at.

use bridge_types::ids::{Address, H256};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::abi::{self, Token};
use crate::digest::keccak256;
use crate::errors::RegistryError;
use crate::message::UPDATE_VALIDATOR_SET_TAG;

/// One committee member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Validator {
    pub hot: Address,
    pub cold: Address,
    pub power: u64,
}

impl Validator {
    /// Create a validator entry.
    pub fn new(hot: Address, cold: Address, power: u64) -> Self {
        Self { hot, cold, power }
    }
}

/// Which key column of the committee signs an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Committee {
    /// Withdrawals and committee rotation
    Hot,
    /// Governance (dispute period)
    Cold,
}

/// A validated committee for one epoch.
///
/// Only constructible through [`ValidatorSet::new`], so every instance is
/// non-empty with unique non-zero keys, positive powers and a total that
/// fits in `u64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorSet {
    epoch: u64,
    validators: Vec<Validator>,
    total_power: u64,
}

impl ValidatorSet {
    pub fn new(epoch: u64, validators: Vec<Validator>) -> Result<Self, RegistryError> {
        if validators.is_empty() {
            return Err(RegistryError::EmptySet);
        }

        let mut hot_seen = HashSet::with_capacity(validators.len());
        let mut cold_seen = HashSet::with_capacity(validators.len());
        let mut total: u64 = 0;

        for (index, v) in validators.iter().enumerate() {
            if v.hot.is_zero() || v.cold.is_zero() {
                return Err(RegistryError::ZeroAddress { index });
            }
            if v.power == 0 {
                return Err(RegistryError::ZeroPower { index });
            }
            if !hot_seen.insert(v.hot) {
                return Err(RegistryError::DuplicateAddress(v.hot));
            }
            if !cold_seen.insert(v.cold) {
                return Err(RegistryError::DuplicateAddress(v.cold));
            }
            total = total
                .checked_add(v.power)
                .ok_or(RegistryError::PowerOverflow)?;
        }

        Ok(Self {
            epoch,
            validators,
            total_power: total,
        })
    }

    /// Build from the three parallel columns of the wire format.
    pub fn from_parts(
        epoch: u64,
        hot: &[Address],
        cold: &[Address],
        powers: &[u64],
    ) -> Result<Self, RegistryError> {
        if hot.len() != cold.len() || hot.len() != powers.len() {
            return Err(RegistryError::LengthMismatch {
                hot: hot.len(),
                cold: cold.len(),
                powers: powers.len(),
            });
        }
        let validators = hot
            .iter()
            .zip(cold)
            .zip(powers)
            .map(|((h, c), p)| Validator::new(*h, *c, *p))
            .collect();
        Self::new(epoch, validators)
    }

    /// Epoch this set belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Validators in slot order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Check if the set has no validators.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Sum of all validator powers.
    pub fn total_power(&self) -> u64 {
        self.total_power
    }

    /// One key column in slot order.
    pub fn keys(&self, committee: Committee) -> Vec<Address> {
        self.validators
            .iter()
            .map(|v| match committee {
                Committee::Hot => v.hot,
                Committee::Cold => v.cold,
            })
            .collect()
    }

    /// Powers in slot order.
    pub fn powers(&self) -> Vec<u64> {
        self.validators.iter().map(|v| v.power).collect()
    }

    /// Commitment over one key column.
    pub fn hash(&self, committee: Committee) -> H256 {
        let keys = self.keys(committee);
        let powers = self.powers();
        keccak256(abi::encode(&[
            Token::Uint(u128::from(self.epoch)),
            Token::AddressArray(&keys),
            Token::UintArray(&powers),
        ]))
    }

    /// Commitment over the hot keys.
    pub fn hot_hash(&self) -> H256 {
        self.hash(Committee::Hot)
    }

    /// Commitment over the cold keys.
    pub fn cold_hash(&self) -> H256 {
        self.hash(Committee::Cold)
    }

    /// `keccak256(abi.encode("updateValidatorSet", epoch, hot[], cold[], powers[]))`
    pub fn update_action_data(&self) -> H256 {
        let hot = self.keys(Committee::Hot);
        let cold = self.keys(Committee::Cold);
        let powers = self.powers();
        keccak256(abi::encode(&[
            Token::String(UPDATE_VALIDATOR_SET_TAG),
            Token::Uint(u128::from(self.epoch)),
            Token::AddressArray(&hot),
            Token::AddressArray(&cold),
            Token::UintArray(&powers),
        ]))
    }
}

/// A committed epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetCommitment {
    pub epoch: u64,
    pub hot_hash: H256,
    pub cold_hash: H256,
    pub total_power: u64,
    pub validator_count: usize,
    pub committed_at: u64,
}

impl SetCommitment {
    pub fn hash(&self, committee: Committee) -> H256 {
        match committee {
            Committee::Hot => self.hot_hash,
            Committee::Cold => self.cold_hash,
        }
    }
}

/// Append-only epoch → commitment history.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    history: BTreeMap<u64, SetCommitment>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `set` as the new current committee.
    ///
    /// The first commit may use any epoch; every later one must be strictly
    /// greater than the current epoch.
    pub fn commit(&mut self, set: &ValidatorSet, now: u64) -> Result<SetCommitment, RegistryError> {
        if let Some(current) = self.latest_epoch() {
            if set.epoch() <= current {
                return Err(RegistryError::NonMonotonicEpoch {
                    current,
                    proposed: set.epoch(),
                });
            }
        }

        let commitment = SetCommitment {
            epoch: set.epoch(),
            hot_hash: set.hot_hash(),
            cold_hash: set.cold_hash(),
            total_power: set.total_power(),
            validator_count: set.len(),
            committed_at: now,
        };
        self.history.insert(set.epoch(), commitment.clone());
        Ok(commitment)
    }

    /// Highest committed epoch.
    pub fn current_epoch(&self) -> Result<u64, RegistryError> {
        self.latest_epoch().ok_or(RegistryError::NoCommittee)
    }

    /// Commitment of the highest epoch.
    pub fn current_commitment(&self) -> Result<&SetCommitment, RegistryError> {
        self.history
            .values()
            .next_back()
            .ok_or(RegistryError::NoCommittee)
    }

    /// Commitment stored for `epoch`.
    pub fn commitment(&self, epoch: u64) -> Result<&SetCommitment, RegistryError> {
        self.history
            .get(&epoch)
            .ok_or(RegistryError::UnknownEpoch(epoch))
    }

    /// Hot-key commitment of `epoch`.
    pub fn set_hash(&self, epoch: u64) -> Result<H256, RegistryError> {
        self.commitment(epoch).map(|c| c.hot_hash)
    }

    /// Cold-key hash stored for `epoch`.
    pub fn cold_set_hash(&self, epoch: u64) -> Result<H256, RegistryError> {
        self.commitment(epoch).map(|c| c.cold_hash)
    }

    /// All committed epochs, ascending.
    pub fn committed_epochs(&self) -> Vec<u64> {
        self.history.keys().copied().collect()
    }

    fn latest_epoch(&self) -> Option<u64> {
        self.history.keys().next_back().copied()
    }
}
