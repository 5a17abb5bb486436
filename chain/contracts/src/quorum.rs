//! Signature Quorum Verifier
//!
//! Checks that a slot-aligned list of signatures carries at least two
//! thirds of a committee's voting power over a digest.
//!
//! Order of checks, cheapest first:
//! 1. the supplied set hashes to the committed commitment
//! 2. every present signature recovers to the key at its own slot
//! 3. `signed * 3 >= total * 2`
//!
//! A single bad slot fails the whole verification. Nothing is skipped.

use bridge_types::ids::H256;
use serde::Serialize;
use tracing::debug;

use crate::errors::QuorumError;
use crate::registry::{Committee, ValidatorSet};
use crate::signature::Signature;

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuorumReport {
    pub signed_power: u64,
    pub total_power: u64,
    pub required_power: u64,
    pub signers: usize,
}

/// Smallest power satisfying the supermajority, `ceil(2 * total / 3)`.
pub fn required_power(total_power: u64) -> u64 {
    let doubled = u128::from(total_power) * 2;
    // at most 2 * u64::MAX / 3, always fits
    ((doubled + 2) / 3) as u64
}

pub fn has_supermajority(signed_power: u64, total_power: u64) -> bool {
    u128::from(signed_power) * 3 >= u128::from(total_power) * 2
}

/// Verify `signatures` over `digest` against `set`.
///
/// `committed` is the registry's hash for the column named by `committee`.
/// Slot `i` of `signatures` belongs to validator `i`; `None` means that
/// validator did not sign. A list shorter than the set leaves the trailing
/// validators unsigned; a longer one is rejected.
pub fn verify_quorum(
    digest: &H256,
    signatures: &[Option<Signature>],
    set: &ValidatorSet,
    committee: Committee,
    committed: &H256,
) -> Result<QuorumReport, QuorumError> {
    let supplied = set.hash(committee);
    if supplied != *committed {
        return Err(QuorumError::ValidatorSetMismatch {
            expected: *committed,
            actual: supplied,
        });
    }

    if signatures.len() > set.len() {
        return Err(QuorumError::SignatureOrderMismatch { slot: set.len() });
    }

    let mut signed_power: u64 = 0;
    let mut signers = 0usize;

    for (slot, (entry, validator)) in signatures.iter().zip(set.validators()).enumerate() {
        let Some(signature) = entry else {
            continue;
        };
        let expected = match committee {
            Committee::Hot => validator.hot,
            Committee::Cold => validator.cold,
        };
        match signature.recover(digest) {
            Ok(recovered) if recovered == expected => {
                // set total fits in u64, so any subset does too
                signed_power += validator.power;
                signers += 1;
            }
            _ => {
                debug!(slot, expected = %expected, "Signature does not match slot");
                return Err(QuorumError::SignatureOrderMismatch { slot });
            }
        }
    }

    let total_power = set.total_power();
    let required = required_power(total_power);
    if !has_supermajority(signed_power, total_power) {
        return Err(QuorumError::InsufficientQuorum {
            signed: signed_power,
            required,
        });
    }

    Ok(QuorumReport {
        signed_power,
        total_power,
        required_power: required,
        signers,
    })
}
