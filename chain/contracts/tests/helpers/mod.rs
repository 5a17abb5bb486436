//! Shared setup for the bridge integration tests
//!
//! Deterministic secp256k1 committees, a funded bridge over `LedgerAsset`,
//! and permit-signed deposit intents.

#![allow(dead_code)]

use bridge_contracts::asset::LedgerAsset;
use bridge_contracts::config::BridgeConfig;
use bridge_contracts::deposit::DepositIntent;
use bridge_contracts::message::WithdrawalIntent;
use bridge_contracts::registry::{Validator, ValidatorSet};
use bridge_contracts::signature::{signer_address, Signature};
use bridge_contracts::Bridge;
use bridge_types::ids::{Address, H256};
use k256::ecdsa::SigningKey;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Request time used by most scenarios.
pub const T0: u64 = 1_700_000_000;

pub const CHAIN_ID: u64 = 1337;

pub fn admin() -> Address {
    Address::new([0xad; 20])
}

pub fn bridge_address() -> Address {
    Address::new([0xb0; 20])
}

pub fn token_address() -> Address {
    Address::new([0xee; 20])
}

pub fn alice() -> Address {
    Address::new([0xa1; 20])
}

pub fn destination() -> Address {
    Address::new([0xde; 20])
}

// ============================================================================
// KEYS & COMMITTEES
// ============================================================================

/// Deterministic key: column tag, epoch and index are packed into the scalar.
pub fn key(column: u8, epoch: u64, index: usize) -> SigningKey {
    let mut bytes = [0u8; 32];
    bytes[0] = column;
    bytes[8..16].copy_from_slice(&epoch.to_be_bytes());
    bytes[24..32].copy_from_slice(&(index as u64 + 1).to_be_bytes());
    SigningKey::from_slice(&bytes).unwrap()
}

pub fn user_key(index: usize) -> SigningKey {
    key(0x30, 0, index)
}

pub fn locker(index: usize) -> Address {
    signer_address(&key(0x40, 0, index))
}

/// Validator set with its hot and cold private keys.
pub struct Committee {
    pub set: ValidatorSet,
    pub hot: Vec<SigningKey>,
    pub cold: Vec<SigningKey>,
}

impl Committee {
    pub fn new(epoch: u64, powers: &[u64]) -> Self {
        let hot: Vec<SigningKey> = (0..powers.len()).map(|i| key(0x10, epoch, i)).collect();
        let cold: Vec<SigningKey> = (0..powers.len()).map(|i| key(0x20, epoch, i)).collect();
        let validators = powers
            .iter()
            .enumerate()
            .map(|(i, p)| Validator::new(signer_address(&hot[i]), signer_address(&cold[i]), *p))
            .collect();
        Self {
            set: ValidatorSet::new(epoch, validators).unwrap(),
            hot,
            cold,
        }
    }

    /// Slot-aligned hot signatures, present only at `slots`.
    pub fn sign_hot(&self, digest: &H256, slots: &[usize]) -> Vec<Option<Signature>> {
        sign_slots(&self.hot, digest, slots)
    }

    pub fn sign_cold(&self, digest: &H256, slots: &[usize]) -> Vec<Option<Signature>> {
        sign_slots(&self.cold, digest, slots)
    }
}

fn sign_slots(keys: &[SigningKey], digest: &H256, slots: &[usize]) -> Vec<Option<Signature>> {
    (0..keys.len())
        .map(|i| {
            slots
                .contains(&i)
                .then(|| Signature::sign(&keys[i], digest).unwrap())
        })
        .collect()
}

// ============================================================================
// BRIDGE BUILDERS
// ============================================================================

pub fn config() -> BridgeConfig {
    BridgeConfig::new(bridge_address(), admin())
}

pub fn new_asset() -> LedgerAsset {
    LedgerAsset::new(token_address(), "USD Coin", CHAIN_ID)
}

/// Bridge with `custody` already held and epoch 0 committed.
pub fn setup_bridge(powers: &[u64], custody: u64) -> (Bridge<LedgerAsset>, Committee) {
    let mut asset = new_asset();
    if custody > 0 {
        asset.mint(bridge_address(), custody).unwrap();
    }
    let mut bridge = Bridge::new(config(), asset).unwrap();
    let committee = Committee::new(0, powers);
    bridge
        .commit_validator_set(&admin(), &committee.set, T0 - 1_000)
        .unwrap();
    (bridge, committee)
}

pub fn intent(amount: u64, nonce: u64) -> WithdrawalIntent {
    WithdrawalIntent::new(alice(), destination(), amount, nonce)
}

/// Permit-signed deposit of `amount` from `key`'s address into the bridge.
pub fn deposit_intent(
    asset: &LedgerAsset,
    key: &SigningKey,
    amount: u64,
    deadline: u64,
) -> DepositIntent {
    let user = signer_address(key);
    let digest = asset.permit_digest(user, bridge_address(), amount, asset.nonce_of(&user), deadline);
    DepositIntent {
        user,
        amount,
        deadline,
        signature: Signature::sign(key, &digest).unwrap(),
    }
}
