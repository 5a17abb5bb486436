//! Asset capability consumed by the bridge
//!
//! The bridge never owns token logic; it calls `permit`, `transfer_from`,
//! `transfer` and `balance_of` through [`AssetCapability`] and treats every
//! call as fallible.
//!
//! [`LedgerAsset`] is an in-memory token with EIP-2612 permits, used as the
//! default custody asset and in tests.

use bridge_types::ids::{Address, H256};
use std::collections::HashMap;

use crate::abi::{self, Token};
use crate::digest::{keccak256, Eip712Domain};
use crate::errors::AssetError;
use crate::signature::Signature;

/// EIP-2612 permit struct type string.
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// Operations the bridge needs from the custodied token.
pub trait AssetCapability {
    /// Let `spender` move `value` of `owner`'s balance, authorized by
    /// `owner`'s signature. Fails once `now` is past `deadline`.
    fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: u64,
        deadline: u64,
        signature: &Signature,
        now: u64,
    ) -> Result<(), AssetError>;

    /// Move `value` from `from` to `to` against `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: u64,
    ) -> Result<(), AssetError>;

    /// Move `value` out of `from`'s own balance.
    fn transfer(&mut self, from: Address, to: Address, value: u64) -> Result<(), AssetError>;

    fn balance_of(&self, account: &Address) -> u64;
}

/// In-memory permit-capable token.
#[derive(Debug, Clone)]
pub struct LedgerAsset {
    domain: Eip712Domain,
    balances: HashMap<Address, u64>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), u64>,
    nonces: HashMap<Address, u64>,
}

impl LedgerAsset {
    /// Token at `token` whose permit domain is `(name, "1", chain_id, token)`.
    pub fn new(token: Address, name: &str, chain_id: u64) -> Self {
        Self {
            domain: Eip712Domain::new(name, "1", chain_id, token),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            nonces: HashMap::new(),
        }
    }

    /// Credit `amount` out of thin air.
    pub fn mint(&mut self, to: Address, amount: u64) -> Result<(), AssetError> {
        if to.is_zero() {
            return Err(AssetError::ZeroAddress);
        }
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(AssetError::Overflow)?;
        Ok(())
    }

    pub fn nonce_of(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Digest `owner` signs to authorize a permit at `nonce`.
    pub fn permit_digest(
        &self,
        owner: Address,
        spender: Address,
        value: u64,
        nonce: u64,
        deadline: u64,
    ) -> H256 {
        let struct_hash = keccak256(abi::encode(&[
            Token::Bytes32(keccak256(PERMIT_TYPE)),
            Token::Address(owner),
            Token::Address(spender),
            Token::Uint(u128::from(value)),
            Token::Uint(u128::from(nonce)),
            Token::Uint(u128::from(deadline)),
        ]));
        self.domain.digest(&struct_hash)
    }

    fn move_balance(&mut self, from: Address, to: Address, value: u64) -> Result<(), AssetError> {
        if from.is_zero() || to.is_zero() {
            return Err(AssetError::ZeroAddress);
        }
        let available = self.balance_of(&from);
        let new_from = available
            .checked_sub(value)
            .ok_or(AssetError::InsufficientBalance {
                required: value,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let new_to = self
            .balance_of(&to)
            .checked_add(value)
            .ok_or(AssetError::Overflow)?;

        self.balances.insert(from, new_from);
        self.balances.insert(to, new_to);
        Ok(())
    }
}

impl AssetCapability for LedgerAsset {
    fn permit(
        &mut self,
        owner: Address,
        spender: Address,
        value: u64,
        deadline: u64,
        signature: &Signature,
        now: u64,
    ) -> Result<(), AssetError> {
        if now > deadline {
            return Err(AssetError::PermitExpired { deadline, now });
        }
        if owner.is_zero() || spender.is_zero() {
            return Err(AssetError::ZeroAddress);
        }

        let nonce = self.nonce_of(&owner);
        let digest = self.permit_digest(owner, spender, value, nonce, deadline);
        match signature.recover(&digest) {
            Ok(signer) if signer == owner => {}
            _ => return Err(AssetError::InvalidPermitSignature),
        }

        let next = nonce.checked_add(1).ok_or(AssetError::Overflow)?;
        self.nonces.insert(owner, next);
        self.allowances.insert((owner, spender), value);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: u64,
    ) -> Result<(), AssetError> {
        let allowed = self.allowance(&from, &spender);
        if allowed < value {
            return Err(AssetError::InsufficientAllowance {
                required: value,
                available: allowed,
            });
        }
        self.move_balance(from, to, value)?;
        self.allowances.insert((from, spender), allowed - value);
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, value: u64) -> Result<(), AssetError> {
        self.move_balance(from, to, value)
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}
