//! Canonical message encoder
//!
//! Binds an action to the bridge instance and to the committee's agent
//! signing convention:
//!
//! ```text
//! data         = keccak256(abi.encode(tag, fields...))
//! connectionId = keccak256(abi.encode(bridgeAddress, data))
//! message      = keccak256(abi.encode(AGENT_TYPEHASH, keccak256(source), connectionId))
//! ```
//!
//! `source` is the fixed network tag ("a" mainnet, "b" testnet). It keeps
//! bridge actions apart from every other action the same validator keys sign.

use bridge_types::ids::{Address, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::abi::{self, Token};
use crate::config::Network;
use crate::digest::keccak256;

/// Operation tag of a withdrawal request.
pub const REQUEST_WITHDRAWAL_TAG: &str = "requestWithdrawal";

/// Operation tag of a committee rotation.
pub const UPDATE_VALIDATOR_SET_TAG: &str = "updateValidatorSet";

/// Operation tag of a dispute period change.
pub const MODIFY_DISPUTE_PERIOD_TAG: &str = "modifyDisputePeriod";

/// Agent struct type string of the committee signing convention.
pub const AGENT_TYPE: &str = "Agent(string source,bytes32 connectionId)";

/// A user's intent to move custodied funds to `destination`.
///
/// `(user, nonce)` is chosen by the caller; uniqueness is enforced on the
/// resulting message, not on the nonce alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WithdrawalIntent {
    pub user: Address,
    pub destination: Address,
    pub amount: u64,
    pub nonce: u64,
}

impl WithdrawalIntent {
    pub fn new(user: Address, destination: Address, amount: u64, nonce: u64) -> Self {
        Self {
            user,
            destination,
            amount,
            nonce,
        }
    }

    /// `keccak256(abi.encode("requestWithdrawal", user, destination, amount, nonce))`
    pub fn action_data(&self) -> H256 {
        keccak256(abi::encode(&[
            Token::String(REQUEST_WITHDRAWAL_TAG),
            Token::Address(self.user),
            Token::Address(self.destination),
            Token::Uint(u128::from(self.amount)),
            Token::Uint(u128::from(self.nonce)),
        ]))
    }
}

/// 32-byte identifier of a withdrawal: signature target, status key and
/// lifecycle record key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WithdrawalMessage(H256);

impl WithdrawalMessage {
    pub fn as_h256(&self) -> &H256 {
        &self.0
    }
}

impl From<H256> for WithdrawalMessage {
    fn from(hash: H256) -> Self {
        Self(hash)
    }
}

impl fmt::Display for WithdrawalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for WithdrawalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WithdrawalMessage({})", self.0)
    }
}

/// `keccak256(abi.encode("modifyDisputePeriod", newPeriod, nonce))`
pub fn dispute_period_action_data(new_period_seconds: u64, nonce: u64) -> H256 {
    keccak256(abi::encode(&[
        Token::String(MODIFY_DISPUTE_PERIOD_TAG),
        Token::Uint(u128::from(new_period_seconds)),
        Token::Uint(u128::from(nonce)),
    ]))
}

/// Wraps action data into agent messages for one bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageEncoder {
    bridge: Address,
    network: Network,
}

impl MessageEncoder {
    pub fn new(bridge: Address, network: Network) -> Self {
        Self { bridge, network }
    }

    pub fn bridge(&self) -> Address {
        self.bridge
    }

    /// `keccak256(abi.encode(bridge, data))`
    pub fn connection_id(&self, data: &H256) -> H256 {
        keccak256(abi::encode(&[
            Token::Address(self.bridge),
            Token::Bytes32(*data),
        ]))
    }

    /// Agent struct hash for `data` on this bridge instance.
    pub fn agent_message(&self, data: &H256) -> H256 {
        keccak256(abi::encode(&[
            Token::Bytes32(keccak256(AGENT_TYPE)),
            Token::Bytes32(keccak256(self.network.source_tag())),
            Token::Bytes32(self.connection_id(data)),
        ]))
    }

    /// The withdrawal message for `intent`.
    pub fn withdrawal_message(&self, intent: &WithdrawalIntent) -> WithdrawalMessage {
        WithdrawalMessage(self.agent_message(&intent.action_data()))
    }
}
