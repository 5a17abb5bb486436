//! Bridge configuration
//!
//! Loaded from TOML. Every field has a default so a partial file is valid;
//! `validate` rejects values the bridge cannot run with.
//!
//! ```toml
//! chain_id = 1337
//! network = "mainnet"
//! bridge_address = "0x…"
//! admin = "0x…"
//! dispute_period_seconds = 200
//! ```

use bridge_types::ids::Address;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_CHAIN_ID: u64 = 1337;

/// Default delay between request and finalization.
pub const DEFAULT_DISPUTE_PERIOD_SECONDS: u64 = 200;

pub const MIN_DISPUTE_PERIOD_SECONDS: u64 = 1;

/// One week.
pub const MAX_DISPUTE_PERIOD_SECONDS: u64 = 7 * 24 * 3600;

/// Which committee signing network the bridge answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Fixed source tag hashed into every agent message.
    pub fn source_tag(&self) -> &'static str {
        match self {
            Network::Mainnet => "a",
            Network::Testnet => "b",
        }
    }
}

/// Bridge instance configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Chain id placed in the committee signing domain
    pub chain_id: u64,
    pub network: Network,
    /// This bridge's identity, bound into every withdrawal message
    pub bridge_address: Address,
    pub dispute_period_seconds: u64,
    /// Initial admin of the access-control table
    pub admin: Address,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            network: Network::Mainnet,
            bridge_address: Address::ZERO,
            dispute_period_seconds: DEFAULT_DISPUTE_PERIOD_SECONDS,
            admin: Address::ZERO,
        }
    }
}

impl BridgeConfig {
    /// Defaults with the two mandatory identities filled in.
    pub fn new(bridge_address: Address, admin: Address) -> Self {
        Self {
            bridge_address,
            admin,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge_address.is_zero() {
            return Err(ConfigError::ZeroBridgeAddress);
        }
        if self.admin.is_zero() {
            return Err(ConfigError::ZeroAdmin);
        }
        if self.chain_id == 0 {
            return Err(ConfigError::ZeroChainId);
        }
        check_dispute_period(self.dispute_period_seconds).map_err(|(value, min, max)| {
            ConfigError::DisputePeriodOutOfRange { value, min, max }
        })
    }
}

/// Bounds check shared by config validation and governed changes.
pub(crate) fn check_dispute_period(value: u64) -> Result<(), (u64, u64, u64)> {
    if (MIN_DISPUTE_PERIOD_SECONDS..=MAX_DISPUTE_PERIOD_SECONDS).contains(&value) {
        Ok(())
    } else {
        Err((value, MIN_DISPUTE_PERIOD_SECONDS, MAX_DISPUTE_PERIOD_SECONDS))
    }
}
