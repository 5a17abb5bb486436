//! Domain/Digest engine
//!
//! Wraps a struct hash in an EIP-712 envelope:
//! `keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)`.
//!
//! The bridge's own signing domain is fixed to
//! `("Exchange", "1", chainId, 0x0000…0000)`. The verifying contract is the
//! zero address, not the bridge, because the validator committee signs the
//! same domain for every action it attests. Changing any field here silently
//! breaks every signature check.

use bridge_types::ids::{Address, H256};
use sha3::{Digest, Keccak256};

use crate::abi::{self, Token};

/// EIP-712 domain type string.
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Protocol name tag of the committee signing domain.
pub const EXCHANGE_DOMAIN_NAME: &str = "Exchange";

/// Protocol version tag of the committee signing domain.
pub const EXCHANGE_DOMAIN_VERSION: &str = "1";

/// EIP-191 prefix for structured data.
const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    H256::new(hasher.finalize().into())
}

/// An EIP-712 signing domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// The committee signing domain for `chain_id`.
    pub fn exchange(chain_id: u64) -> Self {
        Self::new(
            EXCHANGE_DOMAIN_NAME,
            EXCHANGE_DOMAIN_VERSION,
            chain_id,
            Address::ZERO,
        )
    }

    /// `hashStruct(EIP712Domain)`.
    pub fn separator(&self) -> H256 {
        keccak256(abi::encode(&[
            Token::Bytes32(keccak256(EIP712_DOMAIN_TYPE)),
            Token::Bytes32(keccak256(&self.name)),
            Token::Bytes32(keccak256(&self.version)),
            Token::Uint(u128::from(self.chain_id)),
            Token::Address(self.verifying_contract),
        ]))
    }

    /// Signable digest of `struct_hash` under this domain.
    pub fn digest(&self, struct_hash: &H256) -> H256 {
        typed_data_digest(&self.separator(), struct_hash)
    }
}

/// `keccak256(0x19 0x01 ‖ separator ‖ struct_hash)`.
pub fn typed_data_digest(separator: &H256, struct_hash: &H256) -> H256 {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(&TYPED_DATA_PREFIX);
    buf.extend_from_slice(separator.as_bytes());
    buf.extend_from_slice(struct_hash.as_bytes());
    keccak256(buf)
}
