//! Typed secp256k1 signatures
//!
//! A `Signature` is normalized exactly once, at construction:
//! - the recovery id is folded to parity (`0/1`, `27/28` and EIP-155 `v >= 35`
//!   are accepted; anything else is rejected), stored as `27 + parity`;
//! - a high-`s` signature is flipped to its low-`s` twin with the parity
//!   inverted, so the same key always recovers from a single canonical form.
//!
//! Past the constructor, recovery never sees raw wire bytes.

use bridge_types::ids::{Address, H256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::digest::keccak256;
use crate::errors::SignatureError;

/// Wire length of an `r ‖ s ‖ v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Normalized `(v, r, s)` signature over a 32-byte digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSignature", into = "RawSignature")]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

/// Unvalidated wire form, used only for (de)serialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawSignature {
    v: u8,
    r: H256,
    s: H256,
}

impl TryFrom<RawSignature> for Signature {
    type Error = SignatureError;

    fn try_from(raw: RawSignature) -> Result<Self, Self::Error> {
        Signature::new(raw.v, raw.r.into_bytes(), raw.s.into_bytes())
    }
}

impl From<Signature> for RawSignature {
    fn from(sig: Signature) -> Self {
        RawSignature {
            v: sig.v,
            r: H256::new(sig.r),
            s: H256::new(sig.s),
        }
    }
}

impl Signature {
    /// Build and normalize a signature from its components.
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Result<Self, SignatureError> {
        let mut parity = normalize_recovery_id(v)?;

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&r);
        rs[32..].copy_from_slice(&s);
        let mut sig =
            EcdsaSignature::from_slice(&rs).map_err(|_| SignatureError::InvalidScalars)?;

        if let Some(low) = sig.normalize_s() {
            sig = low;
            parity ^= 1;
        }

        let bytes = sig.to_bytes();
        let mut r_out = [0u8; 32];
        let mut s_out = [0u8; 32];
        r_out.copy_from_slice(&bytes[..32]);
        s_out.copy_from_slice(&bytes[32..]);

        Ok(Self {
            r: r_out,
            s: s_out,
            v: 27 + parity,
        })
    }

    /// Parse the 65-byte `r ‖ s ‖ v` wire form.
    pub fn from_rsv_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(SignatureError::InvalidLength {
                expected: SIGNATURE_LEN,
                actual: bytes.len(),
            });
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Self::new(bytes[64], r, s)
    }

    /// Sign a digest, producing a normalized signature.
    pub fn sign(key: &SigningKey, digest: &H256) -> Result<Self, SignatureError> {
        let (sig, recovery_id) = key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| SignatureError::SigningFailed)?;
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self::new(recovery_id.to_byte(), r, s)
    }

    /// Recover the signer's address.
    pub fn recover(&self, digest: &H256) -> Result<Address, SignatureError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let sig = EcdsaSignature::from_slice(&rs).map_err(|_| SignatureError::InvalidScalars)?;
        let recovery_id =
            RecoveryId::from_byte(self.v - 27).ok_or(SignatureError::InvalidRecoveryId(self.v))?;

        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        Ok(address_of(&key))
    }

    /// Always 27 or 28.
    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// 65-byte `r ‖ s ‖ v` wire form.
    pub fn to_rsv_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// Fold any accepted recovery id encoding to parity.
fn normalize_recovery_id(v: u8) -> Result<u8, SignatureError> {
    match v {
        0 | 1 => Ok(v),
        27 | 28 => Ok(v - 27),
        v if v >= 35 => Ok((v - 35) % 2),
        _ => Err(SignatureError::InvalidRecoveryId(v)),
    }
}

/// EVM address of a public key: `keccak256(x ‖ y)[12..]`.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // uncompressed SEC1: 0x04 ‖ x ‖ y
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash.as_bytes()[12..]);
    Address::new(out)
}

/// EVM address of a signing key.
pub fn signer_address(key: &SigningKey) -> Address {
    address_of(key.verifying_key())
}
