//! Settlement core of the validator-attested asset bridge
//!
//! Authorizes withdrawals of a custodied asset against weighted signatures
//! from a rotating validator committee, holds each withdrawal through a
//! dispute window during which a locker committee may halt it, and accepts
//! batched permit deposits with per-item failure isolation.
//!
//! # Modules
//! - `abi`: Solidity `abi.encode` for the hashed tuples
//! - `digest`: Keccak-256 and the EIP-712 committee signing domain
//! - `message`: Withdrawal intents and their canonical message
//! - `signature`: Normalized secp256k1 signatures and address recovery
//! - `registry`: Validator sets and per-epoch commitments
//! - `quorum`: Weighted two-thirds signature verification
//! - `locker`: Locker sets and halt votes
//! - `withdrawal`: Withdrawal records and lifecycle guards
//! - `asset`: Asset capability trait and the in-memory permit token
//! - `deposit`: Batched permit deposits
//! - `bridge`: The orchestrating state machine
//! - `shared`: Lock-protected handle for concurrent callers
//! - `config`, `events`, `errors`, `security`: ambient plumbing

pub mod abi;
pub mod asset;
pub mod bridge;
pub mod config;
pub mod deposit;
pub mod digest;
pub mod errors;
pub mod events;
pub mod locker;
pub mod message;
pub mod quorum;
pub mod registry;
pub mod security;
pub mod shared;
pub mod signature;
pub mod withdrawal;

pub use bridge::Bridge;
pub use shared::SharedBridge;

/// Version of the signed message formats. Validators hash against it.
pub const MESSAGE_FORMAT_VERSION: &str = "1.0.0";
