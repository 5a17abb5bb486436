//! Types library for the validator-attested asset bridge
//!
//! Primitive, chain-agnostic values shared by every bridge component.
//! Everything here is plain data: no hashing, no signature logic.
//!
//! # Modules
//! - `ids`: Fixed-width identifiers (`Address`, `H256`)
//! - `errors`: Parse errors for the identifier types

pub mod errors;
pub mod ids;
