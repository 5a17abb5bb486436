//! Ethereum ABI head/tail encoding for hashed tuples
//!
//! Only the shapes the bridge hashes are supported: addresses, unsigned
//! integers up to 128 bits, 32-byte words, strings, and arrays of addresses
//! or `uint64`. The output is byte-identical to Solidity's `abi.encode`, which
//! is what off-platform validators hash before signing.

use bridge_types::ids::{Address, H256};

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// A single value in an encoded tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Address(Address),
    Uint(u128),
    Bytes32(H256),
    String(&'a str),
    AddressArray(&'a [Address]),
    UintArray(&'a [u64]),
}

impl Token<'_> {
    fn is_dynamic(&self) -> bool {
        matches!(
            self,
            Token::String(_) | Token::AddressArray(_) | Token::UintArray(_)
        )
    }
}

/// Encode a tuple as `abi.encode(t0, t1, ...)` would.
pub fn encode(tokens: &[Token<'_>]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
            encode_tail(token, &mut tail);
        } else {
            head.extend_from_slice(&static_word(token));
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Left-padded big-endian integer word.
pub fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-padded address word.
pub fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn static_word(token: &Token<'_>) -> [u8; WORD] {
    match token {
        Token::Address(a) => address_word(a),
        Token::Uint(v) => uint_word(*v),
        Token::Bytes32(h) => h.into_bytes(),
        // dynamic tokens never reach here
        Token::String(_) | Token::AddressArray(_) | Token::UintArray(_) => [0u8; WORD],
    }
}

fn encode_tail(token: &Token<'_>, out: &mut Vec<u8>) {
    match token {
        Token::String(s) => {
            let bytes = s.as_bytes();
            out.extend_from_slice(&uint_word(bytes.len() as u128));
            out.extend_from_slice(bytes);
            let pad = (WORD - bytes.len() % WORD) % WORD;
            out.extend(std::iter::repeat(0u8).take(pad));
        }
        Token::AddressArray(items) => {
            out.extend_from_slice(&uint_word(items.len() as u128));
            for item in items.iter() {
                out.extend_from_slice(&address_word(item));
            }
        }
        Token::UintArray(items) => {
            out.extend_from_slice(&uint_word(items.len() as u128));
            for item in items.iter() {
                out.extend_from_slice(&uint_word(u128::from(*item)));
            }
        }
        Token::Address(_) | Token::Uint(_) | Token::Bytes32(_) => {}
    }
}
