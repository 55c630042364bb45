//! Just enough of the Solidity contract ABI to call view functions which take and return static
//! types.

use crate::namehash::keccak256;
use crate::types::{Address, NameHash, ADDRESS_LEN};

/// The width of every static ABI value.
pub const WORD_LEN: usize = 32;

/// A static argument to a contract function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
	/// A `bytes32` value.
	FixedBytes32([u8; 32]),
	/// An `address` value, left-padded to a word.
	Address(Address),
}
impl From<NameHash> for Token { fn from(hash: NameHash) -> Token { Token::FixedBytes32(hash.0) } }
impl From<Address> for Token { fn from(address: Address) -> Token { Token::Address(address) } }

/// The four-byte selector of a function with the canonical signature `signature`, e.g.
/// `owner(bytes32)`.
pub fn selector(signature: &str) -> [u8; 4] {
	let hash = keccak256(signature.as_bytes());
	[hash[0], hash[1], hash[2], hash[3]]
}

/// Encodes a call to the function with `signature` and the given arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
	let mut data = Vec::with_capacity(4 + WORD_LEN * args.len());
	data.extend_from_slice(&selector(signature));
	for arg in args {
		match arg {
			Token::FixedBytes32(bytes) => data.extend_from_slice(bytes),
			Token::Address(address) => {
				data.extend_from_slice(&[0; WORD_LEN - ADDRESS_LEN]);
				data.extend_from_slice(address.as_bytes());
			},
		}
	}
	data
}

/// Decodes an `address` return value from the first word of `output`.
pub fn decode_address(output: &[u8]) -> Result<Address, ()> {
	if output.len() < WORD_LEN { return Err(()); }
	if output[..WORD_LEN - ADDRESS_LEN].iter().any(|b| *b != 0) { return Err(()); }
	Address::from_slice(&output[WORD_LEN - ADDRESS_LEN..WORD_LEN]).map_err(|_| ())
}

#[cfg(test)]
mod tests {
	use super::*;
	use hex_lit::hex;

	#[test]
	fn known_selectors() {
		assert_eq!(selector("transfer(address,uint256)"), hex!("a9059cbb"));
		assert_eq!(selector("owner(bytes32)"), hex!("02571be3"));
	}

	#[test]
	fn call_layout() {
		let node = NameHash([0x11; 32]);
		let owner = Address([0x22; 20]);
		let data = encode_call("getSignatureHash(bytes32,address)", &[node.into(), owner.into()]);
		assert_eq!(data.len(), 4 + 64);
		assert_eq!(&data[..4], &selector("getSignatureHash(bytes32,address)"));
		assert_eq!(&data[4..36], &[0x11; 32]);
		assert_eq!(&data[36..48], &[0; 12]);
		assert_eq!(&data[48..], &[0x22; 20]);
	}

	#[test]
	fn address_output() {
		let mut word = [0; 32];
		word[12..].copy_from_slice(&[0x33; 20]);
		assert_eq!(decode_address(&word), Ok(Address([0x33; 20])));
		assert!(decode_address(&word[..31]).is_err());
		word[0] = 1;
		assert!(decode_address(&word).is_err());
	}
}
