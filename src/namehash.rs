//! Computes ENS name identifiers ("namehashes", EIP-137).
//!
//! The identifier of the root is 32 zero bytes. The identifier of `label.parent` is
//! `keccak256(namehash(parent) || keccak256(label))`, so hashing proceeds from the rightmost label
//! to the leftmost.

use sha3::{Digest, Keccak256};

use crate::error::EncodingError;
use crate::types::NameHash;

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
	Keccak256::digest(data).into()
}

/// Normalizes `domain` into the form which is hashed: lowercased, with any single trailing "."
/// removed. `""` and `"."` both normalize to the root, `""`.
///
/// Only case folding is applied; full UTS-46 mapping is left to whoever registers the name.
pub fn normalize(domain: &str) -> Result<String, EncodingError> {
	let trimmed = domain.strip_suffix('.').unwrap_or(domain);
	if trimmed.is_empty() { return Ok(String::new()); }
	if let Some(ch) = trimmed.chars().find(|c| c.is_whitespace() || c.is_control()) {
		return Err(EncodingError::DisallowedCharacter { name: domain.to_owned(), ch });
	}
	if trimmed.split('.').any(str::is_empty) {
		return Err(EncodingError::EmptyLabel(domain.to_owned()));
	}
	Ok(trimmed.to_lowercase())
}

/// Computes the name identifier of `domain`.
pub fn name_hash(domain: &str) -> Result<NameHash, EncodingError> {
	let normalized = normalize(domain)?;
	let mut node = [0; 32];
	if normalized.is_empty() { return Ok(NameHash(node)); }

	let mut buf = [0; 64];
	for label in normalized.rsplit('.') {
		buf[..32].copy_from_slice(&node);
		buf[32..].copy_from_slice(&keccak256(label.as_bytes()));
		node = keccak256(&buf);
	}
	Ok(NameHash(node))
}

#[cfg(test)]
mod tests {
	use super::*;
	use hex_lit::hex;

	#[test]
	fn root() {
		assert_eq!(name_hash("").unwrap(), NameHash::ROOT);
		assert_eq!(name_hash(".").unwrap(), NameHash::ROOT);
	}

	#[test]
	fn eip137_vectors() {
		assert_eq!(name_hash("eth").unwrap().0,
			hex!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"));
		assert_eq!(name_hash("foo.eth").unwrap().0,
			hex!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"));
	}

	#[test]
	fn normalization() {
		assert_eq!(name_hash("Foo.ETH.").unwrap(), name_hash("foo.eth").unwrap());
		assert!(matches!(name_hash("foo..eth"), Err(EncodingError::EmptyLabel(_))));
		assert!(matches!(name_hash(".eth"), Err(EncodingError::EmptyLabel(_))));
		assert!(matches!(name_hash("foo bar.eth"), Err(EncodingError::DisallowedCharacter { ch: ' ', .. })));
		assert!(matches!(name_hash("foo\u{0}.eth"), Err(EncodingError::DisallowedCharacter { .. })));
	}

	#[test]
	fn label_order_matters() {
		let forward = name_hash("wealdtech.eth").unwrap();
		let reversed = name_hash("eth.wealdtech").unwrap();
		assert_ne!(forward, reversed);
		assert_eq!(forward, name_hash("wealdtech.eth").unwrap());
	}
}
