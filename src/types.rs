//! Fixed-width values shared across the pipeline: account addresses and 32-byte hashes.

use core::fmt;
use core::str::FromStr;

/// The length, in bytes, of an [`Address`].
pub const ADDRESS_LEN: usize = 20;

/// An Ethereum account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

/// The reasons a string may fail to parse as an [`Address`].
#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
	/// The string was not valid hex.
	#[error(transparent)]
	Hex(#[from] hex::FromHexError),
	/// The string decoded to the wrong number of bytes.
	#[error("expected {ADDRESS_LEN} bytes, got {0}")]
	Length(usize),
}

impl Address {
	/// The all-zero address.
	pub const ZERO: Address = Address([0; ADDRESS_LEN]);

	/// Parses a hex address, with or without a leading `0x`.
	///
	/// Exactly 20 bytes must be present; unlike some Ethereum libraries we do not silently
	/// truncate or left-pad.
	pub fn from_hex(s: &str) -> Result<Address, AddressParseError> {
		let digits = s.strip_prefix("0x").unwrap_or(s);
		let bytes = hex::decode(digits)?;
		Address::from_slice(&bytes)
	}

	/// Builds an address from a slice which must be exactly 20 bytes long.
	pub fn from_slice(bytes: &[u8]) -> Result<Address, AddressParseError> {
		let arr: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| AddressParseError::Length(bytes.len()))?;
		Ok(Address(arr))
	}

	/// Returns true if this is the all-zero address.
	pub fn is_zero(&self) -> bool { self.0 == [0; ADDRESS_LEN] }

	/// The raw address bytes.
	pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] { &self.0 }
}

impl FromStr for Address {
	type Err = AddressParseError;
	fn from_str(s: &str) -> Result<Address, AddressParseError> { Address::from_hex(s) }
}

/// Prints as `0x`-prefixed lowercase hex.
impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

/// A 32-byte hash, as used for ENS name identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NameHash(pub [u8; 32]);

impl NameHash {
	/// The identifier of the root name, all zeros.
	pub const ROOT: NameHash = NameHash([0; 32]);
}

/// Prints as `0x`-prefixed lowercase hex.
impl fmt::Display for NameHash {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

/// Formats arbitrary bytes as `0x`-prefixed lowercase hex. Empty input yields `"0x"`.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
	format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn address_hex_round_trip() {
		let hex = "388ea662ef2c223ec0b047d41bf3c0f362142ad5";
		let addr = Address::from_hex(&format!("0x{}", hex)).unwrap();
		assert_eq!(addr.to_string(), format!("0x{}", hex));

		// Mixed case input normalizes to lowercase output, prefix is optional.
		let checksummed: Address = "388Ea662EF2c223eC0B047D41Bf3c0f362142ad5".parse().unwrap();
		assert_eq!(checksummed, addr);
		assert_eq!(&checksummed.to_string()[2..], hex);
	}

	#[test]
	fn address_rejects_bad_input() {
		assert!(matches!(Address::from_hex("0x000102030405060708090a0b0c0d0e0f"),
			Err(AddressParseError::Length(16))));
		assert!(matches!(Address::from_hex("invalid"), Err(AddressParseError::Hex(_))));
		assert!(matches!(Address::from_hex("0x"), Err(AddressParseError::Length(0))));
	}

	#[test]
	fn zero_address() {
		assert!(Address::ZERO.is_zero());
		assert!(Address::from_hex("0x0000000000000000000000000000000000000000").unwrap().is_zero());
		assert!(!Address::from_hex("0x0000000000000000000000000000000000000001").unwrap().is_zero());
	}

	#[test]
	fn hex_printing() {
		assert_eq!(to_prefixed_hex(&[]), "0x");
		assert_eq!(to_prefixed_hex(&[0xde, 0xad]), "0xdead");
		assert_eq!(NameHash::ROOT.to_string(), format!("0x{}", "0".repeat(64)));
	}
}
