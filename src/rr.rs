//! Resource Records are the fundamental type in the DNS - individual records mapping a name to
//! some data.
//!
//! Only TXT records, which carry owner addresses, are modelled here.

use crate::error::EncodingError;
use crate::ser::*;

/// A valid domain name.
///
/// It must end with a ".", be no longer than 255 bytes, consist of only printable ASCII
/// characters, and each label must be non-empty and no longer than 63 bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(String);
impl Name {
	/// Gets the underlying human-readable domain name
	pub fn as_str(&self) -> &str { &self.0 }

	/// Builds the fully-qualified form of `domain`, appending the trailing "." if it is missing.
	pub fn fqdn(domain: &str) -> Result<Name, EncodingError> {
		if domain.ends_with('.') {
			Name::try_from(domain)
		} else {
			Name::try_from(format!("{}.", domain))
		}
	}
}
impl core::ops::Deref for Name {
	type Target = str;
	fn deref(&self) -> &str { &self.0 }
}
impl TryFrom<String> for Name {
	type Error = EncodingError;
	fn try_from(s: String) -> Result<Name, EncodingError> {
		if s.is_empty() || !s.ends_with('.') { return Err(EncodingError::EmptyLabel(s)); }
		if s == "." { return Ok(Name(s)); }
		if s.len() > 255 { return Err(EncodingError::TooLong(s)); }
		if let Some(ch) = s.chars().find(|c| !c.is_ascii_graphic()) {
			return Err(EncodingError::DisallowedCharacter { name: s, ch });
		}
		for label in s[..s.len() - 1].split('.') {
			if label.is_empty() { return Err(EncodingError::EmptyLabel(s)); }
			if label.len() > 63 { return Err(EncodingError::TooLong(s)); }
		}

		Ok(Name(s))
	}
}
impl TryFrom<&str> for Name {
	type Error = EncodingError;
	fn try_from(s: &str) -> Result<Name, EncodingError> {
		Self::try_from(s.to_owned())
	}
}

pub(crate) trait StaticRecord : Sized {
	// http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
	const TYPE: u16;
	fn read_from_data(name: Name, data: &[u8]) -> Result<Self, ()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A text resource record, containing one or more character-strings
pub struct Txt {
	/// The name this record is at.
	pub name: Name,
	/// The character-strings of the record, in wire order.
	///
	/// While these are generally UTF-8-valid, there is no specific requirement that they be, and
	/// thus they are arbitrary series of bytes here.
	pub strings: Vec<Vec<u8>>,
}
impl Txt {
	/// The IANA record type for TXT records.
	pub const TYPE: u16 = <Txt as StaticRecord>::TYPE;
}
impl StaticRecord for Txt {
	const TYPE: u16 = 16;
	fn read_from_data(name: Name, mut data: &[u8]) -> Result<Self, ()> {
		let mut strings = Vec::new();
		while !data.is_empty() {
			let len = read_u8(&mut data)? as usize;
			if data.len() < len { return Err(()); }
			strings.push(data[..len].to_vec());
			data = &data[len..];
		}
		Ok(Txt { name, strings })
	}
}
