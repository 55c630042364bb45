//! Proves who controls a domain by reading the owner address its DNS publishes.
//!
//! Whoever controls the DNS for a name asserts an owner by publishing a TXT record of the form
//! `a=0x<40 hex characters>`. Only the first such string in the answer counts.

use std::net::SocketAddr;

use async_trait::async_trait;
use tracing::{trace, Instrument, Span};

use crate::error::ClaimError;
use crate::query::query_txt;
use crate::rr::{Name, Txt};
use crate::types::Address;

/// The prefix which marks a TXT string as an owner address.
pub const OWNER_PREFIX: &str = "a=0x";

/// Resolves the owner address published for a domain.
#[async_trait]
pub trait OwnerResolver: Send + Sync {
	/// Returns the owner address published for `domain`.
	async fn resolve_owner(&self, domain: &str) -> Result<Address, ClaimError>;
}

/// Picks the owner out of the TXT records found at `domain`.
///
/// Records and the strings within them are scanned in order and the first string starting with
/// [`OWNER_PREFIX`] wins; anything after it is ignored, even if it too carries the prefix.
pub fn owner_from_records(domain: &str, records: &[Txt]) -> Result<Address, ClaimError> {
	let first = records.iter()
		.flat_map(|txt| txt.strings.iter())
		.find(|s| s.starts_with(OWNER_PREFIX.as_bytes()));
	let text = match first {
		Some(text) => String::from_utf8_lossy(text),
		None => return Err(ClaimError::OwnerNotFound(domain.to_owned())),
	};

	let address = Address::from_hex(&text[OWNER_PREFIX.len()..])
		.map_err(|_| ClaimError::InvalidRecord(text.to_string()))?;
	if address.is_zero() {
		return Err(ClaimError::InvalidRecord(text.to_string()));
	}
	Ok(address)
}

/// An [`OwnerResolver`] which queries a recursive DNS resolver over UDP.
pub struct DnsOwnerResolver {
	resolver: SocketAddr,
	span: Span,
}

impl DnsOwnerResolver {
	/// Creates a resolver which sends its queries to `resolver`, logging under `span`.
	pub fn new(resolver: SocketAddr, span: Span) -> Self {
		Self { resolver, span }
	}
}

#[async_trait]
impl OwnerResolver for DnsOwnerResolver {
	async fn resolve_owner(&self, domain: &str) -> Result<Address, ClaimError> {
		let name = Name::fqdn(domain)?;
		async {
			let records = query_txt(self.resolver, &name).await?;
			trace!(domain, resolver = %self.resolver, records = records.len(), "Obtained TXT records");
			owner_from_records(domain, &records)
		}.instrument(self.span.clone()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::test_utils::*;

	fn txt(strings: &[&[u8]]) -> Txt {
		Txt {
			name: Name::fqdn("wealdtech.eth").unwrap(),
			strings: strings.iter().map(|s| s.to_vec()).collect(),
		}
	}

	const FIRST: &[u8] = b"a=0xa34C6BCAe6F46ac6470443CCea67d937f6060c7E";
	const SECOND: &[u8] = b"a=0x388Ea662EF2c223eC0B047D41Bf3c0f362142ad5";

	#[test]
	fn first_match_wins() {
		let records = [txt(&[b"v=spf1 -all"]), txt(&[b"a=1234", FIRST]), txt(&[SECOND])];
		let owner = owner_from_records("wealdtech.eth", &records).unwrap();
		assert_eq!(owner.to_string(), "0xa34c6bcae6f46ac6470443ccea67d937f6060c7e");

		let records = [txt(&[SECOND, FIRST])];
		let owner = owner_from_records("wealdtech.eth", &records).unwrap();
		assert_eq!(owner.to_string(), "0x388ea662ef2c223ec0b047d41bf3c0f362142ad5");
	}

	#[test]
	fn no_owner() {
		let err = owner_from_records("a.com", &[]).unwrap_err();
		assert_eq!(err.to_string(), "no owner found for domain a.com");

		let records = [txt(&[b"A=0xa34C6BCAe6F46ac6470443CCea67d937f6060c7E", b"owner"])];
		let err = owner_from_records("example.com", &records).unwrap_err();
		assert_eq!(err.to_string(), "no owner found for domain example.com");
	}

	#[test]
	fn invalid_records() {
		let zero = b"a=0x0000000000000000000000000000000000000000";
		let err = owner_from_records("wealdtech.eth", &[txt(&[zero, FIRST])]).unwrap_err();
		assert_eq!(err.to_string(), "invalid record a=0x0000000000000000000000000000000000000000");

		let err = owner_from_records("wealdtech.eth", &[txt(&[b"a=0xzz", FIRST])]).unwrap_err();
		assert!(matches!(err, ClaimError::InvalidRecord(text) if text == "a=0xzz"));

		let err = owner_from_records("wealdtech.eth", &[txt(&[b"a=0x0102"])]).unwrap_err();
		assert!(matches!(err, ClaimError::InvalidRecord(_)));
	}

	#[tokio::test]
	async fn resolves_over_udp() {
		let resolver = spawn_resolver(|query| txt_response(query, &[&[b"hello"], &[FIRST]])).await;
		let owners = DnsOwnerResolver::new(resolver, Span::none());
		let owner = owners.resolve_owner("wealdtech.eth").await.unwrap();
		assert_eq!(owner, Address::from_hex("a34C6BCAe6F46ac6470443CCea67d937f6060c7E").unwrap());

		let err = owners.resolve_owner("bad..name").await.unwrap_err();
		assert!(matches!(err, ClaimError::Encoding(_)));
	}

	#[tokio::test]
	async fn unreachable_resolver() {
		let closed = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let resolver = closed.local_addr().unwrap();
		drop(closed);

		let owners = DnsOwnerResolver::new(resolver, Span::none());
		let res = tokio::time::timeout(std::time::Duration::from_secs(5), owners.resolve_owner("wealdtech.eth"));
		let err = res.await.expect("refused queries fail immediately").unwrap_err();
		assert!(matches!(err, ClaimError::Transport(_)), "{:?}", err);
		assert_eq!(err.stage(), "dns");
	}
}
