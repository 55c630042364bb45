//! Errors returned by the claim pipeline and its configuration.
//!
//! Every stage hands its error back to [`crate::claim::ClaimService`] unchanged; nothing in the
//! pipeline retries or falls back, so the first error is the one the caller sees.

use std::io;
use std::time::Duration;

/// A domain name could not be turned into a name identifier or a DNS query name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
	/// A label between two separators was empty, e.g. `a..eth`.
	#[error("empty label in {0}")]
	EmptyLabel(String),
	/// The name contained whitespace or control characters.
	#[error("disallowed character {ch:?} in {name}")]
	DisallowedCharacter {
		/// The offending name.
		name: String,
		/// The first character which was rejected.
		ch: char,
	},
	/// The name is too long to be carried in a DNS query.
	#[error("name too long: {0}")]
	TooLong(String),
}

/// A configuration value was missing or malformed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A domain-control entry was not itself a mapping.
	#[error("invalid configuration for {0}")]
	InvalidControl(String),
	/// Two domain-control entries name the same domain once normalized.
	#[error("duplicate configuration for {0}")]
	DuplicateControl(String),
	/// A domain-control entry had no string `owner-address`.
	#[error("owner-address missing for {0}")]
	OwnerAddressMissing(String),
	/// A domain-control entry's `owner-address` was not hex.
	#[error("owner-address invalid for {domain}: {source}")]
	OwnerAddressInvalid {
		/// The domain whose entry was rejected.
		domain: String,
		/// Why the hex failed to decode.
		source: hex::FromHexError,
	},
	/// A domain-control entry's `owner-address` did not decode to 20 bytes.
	#[error("incorrect owner-address length for {0}")]
	OwnerAddressLength(String),
	/// A domain-control entry had no non-empty string `passphrase`.
	#[error("passphrase missing for {0}")]
	PassphraseMissing(String),
	/// A mandatory parameter was not supplied.
	#[error("no {0} specified")]
	Missing(&'static str),
	/// A URL could not be parsed.
	#[error("invalid URL {url}: {reason}")]
	InvalidUrl {
		/// The URL as supplied.
		url: String,
		/// Why it was rejected.
		reason: String,
	},
	/// A socket or contract address could not be parsed.
	#[error("invalid {field}: {value}")]
	InvalidAddress {
		/// The configuration key.
		field: &'static str,
		/// The value as supplied.
		value: String,
	},
	/// The configuration file could not be read.
	#[error("failed to read configuration file: {0}")]
	Io(#[from] io::Error),
	/// The configuration file was not valid.
	#[error("failed to parse configuration file: {0}")]
	Parse(#[from] serde_json::Error),
}

/// The reasons a claim can fail.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
	/// The requested name has no label which could be claimed.
	#[error("domain not allowed")]
	DomainNotAllowed,
	/// The requested name is not beneath a managed domain.
	#[error("domain not supported")]
	DomainNotSupported,
	/// No TXT record published an `a=0x` owner for the domain.
	#[error("no owner found for domain {0}")]
	OwnerNotFound(String),
	/// The first owner record was unusable.
	#[error("invalid record {0}")]
	InvalidRecord(String),
	/// The DNS server's response was not acceptable.
	#[error("{0}")]
	Protocol(&'static str),
	/// The DNS exchange failed at the socket level.
	#[error("DNS transport error: {0}")]
	Transport(#[from] io::Error),
	/// The registry has no registrar for the parent domain.
	#[error("no registrar for {0}")]
	NoRegistrar(String),
	/// A read-only contract call failed or returned something unusable.
	#[error("contract call failed: {0}")]
	ContractCall(String),
	/// A name could not be encoded.
	#[error(transparent)]
	Encoding(#[from] EncodingError),
	/// The signer refused to sign.
	#[error("signing failed: {0}")]
	Signing(String),
	/// The claim did not finish within the service timeout.
	#[error("claim timed out after {0:?}")]
	Timeout(Duration),
	/// Returned by [`crate::claim::MockClaimData`] for every request.
	#[error("mock")]
	Mock,
}

impl ClaimError {
	/// The pipeline stage which produced this error.
	pub fn stage(&self) -> &'static str {
		match self {
			ClaimError::DomainNotAllowed|ClaimError::DomainNotSupported => "match",
			ClaimError::OwnerNotFound(_)|ClaimError::InvalidRecord(_)|ClaimError::Protocol(_)
				|ClaimError::Transport(_) => "dns",
			ClaimError::NoRegistrar(_)|ClaimError::ContractCall(_) => "registrar",
			ClaimError::Encoding(_) => "encoding",
			ClaimError::Signing(_) => "signing",
			ClaimError::Timeout(_) => "timeout",
			ClaimError::Mock => "mock",
		}
	}
}
