//! The parent domains this instance manages, and who is expected to own each of them.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::claim::normalize_domain;
use crate::error::ConfigError;
use crate::types::{Address, ADDRESS_LEN};

/// Control information for a single managed parent domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainControl {
	/// The managed domain, without leading or trailing separators.
	pub domain: String,
	/// The address expected to own the domain.
	pub owner: Address,
	/// The secret shared with the owner of the domain.
	pub passphrase: String,
}

/// Parses the `domain-controls` section of the configuration.
///
/// Each key is a domain and each value an object with a hex `owner-address` and a non-empty
/// `passphrase`. Keys are normalized as requests are, so `wealdtech.eth.` manages `wealdtech.eth`.
/// The first bad entry fails the whole parse. A missing section parses to an empty table.
pub fn parse_domain_controls(controls: Option<&Map<String, Value>>)
-> Result<HashMap<String, DomainControl>, ConfigError> {
	let mut res = HashMap::new();
	let controls = match controls {
		Some(controls) => controls,
		None => return Ok(res),
	};

	for (key, value) in controls {
		let domain = normalize_domain(key);
		if domain.is_empty() || domain == "." {
			return Err(ConfigError::InvalidControl(key.clone()));
		}
		let domain = domain.to_owned();
		let control = value.as_object()
			.ok_or_else(|| ConfigError::InvalidControl(domain.clone()))?;

		let owner_address = control.get("owner-address").and_then(Value::as_str)
			.ok_or_else(|| ConfigError::OwnerAddressMissing(domain.clone()))?;
		let owner = hex::decode(owner_address.strip_prefix("0x").unwrap_or(owner_address))
			.map_err(|source| ConfigError::OwnerAddressInvalid { domain: domain.clone(), source })?;
		if owner.len() != ADDRESS_LEN {
			return Err(ConfigError::OwnerAddressLength(domain.clone()));
		}
		let owner = Address::from_slice(&owner)
			.map_err(|_| ConfigError::OwnerAddressLength(domain.clone()))?;

		let passphrase = match control.get("passphrase").and_then(Value::as_str) {
			Some(passphrase) if !passphrase.is_empty() => passphrase,
			_ => return Err(ConfigError::PassphraseMissing(domain.clone())),
		};

		if res.contains_key(&domain) {
			return Err(ConfigError::DuplicateControl(domain));
		}
		res.insert(domain.clone(), DomainControl { domain, owner, passphrase: passphrase.to_owned() });
	}
	Ok(res)
}
