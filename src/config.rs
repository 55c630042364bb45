//! Configuration, as read from a JSON file and validated once at start-up.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::control::{parse_domain_controls, DomainControl};
use crate::error::ConfigError;
use crate::eth::parse_endpoint;
use crate::registrar::ENS_REGISTRY;
use crate::types::Address;

/// The timeout applied to each claim if none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// The recursive resolver queried if none is configured.
pub const DEFAULT_DNS_RESOLVER: &str = "127.0.0.53:53";

/// Configuration as it appears in the configuration file, before validation.
///
/// Every value is optional here; [`RawConfig::validate`] fills in defaults and rejects what is
/// missing or malformed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
	/// The per-claim timeout, in seconds.
	pub timeout: Option<u64>,
	/// The recursive DNS resolver, as `ip:port`.
	pub dns_resolver: Option<String>,
	/// The execution-layer JSON-RPC endpoint.
	pub eth1client_address: Option<String>,
	/// The address of the ENS registry.
	pub ens_registry: Option<String>,
	/// The address the daemon listens on.
	pub listen_address: Option<String>,
	/// The managed domains.
	pub domain_controls: Option<Map<String, Value>>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
	/// The per-claim timeout.
	pub timeout: Duration,
	/// The recursive DNS resolver.
	pub dns_resolver: SocketAddr,
	/// The execution-layer JSON-RPC endpoint.
	pub eth1client_address: Url,
	/// The address of the ENS registry.
	pub ens_registry: Address,
	/// The address the daemon listens on, if it is to listen at all.
	pub listen_address: Option<SocketAddr>,
	/// The managed domains.
	pub domain_controls: HashMap<String, DomainControl>,
}

impl RawConfig {
	/// Reads the configuration file at `path`.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RawConfig, ConfigError> {
		let contents = std::fs::read(path)?;
		Ok(serde_json::from_slice(&contents)?)
	}

	/// Validates the configuration, returning the first problem found.
	pub fn validate(&self) -> Result<Config, ConfigError> {
		let timeout = match self.timeout {
			Some(0) => return Err(ConfigError::Missing("timeout")),
			Some(secs) => Duration::from_secs(secs),
			None => DEFAULT_TIMEOUT,
		};

		let dns_resolver = self.dns_resolver.as_deref().unwrap_or(DEFAULT_DNS_RESOLVER);
		let dns_resolver = dns_resolver.parse()
			.map_err(|_| ConfigError::InvalidAddress { field: "dns-resolver", value: dns_resolver.to_owned() })?;

		let eth1client_address = match self.eth1client_address.as_deref() {
			Some(address) if !address.is_empty() => parse_endpoint(address)?,
			_ => return Err(ConfigError::Missing("eth1client address")),
		};

		let ens_registry = match self.ens_registry.as_deref() {
			Some(registry) => registry.parse()
				.map_err(|_| ConfigError::InvalidAddress { field: "ens-registry", value: registry.to_owned() })?,
			None => ENS_REGISTRY,
		};

		let listen_address = self.listen_address.as_deref()
			.map(|address| address.parse()
				.map_err(|_| ConfigError::InvalidAddress { field: "listen-address", value: address.to_owned() }))
			.transpose()?;

		let domain_controls = parse_domain_controls(self.domain_controls.as_ref())?;

		Ok(Config { timeout, dns_resolver, eth1client_address, ens_registry, listen_address, domain_controls })
	}
}
