//! A minimal execution-layer JSON-RPC client supporting read-only contract calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ClaimError, ConfigError};
use crate::types::{to_prefixed_hex, Address};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
	jsonrpc: &'static str,
	id: u64,
	method: &'static str,
	params: (CallParams<'a>, &'static str),
}

#[derive(Serialize)]
struct CallParams<'a> {
	from: String,
	to: String,
	data: &'a str,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
	result: Option<String>,
	error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
	code: i64,
	message: String,
}

/// Parses an execution-layer endpoint, assuming `http://` if no scheme is given.
pub fn parse_endpoint(address: &str) -> Result<Url, ConfigError> {
	let with_scheme = if address.starts_with("http") {
		address.to_owned()
	} else {
		format!("http://{}", address)
	};
	Url::parse(&with_scheme).map_err(|e| ConfigError::InvalidUrl { url: address.to_owned(), reason: e.to_string() })
}

/// A client for an Ethereum execution-layer node.
pub struct EthClient {
	endpoint: Url,
	client: reqwest::Client,
	next_id: AtomicU64,
}

impl EthClient {
	/// Creates a client talking to `endpoint`, failing any request which takes longer than
	/// `timeout`.
	pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ConfigError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ConfigError::InvalidUrl { url: endpoint.to_string(), reason: e.to_string() })?;
		Ok(Self { endpoint, client, next_id: AtomicU64::new(1) })
	}

	/// Executes `data` against the contract at `to` as if sent by `from`, at the latest block,
	/// without creating a transaction, returning the raw output bytes.
	pub async fn call(&self, from: Address, to: Address, data: &[u8]) -> Result<Vec<u8>, ClaimError> {
		let data = to_prefixed_hex(data);
		let request = JsonRpcRequest {
			jsonrpc: "2.0",
			id: self.next_id.fetch_add(1, Ordering::Relaxed),
			method: "eth_call",
			params: (CallParams { from: from.to_string(), to: to.to_string(), data: &data }, "latest"),
		};
		trace!(%from, %to, data = %data, "Calling contract");

		let response = self.client
			.post(self.endpoint.clone())
			.json(&request)
			.send()
			.await
			.map_err(|e| ClaimError::ContractCall(e.to_string()))?;
		let status = response.status();
		if !status.is_success() {
			return Err(ClaimError::ContractCall(format!("HTTP status {}", status)));
		}
		let response: JsonRpcResponse = response.json().await
			.map_err(|e| ClaimError::ContractCall(format!("invalid response: {}", e)))?;

		if let Some(error) = response.error {
			return Err(ClaimError::ContractCall(format!("{} ({})", error.message, error.code)));
		}
		let result = response.result
			.ok_or_else(|| ClaimError::ContractCall("no result in response".to_owned()))?;
		let digits = result.strip_prefix("0x").unwrap_or(&result);
		hex::decode(digits).map_err(|e| ClaimError::ContractCall(format!("invalid result {}: {}", result, e)))
	}
}
