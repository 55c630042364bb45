//! Serves claim data as JSON-RPC over HTTP.
//!
//! Requests are `POST /` with a JSON-RPC 2.0 body calling `ens_getclaimdata` (or its alias
//! `ENSService.GetClaimData`) with either `[{"domain": "..."}]` or `{"domain": "..."}` as params.
//! A claim which fails is still a successful call; the failure is reported in the result's
//! `message`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, trace, Instrument, Span};

use crate::claim::ClaimDataProvider;
use crate::types::to_prefixed_hex;

/// The JSON-RPC method which returns claim data.
pub const GET_CLAIM_DATA: &str = "ens_getclaimdata";
/// An alias of [`GET_CLAIM_DATA`].
pub const GET_CLAIM_DATA_ALIAS: &str = "ENSService.GetClaimData";

const MAX_REQUEST_LEN: usize = 16 * 1024;

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// The arguments of [`GET_CLAIM_DATA`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetClaimDataArgs {
	/// The fully-qualified domain name being claimed.
	#[serde(default)]
	pub domain: String,
}

/// The result of [`GET_CLAIM_DATA`].
///
/// On failure only `message` is set, to the error text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetClaimDataResults {
	/// `"Success"`, or why the claim failed.
	pub message: String,
	/// The name identifier of the parent domain, as hex.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub node: Option<String>,
	/// The label being claimed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	/// The owner of the new name, as hex.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub newowner: Option<String>,
	/// The signature authorizing the claim, as hex.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub signature: Option<String>,
}

impl GetClaimDataResults {
	fn failure<M: ToString>(message: M) -> Self {
		Self { message: message.to_string(), ..Default::default() }
	}
}

/// Obtains the claim data for `args` from `provider`.
pub async fn get_claim_data(provider: &dyn ClaimDataProvider, args: Option<GetClaimDataArgs>)
-> GetClaimDataResults {
	let args = match args {
		Some(args) => args,
		None => return GetClaimDataResults::failure("no arguments supplied"),
	};
	trace!(domain = %args.domain, "GetClaimData called");

	match provider.get_claim_data(&args.domain).await {
		Ok(data) => {
			let results = GetClaimDataResults {
				message: "Success".to_owned(),
				node: Some(data.node.to_string()),
				label: Some(data.label),
				newowner: Some(data.owner.to_string()),
				signature: Some(to_prefixed_hex(&data.signature)),
			};
			trace!(domain = %args.domain, ?results, "GetClaimData succeeded");
			results
		},
		Err(e) => {
			trace!(domain = %args.domain, error = %e, "GetClaimData failed");
			GetClaimDataResults::failure(e)
		},
	}
}

#[derive(Deserialize)]
struct RpcRequest {
	#[serde(default)]
	id: Value,
	method: String,
	#[serde(default)]
	params: Value,
}

#[derive(Serialize)]
struct RpcError {
	code: i64,
	message: &'static str,
}

#[derive(Serialize)]
struct RpcResponse {
	jsonrpc: &'static str,
	id: Value,
	#[serde(skip_serializing_if = "Option::is_none")]
	result: Option<GetClaimDataResults>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<RpcError>,
}

fn rpc_error(id: Value, code: i64, message: &'static str) -> RpcResponse {
	RpcResponse { jsonrpc: "2.0", id, result: None, error: Some(RpcError { code, message }) }
}

fn parse_args(params: Value) -> Result<Option<GetClaimDataArgs>, ()> {
	let args = match params {
		Value::Null => return Ok(None),
		Value::Array(mut params) => {
			if params.is_empty() { return Ok(None); }
			params.swap_remove(0)
		},
		args @ Value::Object(_) => args,
		_ => return Err(()),
	};
	if args.is_null() { return Ok(None); }
	serde_json::from_value(args).map(Some).map_err(|_| ())
}

/// Handles a single JSON-RPC request body, returning the response body.
pub async fn handle_request(provider: &dyn ClaimDataProvider, body: &[u8]) -> Vec<u8> {
	let response = match serde_json::from_slice::<Value>(body) {
		Err(_) => rpc_error(Value::Null, PARSE_ERROR, "parse error"),
		Ok(request) => match serde_json::from_value::<RpcRequest>(request) {
			Err(_) => rpc_error(Value::Null, INVALID_REQUEST, "invalid request"),
			Ok(request) if request.method != GET_CLAIM_DATA && request.method != GET_CLAIM_DATA_ALIAS =>
				rpc_error(request.id, METHOD_NOT_FOUND, "method not found"),
			Ok(request) => match parse_args(request.params) {
				Err(()) => rpc_error(request.id, INVALID_PARAMS, "invalid params"),
				Ok(args) => RpcResponse {
					jsonrpc: "2.0",
					id: request.id,
					result: Some(get_claim_data(provider, args).await),
					error: None,
				},
			},
		},
	};
	// Serializing plain structs and `Value`s cannot fail.
	serde_json::to_vec(&response).unwrap_or_default()
}

fn content_length(headers: &str) -> Option<usize> {
	headers.split("\r\n").skip(1).find_map(|line| {
		let (k, v) = line.split_once(':')?;
		if k.trim().eq_ignore_ascii_case("content-length") { v.trim().parse().ok() } else { None }
	})
}

async fn handle_connection(mut socket: TcpStream, provider: Arc<dyn ClaimDataProvider>) {
	let mut response = ("400 Bad Request", "Bad Request");
	'ret_err: loop { // goto label
		let mut buf = vec![0; MAX_REQUEST_LEN];
		let mut buf_pos = 0;
		let header_len = 'read_headers: loop {
			if buf_pos == buf.len() { response.1 = "Request Too Large"; break 'ret_err; }
			match socket.read(&mut buf[buf_pos..]).await {
				Ok(0) => return,
				Ok(len) => {
					buf_pos += len;
					if let Some(pos) = buf[..buf_pos].windows(4).position(|w| w == b"\r\n\r\n") {
						break 'read_headers pos + 4;
					}
				},
				Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {},
				Err(_) => return,
			}
		};

		let headers = if let Ok(s) = std::str::from_utf8(&buf[..header_len]) { s } else { break 'ret_err; };
		let request = if let Some((r, _)) = headers.split_once("\r\n") { r } else { break 'ret_err; };

		let mut parts = request.split(' ');
		let (verb, path, http_vers);
		if let Some(v) = parts.next() { verb = v; } else { break 'ret_err; }
		if let Some(p) = parts.next() { path = p; } else { break 'ret_err; }
		if let Some(v) = parts.next() { http_vers = v; } else { break 'ret_err; }
		if parts.next().is_some() { break 'ret_err; }
		if http_vers != "HTTP/1.1" && http_vers != "HTTP/1.0" { break 'ret_err; }
		if path != "/" {
			response = ("404 Not Found", "Not Found");
			break 'ret_err;
		}
		if verb != "POST" {
			response = ("405 Method Not Allowed", "Method Not Allowed");
			break 'ret_err;
		}

		let body_len = if let Some(len) = content_length(headers) { len } else {
			response = ("411 Length Required", "Length Required");
			break 'ret_err;
		};
		let request_len = match header_len.checked_add(body_len) {
			Some(len) if len <= buf.len() => len,
			_ => { response.1 = "Request Too Large"; break 'ret_err; },
		};
		while buf_pos < request_len {
			match socket.read(&mut buf[buf_pos..request_len]).await {
				Ok(0) => return,
				Ok(len) => buf_pos += len,
				Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {},
				Err(_) => return,
			}
		}

		let body = handle_request(&*provider, &buf[header_len..request_len]).await;
		let _ = socket.write_all(
			format!(
				"HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n",
				body.len(),
			).as_bytes()
		).await;
		let _ = socket.write_all(&body).await;
		return;
	}
	let _ = socket.write_all(format!(
		"HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n{}",
		response.0, response.1.len(), response.1,
	).as_bytes()).await;
}

/// Serves requests arriving on `listener` from `provider` until the returned future is dropped.
pub async fn run_server(listener: TcpListener, provider: Arc<dyn ClaimDataProvider>, span: Span) {
	loop {
		let socket = match listener.accept().await {
			Ok((socket, peer)) => {
				trace!(parent: &span, %peer, "Accepted connection");
				socket
			},
			Err(e) => {
				debug!(parent: &span, error = %e, "Failed to accept connection");
				continue;
			},
		};
		let provider = Arc::clone(&provider);
		tokio::spawn(handle_connection(socket, provider).instrument(span.clone()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::claim::{ClaimData, MockClaimData};
	use crate::error::ClaimError;
	use crate::types::{Address, NameHash};

	use async_trait::async_trait;

	struct Fixed;

	#[async_trait]
	impl ClaimDataProvider for Fixed {
		async fn get_claim_data(&self, domain: &str) -> Result<ClaimData, ClaimError> {
			if domain.is_empty() { return Err(ClaimError::DomainNotAllowed); }
			Ok(ClaimData {
				node: NameHash([0x11; 32]),
				label: "test".to_owned(),
				owner: Address([0x22; 20]),
				signature_hash: vec![0x33; 32],
				signature: Vec::new(),
			})
		}
	}

	async fn call(provider: &dyn ClaimDataProvider, body: &str) -> Value {
		serde_json::from_slice(&handle_request(provider, body.as_bytes()).await).unwrap()
	}

	#[tokio::test]
	async fn results() {
		let res = call(&Fixed, r#"{"jsonrpc":"2.0","id":7,"method":"ens_getclaimdata","params":[{"domain":"test.wealdtech.eth"}]}"#).await;
		assert_eq!(res["id"], 7);
		assert_eq!(res["result"], serde_json::json!({
			"message": "Success",
			"node": format!("0x{}", "11".repeat(32)),
			"label": "test",
			"newowner": format!("0x{}", "22".repeat(20)),
			"signature": "0x",
		}));

		let res = call(&Fixed, r#"{"jsonrpc":"2.0","id":"a","method":"ENSService.GetClaimData","params":{"domain":"x.y"}}"#).await;
		assert_eq!(res["result"]["message"], "Success");
	}

	#[tokio::test]
	async fn failures_are_results() {
		let res = call(&MockClaimData, r#"{"jsonrpc":"2.0","id":1,"method":"ens_getclaimdata","params":[{"domain":"test.com"}]}"#).await;
		assert_eq!(res["result"], serde_json::json!({ "message": "mock" }));

		let res = call(&Fixed, r#"{"jsonrpc":"2.0","id":1,"method":"ens_getclaimdata","params":[{}]}"#).await;
		assert_eq!(res["result"]["message"], "domain not allowed");

		for params in ["", r#","params":null"#, r#","params":[]"#, r#","params":[null]"#] {
			let body = format!(r#"{{"jsonrpc":"2.0","id":1,"method":"ens_getclaimdata"{}}}"#, params);
			let res = call(&Fixed, &body).await;
			assert_eq!(res["result"]["message"], "no arguments supplied", "{}", body);
		}
	}

	#[tokio::test]
	async fn rpc_errors() {
		let res = call(&Fixed, "{").await;
		assert_eq!(res["error"]["code"], PARSE_ERROR);
		assert!(res["id"].is_null());

		let res = call(&Fixed, r#"{"jsonrpc":"2.0","id":3,"method":"eth_call","params":[]}"#).await;
		assert_eq!(res["error"]["code"], METHOD_NOT_FOUND);
		assert_eq!(res["id"], 3);

		let res = call(&Fixed, r#"{"jsonrpc":"2.0","id":3,"method":"ens_getclaimdata","params":"x"}"#).await;
		assert_eq!(res["error"]["code"], INVALID_PARAMS);

		let res = call(&Fixed, r#"{"jsonrpc":"2.0","id":3,"method":"ens_getclaimdata","params":[{"domain":5}]}"#).await;
		assert_eq!(res["error"]["code"], INVALID_PARAMS);

		let res = call(&Fixed, r#"[1, 2]"#).await;
		assert_eq!(res["error"]["code"], INVALID_REQUEST);
	}

	async fn spawn_server(provider: Arc<dyn ClaimDataProvider>) -> String {
		let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind to socket");
		let addr = listener.local_addr().unwrap();
		tokio::spawn(run_server(listener, provider, Span::none()));
		format!("http://{}/", addr)
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
	async fn test_http() {
		let url = spawn_server(Arc::new(Fixed)).await;
		let resp = minreq::post(&url)
			.with_header("Content-Type", "application/json")
			.with_body(r#"{"jsonrpc":"2.0","id":1,"method":"ens_getclaimdata","params":[{"domain":"test.wealdtech.eth"}]}"#)
			.send().unwrap();
		assert_eq!(resp.status_code, 200);
		let res: Value = serde_json::from_slice(resp.as_bytes()).unwrap();
		assert_eq!(res["result"]["label"], "test");
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
	async fn test_http_errors() {
		let url = spawn_server(Arc::new(MockClaimData)).await;

		let resp = minreq::get(&url).send().unwrap();
		assert_eq!(resp.status_code, 405);

		let resp = minreq::post(format!("{}rpc", url)).with_body("{}").send().unwrap();
		assert_eq!(resp.status_code, 404);

		let resp = minreq::post(&url)
			.with_body(r#"{"jsonrpc":"2.0","id":1,"method":"ens_getclaimdata","params":[{"domain":"a.b"}]}"#)
			.send().unwrap();
		assert_eq!(resp.status_code, 200);
		let res: Value = serde_json::from_slice(resp.as_bytes()).unwrap();
		assert_eq!(res["result"]["message"], "mock");
	}

	async fn raw_request(url: &str, request: &[u8]) -> String {
		let addr = url.trim_start_matches("http://").trim_end_matches('/');
		let mut socket = TcpStream::connect(addr).await.unwrap();
		socket.write_all(request).await.unwrap();
		let mut response = Vec::new();
		socket.read_to_end(&mut response).await.unwrap();
		String::from_utf8(response).unwrap()
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
	async fn oversized_content_length() {
		let url = spawn_server(Arc::new(Fixed)).await;

		let request = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", usize::MAX);
		let resp = raw_request(&url, request.as_bytes()).await;
		assert!(resp.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{}", resp);
		assert!(resp.ends_with("Request Too Large"), "{}", resp);

		let request = format!("POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n", MAX_REQUEST_LEN);
		let resp = raw_request(&url, request.as_bytes()).await;
		assert!(resp.ends_with("Request Too Large"), "{}", resp);

		// The server is still answering afterwards.
		let resp = minreq::post(&url)
			.with_body(r#"{"jsonrpc":"2.0","id":1,"method":"ens_getclaimdata","params":[{"domain":"a.b"}]}"#)
			.send().unwrap();
		assert_eq!(resp.status_code, 200);
	}

	#[test]
	fn headers() {
		let headers = "POST / HTTP/1.1\r\nHost: x\r\ncontent-length:  12\r\n\r\n";
		assert_eq!(content_length(headers), Some(12));
		assert_eq!(content_length("POST / HTTP/1.1\r\nHost: x\r\n\r\n"), None);
	}
}
