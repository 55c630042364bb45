//! This module exposes utilities for looking up TXT records by directly querying a recursive
//! resolver over UDP.
//!
//! Unlike a full stub resolver we send exactly one query and accept exactly one response: there
//! are no retries, no fallback to TCP and no caching.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use ring::rand::{SecureRandom, SystemRandom};
use tokio::net::UdpSocket;

use crate::error::ClaimError;
use crate::rr::*;
use crate::ser::*;

// Without EDNS a server may not send us more than 512 bytes, but be generous in what we accept.
const MAX_UDP_RESPONSE: usize = 4096;

const FLAG_RESPONSE: u16 = 0b1000_0000_0000_0000;
const FLAG_TRUNCATED: u16 = 0b0000_0010_0000_0000;
const FLAG_RECURSION_DESIRED: u16 = 0b0000_0001_0000_0000;
const RCODE_MASK: u16 = 0b1111;
const RCODE_NXDOMAIN: u16 = 3;

fn random_txid() -> Result<u16, ClaimError> {
	let mut bytes = [0; 2];
	SystemRandom::new().fill(&mut bytes)
		.map_err(|_| ClaimError::Protocol("failed to generate query ID"))?;
	Ok(u16::from_be_bytes(bytes))
}

/// Builds a recursive query for the TXT records at `domain`, class INternet, with the given
/// transaction ID.
pub fn build_txt_query(domain: &Name, txid: u16) -> Vec<u8> {
	let mut query = Vec::with_capacity(12 + domain.len() + 1 + 4);
	query.extend_from_slice(&txid.to_be_bytes());
	query.extend_from_slice(&FLAG_RECURSION_DESIRED.to_be_bytes());
	query.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0]); // One question, nothing else
	write_name(&mut query, domain);
	query.extend_from_slice(&Txt::TYPE.to_be_bytes());
	query.extend_from_slice(&1u16.to_be_bytes()); // INternet class
	query
}

#[cfg(fuzzing)]
/// Read some input and parse it as if it came from a server, for fuzzing.
pub fn fuzz_response(response: &[u8]) {
	if response.len() < 2 { return; }
	let txid = u16::from_be_bytes([response[0], response[1]]);
	let _ = handle_response(response, txid);
}

/// Validates a response to the query with transaction ID `txid` and returns the TXT records in
/// its answer section, in the order the server sent them.
///
/// A name which does not exist is not an error here; it simply has no TXT records.
pub fn handle_response(resp: &[u8], txid: u16) -> Result<Vec<Txt>, ClaimError> {
	const MALFORMED: ClaimError = ClaimError::Protocol("malformed response");

	let mut read: &[u8] = resp;
	if read_u16(&mut read).map_err(|()| MALFORMED)? != txid {
		return Err(ClaimError::Protocol("query ID mismatch"));
	}
	let flags = read_u16(&mut read).map_err(|()| MALFORMED)?;
	if flags & FLAG_RESPONSE == 0 {
		return Err(ClaimError::Protocol("not a response"));
	}
	if flags & FLAG_TRUNCATED != 0 {
		return Err(ClaimError::Protocol("truncated response"));
	}
	match flags & RCODE_MASK {
		0|RCODE_NXDOMAIN => {},
		_ => return Err(ClaimError::Protocol("server returned an error")),
	}
	let questions = read_u16(&mut read).map_err(|()| MALFORMED)?;
	let answers = read_u16(&mut read).map_err(|()| MALFORMED)?;
	let _authorities = read_u16(&mut read).map_err(|()| MALFORMED)?;
	let _additional = read_u16(&mut read).map_err(|()| MALFORMED)?;

	for _ in 0..questions {
		read_wire_packet_name(&mut read, resp).map_err(|()| MALFORMED)?;
		read_u16(&mut read).map_err(|()| MALFORMED)?; // type
		read_u16(&mut read).map_err(|()| MALFORMED)?; // class
	}

	// Authority and additional sections carry nothing we use.
	let mut txts = Vec::new();
	for _ in 0..answers {
		let (txt, _ttl) = parse_wire_packet_rr(&mut read, resp).map_err(|()| MALFORMED)?;
		if let Some(txt) = txt { txts.push(txt); }
	}
	Ok(txts)
}

/// Sends a single TXT query for `domain` to the resolver at `resolver` over UDP and returns the
/// TXT records in the answer.
///
/// This does not time out on its own; callers should bound it (see
/// [`crate::claim::ClaimService`]). Dropping the future abandons the query.
pub async fn query_txt(resolver: SocketAddr, domain: &Name) -> Result<Vec<Txt>, ClaimError> {
	let txid = random_txid()?;
	let query = build_txt_query(domain, txid);

	let bind_addr: SocketAddr = if resolver.is_ipv4() {
		(Ipv4Addr::UNSPECIFIED, 0).into()
	} else {
		(Ipv6Addr::UNSPECIFIED, 0).into()
	};
	let socket = UdpSocket::bind(bind_addr).await?;
	socket.connect(resolver).await?;
	socket.send(&query).await?;

	let mut buf = vec![0; MAX_UDP_RESPONSE];
	let len = socket.recv(&mut buf).await?;
	handle_response(&buf[..len], txid)
}

#[cfg(test)]
pub(crate) mod test_utils {
	use std::net::SocketAddr;
	use tokio::net::UdpSocket;

	/// Builds a response to `query` answering with one TXT record per entry of `records`, each
	/// made of the given character-strings.
	pub(crate) fn txt_response(query: &[u8], records: &[&[&[u8]]]) -> Vec<u8> {
		let mut resp = Vec::new();
		resp.extend_from_slice(&query[..2]);
		resp.extend_from_slice(&0x8180u16.to_be_bytes()); // Response, RD, RA, NOERROR
		resp.extend_from_slice(&1u16.to_be_bytes());
		resp.extend_from_slice(&(records.len() as u16).to_be_bytes());
		resp.extend_from_slice(&[0, 0, 0, 0]);
		resp.extend_from_slice(&query[12..]);
		for strings in records {
			resp.extend_from_slice(&[0xc0, 12]); // Pointer to the question name
			resp.extend_from_slice(&16u16.to_be_bytes());
			resp.extend_from_slice(&1u16.to_be_bytes());
			resp.extend_from_slice(&300u32.to_be_bytes());
			let rdlen: usize = strings.iter().map(|s| s.len() + 1).sum();
			resp.extend_from_slice(&(rdlen as u16).to_be_bytes());
			for s in strings.iter() {
				resp.push(s.len() as u8);
				resp.extend_from_slice(s);
			}
		}
		resp
	}

	/// Binds a UDP "resolver" on localhost which answers every query with `respond(query)`.
	pub(crate) async fn spawn_resolver<F>(respond: F) -> SocketAddr
	where F: Fn(&[u8]) -> Vec<u8> + Send + 'static {
		let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
		let addr = socket.local_addr().unwrap();
		tokio::spawn(async move {
			let mut buf = [0; 512];
			loop {
				let (len, peer) = match socket.recv_from(&mut buf).await {
					Ok(res) => res,
					Err(_) => return,
				};
				let _ = socket.send_to(&respond(&buf[..len]), peer).await;
			}
		});
		addr
	}
}
