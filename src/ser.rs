//! Serialization/Deserialization logic lives here

use crate::rr::*;

pub(crate) fn read_u8(inp: &mut &[u8]) -> Result<u8, ()> {
	let res = *inp.get(0).ok_or(())?;
	*inp = &inp[1..];
	Ok(res)
}
pub(crate) fn read_u16(inp: &mut &[u8]) -> Result<u16, ()> {
	if inp.len() < 2 { return Err(()); }
	let mut bytes = [0; 2];
	bytes.copy_from_slice(&inp[..2]);
	*inp = &inp[2..];
	Ok(u16::from_be_bytes(bytes))
}
pub(crate) fn read_u32(inp: &mut &[u8]) -> Result<u32, ()> {
	if inp.len() < 4 { return Err(()); }
	let mut bytes = [0; 4];
	bytes.copy_from_slice(&inp[..4]);
	*inp = &inp[4..];
	Ok(u32::from_be_bytes(bytes))
}

// A name can legitimately be spelled out in at most 127 pieces (each at least a length byte and
// one character), so anything beyond that is a pointer loop.
const MAX_NAME_PIECES: usize = 128;

/// Reads a name which may use RFC 1035 message compression, resolving pointers against the full
/// `wire_packet`.
///
/// `inp` is advanced past the name as it appears in `inp`, i.e. up to and including the first
/// pointer, wherever that pointer leads.
pub(crate) fn read_wire_packet_name(inp: &mut &[u8], wire_packet: &[u8]) -> Result<Name, ()> {
	let mut name = String::with_capacity(256);
	let mut read: &[u8] = *inp;
	let mut consumed = None;
	let mut pieces = 0;
	loop {
		pieces += 1;
		if pieces > MAX_NAME_PIECES { return Err(()); }
		let len = read_u8(&mut read)? as usize;
		if len == 0 {
			if name.is_empty() { name += "."; }
			break;
		}
		if len & 0xc0 == 0xc0 {
			let offset = ((len & 0x3f) << 8) | read_u8(&mut read)? as usize;
			if consumed.is_none() { consumed = Some(inp.len() - read.len()); }
			if offset >= wire_packet.len() { return Err(()); }
			read = &wire_packet[offset..];
			continue;
		}
		if len & 0xc0 != 0 { return Err(()); }
		if read.len() < len { return Err(()); }
		name += core::str::from_utf8(&read[..len]).map_err(|_| ())?;
		name += ".";
		read = &read[len..];
		if name.len() > 255 { return Err(()); }
	}
	let consumed = consumed.unwrap_or(inp.len() - read.len());
	*inp = &inp[consumed..];
	name.try_into().map_err(|_| ())
}

pub(crate) fn write_name(out: &mut Vec<u8>, name: &str) {
	let canonical_name = name.to_ascii_lowercase();
	if canonical_name == "." {
		out.push(0);
	} else {
		// Names always end in ".", so the final split yields the empty root label.
		for label in canonical_name.split('.') {
			out.push(label.len() as u8);
			out.extend_from_slice(label.as_bytes());
		}
	}
}

/// Reads a resource record from a DNS message, returning `None` for anything other than an
/// INternet-class TXT record, as well as the record's TTL.
pub(crate) fn parse_wire_packet_rr(inp: &mut &[u8], wire_packet: &[u8]) -> Result<(Option<Txt>, u32), ()> {
	let name = read_wire_packet_name(inp, wire_packet)?;
	let ty = read_u16(inp)?;
	let class = read_u16(inp)?;
	let ttl = read_u32(inp)?;
	let data_len = read_u16(inp)? as usize;
	if inp.len() < data_len { return Err(()); }
	let data = &inp[..data_len];
	*inp = &inp[data_len..];

	if class != 1 || ty != Txt::TYPE { return Ok((None, ttl)); }
	Ok((Some(Txt::read_from_data(name, data)?), ttl))
}
