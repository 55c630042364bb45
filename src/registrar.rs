//! Obtains, from the registrar contract responsible for a parent domain, the hash which must be
//! signed to authorize a subdomain claim.

use async_trait::async_trait;
use hex_lit::hex;
use tracing::{trace, Instrument, Span};

use crate::abi::{decode_address, encode_call};
use crate::error::ClaimError;
use crate::eth::EthClient;
use crate::namehash::name_hash;
use crate::types::Address;

/// The ENS registry deployed on Ethereum mainnet and its public testnets.
pub const ENS_REGISTRY: Address = Address(hex!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e"));

const REGISTRY_OWNER: &str = "owner(bytes32)";
const REGISTRAR_SIGNATURE_HASH: &str = "getSignatureHash(bytes32,address)";

/// Computes the hash a claim's signature must cover.
#[async_trait]
pub trait SignatureHasher: Send + Sync {
	/// Returns the hash which authorizes `owner` to claim `name` beneath `domain`, exactly as the
	/// registrar returned it.
	async fn signature_hash(&self, name: &str, domain: &str, owner: Address) -> Result<Vec<u8>, ClaimError>;
}

/// A [`SignatureHasher`] which asks the on-chain registrar of the parent domain.
///
/// The registrar is whichever address the ENS registry records as the parent's owner.
pub struct EnsRegistrar {
	eth: EthClient,
	registry: Address,
	span: Span,
}

impl EnsRegistrar {
	/// Creates a client using `eth` to reach the registry at `registry`, logging under `span`.
	pub fn new(eth: EthClient, registry: Address, span: Span) -> Self {
		Self { eth, registry, span }
	}

	/// Looks up the registrar contract responsible for `domain`.
	pub async fn registrar_address(&self, domain: &str) -> Result<Address, ClaimError> {
		let node = name_hash(domain)?;
		let data = encode_call(REGISTRY_OWNER, &[node.into()]);
		let output = self.eth.call(Address::ZERO, self.registry, &data).await?;
		let address = decode_address(&output)
			.map_err(|()| ClaimError::ContractCall(format!("unexpected registry output of {} bytes", output.len())))?;
		if address.is_zero() {
			return Err(ClaimError::NoRegistrar(domain.to_owned()));
		}
		Ok(address)
	}
}

#[async_trait]
impl SignatureHasher for EnsRegistrar {
	async fn signature_hash(&self, name: &str, domain: &str, owner: Address) -> Result<Vec<u8>, ClaimError> {
		async {
			let node = name_hash(name)?;
			trace!(domain, name_hash = %node, "Calculated name hash");

			let registrar = self.registrar_address(domain).await?;
			trace!(domain, address = %registrar, "Obtained registrar address");

			let data = encode_call(REGISTRAR_SIGNATURE_HASH, &[node.into(), owner.into()]);
			self.eth.call(owner, registrar, &data).await
		}.instrument(self.span.clone()).await
	}
}

/// A [`SignatureHasher`] which always returns the same 20 bytes, for exercising the pipeline
/// without an execution-layer node.
pub struct MockRegistrar;

impl MockRegistrar {
	/// The hash every call returns.
	pub const HASH: [u8; 20] = [
		0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09,
		0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10, 0x12, 0x13, 0x14,
	];
}

#[async_trait]
impl SignatureHasher for MockRegistrar {
	async fn signature_hash(&self, _name: &str, _domain: &str, _owner: Address) -> Result<Vec<u8>, ClaimError> {
		Ok(Self::HASH.to_vec())
	}
}
