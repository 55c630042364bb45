//! Produces the data a registrar needs to record a subdomain claim.
//!
//! A claim for `label.parent` proceeds in order through:
//!  1. matching `parent` against the managed domains,
//!  2. resolving the owner `parent` publishes in its DNS,
//!  3. obtaining the signature hash from the registrar of `parent`, and
//!  4. signing that hash.
//!
//! The first failure ends the claim; nothing is retried and no stage has side effects which would
//! need undoing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, Instrument, Span};

use crate::control::DomainControl;
use crate::error::ClaimError;
use crate::namehash::name_hash;
use crate::owner::OwnerResolver;
use crate::registrar::SignatureHasher;
use crate::signer::Signer;
use crate::types::{to_prefixed_hex, Address, NameHash};

/// Everything a registrar transaction needs to record a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimData {
	/// The name identifier of the managed parent domain.
	pub node: NameHash,
	/// The label being claimed beneath the parent.
	pub label: String,
	/// The owner published in the parent's DNS, who becomes the owner of the new name.
	pub owner: Address,
	/// The hash the registrar requires to be signed.
	pub signature_hash: Vec<u8>,
	/// The signature over `signature_hash`. Empty as long as no signing scheme is configured.
	pub signature: Vec<u8>,
}

/// Provides claim data for fully-qualified domain names.
#[async_trait]
pub trait ClaimDataProvider: Send + Sync {
	/// Obtains the claim data for `domain`.
	async fn get_claim_data(&self, domain: &str) -> Result<ClaimData, ClaimError>;
}

/// Strips the leading and trailing separators from `domain`. The root, `"."`, is kept as is.
///
/// Every separator at either end goes, not just one, so `"..a.b."` becomes `"a.b"` and
/// normalizing twice gives the same result as normalizing once.
pub fn normalize_domain(domain: &str) -> &str {
	if domain == "." { return domain; }
	domain.trim_matches('.')
}

/// A request matched against a managed domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedMatch<'a> {
	/// The managed parent domain.
	pub control: &'a DomainControl,
	/// The first label of the request.
	pub label: String,
}

/// Finds the managed domain `fqdn` would be claimed beneath.
///
/// Everything after the first label must itself be a managed domain; `a.b.wealdtech.eth` is only
/// claimable if `b.wealdtech.eth` is managed, regardless of `wealdtech.eth`.
pub fn managed_domain<'a>(controls: &'a HashMap<String, DomainControl>, fqdn: &str)
-> Result<ManagedMatch<'a>, ClaimError> {
	let domain = normalize_domain(fqdn);
	if domain == "." { return Err(ClaimError::DomainNotAllowed); }
	let (label, parent) = domain.split_once('.').ok_or(ClaimError::DomainNotAllowed)?;
	let control = controls.get(parent).ok_or(ClaimError::DomainNotSupported)?;
	Ok(ManagedMatch { control, label: label.to_owned() })
}

/// The standard [`ClaimDataProvider`], proving ownership through DNS and asking the parent's
/// registrar for the signature hash.
pub struct ClaimService {
	controls: HashMap<String, DomainControl>,
	owners: Box<dyn OwnerResolver>,
	hasher: Box<dyn SignatureHasher>,
	signer: Box<dyn Signer>,
	timeout: Duration,
	span: Span,
}

impl ClaimService {
	/// Creates a service managing the domains in `controls`.
	///
	/// Each claim, including all of its DNS and contract calls, must complete within `timeout`.
	pub fn new(
		controls: HashMap<String, DomainControl>,
		owners: Box<dyn OwnerResolver>,
		hasher: Box<dyn SignatureHasher>,
		signer: Box<dyn Signer>,
		timeout: Duration,
		span: Span,
	) -> Self {
		Self { controls, owners, hasher, signer, timeout, span }
	}

	async fn claim(&self, domain: &str) -> Result<ClaimData, ClaimError> {
		let managed = managed_domain(&self.controls, domain)?;
		let parent = managed.control;
		trace!(domain, parent_domain = %parent.domain, parent_owner = %parent.owner, "Obtained parent domain");

		let node = name_hash(&parent.domain)?;

		let owner = self.owners.resolve_owner(&parent.domain).await?;
		trace!(domain, %owner, "Obtained domain owner");

		let name = normalize_domain(domain);
		let signature_hash = self.hasher.signature_hash(name, &parent.domain, owner).await?;
		trace!(domain, hash = %to_prefixed_hex(&signature_hash), "Obtained signature hash");

		let signature = self.signer.sign(&signature_hash, parent).await?;
		trace!(domain, signature = %to_prefixed_hex(&signature), "Signed hash");

		Ok(ClaimData { node, label: managed.label, owner, signature_hash, signature })
	}
}

#[async_trait]
impl ClaimDataProvider for ClaimService {
	async fn get_claim_data(&self, domain: &str) -> Result<ClaimData, ClaimError> {
		async {
			let res = match tokio::time::timeout(self.timeout, self.claim(domain)).await {
				Ok(res) => res,
				Err(_) => Err(ClaimError::Timeout(self.timeout)),
			};
			if let Err(e) = &res {
				debug!(domain, stage = e.stage(), error = %e, "Claim failed");
			}
			res
		}.instrument(self.span.clone()).await
	}
}

/// A [`ClaimDataProvider`] which fails every request with [`ClaimError::Mock`].
pub struct MockClaimData;

#[async_trait]
impl ClaimDataProvider for MockClaimData {
	async fn get_claim_data(&self, _domain: &str) -> Result<ClaimData, ClaimError> {
		Err(ClaimError::Mock)
	}
}
