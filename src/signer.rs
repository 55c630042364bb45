//! Signing of the registrar's signature hash.
//!
//! No signing scheme has been defined for claims, so the only [`Signer`] provided is [`Unsigned`],
//! which leaves the signature empty. A real scheme would plug in here, using the passphrase from
//! the parent's [`DomainControl`].

use async_trait::async_trait;

use crate::control::DomainControl;
use crate::error::ClaimError;

/// Signs a signature hash on behalf of a managed parent domain.
#[async_trait]
pub trait Signer: Send + Sync {
	/// Produces the signature over `hash` for a claim beneath `control`'s domain.
	async fn sign(&self, hash: &[u8], control: &DomainControl) -> Result<Vec<u8>, ClaimError>;
}

/// The default [`Signer`]. Signing is not implemented; every signature is empty.
pub struct Unsigned;

#[async_trait]
impl Signer for Unsigned {
	async fn sign(&self, _hash: &[u8], _control: &DomainControl) -> Result<Vec<u8>, ClaimError> {
		Ok(Vec::new())
	}
}
