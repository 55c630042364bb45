//! ENS lets the owner of a name hand out subdomains beneath it, but only through a registrar
//! contract which must be convinced that the claimant is entitled to the label being claimed.
//!
//! This crate implements the off-chain half of that process for a set of parent domains which
//! this instance manages. Given a fully-qualified domain name it:
//!  * matches the name against the configured managed parents ([`control`], [`claim`]),
//!  * proves control of the parent through a DNS TXT record of the form `a=0x<address>`
//!    ([`owner`], built on the wire-format handling in [`query`], [`rr`] and [`ser`]),
//!  * computes the EIP-137 namehash of the parent ([`namehash`]), and
//!  * asks the parent's registrar contract, via a read-only `eth_call`, for the hash which must be
//!    signed to authorize the claim ([`registrar`], [`eth`], [`abi`]).
//!
//! The resulting [`claim::ClaimData`] is what a registrar transaction needs. Signing the hash is
//! exposed as the [`signer::Signer`] capability; no signing scheme is provided.
//!
//! The crate can be built as a binary using the `build_server` feature, answering JSON-RPC
//! `ens_getclaimdata` calls over HTTP (see [`daemon`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod types;
pub mod error;
pub mod rr;
pub mod ser;
pub mod query;
pub mod owner;
pub mod namehash;
pub mod abi;
pub mod eth;
pub mod registrar;
pub mod control;
pub mod signer;
pub mod claim;
pub mod config;
pub mod daemon;
