//! Vigil Auth - certificate authentication and identity binding.
//!
//! This crate provides:
//! - [`ClientCertificate`]: CA-signed client certificates with an armored
//!   text encoding and BLAKE3 fingerprints
//! - [`CertBinding`] tables mapping certificates or issuers to policies
//! - [`RevocationChecker`], consulted under a timeout and failing closed
//! - [`TokenStore`]: period-based access tokens on the Tokio clock
//! - [`IdentityBinder`]: turns a [`Credential`] into an [`Identity`]
//!
//! # Example
//!
//! ```
//! use vigil_auth::{BinderConfig, CertBinding, IdentityBinder};
//! use vigil_crypto::{KeyPair, TrustAnchor};
//!
//! let ca = KeyPair::generate();
//! let binder = IdentityBinder::new(BinderConfig::new(TrustAnchor::from_keys([
//!     ca.export_public_key(),
//! ])));
//! binder
//!     .bind_issuer(ca.key_id(), CertBinding::new("test", ["kv-policy"]))
//!     .unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod binder;
mod binding;
mod certificate;
mod error;
mod revocation;
mod token;

pub use binder::{BinderConfig, Credential, DEFAULT_REVOCATION_TIMEOUT, IdentityBinder};
pub use binding::{BindingRegistry, BindingSource, CertBinding};
pub use certificate::{
    CertificateId, CertificateParams, ClientCertificate, ca_key_from_pem, ca_key_to_pem,
    parse_key_id,
};
pub use error::{AuthError, AuthResult};
pub use revocation::{
    NoRevocation, RevocationChecker, RevocationError, RevocationStatus, SerialRevocationList,
};
pub use token::{AccessToken, Identity, TokenGrant, TokenStore};
