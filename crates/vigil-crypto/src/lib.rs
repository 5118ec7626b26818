//! Vigil Crypto - primitives behind certificate authentication.
//!
//! This crate provides:
//! - Ed25519 key pairs with zeroized secret material
//! - Detached signatures used by certificate authorities
//! - BLAKE3 fingerprints that identify certificates
//! - [`TrustAnchor`], the registry of CA keys a binder accepts
//!
//! # Example
//!
//! ```
//! use vigil_crypto::{KeyPair, TrustAnchor};
//!
//! let ca = KeyPair::generate();
//! let mut anchor = TrustAnchor::new();
//! let ca_id = anchor.add_trusted_key(ca.export_public_key());
//!
//! let signature = ca.sign(b"subject=test1");
//! assert!(anchor.verify(&ca_id, b"subject=test1", &signature).is_ok());
//! assert!(anchor.verify(&ca_id, b"subject=other", &signature).is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hash;
mod keypair;
mod signature;
mod verifier;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use keypair::{KeyPair, PublicKey};
pub use signature::Signature;
pub use verifier::{KeyId, TrustAnchor};
