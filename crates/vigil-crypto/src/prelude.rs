//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_crypto::prelude::*;` to import all essential types.

pub use crate::{CryptoError, CryptoResult};
pub use crate::{ContentHash, KeyId, KeyPair, PublicKey, Signature, TrustAnchor};
