//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_auth::prelude::*;` to import all essential types.

pub use crate::{AuthError, AuthResult};

pub use crate::{BinderConfig, Credential, Identity, IdentityBinder};

pub use crate::{CertBinding, CertificateId, ClientCertificate};

pub use crate::{RevocationChecker, RevocationStatus};
