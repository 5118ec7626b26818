//! Vigil Test - shared test utilities for the Vigil access engine.
//!
//! Add as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! vigil-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use vigil_core::Operation;
//! use vigil_test::TestHarness;
//!
//! #[tokio::test]
//! async fn test_read_secret() {
//!     let harness = TestHarness::new();
//!     let cred = harness.client_credential();
//!     let decision = harness
//!         .evaluator()
//!         .authorize(&cred, "kv/data/foo", Operation::Read)
//!         .await
//!         .unwrap();
//!     assert!(decision.allowed);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod authority;
pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use authority::*;
pub use fixtures::*;
pub use harness::*;
pub use mocks::*;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
