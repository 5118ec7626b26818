//! Common imports for tests.
//!
//! ```rust
//! use vigil_test::prelude::*;
//! ```

pub use crate::{
    CountingRevocation, FailingRevocation, IssuedCertificate, SlowRevocation, TEST_CLIENT,
    TestAuthority, TestHarness, init_test_logging, kv_policy, tag_policy,
};
