//! A fully provisioned evaluator for end-to-end tests.
//!
//! The harness mirrors the reference deployment: one CA, one client
//! certificate for [`TEST_CLIENT`], `kv-policy` and `tag-policy` installed,
//! and an issuer-wide binding named `test` granting both with a token period
//! of zero.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vigil_access::{AccessContext, AccessEvaluator, AccessResult};
use vigil_auth::{BinderConfig, CertBinding, Credential, IdentityBinder, RevocationChecker};
use vigil_policy::{PolicyStore, ResolverConfig};

use crate::authority::{IssuedCertificate, TestAuthority};
use crate::fixtures::{TEST_CLIENT, test_policy_store};

/// Name of the issuer binding the harness registers.
pub const TEST_BINDING: &str = "test";

/// Builder for [`TestHarness`].
#[must_use]
pub struct TestHarnessBuilder {
    token_period: Duration,
    resolver: ResolverConfig,
    revocation: Option<Arc<dyn RevocationChecker>>,
    revocation_timeout: Option<Duration>,
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self {
            token_period: Duration::ZERO,
            resolver: ResolverConfig::default(),
            revocation: None,
            revocation_timeout: None,
        }
    }
}

impl TestHarnessBuilder {
    /// Token period for the `test` binding.
    pub fn token_period(mut self, period: Duration) -> Self {
        self.token_period = period;
        self
    }

    /// Resolver settings.
    pub fn resolver(mut self, config: ResolverConfig) -> Self {
        self.resolver = config;
        self
    }

    /// Revocation checker for the binder.
    pub fn revocation_checker(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = Some(checker);
        self
    }

    /// Bound on each revocation check.
    pub fn revocation_timeout(mut self, timeout: Duration) -> Self {
        self.revocation_timeout = Some(timeout);
        self
    }

    /// Provision the evaluator.
    ///
    /// # Errors
    ///
    /// Returns an error if a fixture policy or the binding is rejected.
    pub fn build(self) -> AccessResult<TestHarness> {
        let authority = TestAuthority::new();
        let client = authority.issue(TEST_CLIENT);
        let policies = test_policy_store()?;

        let mut binder_config = BinderConfig::new(authority.trust_anchor());
        if let Some(timeout) = self.revocation_timeout {
            binder_config = binder_config.with_revocation_timeout(timeout);
        }
        let mut binder = IdentityBinder::new(binder_config);
        if let Some(checker) = self.revocation {
            binder = binder.with_revocation_checker(checker);
        }
        binder.bind_issuer(
            authority.key_id(),
            CertBinding::new(TEST_BINDING, ["kv-policy", "tag-policy"])
                .with_token_period(self.token_period),
        )?;

        let context = AccessContext::new(policies, Arc::new(binder), self.resolver);
        Ok(TestHarness {
            authority,
            client,
            evaluator: Arc::new(AccessEvaluator::new(Arc::new(context))),
        })
    }
}

/// CA, client certificate and evaluator wired together.
#[derive(Debug)]
pub struct TestHarness {
    authority: TestAuthority,
    client: IssuedCertificate,
    evaluator: Arc<AccessEvaluator>,
}

impl TestHarness {
    /// Harness with default settings.
    ///
    /// # Errors
    ///
    /// See [`TestHarnessBuilder::build`].
    pub fn new() -> AccessResult<Self> {
        Self::builder().build()
    }

    /// Start a customized harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// The CA.
    #[must_use]
    pub fn authority(&self) -> &TestAuthority {
        &self.authority
    }

    /// The default client certificate and key.
    #[must_use]
    pub fn client(&self) -> &IssuedCertificate {
        &self.client
    }

    /// The default client certificate as a credential.
    #[must_use]
    pub fn client_credential(&self) -> Credential {
        self.client.credential()
    }

    /// The evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &Arc<AccessEvaluator> {
        &self.evaluator
    }

    /// The policy store behind the evaluator.
    #[must_use]
    pub fn policies(&self) -> &Arc<PolicyStore> {
        self.evaluator.context().policies()
    }

    /// The identity binder behind the evaluator.
    #[must_use]
    pub fn binder(&self) -> &Arc<IdentityBinder> {
        self.evaluator.context().binder()
    }

    /// Write the CA and client material under `dir`, replacing whatever was
    /// there:
    ///
    /// ```text
    /// dir/ca/ca.pem
    /// dir/test1/test1.pem
    /// dir/test1/test1.pk
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be cleared or written.
    pub fn write_tls_material(&self, dir: &Path) -> io::Result<()> {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {},
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => return Err(e),
        }

        let ca_dir = dir.join("ca");
        std::fs::create_dir_all(&ca_dir)?;
        std::fs::write(ca_dir.join("ca.pem"), self.authority.ca_pem())?;

        let name = self.client.certificate.common_name();
        let client_dir = dir.join(name);
        std::fs::create_dir_all(&client_dir)?;
        let cert_pem = self.client.certificate.to_pem().map_err(io::Error::other)?;
        std::fs::write(client_dir.join(format!("{name}.pem")), cert_pem)?;
        std::fs::write(
            client_dir.join(format!("{name}.pk")),
            self.client.private_key_pem(),
        )?;

        tracing::debug!(dir = %dir.display(), "Wrote TLS material");
        Ok(())
    }
}
