//! Prediction secrets gating predictor creation.

use std::fmt;

use tokio::sync::oneshot;

/// A short-lived credential issued for one predictor creation.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap an issued credential.
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// The raw credential.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never leak the credential through debug output.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Issues prediction secrets on demand.
///
/// `issue` hands the provider a one-shot delivery closure; the provider
/// calls it exactly once, from any thread, with `Some(secret)` on success
/// or `None` on denial. Issuance may complete before `issue` returns or
/// long after.
pub trait SecretProvider: Send + Sync {
    /// Request one secret.
    fn issue(&self, deliver: Box<dyn FnOnce(Option<Secret>) + Send>);
}

/// A provider that always delivers the same pre-issued secret.
///
/// Useful for tests and for embedders that obtained a credential out of
/// band.
pub struct StaticSecretProvider(Option<Secret>);

impl StaticSecretProvider {
    /// A provider that delivers `secret` to every request.
    pub fn new(secret: impl Into<String>) -> Self {
        StaticSecretProvider(Some(Secret::new(secret)))
    }

    /// A provider that denies every request.
    pub fn denying() -> Self {
        StaticSecretProvider(None)
    }
}

impl SecretProvider for StaticSecretProvider {
    fn issue(&self, deliver: Box<dyn FnOnce(Option<Secret>) + Send>) {
        deliver(self.0.clone());
    }
}

/// Await one secret from a provider.
///
/// A provider that drops the delivery closure without calling it counts
/// as a denial.
pub(crate) async fn issue_secret(provider: &dyn SecretProvider) -> Option<Secret> {
    let (tx, rx) = oneshot::channel();
    provider.issue(Box::new(move |secret| {
        // The requester may have given up waiting; delivery is then a no-op.
        let _ = tx.send(secret);
    }));
    rx.await.ok().flatten()
}
