//! Session credential accessors.
//!
//! The dashboard's auth layer owns token issuance; the cover proxy only asks
//! for whatever token is current when it builds a library client.

use async_trait::async_trait;

use crate::config::SecureString;

/// Supplies a short-lived session token on demand.
///
/// `None` means "use the configured default credentials", never an error.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn session(&self) -> Option<SecureString>;
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(Option<SecureString>);

impl StaticSession {
    pub fn new(token: Option<SecureString>) -> Self {
        Self(token)
    }

    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl SessionSource for StaticSession {
    async fn session(&self) -> Option<SecureString> {
        self.0.clone()
    }
}

/// Reads the token from an environment variable on every call.
///
/// Not cached, so a rotated token is picked up by the next client rebuild.
#[derive(Debug, Clone)]
pub struct EnvSession {
    var: String,
}

impl EnvSession {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SessionSource for EnvSession {
    async fn session(&self) -> Option<SecureString> {
        std::env::var(&self.var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecureString::new)
    }
}
