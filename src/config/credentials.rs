//! Credential resolution for the library server.
//!
//! A session token wins over configured basic-auth credentials; with neither
//! the client talks to the server anonymously.

use super::types::LibraryConfig;

/// Wrapper for sensitive strings that prevents accidental logging.
///
/// The inner value is never exposed via Debug or Display traits.
/// Use `expose()` to access the actual value when needed for requests.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString(String);

impl SecureString {
    /// Create a new secure string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value.
    ///
    /// Use sparingly and only when actually sending to the server.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(••••••••)")
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "••••••••")
    }
}

/// Credentials a client handle was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>` from the session accessor.
    Session(SecureString),
    /// HTTP basic auth from configuration.
    Basic {
        username: String,
        password: SecureString,
    },
    /// No authentication.
    Anonymous,
}

impl Credentials {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Session(_) => "session",
            Credentials::Basic { .. } => "basic",
            Credentials::Anonymous => "anonymous",
        }
    }
}

/// Why credentials could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCredential {
    pub reason: String,
}

impl LibraryConfig {
    /// Resolve the credentials to use, given an optional session token.
    ///
    /// An empty token is treated as absent. A username without a password
    /// is reported as missing rather than silently downgraded to anonymous.
    pub fn resolve_credentials(
        &self,
        session: Option<SecureString>,
    ) -> Result<Credentials, MissingCredential> {
        if let Some(token) = session {
            if !token.expose().is_empty() {
                return Ok(Credentials::Session(token));
            }
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !password.is_empty() => Ok(Credentials::Basic {
                username: username.clone(),
                password: SecureString::new(password.clone()),
            }),
            (Some(username), _) => Err(MissingCredential {
                reason: format!("password is not set for library user '{}'", username),
            }),
            (None, _) => Ok(Credentials::Anonymous),
        }
    }
}
