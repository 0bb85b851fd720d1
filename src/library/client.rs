//! Authenticated connection handle to the ebook library server.

use std::time::{Duration, SystemTime};

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use base64::Engine;
use reqwest::{Client, Response};

use crate::config::{Credentials, LibraryConfig};
use crate::covers::CoverError;

/// Shared, immutable client context.
///
/// Built once per effective configuration and handed out as `Arc<LibraryClient>`.
/// Never mutated; the registry swaps in a new handle instead.
#[derive(Debug)]
pub struct LibraryClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    created_at: SystemTime,
    generation: u64,
    config: LibraryConfig,
}

impl LibraryClient {
    /// Build a client and, if configured, verify it with a handshake request.
    pub async fn connect(
        config: &LibraryConfig,
        credentials: Credentials,
        generation: u64,
    ) -> Result<Self, CoverError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .timeout(Duration::from_secs(config.timeout_seconds as u64))
            .build()
            .map_err(|e| CoverError::Internal(format!("Failed to build library client: {}", e)))?;

        let client = Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            created_at: SystemTime::now(),
            generation,
            config: config.clone(),
        };

        if let Some(path) = config.handshake_path.as_deref() {
            client.handshake(path).await?;
        }

        Ok(client)
    }

    async fn handshake(&self, path: &str) -> Result<(), CoverError> {
        let url = self.url(path);
        let response = self
            .get(path)
            .await
            .map_err(|e| CoverError::from_transport(&url, &e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(url = %url, "Library handshake succeeded");
            return Ok(());
        }
        if is_auth_status(status) {
            return Err(CoverError::Authentication {
                status: Some(status.as_u16()),
                message: format!("handshake at {} rejected {} credentials", url, self.credentials.kind()),
                after_retry: false,
            });
        }
        Err(CoverError::Upstream {
            status: Some(status.as_u16()),
            message: format!("handshake at {} returned {}", url, status),
        })
    }

    /// Issue a single GET for `path` with this handle's credentials.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        let mut builder = self.http.get(self.url(path));
        if let Some(value) = self.authorization() {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.send().await
    }

    fn authorization(&self) -> Option<String> {
        match &self.credentials {
            Credentials::Session(token) => Some(format!("Bearer {}", token.expose())),
            Credentials::Basic { username, password } => {
                let raw = format!("{}:{}", username, password.expose());
                let encoded = base64::engine::general_purpose::STANDARD.encode(raw);
                Some(format!("Basic {}", encoded))
            }
            Credentials::Anonymous => None,
        }
    }

    /// Absolute URL for a server-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Build counter value; distinguishes a handle from its replacement.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this handle was built from `config`.
    pub fn matches(&self, config: &LibraryConfig) -> bool {
        self.config == *config
    }
}

/// 401 and 403 mean the credentials, not the resource, are the problem.
pub fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
