use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Local HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the dashboard server (host:port).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// Connection settings for the ebook library server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Base URL of the library server (e.g., "http://calibre.lan:8080").
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Username for HTTP basic auth, used when no session token is available.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for HTTP basic auth.
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding a short-lived session token.
    #[serde(default)]
    pub session_env_var: Option<String>,
    /// Path probed once when a client is built to verify credentials.
    #[serde(default)]
    pub handshake_path: Option<String>,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 3).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Cover path templates in priority order. `{id}` is replaced by the book id.
    #[serde(default = "default_cover_paths")]
    pub cover_paths: Vec<String>,
}

/// Resolution cache tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Consecutive failures before a cached path is dropped (default: 3).
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Maximum number of remembered books. Unbounded when absent.
    #[serde(default)]
    pub capacity: Option<usize>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8480".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    3
}

fn default_cover_paths() -> Vec<String> {
    vec![
        "/get/cover/{id}".to_string(),
        "/get/thumb/{id}".to_string(),
        "/cover/{id}".to_string(),
    ]
}

fn default_failure_threshold() -> u32 {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: None,
            password: None,
            session_env_var: None,
            handshake_path: None,
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            cover_paths: default_cover_paths(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            capacity: None,
        }
    }
}
