//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_library;

use homedeck::config::{Config, ConfigStore};
use homedeck::covers::CoverService;
use homedeck::session::{SessionSource, StaticSession};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

/// Find an available port for testing.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}

/// Config pointing at `base_url` with the given cover path templates.
pub fn library_config(base_url: &str, cover_paths: &[&str]) -> Config {
    let mut config = Config::default();
    config.server.bind_addr = "127.0.0.1:0".to_string();
    config.library.base_url = base_url.to_string();
    config.library.timeout_seconds = 2;
    config.library.connect_timeout_seconds = 1;
    config.library.cover_paths = cover_paths.iter().map(|p| p.to_string()).collect();
    config
}

pub fn store(config: Config) -> ConfigStore {
    ConfigStore::new(config, PathBuf::from("/tmp/homedeck-test.toml"))
}

/// Anonymous cover service for `base_url`.
pub fn cover_service(base_url: &str, cover_paths: &[&str]) -> CoverService {
    cover_service_with(library_config(base_url, cover_paths), Arc::new(StaticSession::none()))
}

pub fn cover_service_with(config: Config, session: Arc<dyn SessionSource>) -> CoverService {
    CoverService::from_config(store(config), session)
}
