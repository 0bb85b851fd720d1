use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use homedeck::config::{Config, ConfigStore};
use homedeck::logging::init_tracing;
use homedeck::proxy::ProxyServer;
use homedeck::session::{EnvSession, SessionSource, StaticSession};

/// Cover proxy for a self-hosted ebook library.
#[derive(Debug, Parser)]
#[command(name = "homedeck", version, about)]
struct Args {
    /// Path to the config file (default: ~/.config/homedeck/config.toml).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the bind address from the config file.
    #[arg(long, short = 'b')]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let path = args.config.unwrap_or_else(Config::config_path);
    let config = Config::load_from(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let bind_addr = args.bind.unwrap_or_else(|| config.server.bind_addr.clone());

    let session: Arc<dyn SessionSource> = match config.library.session_env_var.clone() {
        Some(var) => Arc::new(EnvSession::new(var)),
        None => Arc::new(StaticSession::none()),
    };

    tracing::info!(
        config = %path.display(),
        library = %config.library.base_url,
        candidates = config.library.cover_paths.len(),
        "Starting homedeck"
    );

    let store = ConfigStore::new(config, path);
    let mut server = ProxyServer::new(store, session);
    server.try_bind(&bind_addr).await?;
    server.run().await
}
