use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::net::TcpListener;

use crate::config::ConfigStore;
use crate::covers::CoverService;
use crate::proxy::router::build_router;
use crate::proxy::shutdown::ShutdownManager;
use crate::session::SessionSource;

pub struct ProxyServer {
    pub addr: SocketAddr,
    /// The bound listener, kept alive to prevent port race conditions.
    /// Populated by try_bind(), consumed by run().
    listener: Option<TcpListener>,
    service: CoverService,
    shutdown: Arc<ShutdownManager>,
}

impl ProxyServer {
    pub fn new(config: ConfigStore, session: Arc<dyn SessionSource>) -> Self {
        Self::with_service(CoverService::from_config(config, session))
    }

    pub fn with_service(service: CoverService) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            listener: None,
            service,
            shutdown: Arc::new(ShutdownManager::new()),
        }
    }

    /// Try to bind to `bind_addr`, falling back to the next ports if busy.
    ///
    /// Port 0 asks the OS for any free port. The listener is kept until
    /// `run()` so nothing can claim the port in between.
    pub async fn try_bind(&mut self, bind_addr: &str) -> anyhow::Result<SocketAddr> {
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", bind_addr))?;

        let start_port = bind_addr.port();
        let last_port = if start_port == 0 {
            0
        } else {
            start_port.saturating_add(20)
        };

        for port in start_port..=last_port {
            let try_addr = SocketAddr::new(bind_addr.ip(), port);
            match TcpListener::bind(try_addr).await {
                Ok(listener) => {
                    let actual_addr = listener.local_addr()?;
                    self.addr = actual_addr;
                    self.listener = Some(listener);
                    tracing::info!("Cover proxy bound to {}", actual_addr);
                    return Ok(actual_addr);
                }
                Err(e) => {
                    tracing::debug!("Port {} busy: {}", port, e);
                }
            }
        }

        Err(anyhow!(
            "Could not find available port in range {}-{}",
            start_port,
            last_port
        ))
    }

    pub fn service(&self) -> CoverService {
        self.service.clone()
    }

    pub fn handle(&self) -> ProxyHandle {
        ProxyHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Run the server until shutdown is signalled.
    ///
    /// Consumes self to take ownership of the pre-bound listener.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = self
            .listener
            .ok_or_else(|| anyhow!("try_bind() must be called before run()"))?;

        tracing::info!("Starting cover proxy on {}", self.addr);

        let app = build_router(self.service.clone());
        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait_for_shutdown().await })
            .into_future()
            .await?;

        tracing::info!("Cover proxy stopped");
        Ok(())
    }
}

#[derive(Clone)]
pub struct ProxyHandle {
    shutdown: Arc<ShutdownManager>,
}

impl ProxyHandle {
    pub fn shutdown(&self) {
        self.shutdown.signal_shutdown();
    }
}
