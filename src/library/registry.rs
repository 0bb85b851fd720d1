//! Process-wide cache of the library client handle.
//!
//! Readers clone the current `Arc` under a read lock, so a caller never sees
//! a half-replaced handle. Builds are serialized by an async mutex: when many
//! requests find the slot empty at once, one builds and the rest reuse it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::config::{ConfigStore, LibraryConfig};
use crate::covers::CoverError;
use crate::library::client::LibraryClient;
use crate::session::SessionSource;

pub struct ClientRegistry {
    config: ConfigStore,
    session: Arc<dyn SessionSource>,
    current: RwLock<Option<Arc<LibraryClient>>>,
    build_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ClientRegistry {
    pub fn new(config: ConfigStore, session: Arc<dyn SessionSource>) -> Self {
        Self {
            config,
            session,
            current: RwLock::new(None),
            build_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Return the shared handle, building one if absent or stale.
    ///
    /// # Errors
    /// `Authentication` when credentials are missing or the handshake is
    /// rejected; `Connectivity` when the server cannot be reached. Neither is
    /// retried here.
    pub async fn get_client(&self) -> Result<Arc<LibraryClient>, CoverError> {
        let library = self.config.get().library;
        if let Some(client) = self.current_for(&library) {
            return Ok(client);
        }

        let _build = self.build_lock.lock().await;

        // Another caller may have finished a build while we waited.
        let library = self.config.get().library;
        if let Some(client) = self.current_for(&library) {
            return Ok(client);
        }

        if let Some(stale) = self.current.write().take() {
            tracing::info!(
                generation = stale.generation(),
                "Library configuration changed, dropping client"
            );
        }

        let token = self.session.session().await;
        let credentials = library
            .resolve_credentials(token)
            .map_err(|missing| CoverError::Authentication {
                status: None,
                message: missing.reason,
                after_retry: false,
            })?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let client = Arc::new(LibraryClient::connect(&library, credentials, generation).await?);

        tracing::info!(
            generation,
            base_url = %client.base_url(),
            auth = client.credentials().kind(),
            "Library client built"
        );

        *self.current.write() = Some(Arc::clone(&client));
        Ok(client)
    }

    fn current_for(&self, library: &LibraryConfig) -> Option<Arc<LibraryClient>> {
        self.current
            .read()
            .as_ref()
            .filter(|client| client.matches(library))
            .cloned()
    }

    /// Drop the stored handle if it is still `stale`.
    ///
    /// A handle that was already replaced is left alone, so concurrent
    /// reports about the same broken handle trigger a single rebuild.
    pub fn invalidate_client(&self, stale: &LibraryClient) -> bool {
        self.invalidate_generation(stale.generation())
    }

    /// Drop the stored handle if it was built as `generation`.
    pub fn invalidate_generation(&self, generation: u64) -> bool {
        let mut current = self.current.write();
        match current.as_ref() {
            Some(client) if client.generation() == generation => {
                *current = None;
                tracing::warn!(generation, "Library client invalidated");
                true
            }
            _ => false,
        }
    }

    /// Number of handles built so far.
    pub fn builds(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Generation of the live handle, if any.
    pub fn current_generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|client| client.generation())
    }
}
