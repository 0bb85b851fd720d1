//! Cover retrieval: client, hint, probe, bookkeeping.

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::covers::cache::{ResolutionCache, SettledProbe};
use crate::covers::candidate::CoverPathCandidate;
use crate::covers::error::CoverError;
use crate::covers::resolver::{CoverImage, PathResolver};
use crate::library::{ClientRegistry, LibraryClient};
use crate::session::SessionSource;

const MAX_BOOK_ID_LEN: usize = 128;

/// Cover retrieval state, shared by all request handlers.
#[derive(Clone)]
pub struct CoverService {
    registry: Arc<ClientRegistry>,
    resolver: Arc<PathResolver>,
    cache: Arc<ResolutionCache>,
}

impl CoverService {
    pub fn new(
        registry: Arc<ClientRegistry>,
        resolver: Arc<PathResolver>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        Self {
            registry,
            resolver,
            cache,
        }
    }

    /// Wire up registry, resolver and cache from configuration.
    ///
    /// Candidates and cache tuning are read once; later config changes only
    /// affect how the library client is built.
    pub fn from_config(config: ConfigStore, session: Arc<dyn SessionSource>) -> Self {
        let snapshot = config.get();
        let resolver = PathResolver::new(CoverPathCandidate::from_config(&snapshot.library));
        let cache = ResolutionCache::new(&snapshot.cache);
        let registry = ClientRegistry::new(config, session);
        Self::new(Arc::new(registry), Arc::new(resolver), Arc::new(cache))
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Fetch the cover for `book_id`.
    ///
    /// An authentication failure rebuilds the client and retries the whole
    /// flow once. Every other error is returned as is.
    ///
    /// The handle invalidated is the one the failing probe ran on, which is
    /// older than ours when we joined a probe started before a rebuild.
    pub async fn get_cover(&self, book_id: &str) -> Result<CoverImage, CoverError> {
        validate_book_id(book_id)?;

        let client = self.registry.get_client().await?;
        let settled = self.fetch(&client, book_id).await;
        match settled.outcome {
            Err(err) if err.is_authentication() => {
                tracing::warn!(
                    book_id = %book_id,
                    generation = settled.generation,
                    error = %err,
                    "Library rejected client, rebuilding and retrying once"
                );
                self.registry.invalidate_generation(settled.generation);
                let client = self.registry.get_client().await?;
                self.fetch(&client, book_id)
                    .await
                    .outcome
                    .map_err(CoverError::after_retry)
            }
            outcome => outcome,
        }
    }

    /// Forget the cached path for `book_id`.
    pub fn clear_hint(&self, book_id: &str) -> Result<bool, CoverError> {
        validate_book_id(book_id)?;
        Ok(self.cache.clear(book_id))
    }

    /// One coalesced probe. Cache bookkeeping happens inside the probe so
    /// it is counted once no matter how many callers are waiting.
    async fn fetch(&self, client: &Arc<LibraryClient>, book_id: &str) -> SettledProbe {
        let generation = client.generation();
        let client = Arc::clone(client);
        let resolver = Arc::clone(&self.resolver);
        let cache = Arc::clone(&self.cache);
        let id = book_id.to_string();

        self.cache
            .coalesce(book_id, generation, async move {
                let hint = cache.get(&id);
                let outcome = resolver.resolve_cover(&client, &id, hint).await;
                match &outcome {
                    Ok(image) => cache.record_success(&id, image.candidate),
                    Err(CoverError::NotFound { .. }) => cache.record_failure(&id),
                    Err(_) => {}
                }
                outcome
            })
            .await
    }
}

/// Book ids end up in URL paths, so only a conservative charset is allowed.
pub fn validate_book_id(book_id: &str) -> Result<(), CoverError> {
    if book_id.is_empty() || book_id.len() > MAX_BOOK_ID_LEN {
        return Err(CoverError::InvalidRequest(format!(
            "book id must be 1-{} characters",
            MAX_BOOK_ID_LEN
        )));
    }
    let valid = book_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || book_id.chars().all(|c| c == '.') {
        return Err(CoverError::InvalidRequest(format!(
            "book id '{}' contains unsupported characters",
            book_id
        )));
    }
    Ok(())
}
