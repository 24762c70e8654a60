use std::{sync::Arc, time::Duration};

use crate::{
    artwork::{
        cache::{ArtworkCache, CacheKey, CacheNamespace},
        catalog::{self, CatalogEndpoints},
        fetch::{FetchRequest, HttpFetch, fetch_bounded},
        normalize::normalize_artwork,
    },
    foundation::error::{FmiError, FmiResult},
};

/// Where resolved artwork bytes came from. Diagnostic only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkOrigin {
    /// Served from the `art` cache namespace.
    Cached,
    /// Fetched from the art archive using an identifier from a fresh catalog query.
    IdentifierLookup,
    /// Fetched from the art archive using a cached identifier.
    PrimarySource,
    /// Fetched from the scrobble's own art hint URL.
    FallbackSource,
}

impl std::fmt::Display for ArtworkOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cached => "cached",
            Self::IdentifierLookup => "identifier_lookup",
            Self::PrimarySource => "primary_source",
            Self::FallbackSource => "fallback_source",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedArtwork {
    pub bytes: Vec<u8>,
    pub origin: ArtworkOrigin,
}

/// Walks the artwork fallback chain: cache, catalog identifier + art archive, then the hint URL.
pub struct AlbumArtResolver<F> {
    fetcher: Arc<F>,
    cache: Arc<ArtworkCache>,
    endpoints: CatalogEndpoints,
    timeout: Duration,
}

impl<F: HttpFetch> AlbumArtResolver<F> {
    pub fn new(
        fetcher: Arc<F>,
        cache: Arc<ArtworkCache>,
        endpoints: CatalogEndpoints,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            endpoints,
            timeout,
        }
    }

    pub fn cache(&self) -> &ArtworkCache {
        &self.cache
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn resolve(
        &self,
        artist: &str,
        album: &str,
        fallback_url: &str,
    ) -> FmiResult<ResolvedArtwork> {
        let art_key = CacheKey::album(artist, album);
        let lookup_key = art_key.clone();
        let cached = self
            .with_cache(move |cache| cache.get(CacheNamespace::Art, &lookup_key))
            .await
            .flatten();
        if let Some(bytes) = cached {
            return Ok(self.resolved(bytes, ArtworkOrigin::Cached));
        }

        if let Some((release_id, fresh)) = self.lookup_identifier(artist, album).await {
            let url = self.endpoints.front_cover(&release_id);
            if let Some(bytes) = self.fetch_art(&url, "art archive").await {
                let origin = if fresh {
                    ArtworkOrigin::IdentifierLookup
                } else {
                    ArtworkOrigin::PrimarySource
                };
                self.store(art_key, bytes.clone()).await;
                return Ok(self.resolved(bytes, origin));
            }
        }

        if !fallback_url.is_empty()
            && let Some(bytes) = self.fetch_art(fallback_url, "art hint").await
        {
            self.store(art_key, bytes.clone()).await;
            return Ok(self.resolved(bytes, ArtworkOrigin::FallbackSource));
        }

        Err(FmiError::artwork(format!(
            "no artwork source succeeded for '{artist}' / '{album}'"
        )))
    }

    fn resolved(&self, bytes: Vec<u8>, origin: ArtworkOrigin) -> ResolvedArtwork {
        tracing::info!(%origin, bytes = bytes.len(), "artwork resolved");
        ResolvedArtwork { bytes, origin }
    }

    /// Run `op` against the cache on the blocking pool; the disk variant reads and writes files
    /// while holding a namespace lock.
    async fn with_cache<T, Op>(&self, op: Op) -> Option<T>
    where
        T: Send + 'static,
        Op: FnOnce(&ArtworkCache) -> T + Send + 'static,
    {
        let cache = self.cache.clone();
        match tokio::task::spawn_blocking(move || op(&cache)).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "cache worker failed");
                None
            }
        }
    }

    async fn store(&self, key: CacheKey, bytes: Vec<u8>) {
        let stored = self
            .with_cache(move |cache| cache.set(CacheNamespace::Art, key, bytes))
            .await;
        if let Some(Err(e)) = stored {
            tracing::warn!(error = %e, "failed to cache artwork");
        }
    }

    /// Cached or freshly queried release identifier; the flag is true for a fresh query.
    async fn lookup_identifier(&self, artist: &str, album: &str) -> Option<(String, bool)> {
        let (a, b) = (artist.to_string(), album.to_string());
        let cached = self
            .with_cache(move |cache| cache.get_identifier(&a, &b))
            .await
            .flatten();
        if let Some(id) = cached {
            return Some((id, false));
        }

        let url = match self.endpoints.search(artist, album) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build catalog query");
                return None;
            }
        };
        let request = FetchRequest::get(url).with_header("accept", "application/json");
        let resp = match fetch_bounded(self.fetcher.as_ref(), request, self.timeout).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "catalog search failed");
                return None;
            }
        };
        if !resp.is_success() {
            tracing::warn!(status = resp.status, "catalog search returned non-success");
            return None;
        }

        match catalog::parse_release_id(&resp.body) {
            Ok(Some(id)) => {
                let (a, b, value) = (artist.to_string(), album.to_string(), id.clone());
                let stored = self
                    .with_cache(move |cache| cache.set_identifier(&a, &b, &value))
                    .await;
                if let Some(Err(e)) = stored {
                    tracing::warn!(error = %e, "failed to cache catalog identifier");
                }
                Some((id, true))
            }
            Ok(None) => {
                tracing::debug!("catalog search found no release");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog search response unparsable");
                None
            }
        }
    }

    /// Fetch and normalize one artwork URL; every failure is soft and yields `None`.
    async fn fetch_art(&self, url: &str, source: &'static str) -> Option<Vec<u8>> {
        let resp = match fetch_bounded(self.fetcher.as_ref(), FetchRequest::get(url), self.timeout)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(source, error = %e, "artwork fetch failed");
                return None;
            }
        };

        if resp.is_not_found() {
            tracing::debug!(source, url, "no artwork at source");
            return None;
        }
        if !resp.is_success() {
            tracing::warn!(source, url, status = resp.status, "artwork fetch returned non-success");
            return None;
        }

        match normalize_artwork(resp.body) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(source, url, error = %e, "artwork normalization failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/artwork/resolver.rs"]
mod tests;
