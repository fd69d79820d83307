//! Named-cache registry over the raw content store.
//!
//! The registry is a thin facade adding the worker's cache-name discipline
//! on top of the [`CacheStore`] seam: the two reserved caches holding
//! manifest text, and one content cache per manifest group. It also owns the
//! corrupt-tolerant manifest reads that make cold starts self-healing.

use std::sync::Arc;

use tracing::warn;

use crate::adapter::{CacheStore, Response};
use crate::consts::{CACHE_ACTIVE, CACHE_INSTALLING, MANIFEST_URL};
use crate::error::{Result, WorkerError};
use crate::manifest::{ParsedManifest, parse};

/// Facade over the content store with manifest-text helpers.
#[derive(Clone)]
pub struct CacheRegistry {
  store: Arc<dyn CacheStore>,
}

impl CacheRegistry {
  pub fn new(store: Arc<dyn CacheStore>) -> Self {
    Self { store }
  }

  /// Look up a stored response. Missing cache or missing URL is a miss.
  pub async fn load(&self, cache: &str, url: &str) -> Option<Response> {
    self.store.load(cache, url).await
  }

  /// Store a response, creating the cache on demand.
  pub async fn store(&self, cache: &str, url: &str, response: Response) -> Result<()> {
    self.store.store(cache, url, response).await
  }

  /// Names of every cache this worker has created.
  pub async fn keys(&self) -> Vec<String> {
    self.store.keys().await
  }

  /// Delete a cache. No-op on absent.
  pub async fn remove(&self, cache: &str) -> Result<()> {
    self.store.remove(cache).await
  }

  /// Read and parse the manifest text stored in a cache.
  ///
  /// Absent or unparseable text is treated as absent: a corrupt reserved
  /// cache must not wedge the worker, the next install rebuilds it.
  pub async fn read_manifest(&self, cache: &str) -> Option<ParsedManifest> {
    let response = self.store.load(cache, MANIFEST_URL).await?;
    let text = response.body_text();

    match parse(&text) {
      Ok(parsed) => Some(parsed),
      Err(e) => {
        warn!(cache = %cache, error = %e, "ngsw: discarding unparseable stored manifest");
        None
      }
    }
  }

  /// Read a manifest from one of the two reserved caches.
  ///
  /// Any other source name is a programmer error and is reported fatally.
  pub async fn read_manifest_source(&self, source: &str) -> Result<Option<ParsedManifest>> {
    if source != CACHE_ACTIVE && source != CACHE_INSTALLING {
      return Err(WorkerError::UnknownManifestSource(source.to_string()));
    }
    Ok(self.read_manifest(source).await)
  }

  /// Store manifest text into a cache under the manifest URL.
  pub async fn write_manifest(&self, cache: &str, text: &str) -> Result<()> {
    self
      .store
      .store(cache, MANIFEST_URL, Response::from_body(text))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::adapter::MemoryCacheStore;

  fn registry() -> CacheRegistry {
    CacheRegistry::new(Arc::new(MemoryCacheStore::new()))
  }

  #[tokio::test]
  async fn load_missing_is_a_miss() {
    let registry = registry();
    assert!(registry.load("ngsw.cache.app", "/x").await.is_none());
  }

  #[tokio::test]
  async fn manifest_write_read_round_trip() {
    let registry = registry();
    let text = r#"{"groups": [{"name": "app"}]}"#;

    registry.write_manifest(CACHE_ACTIVE, text).await.unwrap();
    let parsed = registry.read_manifest(CACHE_ACTIVE).await.unwrap();

    assert_eq!(parsed.text, text);
    assert_eq!(parsed.manifest.groups[0].name, "app");
  }

  #[tokio::test]
  async fn corrupt_stored_manifest_reads_as_absent() {
    let registry = registry();
    registry.write_manifest(CACHE_ACTIVE, "garbage {{{").await.unwrap();

    assert!(registry.read_manifest(CACHE_ACTIVE).await.is_none());
  }

  #[tokio::test]
  async fn read_manifest_source_accepts_reserved_names() {
    let registry = registry();

    assert!(registry.read_manifest_source(CACHE_ACTIVE).await.unwrap().is_none());
    assert!(
      registry
        .read_manifest_source(CACHE_INSTALLING)
        .await
        .unwrap()
        .is_none()
    );
  }

  #[tokio::test]
  async fn read_manifest_source_rejects_unknown_names() {
    let registry = registry();
    let result = registry.read_manifest_source("ngsw.cache.app").await;

    assert!(matches!(result, Err(WorkerError::UnknownManifestSource(_))));
  }
}
