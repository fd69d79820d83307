//! In-memory adapter implementations.
//!
//! [`MemoryCacheStore`] is a complete content store held in process memory,
//! suitable for tests, simulators, and cold-start experiments.
//! [`StaticFetcher`] is a scripted network: it serves pre-registered
//! responses, records every request it sees, and can be silenced to model a
//! network that never answers.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::adapter::{CacheStore, NetworkFetcher, Request, Response};
use crate::error::{Result, WorkerError};

/// A content store backed by nested in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
  caches: RwLock<BTreeMap<String, BTreeMap<String, Response>>>,
}

impl MemoryCacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of entries in the named cache, zero when absent.
  pub fn entry_count(&self, cache: &str) -> usize {
    self
      .caches
      .read()
      .unwrap()
      .get(cache)
      .map(|entries| entries.len())
      .unwrap_or(0)
  }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
  async fn load(&self, cache: &str, url: &str) -> Option<Response> {
    self
      .caches
      .read()
      .unwrap()
      .get(cache)
      .and_then(|entries| entries.get(url))
      .cloned()
  }

  async fn store(&self, cache: &str, url: &str, response: Response) -> Result<()> {
    self
      .caches
      .write()
      .unwrap()
      .entry(cache.to_string())
      .or_default()
      .insert(url.to_string(), response);
    Ok(())
  }

  async fn keys(&self) -> Vec<String> {
    self.caches.read().unwrap().keys().cloned().collect()
  }

  async fn remove(&self, cache: &str) -> Result<()> {
    self.caches.write().unwrap().remove(cache);
    Ok(())
  }
}

/// A scripted network fetcher.
///
/// Responses are registered per URL with [`StaticFetcher::serve`]. Requests
/// for unregistered URLs fail like an unreachable host. When silenced, both
/// fetch operations record the request and then never resolve, which is the
/// shape a dispatch timeout has to cope with.
#[derive(Debug, Default)]
pub struct StaticFetcher {
  routes: RwLock<BTreeMap<String, Response>>,
  silent: AtomicBool,
  log: RwLock<Vec<String>>,
  revalidations: RwLock<Vec<String>>,
}

impl StaticFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register the response served for `url`.
  pub fn serve(&self, url: impl Into<String>, response: Response) {
    self.routes.write().unwrap().insert(url.into(), response);
  }

  /// Stop answering requests entirely. Requests are still recorded.
  pub fn silence(&self, silent: bool) {
    self.silent.store(silent, Ordering::SeqCst);
  }

  /// URLs requested so far, in order, regardless of operation.
  pub fn requests(&self) -> Vec<String> {
    self.log.read().unwrap().clone()
  }

  /// URLs fetched through the revalidating `refresh` operation.
  pub fn revalidations(&self) -> Vec<String> {
    self.revalidations.read().unwrap().clone()
  }

  async fn answer(&self, req: &Request) -> Result<Response> {
    self.log.write().unwrap().push(req.url.clone());

    if self.silent.load(Ordering::SeqCst) {
      return std::future::pending().await;
    }

    self
      .routes
      .read()
      .unwrap()
      .get(&req.url)
      .cloned()
      .ok_or_else(|| WorkerError::Network(format!("no route for {}", req.url)))
  }
}

#[async_trait]
impl NetworkFetcher for StaticFetcher {
  async fn request(&self, req: &Request) -> Result<Response> {
    self.answer(req).await
  }

  async fn refresh(&self, req: &Request) -> Result<Response> {
    self.revalidations.write().unwrap().push(req.url.clone());
    self.answer(req).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn load_missing_cache_is_a_miss() {
    let store = MemoryCacheStore::new();
    assert!(store.load("nope", "/x").await.is_none());
  }

  #[tokio::test]
  async fn store_creates_cache_on_demand_and_overwrites() {
    let store = MemoryCacheStore::new();

    store.store("c", "/x", Response::from_body("one")).await.unwrap();
    store.store("c", "/x", Response::from_body("two")).await.unwrap();

    let loaded = store.load("c", "/x").await.unwrap();
    assert_eq!(loaded.body_text(), "two");
    assert_eq!(store.entry_count("c"), 1);
  }

  #[tokio::test]
  async fn keys_lists_created_caches() {
    let store = MemoryCacheStore::new();
    store.store("a", "/x", Response::from_body("x")).await.unwrap();
    store.store("b", "/y", Response::from_body("y")).await.unwrap();

    assert_eq!(store.keys().await, vec!["a".to_string(), "b".to_string()]);
  }

  #[tokio::test]
  async fn remove_is_noop_when_absent() {
    let store = MemoryCacheStore::new();
    store.remove("ghost").await.unwrap();

    store.store("real", "/x", Response::from_body("x")).await.unwrap();
    store.remove("real").await.unwrap();
    assert!(store.keys().await.is_empty());
  }

  #[tokio::test]
  async fn static_fetcher_serves_and_records() {
    let fetcher = StaticFetcher::new();
    fetcher.serve("/a", Response::from_body("A"));

    let response = fetcher.request(&Request::get("/a")).await.unwrap();
    assert_eq!(response.body_text(), "A");

    let missing = fetcher.request(&Request::get("/b")).await;
    assert!(missing.is_err());

    assert_eq!(fetcher.requests(), vec!["/a".to_string(), "/b".to_string()]);
  }

  #[tokio::test]
  async fn silenced_fetcher_never_resolves() {
    let fetcher = StaticFetcher::new();
    fetcher.serve("/a", Response::from_body("A"));
    fetcher.silence(true);

    let outcome = tokio::time::timeout(
      std::time::Duration::from_millis(20),
      fetcher.request(&Request::get("/a")),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(fetcher.requests(), vec!["/a".to_string()]);
  }
}
