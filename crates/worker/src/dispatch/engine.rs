//! The dispatch engine.
//!
//! For one request and the active manifest, the engine composes the
//! instruction cascade and executes it in strict order: instruction *i+1*
//! does not start until *i* has resolved empty. Fallback and index rewrites
//! re-enter the engine with a fresh cascade; cycle prevention is the
//! fallback suppression rule, so the engine itself carries no depth counter.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::adapter::{NetworkFetcher, Request, Response};
use crate::cache::CacheRegistry;
use crate::dispatch::instruction::FetchInstruction;
use crate::manifest::Manifest;

/// Per-dispatch options handed in by the fetch handler.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
  /// Upper bound on each network instruction in the cascade.
  pub timeout: Option<Duration>,
}

/// Resolves requests against a manifest via the instruction cascade.
#[derive(Clone)]
pub struct DispatchEngine {
  registry: CacheRegistry,
  fetcher: Arc<dyn NetworkFetcher>,
}

impl DispatchEngine {
  pub fn new(registry: CacheRegistry, fetcher: Arc<dyn NetworkFetcher>) -> Self {
    Self { registry, fetcher }
  }

  /// Compose the instruction cascade for one request.
  ///
  /// Order: dev bypass short-circuit, index rewrite, per-group fallbacks,
  /// per-group cache lookups, per-group network fetches. Groups are probed
  /// in manifest order so higher-priority groups come first.
  pub fn cascade(
    manifest: &Manifest,
    request: &Request,
    options: &DispatchOptions,
  ) -> Vec<FetchInstruction> {
    if manifest.dev() {
      return vec![FetchInstruction::FromNetwork {
        request: request.clone(),
        bypass_http_cache: false,
        timeout: None,
      }];
    }

    let mut sequence = vec![FetchInstruction::Index {
      request: request.clone(),
      index: manifest.metadata.index.clone(),
    }];

    for group in &manifest.groups {
      sequence.push(FetchInstruction::Fallback {
        request: request.clone(),
        group: group.name.clone(),
      });
    }

    for group in &manifest.groups {
      sequence.push(FetchInstruction::FromCache {
        cache_name: group.cache_name(),
        request: request.clone(),
      });
    }

    for _ in &manifest.groups {
      sequence.push(FetchInstruction::FromNetwork {
        request: request.clone(),
        bypass_http_cache: false,
        timeout: options.timeout,
      });
    }

    sequence
  }

  /// Resolve one request: first instruction to yield a response wins.
  pub async fn dispatch(
    &self,
    manifest: &Manifest,
    request: &Request,
    options: &DispatchOptions,
  ) -> Option<Response> {
    for instruction in Self::cascade(manifest, request, options) {
      debug!("ngsw: {}", instruction.describe());
      if let Some(response) = self.execute(&instruction, manifest, options).await {
        return Some(response);
      }
    }

    debug!(url = %request.url, "ngsw: cascade exhausted");
    None
  }

  async fn execute(
    &self,
    instruction: &FetchInstruction,
    manifest: &Manifest,
    options: &DispatchOptions,
  ) -> Option<Response> {
    match instruction {
      FetchInstruction::FromCache { cache_name, request } => {
        self.registry.load(cache_name, &request.url).await
      }
      FetchInstruction::FromNetwork {
        request,
        bypass_http_cache,
        timeout,
      } => self.fetch_network(request, *bypass_http_cache, *timeout).await,
      FetchInstruction::Fallback { request, group } => {
        self.execute_fallback(request, group, manifest, options).await
      }
      FetchInstruction::Index { request, index } => {
        let index = index.as_deref()?;
        if request.url != "/" {
          return None;
        }
        self
          .redispatch(manifest, request.with_url(index), options)
          .await
      }
    }
  }

  async fn fetch_network(
    &self,
    request: &Request,
    bypass_http_cache: bool,
    timeout: Option<Duration>,
  ) -> Option<Response> {
    let fetch = async {
      if bypass_http_cache {
        self.fetcher.refresh(request).await
      } else {
        self.fetcher.request(request).await
      }
    };

    let result = match timeout {
      Some(limit) => match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => {
          debug!(url = %request.url, "ngsw: network fetch timed out");
          return None;
        }
      },
      None => fetch.await,
    };

    match result {
      Ok(response) => Some(response),
      Err(e) => {
        debug!(url = %request.url, error = %e, "ngsw: network fetch failed");
        None
      }
    }
  }

  async fn execute_fallback(
    &self,
    request: &Request,
    group_name: &str,
    manifest: &Manifest,
    options: &DispatchOptions,
  ) -> Option<Response> {
    let group = manifest.group(group_name)?;

    for rule in group.fallback.values() {
      if !request.url.starts_with(&rule.prefix) {
        continue;
      }

      if rule.fallback_to == request.url {
        warn!(url = %request.url, prefix = %rule.prefix, "ngsw: suppressing self-referential fallback");
        continue;
      }

      debug!("ngsw: fallback({}, {})", rule.prefix, rule.fallback_to);
      let rewritten = request.with_url(&rule.fallback_to);
      if let Some(response) = self.redispatch(manifest, rewritten, options).await {
        return Some(response);
      }
    }

    None
  }

  // Fallback and index rewrites recurse into dispatch; the boxed future
  // breaks the otherwise-infinite async type.
  fn redispatch<'a>(
    &'a self,
    manifest: &'a Manifest,
    request: Request,
    options: &'a DispatchOptions,
  ) -> Pin<Box<dyn Future<Output = Option<Response>> + Send + 'a>> {
    Box::pin(async move { self.dispatch(manifest, &request, options).await })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::adapter::{CacheStore, MemoryCacheStore, StaticFetcher};
  use crate::manifest::parse;
  use std::time::Instant;

  struct Rig {
    engine: DispatchEngine,
    store: Arc<MemoryCacheStore>,
    fetcher: Arc<StaticFetcher>,
  }

  fn rig() -> Rig {
    let store = Arc::new(MemoryCacheStore::new());
    let fetcher = Arc::new(StaticFetcher::new());
    let engine = DispatchEngine::new(
      CacheRegistry::new(store.clone()),
      fetcher.clone(),
    );
    Rig { engine, store, fetcher }
  }

  fn manifest(text: &str) -> Manifest {
    parse(text).unwrap().manifest
  }

  async fn seed(rig: &Rig, cache: &str, url: &str, body: &str) {
    rig
      .store
      .store(cache, url, Response::from_body(body))
      .await
      .unwrap();
  }

  fn kinds(sequence: &[FetchInstruction]) -> Vec<&'static str> {
    sequence
      .iter()
      .map(|i| match i {
        FetchInstruction::FromCache { .. } => "cache",
        FetchInstruction::FromNetwork { .. } => "network",
        FetchInstruction::Fallback { .. } => "fallback",
        FetchInstruction::Index { .. } => "index",
      })
      .collect()
  }

  #[test]
  fn cascade_order_for_two_groups() {
    let manifest = manifest(r#"{"groups": [{"name": "one"}, {"name": "two"}]}"#);
    let sequence = DispatchEngine::cascade(&manifest, &Request::get("/x"), &DispatchOptions::default());

    assert_eq!(
      kinds(&sequence),
      vec!["index", "fallback", "fallback", "cache", "cache", "network", "network"]
    );

    // Group order within each segment follows the manifest.
    assert_eq!(
      sequence[3],
      FetchInstruction::FromCache {
        cache_name: "ngsw.cache.one".to_string(),
        request: Request::get("/x"),
      }
    );
  }

  #[test]
  fn cascade_in_dev_mode_is_a_single_network_fetch() {
    let manifest = manifest(r#"{"metadata": {"dev": true}, "groups": [{"name": "app"}]}"#);
    let sequence = DispatchEngine::cascade(&manifest, &Request::get("/x"), &DispatchOptions::default());

    assert_eq!(kinds(&sequence), vec!["network"]);
  }

  #[tokio::test]
  async fn serves_from_cache_before_network() {
    let rig = rig();
    let manifest = manifest(r#"{"groups": [{"name": "app", "urls": {"/a.js": {}}}]}"#);

    seed(&rig, "ngsw.cache.app", "/a.js", "cached").await;
    rig.fetcher.serve("/a.js", Response::from_body("network"));

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/a.js"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "cached");
    assert!(rig.fetcher.requests().is_empty());
  }

  #[tokio::test]
  async fn falls_through_to_network_on_cache_miss() {
    let rig = rig();
    let manifest = manifest(r#"{"groups": [{"name": "app"}]}"#);

    rig.fetcher.serve("/data.json", Response::from_body("fresh"));

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/data.json"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "fresh");
  }

  #[tokio::test]
  async fn dev_mode_bypasses_caches() {
    let rig = rig();
    let manifest = manifest(
      r#"{"metadata": {"dev": true}, "groups": [{"name": "app", "urls": {"/a.js": {}}}]}"#,
    );

    seed(&rig, "ngsw.cache.app", "/a.js", "stale").await;
    rig.fetcher.serve("/a.js", Response::from_body("live"));

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/a.js"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "live");
    assert_eq!(rig.fetcher.requests(), vec!["/a.js".to_string()]);
  }

  #[tokio::test]
  async fn index_rewrite_serves_the_cached_index() {
    let rig = rig();
    let manifest = manifest(
      r#"{"metadata": {"index": "/index.html"}, "groups": [{"name": "app", "urls": {"/index.html": {}}}]}"#,
    );

    seed(&rig, "ngsw.cache.app", "/index.html", "INDEX").await;

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "INDEX");
    assert!(rig.fetcher.requests().is_empty());
  }

  #[tokio::test]
  async fn index_ignores_non_root_urls() {
    let rig = rig();
    let manifest = manifest(r#"{"metadata": {"index": "/index.html"}, "groups": []}"#);

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/other"), &DispatchOptions::default())
      .await;

    assert!(response.is_none());
  }

  #[tokio::test]
  async fn fallback_rewrites_into_the_cache() {
    let rig = rig();
    let manifest = manifest(
      r#"{"groups": [{"name": "app", "urls": {"/index.html": {}}, "fallback": {"/deep/": "/index.html"}}]}"#,
    );

    seed(&rig, "ngsw.cache.app", "/index.html", "INDEX").await;

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/deep/unknown"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "INDEX");
  }

  #[tokio::test]
  async fn self_referential_fallback_is_suppressed_and_others_tried() {
    let rig = rig();
    // "/a" sorts before "/a/": the self-referential rule is hit first and
    // must not recurse; the second rule resolves.
    let manifest = manifest(
      r#"{"groups": [{"name": "app", "urls": {"/ok.html": {}},
           "fallback": {"/a": "/a/x", "/a/": "/ok.html"}}]}"#,
    );

    seed(&rig, "ngsw.cache.app", "/ok.html", "OK").await;

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/a/x"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "OK");
  }

  #[tokio::test]
  async fn bypassing_network_instruction_revalidates() {
    let rig = rig();
    let manifest = manifest(r#"{"groups": [{"name": "app"}]}"#);

    rig.fetcher.serve("/a.js", Response::from_body("A"));

    let instruction = FetchInstruction::FromNetwork {
      request: Request::get("/a.js"),
      bypass_http_cache: true,
      timeout: None,
    };

    let response = rig
      .engine
      .execute(&instruction, &manifest, &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.body_text(), "A");
    assert_eq!(rig.fetcher.revalidations(), vec!["/a.js".to_string()]);
  }

  #[tokio::test]
  async fn exhausted_cascade_yields_nothing() {
    let rig = rig();
    let manifest = manifest(r#"{"groups": [{"name": "app"}]}"#);

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/missing"), &DispatchOptions::default())
      .await;

    assert!(response.is_none());
  }

  #[tokio::test]
  async fn non_ok_network_response_still_resolves() {
    let rig = rig();
    let manifest = manifest(r#"{"groups": [{"name": "app"}]}"#);

    rig.fetcher.serve("/gone", Response::with_status(404, "not here"));

    let response = rig
      .engine
      .dispatch(&manifest, &Request::get("/gone"), &DispatchOptions::default())
      .await
      .unwrap();

    assert_eq!(response.status, 404);
  }

  #[tokio::test]
  async fn timeout_bounds_a_silent_network() {
    let rig = rig();
    let manifest = manifest(r#"{"groups": [{"name": "one"}, {"name": "two"}]}"#);

    rig.fetcher.silence(true);

    let options = DispatchOptions {
      timeout: Some(Duration::from_millis(30)),
    };

    let started = Instant::now();
    let response = rig.engine.dispatch(&manifest, &Request::get("/x"), &options).await;

    assert!(response.is_none());
    // Two groups, 30ms each, plus scheduling slack.
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(rig.fetcher.requests().len(), 2);
  }
}
