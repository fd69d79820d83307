//! Adapter seams between the engine and its host platform.
//!
//! The worker core consumes two platform capabilities, both abstracted here
//! as async traits: the raw content store ([`CacheStore`]) and the low-level
//! network fetcher ([`NetworkFetcher`]). Shipped implementations cover the
//! in-memory case for tests and simulators and an HTTP client for hosts that
//! bridge to a real network.

pub mod client;
pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use client::HttpFetcher;
pub use http::{Request, Response};
pub use memory::{MemoryCacheStore, StaticFetcher};

/// The raw, named content store backing the worker's caches.
///
/// All operations are asynchronous single-shot. Implementations must treat a
/// missing cache as a miss on `load` and as a no-op on `remove`, never as an
/// error.
#[async_trait]
pub trait CacheStore: Send + Sync {
  /// Look up the stored response for `url` in the named cache.
  async fn load(&self, cache: &str, url: &str) -> Option<Response>;

  /// Store a response under `url`, creating the cache on demand.
  /// Overwrites any prior value for that URL.
  async fn store(&self, cache: &str, url: &str, response: Response) -> Result<()>;

  /// Names of every cache this worker has created.
  async fn keys(&self) -> Vec<String>;

  /// Delete the named cache. No-op when absent.
  async fn remove(&self, cache: &str) -> Result<()>;
}

/// The low-level network fetcher.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
  /// Plain fetch, with the platform's HTTP cache participating.
  async fn request(&self, req: &Request) -> Result<Response>;

  /// Revalidating fetch that must not be served from the HTTP cache.
  async fn refresh(&self, req: &Request) -> Result<Response>;
}
