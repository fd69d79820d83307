//! HTTP-backed network fetcher.
//!
//! Bridges the engine's absolute-path request URLs onto a real origin with
//! reqwest. Hosts embedding the worker outside a browser (simulators,
//! integration rigs, edge runtimes with plain HTTP egress) use this; inside
//! a browser the platform's own fetch primitive takes its place.

use async_trait::async_trait;
use tracing::debug;

use crate::adapter::{NetworkFetcher, Request, Response};
use crate::error::{Result, WorkerError};

/// A [`NetworkFetcher`] issuing real HTTP requests against one origin.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  origin: String,
}

impl HttpFetcher {
  /// Create a fetcher for the given origin, e.g. `https://app.example.com`.
  pub fn new(origin: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      origin: origin.into().trim_end_matches('/').to_string(),
    }
  }

  fn absolute(&self, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
      url.to_string()
    } else {
      format!("{}{}", self.origin, url)
    }
  }

  async fn send(&self, req: &Request, revalidate: bool) -> Result<Response> {
    let url = self.absolute(&req.url);
    debug!(url = %url, revalidate, "ngsw: network fetch");

    let mut builder = self.client.request(
      req.method.parse().map_err(|_| WorkerError::Network(format!("bad method {}", req.method)))?,
      &url,
    );

    if revalidate {
      builder = builder
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .header(reqwest::header::PRAGMA, "no-cache");
    }

    let response = builder
      .send()
      .await
      .map_err(|e| WorkerError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| WorkerError::Network(e.to_string()))?
      .to_vec();

    Ok(Response { status, body })
  }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
  async fn request(&self, req: &Request) -> Result<Response> {
    self.send(req, false).await
  }

  async fn refresh(&self, req: &Request) -> Result<Response> {
    self.send(req, true).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absolute_joins_origin_and_path() {
    let fetcher = HttpFetcher::new("https://app.example.com/");
    assert_eq!(fetcher.absolute("/index.html"), "https://app.example.com/index.html");
  }

  #[test]
  fn absolute_passes_through_full_urls() {
    let fetcher = HttpFetcher::new("https://app.example.com");
    assert_eq!(fetcher.absolute("https://cdn.example.com/x"), "https://cdn.example.com/x");
  }
}
