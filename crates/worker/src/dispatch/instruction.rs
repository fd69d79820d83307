//! Instruction value objects.
//!
//! An instruction describes one atomic attempt to resolve a request. It is
//! pure description: execution is triggered by the engine, and an executed
//! instruction yields at most one response. `describe()` is the diagnostic
//! tag logged for each instruction the engine runs.

use std::time::Duration;

use crate::adapter::Request;

/// One atomic resolution attempt within a dispatch cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchInstruction {
  /// Consult a named cache for the request URL.
  FromCache { cache_name: String, request: Request },

  /// Issue a network fetch. With `bypass_http_cache` the fetch must
  /// revalidate past the platform HTTP cache; with a `timeout` the result is
  /// whichever of response or expiry arrives first, where expiry yields
  /// nothing.
  FromNetwork {
    request: Request,
    bypass_http_cache: bool,
    timeout: Option<Duration>,
  },

  /// Try the named group's fallback rules: each prefix the request URL
  /// starts with rewrites the request to the rule's target and re-enters
  /// dispatch. A rule whose target equals the request URL is suppressed.
  Fallback { request: Request, group: String },

  /// Rewrite the root path `/` to the manifest's index URL and re-enter
  /// dispatch. Yields nothing for any other URL or when no index is set.
  Index {
    request: Request,
    index: Option<String>,
  },
}

impl FetchInstruction {
  /// Human-readable tag for diagnostics.
  pub fn describe(&self) -> String {
    match self {
      FetchInstruction::FromCache { cache_name, request } => {
        format!("fetchFromCache({}, {})", cache_name, request.url)
      }
      FetchInstruction::FromNetwork { request, .. } => {
        format!("fetchFromNetwork({})", request.url)
      }
      FetchInstruction::Fallback { request, group } => {
        format!("fallback({}, {})", group, request.url)
      }
      FetchInstruction::Index { request, index } => {
        format!("index({}, {})", request.url, index.as_deref().unwrap_or("-"))
      }
    }
  }
}
