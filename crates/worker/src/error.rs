//! Error types for the worker core.

use thiserror::Error;

/// Result type for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur inside the worker core.
///
/// Most failure modes in this domain are deliberately *not* errors: a cache
/// miss, a network failure, or a timeout during dispatch simply yields no
/// response and the cascade moves on. The variants here are the cases that
/// abort an operation outright.
#[derive(Debug, Error)]
pub enum WorkerError {
  /// The manifest text could not be parsed.
  #[error("manifest parse error: {0}")]
  ManifestParse(#[from] serde_json::Error),

  /// The fresh manifest could not be fetched, or came back non-ok.
  #[error("fresh manifest unavailable (status {status:?})")]
  ManifestUnavailable { status: Option<u16> },

  /// A manifest source other than the two reserved caches was requested.
  #[error("unknown manifest source: {0}")]
  UnknownManifestSource(String),

  /// A delta URL could not be prefetched during install.
  #[error("prefetch failed for {url}: {message}")]
  Prefetch { url: String, message: String },

  /// The content store rejected an operation.
  #[error("cache error: {0}")]
  Cache(String),

  /// The network fetcher failed outside of dispatch.
  #[error("network error: {0}")]
  Network(String),

  /// A fetch event was responded to more than once.
  #[error("fetch event already responded")]
  AlreadyResponded,
}
