//! Request and response value types.
//!
//! The engine never touches the host's real fetch types. It works on these
//! plain values and lets the embedding glue convert at the edge, so the core
//! stays independent of any particular runtime binding.

/// A request as seen by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  /// Request URL, absolute-path form within the worker's scope (`/app.js`).
  pub url: String,
  /// HTTP method. Dispatch itself is method-agnostic.
  pub method: String,
}

impl Request {
  /// Create a GET request for the given URL.
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      method: "GET".to_string(),
    }
  }

  /// Clone this request with a URL override.
  ///
  /// This is the `newRequest(original, { url })` operation of the host
  /// adapter contract: everything but the URL is carried over.
  pub fn with_url(&self, url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      method: self.method.clone(),
    }
  }
}

/// A response as seen by the dispatch engine.
///
/// A *missing* response is represented as `Option` absence throughout the
/// crate, never as a sentinel value on this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  /// HTTP status code.
  pub status: u16,
  /// Response body bytes.
  pub body: Vec<u8>,
}

impl Response {
  /// Synthesize a 200 response from a body string.
  ///
  /// This is the `newResponse(body)` operation of the host adapter contract.
  pub fn from_body(body: impl Into<String>) -> Self {
    Self {
      status: 200,
      body: body.into().into_bytes(),
    }
  }

  /// Create a response with an explicit status.
  pub fn with_status(status: u16, body: impl Into<String>) -> Self {
    Self {
      status,
      body: body.into().into_bytes(),
    }
  }

  /// Whether the status is in the 2xx range.
  pub fn ok(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Extract the body as text.
  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}
