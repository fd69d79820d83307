//! Host event types.
//!
//! The host's fetch channel carries a request and a single-shot means to
//! provide a response. If the handler provides none, the host performs its
//! default network behavior.

use std::sync::Mutex;

use crate::adapter::{Request, Response};
use crate::error::{Result, WorkerError};

#[derive(Debug, Default)]
enum ResponseSlot {
  #[default]
  Open,
  Filled(Response),
}

/// A fetch event delivered by the host runtime.
#[derive(Debug)]
pub struct FetchEvent {
  pub request: Request,
  slot: Mutex<ResponseSlot>,
}

impl FetchEvent {
  pub fn new(request: Request) -> Self {
    Self {
      request,
      slot: Mutex::new(ResponseSlot::Open),
    }
  }

  /// Provide the response for this event. May be called at most once.
  pub fn respond_with(&self, response: Response) -> Result<()> {
    let mut slot = self.slot.lock().unwrap();
    if matches!(*slot, ResponseSlot::Filled(_)) {
      return Err(WorkerError::AlreadyResponded);
    }
    *slot = ResponseSlot::Filled(response);
    Ok(())
  }

  /// Whether a response has been provided.
  pub fn was_responded(&self) -> bool {
    matches!(*self.slot.lock().unwrap(), ResponseSlot::Filled(_))
  }

  /// Consume the event, yielding the provided response, if any.
  pub fn into_response(self) -> Option<Response> {
    match self.slot.into_inner().unwrap() {
      ResponseSlot::Open => None,
      ResponseSlot::Filled(response) => Some(response),
    }
  }
}
