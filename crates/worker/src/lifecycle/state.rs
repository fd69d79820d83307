//! Lifecycle states.

/// Where the worker stands in its lifecycle.
///
/// There is no terminal state: the host restarts the worker rather than the
/// worker terminating itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  /// No active manifest is known; fetches fall through to the platform.
  Uninitialized,
  /// An active manifest is serving traffic.
  Active,
  /// A new manifest has been prefetched and staged, awaiting activation.
  Installing,
  /// Activation cleanup and promotion are in progress.
  Activating,
}

impl std::fmt::Display for WorkerState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      WorkerState::Uninitialized => write!(f, "uninitialized"),
      WorkerState::Active => write!(f, "active"),
      WorkerState::Installing => write!(f, "installing"),
      WorkerState::Activating => write!(f, "activating"),
    }
  }
}
