//! Worker lifecycle: install / activate / fetch reactions.
//!
//! The controller owns the two coherent views of the world, the manifest
//! currently serving traffic and the one being staged by an install, and
//! transitions between them at host lifecycle events. Writes to the named
//! caches happen only from install and activate; fetch only reads.

mod controller;
mod events;
mod state;

pub use controller::LifecycleController;
pub use events::FetchEvent;
pub use state::WorkerState;
