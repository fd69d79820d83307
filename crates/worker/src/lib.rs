//! offcache-worker: control core of a browser-resident offline cache.
//!
//! Running inside a service-worker host, the core intercepts every request
//! in its scope and decides, from a versioned manifest of asset groups,
//! whether to answer from a local content cache, from a fallback URL, or
//! from the network:
//! - `manifest`: the deployment model, parser, and structural diff
//! - `cache`: named-cache registry over the host content store
//! - `dispatch`: the instruction cascade resolving one request
//! - `lifecycle`: install / activate / fetch reactions and the state machine
//! - `adapter`: seams to the host platform, with in-memory and HTTP impls
//!
//! The core is host-agnostic: lifecycle-event delivery, real cache storage,
//! and network plumbing all stay behind the adapter seams.

pub mod adapter;
pub mod cache;
pub mod consts;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod manifest;

pub use adapter::{CacheStore, NetworkFetcher, Request, Response};
pub use cache::CacheRegistry;
pub use dispatch::{DispatchEngine, DispatchOptions, FetchInstruction};
pub use error::{Result, WorkerError};
pub use lifecycle::{FetchEvent, LifecycleController, WorkerState};
pub use manifest::{Manifest, ManifestDelta, ParsedManifest, compute_delta, parse, serialize};
