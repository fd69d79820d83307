//! The lifecycle controller.
//!
//! Reacts to the three host events. `install` diffs the network manifest
//! against the active one and prefetches only the delta into staging;
//! `activate` sweeps caches no group backs anymore and promotes the staged
//! manifest; `fetch` dispatches against whatever manifest is active,
//! recovering it from `ngsw.active` on a cold start.
//!
//! The in-memory manifest views are plain cells: written only at the end of
//! a successful install or activate, read by fetch. A concurrent fetch
//! observes either the old or the new manifest, never a torn intermediate.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::adapter::{CacheStore, NetworkFetcher, Request, Response};
use crate::cache::CacheRegistry;
use crate::consts::{CACHE_ACTIVE, CACHE_INSTALLING, MANIFEST_URL};
use crate::dispatch::{DispatchEngine, DispatchOptions};
use crate::error::{Result, WorkerError};
use crate::lifecycle::events::FetchEvent;
use crate::lifecycle::state::WorkerState;
use crate::manifest::{Manifest, ManifestDelta, ParsedManifest, compute_delta, parse};

/// Owns the worker's state machine and the install/activate/fetch reactions.
pub struct LifecycleController {
  registry: CacheRegistry,
  fetcher: Arc<dyn NetworkFetcher>,
  engine: DispatchEngine,
  /// Manifest currently serving traffic.
  current: RwLock<Option<Arc<ParsedManifest>>>,
  /// Manifest staged by the last successful install.
  staged: RwLock<Option<Arc<ParsedManifest>>>,
  state: RwLock<WorkerState>,
}

impl LifecycleController {
  pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn NetworkFetcher>) -> Self {
    let registry = CacheRegistry::new(store);
    let engine = DispatchEngine::new(registry.clone(), fetcher.clone());

    Self {
      registry,
      fetcher,
      engine,
      current: RwLock::new(None),
      staged: RwLock::new(None),
      state: RwLock::new(WorkerState::Uninitialized),
    }
  }

  /// The worker's current lifecycle state.
  pub fn state(&self) -> WorkerState {
    *self.state.read().unwrap()
  }

  /// The manifest currently serving traffic, if any.
  pub fn active_manifest(&self) -> Option<Arc<ParsedManifest>> {
    self.current.read().unwrap().clone()
  }

  /// The manifest staged by the last install, if any.
  pub fn staged_manifest(&self) -> Option<Arc<ParsedManifest>> {
    self.staged.read().unwrap().clone()
  }

  fn set_state(&self, next: WorkerState) {
    let mut state = self.state.write().unwrap();
    if *state != next {
      debug!(from = %*state, to = %next, "ngsw: state transition");
      *state = next;
    }
  }

  /// The state the worker settles into outside of an in-flight event.
  fn resting_state(&self) -> WorkerState {
    if self.staged_manifest().is_some() {
      WorkerState::Installing
    } else if self.active_manifest().is_some() {
      WorkerState::Active
    } else {
      WorkerState::Uninitialized
    }
  }

  /// React to the host's `install` event.
  ///
  /// Any error aborts the installation and the previous active state is
  /// retained; the host keeps serving the old version. A further install
  /// while one is already staged supersedes the staged state.
  pub async fn handle_install(&self) -> Result<()> {
    info!("ngsw: install event");
    self.set_state(WorkerState::Installing);

    match self.install().await {
      Ok(()) => Ok(()),
      Err(e) => {
        warn!(error = %e, "ngsw: install failed, previous state retained");
        self.set_state(self.resting_state());
        Err(e)
      }
    }
  }

  async fn install(&self) -> Result<()> {
    let response = self
      .fetcher
      .refresh(&Request::get(MANIFEST_URL))
      .await
      .map_err(|_| WorkerError::ManifestUnavailable { status: None })?;

    if !response.ok() {
      return Err(WorkerError::ManifestUnavailable {
        status: Some(response.status),
      });
    }

    let text = response.body_text();
    let fresh = parse(&text)?;

    // Diff against the manifest serving traffic: the in-memory view when
    // warm, ngsw.active on a cold install.
    let active = match self.active_manifest() {
      Some(current) => Some((*current).clone()),
      None => self.registry.read_manifest_source(CACHE_ACTIVE).await?,
    };

    let delta = compute_delta(&fresh, active.as_ref());

    if delta.changed {
      self.prefetch(&delta).await?;
    } else {
      info!("ngsw: manifest unchanged, nothing to prefetch");
    }

    self.registry.write_manifest(CACHE_INSTALLING, &text).await?;
    *self.staged.write().unwrap() = Some(Arc::new(fresh));

    info!(groups = delta.current.groups.len(), changed = delta.changed, "ngsw: install complete");
    Ok(())
  }

  /// Fetch every added URL into its group's cache, in manifest order.
  async fn prefetch(&self, delta: &ManifestDelta) -> Result<()> {
    let mut fetched = 0usize;

    for group in &delta.current.groups {
      let Some(group_delta) = delta.per_group.get(&group.name) else {
        continue;
      };

      let cache_name = group.cache_name();

      for url in &group_delta.added {
        let response = self
          .fetcher
          .refresh(&Request::get(url))
          .await
          .map_err(|e| WorkerError::Prefetch {
            url: url.clone(),
            message: e.to_string(),
          })?;

        if !response.ok() {
          return Err(WorkerError::Prefetch {
            url: url.clone(),
            message: format!("HTTP {}", response.status),
          });
        }

        self.registry.store(&cache_name, url, response).await?;
        fetched += 1;
        debug!(url = %url, cache = %cache_name, "ngsw: prefetched");
      }
    }

    info!(urls = fetched, "ngsw: prefetch complete");
    Ok(())
  }

  /// React to the host's `activate` event.
  ///
  /// Promotes the staged manifest to active, then deletes every cache that
  /// is neither reserved nor backing a group of the promoted manifest. After
  /// this returns, the engine serves from the new active state.
  pub async fn handle_activate(&self) -> Result<()> {
    info!("ngsw: activate event");
    self.set_state(WorkerState::Activating);

    // The staged in-memory manifest wins; a cold activation falls back to
    // the reserved caches, installing first.
    let staged = match self.staged_manifest() {
      Some(pm) => Some((*pm).clone()),
      None => self.registry.read_manifest_source(CACHE_INSTALLING).await?,
    };

    let active = match self.active_manifest() {
      Some(pm) => Some((*pm).clone()),
      None => self.registry.read_manifest_source(CACHE_ACTIVE).await?,
    };

    let promoted = match staged.or(active.clone()) {
      Some(pm) => pm,
      None => {
        warn!("ngsw: nothing to activate");
        self.set_state(self.resting_state());
        return Ok(());
      }
    };

    let delta = compute_delta(&promoted, active.as_ref());
    debug!(changed = delta.changed, groups = promoted.manifest.groups.len(), "ngsw: activating");

    self.cleanup(&promoted.manifest).await?;

    self.registry.write_manifest(CACHE_ACTIVE, &promoted.text).await?;
    // The staging copy has been consumed.
    self.registry.remove(CACHE_INSTALLING).await?;

    *self.current.write().unwrap() = Some(Arc::new(promoted));
    *self.staged.write().unwrap() = None;
    self.set_state(WorkerState::Active);

    info!("ngsw: activate complete");
    Ok(())
  }

  /// Delete every cache not reserved and not backing a current group.
  async fn cleanup(&self, manifest: &Manifest) -> Result<()> {
    let mut keep: HashSet<String> =
      HashSet::from([CACHE_ACTIVE.to_string(), CACHE_INSTALLING.to_string()]);
    keep.extend(manifest.groups.iter().map(|g| g.cache_name()));

    let mut removed = 0usize;
    for name in self.registry.keys().await {
      if keep.contains(&name) {
        continue;
      }
      debug!(cache = %name, "ngsw: removing stale cache");
      self.registry.remove(&name).await?;
      removed += 1;
    }

    info!(removed, "ngsw: cache cleanup complete");
    Ok(())
  }

  /// React to the host's `fetch` event.
  ///
  /// Lazily recovers the active manifest from `ngsw.active` after a cold
  /// start. With no manifest at all the worker stays uninitialized and the
  /// fetch falls through to the platform (`None`).
  pub async fn handle_fetch(&self, request: &Request, options: &DispatchOptions) -> Option<Response> {
    self.ensure_initialized().await;

    let current = match self.active_manifest() {
      Some(pm) => pm,
      None => {
        debug!(url = %request.url, "ngsw: no active manifest, falling through");
        return None;
      }
    };

    self.engine.dispatch(&current.manifest, request, options).await
  }

  /// Handle a host fetch event end to end, filling its response slot when
  /// dispatch produced a response.
  pub async fn handle_fetch_event(&self, event: &FetchEvent, options: &DispatchOptions) {
    if let Some(response) = self.handle_fetch(&event.request, options).await {
      if let Err(e) = event.respond_with(response) {
        warn!(url = %event.request.url, error = %e, "ngsw: could not deliver response");
      }
    }
  }

  async fn ensure_initialized(&self) {
    if self.active_manifest().is_some() {
      return;
    }

    if let Some(parsed) = self.registry.read_manifest(CACHE_ACTIVE).await {
      info!("ngsw: recovered active manifest from cache");
      *self.current.write().unwrap() = Some(Arc::new(parsed));
      if self.state() == WorkerState::Uninitialized {
        self.set_state(WorkerState::Active);
      }
    }
  }
}
