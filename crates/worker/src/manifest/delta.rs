//! Structural diff between two manifests.
//!
//! The diff decides how much work a deployment costs: only the per-group
//! `added` URLs are prefetched during install, and byte-identical manifest
//! text short-circuits the whole thing to a no-op.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;

use crate::manifest::types::{Manifest, ParsedManifest};

/// URL churn within one group between two deployments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDelta {
  /// URLs present in the fresh group but not the cached one.
  pub added: Vec<String>,
  /// URLs present in the cached group but not the fresh one.
  pub removed: Vec<String>,
}

/// The result of comparing a fresh manifest against the cached one.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDelta {
  pub current: Manifest,
  pub current_text: String,
  pub previous: Option<Manifest>,
  /// False only when a previous text exists and equals the current text
  /// byte-for-byte.
  pub changed: bool,
  /// Group name -> churn. Covers every group of the fresh manifest plus any
  /// group that disappeared.
  pub per_group: BTreeMap<String, GroupDelta>,
}

/// Compare `fresh` against the previously cached manifest, if any.
pub fn compute_delta(fresh: &ParsedManifest, cached: Option<&ParsedManifest>) -> ManifestDelta {
  let mut per_group: BTreeMap<String, GroupDelta> = BTreeMap::new();

  if let Some(cached) = cached {
    if cached.text == fresh.text {
      // Identical deployments: nothing added, nothing removed, anywhere.
      for group in &fresh.manifest.groups {
        per_group.insert(group.name.clone(), GroupDelta::default());
      }
      return ManifestDelta {
        current: fresh.manifest.clone(),
        current_text: fresh.text.clone(),
        previous: Some(cached.manifest.clone()),
        changed: false,
        per_group,
      };
    }
  }

  let previous = cached.map(|c| &c.manifest);

  for group in &fresh.manifest.groups {
    // A version bump changes the backing cache, so the old group is no
    // baseline: every URL must land in the new cache.
    let old_urls = previous
      .and_then(|m| m.group(&group.name))
      .filter(|old| old.cache_name() == group.cache_name())
      .map(|g| &g.urls);

    let added: Vec<String> = group
      .urls
      .keys()
      .filter(|url| !old_urls.is_some_and(|old| old.contains_key(*url)))
      .cloned()
      .collect();

    let removed: Vec<String> = old_urls
      .map(|old| {
        old
          .keys()
          .filter(|url| !group.urls.contains_key(*url))
          .cloned()
          .collect()
      })
      .unwrap_or_default();

    per_group.insert(group.name.clone(), GroupDelta { added, removed });
  }

  // Groups that disappeared entirely contribute fully-removed entries.
  // Every fresh group already has a slot, so a vacant slot means the group
  // exists only in the previous manifest.
  if let Some(previous) = previous {
    for group in &previous.groups {
      if let MapEntry::Vacant(slot) = per_group.entry(group.name.clone()) {
        slot.insert(GroupDelta {
          added: Vec::new(),
          removed: group.urls.keys().cloned().collect(),
        });
      }
    }
  }

  ManifestDelta {
    current: fresh.manifest.clone(),
    current_text: fresh.text.clone(),
    previous: previous.cloned(),
    changed: true,
    per_group,
  }
}
