use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::GROUP_CACHE_PREFIX;

/// Manifest metadata with the recognized keys promoted to typed fields.
///
/// Unrecognized keys are retained in `extra` so tooling-specific annotations
/// survive a parse/serialize round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
  /// Development mode: every fetch bypasses the caches and goes straight to
  /// the network.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dev: Option<bool>,

  /// URL the root path `/` is rewritten to during dispatch.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub index: Option<String>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}

/// An immutable snapshot of one deployment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
  pub metadata: Metadata,
  /// Groups in manifest order. Dispatch probes groups in exactly this order,
  /// so higher-priority groups come first in the manifest text.
  pub groups: Vec<Group>,
}

impl Manifest {
  /// Look up a group by name.
  pub fn group(&self, name: &str) -> Option<&Group> {
    self.groups.iter().find(|g| g.name == name)
  }

  /// Whether development passthrough mode is on.
  pub fn dev(&self) -> bool {
    self.metadata.dev.unwrap_or(false)
  }

  /// The root-path rewrite target, when configured.
  pub fn index(&self) -> Option<&str> {
    self.metadata.index.as_deref()
  }
}

/// A named bundle of cacheable content, versioned as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
  /// Unique within the manifest.
  pub name: String,
  /// Optional content version; bumping it retires the previous group cache.
  pub version: Option<u32>,
  /// URL -> entry. Key order is not significant; group order is.
  pub urls: BTreeMap<String, Entry>,
  /// URL prefix -> fallback rule.
  pub fallback: BTreeMap<String, FallbackEntry>,
}

impl Group {
  /// The named cache backing this group.
  ///
  /// The name is a pure function of the group's identity, so a redeployment
  /// with equal contents maps to the same cache and reuses it.
  pub fn cache_name(&self) -> String {
    match self.version {
      Some(v) => format!("{}{}.v{}", GROUP_CACHE_PREFIX, self.name, v),
      None => format!("{}{}", GROUP_CACHE_PREFIX, self.name),
    }
  }
}

/// One cacheable URL within a group.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  pub url: String,
  /// Content hash as emitted by the build tooling, when present.
  pub hash: Option<String>,
  /// Name of the owning group. A lookup key, not ownership; resolve through
  /// the manifest.
  pub group: String,
}

/// A fallback rule: requests whose URL starts with `prefix` are rewritten to
/// `fallback_to` and re-dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackEntry {
  pub prefix: String,
  pub fallback_to: String,
}

/// A parsed manifest together with the exact text it came from.
///
/// The text is what gets stored in the reserved caches and what the diff
/// compares byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedManifest {
  pub manifest: Manifest,
  pub text: String,
}
