//! Manifest text parsing and canonical serialization.
//!
//! The wire grammar is whatever the build tooling emits: a JSON object with
//! an optional `metadata` block and a `groups` array. Group entries may be
//! written either as `{ "hash": "..." }` objects or as bare hash strings.
//! Serialization always emits the object form, so `parse(serialize(m)) == m`
//! holds for every well-formed manifest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::manifest::types::{Entry, FallbackEntry, Group, Manifest, Metadata, ParsedManifest};

#[derive(Serialize, Deserialize)]
struct ManifestDoc {
  #[serde(default)]
  metadata: Metadata,
  #[serde(default)]
  groups: Vec<GroupDoc>,
}

#[derive(Serialize, Deserialize)]
struct GroupDoc {
  name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  version: Option<u32>,
  #[serde(default)]
  urls: BTreeMap<String, EntryDoc>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  fallback: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EntryDoc {
  Full {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
  },
  Bare(String),
}

/// Parse manifest text into a [`ParsedManifest`], retaining the text.
pub fn parse(text: &str) -> Result<ParsedManifest> {
  let doc: ManifestDoc = serde_json::from_str(text)?;

  let groups = doc
    .groups
    .into_iter()
    .map(|g| {
      let urls = g
        .urls
        .into_iter()
        .map(|(url, entry)| {
          let hash = match entry {
            EntryDoc::Bare(hash) => Some(hash),
            EntryDoc::Full { hash } => hash,
          };
          (
            url.clone(),
            Entry {
              url,
              hash,
              group: g.name.clone(),
            },
          )
        })
        .collect();

      let fallback = g
        .fallback
        .into_iter()
        .map(|(prefix, fallback_to)| {
          (
            prefix.clone(),
            FallbackEntry {
              prefix,
              fallback_to,
            },
          )
        })
        .collect();

      Group {
        name: g.name,
        version: g.version,
        urls,
        fallback,
      }
    })
    .collect();

  Ok(ParsedManifest {
    manifest: Manifest {
      metadata: doc.metadata,
      groups,
    },
    text: text.to_string(),
  })
}

/// Serialize a manifest to its canonical JSON form.
pub fn serialize(manifest: &Manifest) -> String {
  let doc = ManifestDoc {
    metadata: manifest.metadata.clone(),
    groups: manifest
      .groups
      .iter()
      .map(|g| GroupDoc {
        name: g.name.clone(),
        version: g.version,
        urls: g
          .urls
          .iter()
          .map(|(url, entry)| {
            (
              url.clone(),
              EntryDoc::Full {
                hash: entry.hash.clone(),
              },
            )
          })
          .collect(),
        fallback: g
          .fallback
          .iter()
          .map(|(prefix, fb)| (prefix.clone(), fb.fallback_to.clone()))
          .collect(),
      })
      .collect(),
  };

  // ManifestDoc contains no map keys or values that can fail to serialize.
  serde_json::to_string_pretty(&doc).expect("manifest serialization is infallible")
}
