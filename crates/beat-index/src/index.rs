//! [`MemoryIndex`], the in-memory cosine index behind [`SemanticIndex`].

use std::{
  collections::HashMap,
  sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use beat_core::retrieval::{
  MAX_QUERY_K, PassageDoc, RetrievedPassage, SemanticIndex,
};
use serde_json::{Map, Value};

use crate::{
  embed::HashedEmbedder,
  error::{Error, Result},
  sanitize::sanitize,
};

struct StoredPassage {
  content:   String,
  metadata:  Map<String, Value>,
  embedding: Vec<f32>,
}

/// In-process vector index. Contents live and die with the process.
#[derive(Default)]
pub struct MemoryIndex {
  embedder: HashedEmbedder,
  passages: RwLock<HashMap<String, StoredPassage>>,
}

impl MemoryIndex {
  pub fn new() -> Self {
    Self::default()
  }

  fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredPassage>>> {
    self.passages.read().map_err(|_| Error::LockPoisoned)
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredPassage>>> {
    self.passages.write().map_err(|_| Error::LockPoisoned)
  }
}

/// Cosine distance between two unit-length vectors.
fn distance(a: &[f32], b: &[f32]) -> f32 {
  let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  1.0 - dot
}

fn matches_filter(metadata: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
  filter.iter().all(|(key, want)| metadata.get(key) == Some(want))
}

impl SemanticIndex for MemoryIndex {
  type Error = Error;

  async fn ingest(&self, doc: PassageDoc) -> Result<()> {
    let stored = StoredPassage {
      embedding: self.embedder.embed(&doc.content),
      content:   doc.content,
      metadata:  sanitize(doc.metadata),
    };
    self.write()?.insert(doc.doc_id, stored);
    Ok(())
  }

  async fn query(
    &self,
    text: &str,
    k: usize,
    filter: Option<&Map<String, Value>>,
  ) -> Result<Vec<RetrievedPassage>> {
    if text.trim().is_empty() {
      return Ok(Vec::new());
    }
    let k = k.min(MAX_QUERY_K);
    let needle = self.embedder.embed(text);

    let passages = self.read()?;
    let mut hits: Vec<(&String, f32)> = passages
      .iter()
      .filter(|(_, p)| filter.is_none_or(|f| matches_filter(&p.metadata, f)))
      .map(|(doc_id, p)| (doc_id, distance(&needle, &p.embedding)))
      .collect();
    // Ascending distance; doc id breaks ties so results are reproducible.
    hits.sort_by(|a, b| {
      a.1
        .partial_cmp(&b.1)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.0.cmp(b.0))
    });
    hits.truncate(k);

    Ok(
      hits
        .into_iter()
        .map(|(doc_id, dist)| {
          let p = &passages[doc_id];
          RetrievedPassage {
            content:  p.content.clone(),
            metadata: p.metadata.clone(),
            distance: dist,
          }
        })
        .collect(),
    )
  }
}
