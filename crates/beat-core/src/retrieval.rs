//! The `SemanticIndex` trait: best-effort passage storage and ranking.
//!
//! The index enriches debriefs and answers operator queries. It is never
//! authoritative: callers that can degrade do so, and nothing in the record
//! store depends on it.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cap on `k` accepted by [`SemanticIndex::query`].
pub const MAX_QUERY_K: usize = 50;

/// A document offered for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageDoc {
  pub doc_id:   String,
  pub content:  String,
  #[serde(default)]
  pub metadata: Map<String, Value>,
}

/// One ranked retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
  pub content:  String,
  /// Scalar-or-null values only; sanitized at ingest time.
  pub metadata: Map<String, Value>,
  /// Smaller is more similar. Comparable within one index, not across
  /// implementations.
  pub distance: f32,
}

pub trait SemanticIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upsert one document by `doc_id`. Metadata is reduced to
  /// scalar-or-null values before storage.
  fn ingest(
    &self,
    doc: PassageDoc,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Rank up to `k` passages by ascending distance from `text`.
  ///
  /// `k` beyond [`MAX_QUERY_K`] is clamped; blank text yields an empty
  /// result. `filter` is a metadata equality map and every pair must match
  /// the stored (sanitized) metadata.
  fn query<'a>(
    &'a self,
    text: &'a str,
    k: usize,
    filter: Option<&'a Map<String, Value>>,
  ) -> impl Future<Output = Result<Vec<RetrievedPassage>, Self::Error>> + Send + 'a;
}
