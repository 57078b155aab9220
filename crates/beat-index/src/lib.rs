//! In-process semantic index: a deterministic hashed embedder over an
//! in-memory cosine index.
//!
//! Implements [`beat_core::retrieval::SemanticIndex`] without any external
//! service, which keeps single-node deployments self-contained. A real
//! vector database can replace [`MemoryIndex`] behind the same trait.

mod embed;
mod index;
mod sanitize;

pub mod error;

pub use embed::{EMBED_DIM, HashedEmbedder};
pub use error::{Error, Result};
pub use index::MemoryIndex;
pub use sanitize::sanitize;
