//! Error type for the in-process index.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors from [`MemoryIndex`](crate::MemoryIndex).
///
/// The in-memory index has one failure mode: a lock poisoned by a panicking
/// writer. A remote implementation would grow transport variants here.
#[derive(Debug, Error)]
pub enum Error {
  #[error("index lock poisoned")]
  LockPoisoned,
}
