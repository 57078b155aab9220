//! Core types and trait definitions for the beat dispatch pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage, semantic retrieval, text generation, and live transport all
//! arrive through traits; the services here orchestrate them.

pub mod alert;
pub mod briefing;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod patrol;
pub mod registry;
pub mod retrieval;
pub mod store;
pub mod unit;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
