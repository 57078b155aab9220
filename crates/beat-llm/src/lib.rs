//! Chat-completion client for narrative generation.
//!
//! Speaks the OpenAI-compatible `/chat/completions` shape (Groq serves it
//! too), which is all the debrief pipeline needs from a language model.

mod client;

pub mod error;

pub use client::{ChatClient, ChatConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
