//! Error type for the chat-completion client.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport-level failure: connect, timeout, response decode.
  #[error("chat request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The endpoint answered with a non-success status.
  #[error("chat endpoint returned {status}: {body}")]
  Api { status: u16, body: String },

  /// A success response with no usable text in it.
  #[error("chat endpoint returned an empty completion")]
  EmptyCompletion,
}
