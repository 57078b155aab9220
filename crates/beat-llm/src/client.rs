//! [`ChatClient`], the HTTP implementation of [`GenerationBackend`].

use std::time::Duration;

use beat_core::briefing::GenerationBackend;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Request timeout applied when the config does not name one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling temperature for every completion request.
const TEMPERATURE: f64 = 0.3;

/// Longest error-body excerpt carried into an [`Error::Api`].
const BODY_EXCERPT_CHARS: usize = 200;

/// Connection settings for the completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
  /// Base URL up to and excluding `/chat/completions`, e.g.
  /// `https://api.groq.com/openai/v1`.
  pub base_url: String,
  pub api_key:  String,
  pub model:    String,
  pub timeout:  Duration,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ChatClient {
  http:   reqwest::Client,
  config: ChatConfig,
}

impl ChatClient {
  pub fn new(config: ChatConfig) -> Result<Self> {
    let http = reqwest::Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config })
  }

  fn completions_url(&self) -> String {
    format!(
      "{}/chat/completions",
      self.config.base_url.trim_end_matches('/')
    )
  }
}

impl GenerationBackend for ChatClient {
  type Error = Error;

  async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
    let body = ChatRequest {
      model:       &self.config.model,
      messages:    vec![
        ChatMessage { role: "system", content: system },
        ChatMessage { role: "user", content: prompt },
      ],
      temperature: TEMPERATURE,
    };

    let resp = self
      .http
      .post(self.completions_url())
      .bearer_auth(&self.config.api_key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Api {
        status: status.as_u16(),
        body:   body.chars().take(BODY_EXCERPT_CHARS).collect(),
      });
    }

    let parsed: ChatResponse = resp.json().await?;
    let content = parsed
      .choices
      .into_iter()
      .next()
      .map(|c| c.message.content)
      .unwrap_or_default();
    let content = content.trim();
    if content.is_empty() {
      return Err(Error::EmptyCompletion);
    }
    Ok(content.to_owned())
  }
}

// ─── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    Vec<ChatMessage<'a>>,
  temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
  content: String,
}
