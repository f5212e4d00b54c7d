use std::time::Duration;

use axiom_shared::AxiomError;
use serde::{Deserialize, Serialize};

use crate::ParsedSentence;

/// Capability handle for the external NLP collaborator. Owned by the node and
/// injected at construction so tests can substitute scripted parses.
#[async_trait::async_trait]
pub trait NlpEngine: Send + Sync {
  /// Segment `text` into sentences and return a full parse of each.
  async fn parse(&self, text: &str) -> Result<Vec<ParsedSentence>, AxiomError>;
}

#[derive(Serialize)]
struct ParseRequest<'a> {
  text: &'a str,
}

#[derive(Deserialize)]
struct ParseResponse {
  sentences: Vec<ParsedSentence>,
}

/// HTTP client for an NLP service exposing `POST /parse` and `GET /healthz`.
pub struct HttpNlpEngine {
  client: reqwest::Client,
  base_url: String,
}

impl HttpNlpEngine {
  #[must_use]
  pub fn new(base_url: &str) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.trim_end_matches('/').to_owned(),
    }
  }

  /// Startup reachability check. An unreachable NLP collaborator is fatal.
  pub async fn probe(&self) -> Result<(), AxiomError> {
    self
      .client
      .get(format!("{}/healthz", self.base_url))
      .timeout(Duration::from_secs(5))
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(|e| AxiomError::Config(format!("NLP collaborator unreachable: {e}")))?;
    Ok(())
  }
}

#[async_trait::async_trait]
impl NlpEngine for HttpNlpEngine {
  async fn parse(&self, text: &str) -> Result<Vec<ParsedSentence>, AxiomError> {
    let response = self
      .client
      .post(format!("{}/parse", self.base_url))
      .timeout(Duration::from_secs(20))
      .json(&ParseRequest { text })
      .send()
      .await?
      .error_for_status()?;

    let parsed: ParseResponse = response
      .json()
      .await
      .map_err(|e| AxiomError::Decode(format!("malformed NLP response: {e}")))?;
    Ok(parsed.sentences)
  }
}
