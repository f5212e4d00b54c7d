//! The article/RSS content gateway collaborator: trending topics from
//! headline NER and `{source_url, text}` tuples per topic. External service,
//! consumed behind a trait so cycles can run against canned documents.

use std::time::Duration;

use axiom_shared::AxiomError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
  pub source_url: String,
  pub content: String,
}

#[async_trait::async_trait]
pub trait ContentGateway: Send + Sync {
  /// Trending topics discovered from feed headlines, most prominent first.
  async fn trending_topics(&self, top_n: usize) -> Result<Vec<String>, AxiomError>;

  /// Fetch up to `max_sources` article texts relevant to `topic`.
  async fn find_and_extract(
    &self,
    topic: &str,
    max_sources: usize,
  ) -> Result<Vec<SourceDocument>, AxiomError>;
}

#[derive(Deserialize)]
struct TopicsResponse {
  #[serde(default)]
  topics: Vec<String>,
}

#[derive(Deserialize)]
struct DocumentsResponse {
  #[serde(default)]
  documents: Vec<SourceDocument>,
}

pub struct HttpContentGateway {
  http: reqwest::Client,
  base_url: String,
}

impl HttpContentGateway {
  #[must_use]
  pub fn new(base_url: &str) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.trim_end_matches('/').to_owned(),
    }
  }
}

#[async_trait::async_trait]
impl ContentGateway for HttpContentGateway {
  async fn trending_topics(&self, top_n: usize) -> Result<Vec<String>, AxiomError> {
    let response = self
      .http
      .get(format!("{}/trending_topics?top_n={top_n}", self.base_url))
      .timeout(Duration::from_secs(12))
      .send()
      .await?
      .error_for_status()?;
    let topics: TopicsResponse = response
      .json()
      .await
      .map_err(|e| AxiomError::Decode(format!("malformed gateway response: {e}")))?;
    Ok(topics.topics)
  }

  async fn find_and_extract(
    &self,
    topic: &str,
    max_sources: usize,
  ) -> Result<Vec<SourceDocument>, AxiomError> {
    let response = self
      .http
      .get(format!(
        "{}/find_and_extract?topic={}&max_sources={max_sources}",
        self.base_url,
        urlencode(topic)
      ))
      .timeout(Duration::from_secs(12))
      .send()
      .await?
      .error_for_status()?;
    let documents: DocumentsResponse = response
      .json()
      .await
      .map_err(|e| AxiomError::Decode(format!("malformed gateway response: {e}")))?;
    Ok(documents.documents)
  }
}

fn urlencode(raw: &str) -> String {
  raw
    .bytes()
    .map(|b| match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
        char::from(b).to_string()
      }
      _ => format!("%{b:02X}"),
    })
    .collect()
}

/// Canned gateway for tests and offline runs.
#[derive(Default)]
pub struct StubGateway {
  pub topics: Vec<String>,
  pub documents: Vec<SourceDocument>,
}

#[async_trait::async_trait]
impl ContentGateway for StubGateway {
  async fn trending_topics(&self, top_n: usize) -> Result<Vec<String>, AxiomError> {
    Ok(self.topics.iter().take(top_n).cloned().collect())
  }

  async fn find_and_extract(
    &self,
    _topic: &str,
    max_sources: usize,
  ) -> Result<Vec<SourceDocument>, AxiomError> {
    Ok(self.documents.iter().take(max_sources).cloned().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::urlencode;

  #[test]
  fn topics_are_query_encoded() {
    assert_eq!(urlencode("US Politics"), "US%20Politics");
    assert_eq!(urlencode("Aix-en-Provence"), "Aix-en-Provence");
  }
}
