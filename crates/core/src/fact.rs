use axiom_entities::facts;
use axiom_shared::AxiomError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::{compress, decompress};

/// ISO-8601 UTC with microseconds, the timestamp shape used across the ledger
/// and the chain (`2026-06-12T08:00:00.000000+00:00`).
#[must_use]
pub fn utc_now_iso() -> String {
  chrono::Utc::now()
    .format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
    .to_string()
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactStatus {
  Uncorroborated,
  Trusted,
  Disputed,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FragmentState {
  Unknown,
  SuspectedFragment,
  ConfirmedFragment,
  RejectedFragment,
}

/// Heuristic fragment classification attached to a fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentMeta {
  pub state: FragmentState,
  /// Confidence in [0, 1] that this sentence is a context-dependent stub.
  pub score: f64,
  pub reason: Option<String>,
}

impl Default for FragmentMeta {
  fn default() -> Self {
    Self {
      state: FragmentState::Unknown,
      score: 0.0,
      reason: None,
    }
  }
}

/// In-memory view of a ledger row with the content decompressed.
#[derive(Debug, Clone, Serialize)]
pub struct Fact {
  pub fact_id: String,
  pub content: String,
  pub source_url: String,
  pub ingest_timestamp_utc: String,
  pub trust_score: i32,
  pub status: FactStatus,
  pub corroborating_sources: Vec<String>,
  pub contradicts_fact_id: Option<String>,
  pub lexically_processed: bool,
  pub adl_summary: String,
  pub fragment: FragmentMeta,
}

impl Fact {
  pub fn from_model(model: facts::Model) -> Result<Self, AxiomError> {
    Ok(Self {
      content: decompress(&model.fact_content)?,
      fact_id: model.fact_id,
      source_url: model.source_url,
      ingest_timestamp_utc: model.ingest_timestamp_utc,
      trust_score: model.trust_score,
      status: model
        .status
        .parse()
        .map_err(|_| AxiomError::Decode(format!("unknown fact status {:?}", model.status)))?,
      corroborating_sources: model
        .corroborating_sources
        .as_deref()
        .map(parse_sources)
        .unwrap_or_default(),
      contradicts_fact_id: model.contradicts_fact_id,
      lexically_processed: model.lexically_processed,
      adl_summary: model.adl_summary,
      fragment: FragmentMeta {
        state: model.fragment_state.parse().unwrap_or(FragmentState::Unknown),
        score: model.fragment_score,
        reason: model.fragment_reason,
      },
    })
  }

  pub fn to_model(&self) -> facts::Model {
    facts::Model {
      fact_id: self.fact_id.clone(),
      fact_content: compress(&self.content),
      source_url: self.source_url.clone(),
      ingest_timestamp_utc: self.ingest_timestamp_utc.clone(),
      trust_score: self.trust_score,
      status: self.status.to_string(),
      corroborating_sources: if self.corroborating_sources.is_empty() {
        None
      } else {
        Some(serde_json::to_string(&self.corroborating_sources).expect("source list serializes"))
      },
      contradicts_fact_id: self.contradicts_fact_id.clone(),
      lexically_processed: self.lexically_processed,
      adl_summary: self.adl_summary.clone(),
      fragment_state: self.fragment.state.to_string(),
      fragment_score: self.fragment.score,
      fragment_reason: self.fragment.reason.clone(),
    }
  }
}

pub(crate) fn parse_sources(raw: &str) -> Vec<String> {
  serde_json::from_str(raw).unwrap_or_default()
}

/// Canonical wire form of a fact. Content travels decompressed; the receiver
/// verifies `sha256(fact_content) == fact_id` and re-compresses on ingest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WireFact {
  pub fact_id: String,
  pub fact_content: String,
  pub source_url: String,
  pub ingest_timestamp_utc: String,
  pub trust_score: i32,
  pub status: FactStatus,
}

impl From<&Fact> for WireFact {
  fn from(fact: &Fact) -> Self {
    Self {
      fact_id: fact.fact_id.clone(),
      fact_content: fact.content.clone(),
      source_url: fact.source_url.clone(),
      ingest_timestamp_utc: fact.ingest_timestamp_utc.clone(),
      trust_score: fact.trust_score,
      status: fact.status,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_round_trips_through_strings() {
    assert_eq!(FactStatus::Trusted.to_string(), "trusted");
    assert_eq!("disputed".parse::<FactStatus>().unwrap(), FactStatus::Disputed);
    assert_eq!(
      FragmentState::SuspectedFragment.to_string(),
      "suspected_fragment"
    );
    assert_eq!(
      "rejected_fragment".parse::<FragmentState>().unwrap(),
      FragmentState::RejectedFragment
    );
  }

  #[test]
  fn model_round_trip_preserves_content_and_sources() {
    let fact = Fact {
      fact_id: crate::fact_id("Company X acquired Company Y in 2023."),
      content: "Company X acquired Company Y in 2023.".to_owned(),
      source_url: "https://a.example/story".to_owned(),
      ingest_timestamp_utc: utc_now_iso(),
      trust_score: 2,
      status: FactStatus::Uncorroborated,
      corroborating_sources: vec!["https://b.example/other".to_owned()],
      contradicts_fact_id: None,
      lexically_processed: false,
      adl_summary: "company|acquire|ORG_ORG".to_owned(),
      fragment: FragmentMeta::default(),
    };
    let restored = Fact::from_model(fact.to_model()).unwrap();
    assert_eq!(restored.content, fact.content);
    assert_eq!(restored.corroborating_sources, fact.corroborating_sources);
    assert_eq!(restored.status, fact.status);
  }
}
