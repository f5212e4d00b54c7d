//! Metacognition: integrity pruning and the fragment audit state machine.

use axiom_shared::AxiomError;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{FactStatus, FragmentState, ledger};

pub const PRUNE_THRESHOLD_DAYS: i64 = 90;
/// Facts need an ADL summary of at least this length to be structurally useful.
pub const ADL_INTEGRITY_THRESHOLD: u32 = 10;
pub const TRUST_SCORE_FOR_PRUNING: i32 = 1;

/// Deep structural review: purge facts that are both stale and structurally
/// shallow. Returns the number of rows deleted.
pub async fn run_metacognitive_cycle(db: &DatabaseConnection) -> Result<u64, AxiomError> {
  let cutoff = (Utc::now() - Duration::days(PRUNE_THRESHOLD_DAYS))
    .format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
    .to_string();
  let deleted = ledger::prune_stale_shallow(
    db,
    &cutoff,
    TRUST_SCORE_FOR_PRUNING,
    ADL_INTEGRITY_THRESHOLD,
  )
  .await?;
  if deleted > 0 {
    tracing::info!(deleted, "purged low-integrity stale facts");
  } else {
    tracing::debug!("no records met the garbage collection threshold");
  }
  Ok(deleted)
}

const PRONOUN_STARTS: &[&str] = &[
  "he ", "she ", "they ", "it ", "this ", "that ", "these ", "those ",
];

/// Model-free re-scoring used by the idle audit. Unlike the ingest-time
/// heuristic this sees only the stored text, so the entity term is absent.
#[must_use]
pub fn audit_score(text: &str) -> (f64, Vec<&'static str>) {
  let text = text.trim();
  let lower = text.to_lowercase();
  let word_count = text.split_whitespace().count();
  let mut score: f64 = 0.0;
  let mut reasons = Vec::new();

  if word_count <= 8 {
    score += 0.6;
    reasons.push("short_sentence");
  } else if word_count <= 12 {
    score += 0.3;
    reasons.push("moderately_short");
  }
  if PRONOUN_STARTS.iter().any(|p| lower.starts_with(p)) {
    score += 0.25;
    reasons.push("pronoun_start");
  }
  if !text.ends_with(['.', '!', '?']) {
    score += 0.15;
    reasons.push("nonterminal_punctuation");
  }
  (score.clamp(0.0, 1.0), reasons)
}

/// State transition for one audited fact, before any peer consensus.
#[must_use]
pub fn refine_state(current: FragmentState, score: f64) -> FragmentState {
  if score >= 0.8 {
    FragmentState::SuspectedFragment
  } else if score >= 0.5 {
    if current == FragmentState::Unknown {
      FragmentState::SuspectedFragment
    } else {
      current
    }
  } else if matches!(
    current,
    FragmentState::SuspectedFragment | FragmentState::ConfirmedFragment
  ) {
    // Evidence weakened since the suspicion was recorded: release it.
    FragmentState::RejectedFragment
  } else {
    current
  }
}

/// One peer's answer to `/fragment_opinion`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FragmentOpinion {
  pub seen: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<FactStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub trust_score: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fragment_state: Option<FragmentState>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fragment_score: Option<f64>,
}

impl FragmentOpinion {
  #[must_use]
  pub const fn unseen() -> Self {
    Self {
      seen: false,
      status: None,
      trust_score: None,
      fragment_state: None,
      fragment_score: None,
    }
  }
}

/// Aggregate peer opinions about a suspected fragment. Peers that do not know
/// the fact (or also suspect it) count for confirmation; peers that rejected
/// it or hold it as meaningfully trusted count against. A split leaves the
/// state unchanged.
#[must_use]
pub fn fragment_consensus(opinions: &[FragmentOpinion]) -> Option<FragmentState> {
  let mut positives = 0;
  let mut negatives = 0;
  for opinion in opinions {
    if !opinion.seen {
      positives += 1;
      continue;
    }
    match opinion.fragment_state {
      Some(FragmentState::SuspectedFragment | FragmentState::ConfirmedFragment) => positives += 1,
      Some(FragmentState::RejectedFragment) => negatives += 1,
      _ => {
        if opinion.status == Some(FactStatus::Trusted)
          && opinion.trust_score.unwrap_or(0.0) >= 2.0
        {
          negatives += 1;
        }
      }
    }
  }
  if positives > 0 && negatives == 0 {
    Some(FragmentState::ConfirmedFragment)
  } else if negatives > 0 && positives == 0 {
    Some(FragmentState::RejectedFragment)
  } else {
    None
  }
}
