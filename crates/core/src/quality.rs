//! Sampled data-quality scans: duplicate detection by content fingerprint and
//! conflict candidates over ADL fingerprints. Sized for throttled idle tasks,
//! not offline jobs.

use std::collections::HashMap;

use axiom_entities::facts;
use axiom_shared::AxiomError;
use sea_orm::{
  DatabaseConnection, EntityTrait, Order, QueryOrder, QuerySelect, sea_query::Expr,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::decompress;

/// Cheap, stable fingerprint for duplicate detection: lowercase, collapse
/// whitespace, cap at 512 chars, hash.
#[must_use]
pub fn fingerprint(text: &str) -> String {
  let normalized: String = text
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
    .chars()
    .take(512)
    .collect();
  hex::encode(Sha256::digest(normalized.as_bytes()))
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
  pub fingerprint: String,
  pub fact_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictGroup {
  pub subject: String,
  pub predicate: String,
  /// Distinct entity signatures observed for the subject+predicate pair.
  pub signatures: Vec<String>,
  pub fact_ids: Vec<String>,
}

async fn sample(
  db: &DatabaseConnection,
  sample_size: u64,
) -> Result<Vec<facts::Model>, AxiomError> {
  Ok(
    facts::Entity::find()
      .order_by(Expr::cust("RANDOM()"), Order::Asc)
      .limit(sample_size)
      .all(db)
      .await?,
  )
}

/// Group obvious duplicates in a random sample by content fingerprint.
pub async fn find_duplicate_candidates(
  db: &DatabaseConnection,
  sample_size: u64,
) -> Result<Vec<DuplicateGroup>, AxiomError> {
  let rows = sample(db, sample_size).await?;
  let mut buckets: HashMap<String, Vec<String>> = HashMap::new();
  for row in rows {
    let Ok(text) = decompress(&row.fact_content) else {
      continue;
    };
    if text.is_empty() {
      continue;
    }
    buckets.entry(fingerprint(&text)).or_default().push(row.fact_id);
  }
  Ok(
    buckets
      .into_iter()
      .filter(|(_, ids)| ids.len() > 1)
      .map(|(fingerprint, fact_ids)| DuplicateGroup { fingerprint, fact_ids })
      .collect(),
  )
}

fn adl_triplet(adl: &str) -> Option<(String, String, String)> {
  let parts: Vec<&str> = adl.split('|').map(str::trim).collect();
  match parts.as_slice() {
    [subject, predicate, signature]
      if !subject.is_empty() && !predicate.is_empty() && !signature.is_empty() =>
    {
      Some(((*subject).to_owned(), (*predicate).to_owned(), (*signature).to_owned()))
    }
    _ => None,
  }
}

/// Conflict candidates: the same subject+predicate ADL pair carrying multiple
/// distinct entity signatures across the sample.
pub async fn find_conflict_candidates(
  db: &DatabaseConnection,
  sample_size: u64,
) -> Result<Vec<ConflictGroup>, AxiomError> {
  let rows = sample(db, sample_size).await?;
  let mut buckets: HashMap<(String, String), HashMap<String, Vec<String>>> = HashMap::new();
  for row in rows {
    let Some((subject, predicate, signature)) = adl_triplet(&row.adl_summary) else {
      continue;
    };
    buckets
      .entry((subject, predicate))
      .or_default()
      .entry(signature)
      .or_default()
      .push(row.fact_id);
  }

  let mut conflicts = Vec::new();
  for ((subject, predicate), by_signature) in buckets {
    if by_signature.len() <= 1 {
      continue;
    }
    let mut signatures: Vec<String> = by_signature.keys().cloned().collect();
    signatures.sort_unstable();
    let fact_ids = by_signature.into_values().flatten().collect();
    conflicts.push(ConflictGroup {
      subject,
      predicate,
      signatures,
      fact_ids,
    });
  }
  Ok(conflicts)
}
