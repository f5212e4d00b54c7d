//! Lightweight ledger and chain health snapshots for periodic idle checks.

use std::collections::BTreeMap;

use axiom_entities::{blocks, facts};
use axiom_shared::AxiomError;
use sea_orm::{
  DatabaseConnection, EntityTrait, ExprTrait, PaginatorTrait, QuerySelect, sea_query::Expr,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthSnapshot {
  pub total_facts: u64,
  pub status_counts: BTreeMap<String, u64>,
  pub avg_trust_score: Option<f64>,
  pub oldest_fact_ts: Option<String>,
  pub newest_fact_ts: Option<String>,
  pub total_blocks: u64,
  pub chain_height: i64,
}

pub async fn compute_health_snapshot(
  db: &DatabaseConnection,
) -> Result<HealthSnapshot, AxiomError> {
  let status_rows: Vec<(String, i64)> = facts::Entity::find()
    .select_only()
    .column(facts::Column::Status)
    .column_as(Expr::col(facts::Column::FactId).count(), "c")
    .group_by(facts::Column::Status)
    .into_tuple()
    .all(db)
    .await?;
  let status_counts: BTreeMap<String, u64> = status_rows
    .into_iter()
    .map(|(status, count)| (status, std::cmp::Ord::max(count, 0) as u64))
    .collect();

  let total_facts = facts::Entity::find().count(db).await?;

  let stats: Option<(Option<f64>, Option<String>, Option<String>)> = facts::Entity::find()
    .select_only()
    .column_as(Expr::col(facts::Column::TrustScore).avg(), "avg_trust")
    .column_as(Expr::col(facts::Column::IngestTimestampUtc).min(), "oldest")
    .column_as(Expr::col(facts::Column::IngestTimestampUtc).max(), "newest")
    .into_tuple()
    .one(db)
    .await?;
  let (avg_trust_score, oldest_fact_ts, newest_fact_ts) = stats.unwrap_or((None, None, None));

  let total_blocks = blocks::Entity::find().count(db).await?;
  let max_height: Option<Option<i64>> = blocks::Entity::find()
    .select_only()
    .column_as(Expr::col(blocks::Column::Height).max(), "h")
    .into_tuple()
    .one(db)
    .await?;
  let chain_height = max_height.flatten().unwrap_or(0);

  Ok(HealthSnapshot {
    total_facts,
    status_counts,
    avg_trust_score,
    oldest_fact_ts,
    newest_fact_ts,
    total_blocks,
    chain_height,
  })
}

impl HealthSnapshot {
  /// Blocks without facts means the chain references data this node lost.
  #[must_use]
  pub fn is_anomalous(&self) -> bool {
    self.total_blocks > 0 && self.total_facts == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{chain, ledger, test_support::{new_fact, test_db}};

  #[tokio::test]
  async fn snapshot_counts_facts_and_blocks() {
    let db = test_db().await;
    chain::ensure_genesis(&db).await.unwrap();
    let fact = new_fact("The reactor reached first criticality in March.", "https://a.example/1");
    ledger::insert_candidate_fact(&db, &fact).await.unwrap();
    chain::create_block(&db, vec![fact.fact_id.clone()]).await.unwrap();

    let snapshot = compute_health_snapshot(&db).await.unwrap();
    assert_eq!(snapshot.total_facts, 1);
    assert_eq!(snapshot.total_blocks, 2);
    assert_eq!(snapshot.chain_height, 1);
    assert_eq!(snapshot.status_counts.get("uncorroborated"), Some(&1));
    assert_eq!(snapshot.avg_trust_score, Some(1.0));
    assert!(!snapshot.is_anomalous());
  }

  #[tokio::test]
  async fn chain_without_facts_is_flagged() {
    let db = test_db().await;
    chain::ensure_genesis(&db).await.unwrap();
    let snapshot = compute_health_snapshot(&db).await.unwrap();
    assert!(snapshot.is_anomalous());
  }
}
