//! Keyword search over the ledger backing `/local_query`.

use axiom_entities::facts;
use axiom_shared::AxiomError;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::{Fact, FactStatus, WireFact};

/// Case-insensitive substring search over decompressed content. Disputed
/// facts are excluded unless explicitly requested; by default only trusted
/// facts are returned.
pub async fn search_ledger(
  db: &DatabaseConnection,
  term: &str,
  include_uncorroborated: bool,
  include_disputed: bool,
) -> Result<Vec<WireFact>, AxiomError> {
  let needle = term.to_lowercase();
  let rows = facts::Entity::find().all(db).await?;

  let mut results = Vec::new();
  for model in rows {
    let Ok(fact) = Fact::from_model(model) else {
      // Undecodable rows are skipped rather than failing the query.
      continue;
    };
    if !include_disputed && fact.status == FactStatus::Disputed {
      continue;
    }
    if !include_uncorroborated && fact.status != FactStatus::Trusted {
      continue;
    }
    if !needle.is_empty() && !fact.content.to_lowercase().contains(&needle) {
      continue;
    }
    results.push(WireFact::from(&fact));
  }
  Ok(results)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ledger, test_support::{new_fact, test_db}};

  #[tokio::test]
  async fn filters_follow_status_flags() {
    let db = test_db().await;
    let plain = new_fact("Glass beads were found at the Saqqara site.", "https://a.example/1");
    ledger::insert_candidate_fact(&db, &plain).await.unwrap();

    let trusted = new_fact("The Saqqara dig uncovered a sealed chamber.", "https://b.example/2");
    ledger::insert_candidate_fact(&db, &trusted).await.unwrap();
    ledger::corroborate(&db, &trusted.fact_id, "https://c.example/x", 2)
      .await
      .unwrap();

    let by_default = search_ledger(&db, "saqqara", false, false).await.unwrap();
    assert_eq!(by_default.len(), 1);
    assert_eq!(by_default[0].fact_id, trusted.fact_id);

    let with_uncorroborated = search_ledger(&db, "saqqara", true, false).await.unwrap();
    assert_eq!(with_uncorroborated.len(), 2);

    let misses = search_ledger(&db, "giza", true, false).await.unwrap();
    assert!(misses.is_empty());

    // Empty term matches everything in scope.
    let all = search_ledger(&db, "", true, false).await.unwrap();
    assert_eq!(all.len(), 2);
  }
}
