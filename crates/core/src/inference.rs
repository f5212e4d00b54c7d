//! The inference pathway behind `/think`: shred the query into grounding
//! atoms, scan the non-disputed ledger, and rank hits by trust.

use axiom_nlp::NlpEngine;
use axiom_shared::AxiomError;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use axiom_entities::facts;

use crate::{Fact, FactStatus, WireFact};

#[derive(Debug, Clone)]
pub struct ThinkResult {
  pub response: String,
  /// Full ranked hit list; callers may page past the best match.
  pub hits: Vec<WireFact>,
}

/// Answer a free-text query from the distilled ledger. Disputed facts are
/// excluded; hits are ranked by trust score, stable.
pub async fn think(
  nlp: &dyn NlpEngine,
  db: &DatabaseConnection,
  query: &str,
) -> Result<ThinkResult, AxiomError> {
  let mut atoms = Vec::new();
  for sentence in nlp.parse(query).await? {
    for token in &sentence.tokens {
      if token.pos == "NOUN" || token.pos == "PROPN" {
        let lemma = token.lemma.to_lowercase();
        if !lemma.is_empty() && !atoms.contains(&lemma) {
          atoms.push(lemma);
        }
      }
    }
  }

  if atoms.is_empty() {
    return Ok(ThinkResult {
      response: "Query contains no grounding atoms. Please specify a subject.".to_owned(),
      hits: Vec::new(),
    });
  }

  let rows = facts::Entity::find()
    .filter(facts::Column::Status.ne(FactStatus::Disputed.to_string()))
    .all(db)
    .await?;

  let mut hits = Vec::new();
  for model in rows {
    let Ok(fact) = Fact::from_model(model) else {
      continue;
    };
    let content_lower = fact.content.to_lowercase();
    if atoms.iter().any(|atom| content_lower.contains(atom)) {
      hits.push(WireFact::from(&fact));
    }
  }
  hits.sort_by_key(|hit| std::cmp::Reverse(hit.trust_score));

  if hits.is_empty() {
    return Ok(ThinkResult {
      response: format!(
        "Neural path for '{}' is currently vacant. No verified facts found.",
        atoms.join(" + ")
      ),
      hits,
    });
  }

  let mut response = format!("Verified Record Found: \"{}\"", hits[0].fact_content);
  if hits.len() > 1 {
    response.push_str(&format!(
      "\n\nAdditionally, {} other corroborated streams support this trajectory.",
      hits.len() - 1
    ));
  }
  Ok(ThinkResult { response, hits })
}
