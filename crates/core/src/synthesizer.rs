//! Knowledge-graph linking: shared weighted entities between facts become
//! relationship edges, and strongly shared entities reinforce
//! `conceptual_bridge` synapses.

use std::collections::HashMap;

use axiom_nlp::NlpEngine;
use axiom_shared::AxiomError;
use sea_orm::DatabaseConnection;

use crate::{Fact, IGNORED_ENTITIES, decompress, ledger};

const LINK_THRESHOLD: f64 = 2.0;

fn entity_weight(label: &str) -> Option<i32> {
  match label {
    "PERSON" | "ORG" | "EVENT" | "WORK_OF_ART" => Some(3),
    "GPE" | "PRODUCT" | "LAW" => Some(1),
    _ => None,
  }
}

/// Extract entities with a relevance weight: people and organizations carry
/// more signal than places. Calendar words, stopword-ish entities, and bare
/// numerals are ignored.
pub async fn weighted_entities(
  nlp: &dyn NlpEngine,
  text: &str,
) -> Result<HashMap<String, i32>, AxiomError> {
  let mut entities: HashMap<String, i32> = HashMap::new();
  for sentence in nlp.parse(text).await? {
    for entity in &sentence.entities {
      let clean = entity.text.to_lowercase().trim().to_owned();
      if clean.len() < 3
        || IGNORED_ENTITIES.contains(&clean.as_str())
        || clean.chars().all(|c| c.is_ascii_digit())
      {
        continue;
      }
      let Some(weight) = entity_weight(&entity.label) else {
        continue;
      };
      entities
        .entry(clean)
        .and_modify(|w| *w = (*w).max(weight))
        .or_insert(weight);
    }
  }
  Ok(entities)
}

/// Compare a batch of new facts against the whole ledger and persist
/// relationship edges where entity overlap is strong enough. Returns the
/// number of links created.
pub async fn link_related_facts(
  nlp: &dyn NlpEngine,
  db: &DatabaseConnection,
  new_facts: &[Fact],
) -> Result<u64, AxiomError> {
  if new_facts.is_empty() {
    return Ok(0);
  }

  let mut new_entities = Vec::new();
  for fact in new_facts {
    let entities = weighted_entities(nlp, &fact.content).await?;
    if !entities.is_empty() {
      new_entities.push((fact.fact_id.clone(), entities));
    }
  }
  if new_entities.is_empty() {
    tracing::debug!("no distinctive entities in new facts, skipping linking");
    return Ok(0);
  }

  let all_facts = ledger::get_facts_for_analysis(db).await?;
  tracing::debug!(existing = all_facts.len(), "cross-referencing ledger");

  let mut links_created = 0;
  for existing in &all_facts {
    let Ok(content) = decompress(&existing.fact_content) else {
      continue;
    };
    let existing_entities = weighted_entities(nlp, &content).await?;
    if existing_entities.is_empty() {
      continue;
    }

    for (new_id, entities) in &new_entities {
      if new_id == &existing.fact_id {
        continue;
      }
      let mut total = 0.0;
      let mut shared = Vec::new();
      for (entity, weight) in entities {
        if let Some(existing_weight) = existing_entities.get(entity) {
          total += f64::from(weight + existing_weight) / 2.0;
          shared.push(entity.as_str());
        }
      }
      if total >= LINK_THRESHOLD {
        ledger::insert_relationship(db, new_id, &existing.fact_id, total as i32).await?;
        links_created += 1;
        if shared.len() > 1 {
          for (i, a) in shared.iter().enumerate() {
            for b in &shared[i + 1..] {
              ledger::update_synapse(db, a, b, "conceptual_bridge").await?;
            }
          }
        }
      }
    }
  }

  if links_created > 0 {
    tracing::info!(links_created, "graph connections created");
  }
  Ok(links_created)
}
