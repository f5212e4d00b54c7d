//! The lexical mesh: per-word atoms and typed word-pair synapses, grown by
//! shredding verified facts during reflection.

use axiom_entities::{lexicon, synapses};
use axiom_nlp::NlpEngine;
use axiom_shared::AxiomError;
use sea_orm::{
  ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;

use crate::{decompress, ledger};

/// Deconstruct one fact into lexical atoms and synapses: every token becomes
/// an atom, every dependency arc a typed synapse, every entity pair a
/// `shared_context` synapse.
pub async fn integrate_fact_to_mesh(
  nlp: &dyn NlpEngine,
  db: &DatabaseConnection,
  content: &str,
) -> Result<(), AxiomError> {
  for sentence in nlp.parse(content).await? {
    for token in &sentence.tokens {
      if token.is_punct_or_space() {
        continue;
      }
      ledger::update_atom(db, &token.text, &token.pos).await?;
      if token.dep != "ROOT" {
        ledger::update_synapse(db, &token.text, &token.head, &token.dep).await?;
      }
    }
    for (i, first) in sentence.entities.iter().enumerate() {
      for second in &sentence.entities[i + 1..] {
        ledger::update_synapse(db, &first.text, &second.text, "shared_context").await?;
      }
    }
  }
  Ok(())
}

/// Reflection pass: absorb every fact the mesh has not processed yet.
/// Returns the number of facts integrated.
pub async fn run_reflection(
  nlp: &dyn NlpEngine,
  db: &DatabaseConnection,
) -> Result<u64, AxiomError> {
  let unprocessed = ledger::get_unprocessed_for_mesh(db).await?;
  if unprocessed.is_empty() {
    tracing::debug!("lexical mesh is up to date");
    return Ok(0);
  }
  tracing::info!(count = unprocessed.len(), "shredding facts into synapses");

  let mut integrated = 0;
  for model in unprocessed {
    let Ok(content) = decompress(&model.fact_content) else {
      continue;
    };
    integrate_fact_to_mesh(nlp, db, &content).await?;
    ledger::mark_processed(db, &model.fact_id).await?;
    integrated += 1;
  }
  Ok(integrated)
}

#[derive(Debug, Serialize)]
pub struct MeshView {
  pub concept: String,
  /// Strongest atom row for the word, if the mesh knows it.
  pub properties: Option<lexicon::Model>,
  /// Top synapses touching the word, strongest first.
  pub associations: Vec<synapses::Model>,
}

pub async fn query_mesh(db: &DatabaseConnection, term: &str) -> Result<MeshView, AxiomError> {
  let word = term.to_lowercase();
  let properties = lexicon::Entity::find()
    .filter(lexicon::Column::Word.eq(word.clone()))
    .order_by_desc(lexicon::Column::OccurrenceCount)
    .one(db)
    .await?;
  let associations = synapses::Entity::find()
    .filter(
      synapses::Column::WordA
        .eq(word.clone())
        .or(synapses::Column::WordB.eq(word.clone())),
    )
    .order_by_desc(synapses::Column::Strength)
    .limit(10)
    .all(db)
    .await?;
  Ok(MeshView {
    concept: term.to_owned(),
    properties,
    associations,
  })
}

#[cfg(test)]
mod tests {
  use axiom_nlp::{SentenceBuilder, StubNlp};

  use super::*;
  use crate::test_support::{new_fact, test_db};

  fn parsed(content: &str) -> axiom_nlp::ParsedSentence {
    SentenceBuilder::new(content)
      .token("Iron", "iron", "NOUN", "nsubj", "melts")
      .token("melts", "melt", "VERB", "ROOT", "melts")
      .token(".", ".", "PUNCT", "punct", "melts")
      .entity("Iron", "PRODUCT")
      .entity("Curie", "PERSON")
      .build()
  }

  #[tokio::test]
  async fn reflection_builds_atoms_and_synapses_and_marks_facts() {
    let db = test_db().await;
    let fact = new_fact("Iron melts.", "https://a.example/iron");
    ledger::insert_candidate_fact(&db, &fact).await.unwrap();
    let nlp = StubNlp::new().script(&fact.content, vec![parsed(&fact.content)]);

    assert_eq!(run_reflection(&nlp, &db).await.unwrap(), 1);
    // Second pass finds nothing unprocessed.
    assert_eq!(run_reflection(&nlp, &db).await.unwrap(), 0);

    let view = query_mesh(&db, "Iron").await.unwrap();
    let atom = view.properties.expect("atom for iron");
    assert_eq!(atom.word, "iron");
    assert_eq!(atom.pos_tag, "NOUN");
    // nsubj arc to the head plus the entity-pair shared context.
    assert!(view.associations.iter().any(|s| s.relation_type == "nsubj"));
    assert!(
      view
        .associations
        .iter()
        .any(|s| s.relation_type == "shared_context")
    );
    // Punctuation never becomes an atom.
    let punct = query_mesh(&db, ".").await.unwrap();
    assert!(punct.properties.is_none());
  }

  #[tokio::test]
  async fn disputed_facts_never_feed_the_mesh() {
    let db = test_db().await;
    let fact = new_fact("Iron melts.", "https://a.example/iron");
    ledger::insert_candidate_fact(&db, &fact).await.unwrap();
    ledger::mark_disputed(&db, &fact.fact_id, "other", None, None)
      .await
      .unwrap();
    let nlp = StubNlp::new().script(&fact.content, vec![parsed(&fact.content)]);

    assert_eq!(run_reflection(&nlp, &db).await.unwrap(), 0);
  }
}
