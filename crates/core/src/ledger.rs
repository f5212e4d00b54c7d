//! Storage operations over the fact ledger, the relationship graph, and the
//! lexical mesh tables. All multi-statement writers are expected to hold the
//! node's write mutex; readers run against snapshots.

use std::collections::HashSet;

use axiom_entities::{fact_relationships, facts, lexicon, synapses};
use axiom_shared::{AxiomError, source_domain};
use sea_orm::{
  ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, IntoActiveModel,
  Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
  sea_query::{Expr, OnConflict},
};

use crate::{
  Fact, FactStatus, FragmentState, compress,
  fact::{parse_sources, utc_now_iso},
  is_zlib,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
  Created,
  /// The primary key already existed. Not an error — this is the signal to
  /// corroborate instead.
  Duplicate,
}

pub async fn insert_candidate_fact(
  db: &DatabaseConnection,
  fact: &Fact,
) -> Result<InsertOutcome, AxiomError> {
  let inserted = facts::Entity::insert(fact.to_model().into_active_model())
    .on_conflict(
      OnConflict::column(facts::Column::FactId)
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
  Ok(if inserted == 0 {
    InsertOutcome::Duplicate
  } else {
    InsertOutcome::Created
  })
}

/// Record an additional source for `fact_id`. Trust is the count of distinct
/// base domains across origin and corroborators; a repeat domain is a no-op.
/// Disputed facts never regain standing.
pub async fn corroborate(
  db: &DatabaseConnection,
  fact_id: &str,
  new_source_url: &str,
  required_domains: u32,
) -> Result<(), AxiomError> {
  let Some(model) = facts::Entity::find_by_id(fact_id).one(db).await? else {
    return Ok(());
  };
  if model.status == FactStatus::Disputed.to_string() {
    return Ok(());
  }

  let mut sources = model
    .corroborating_sources
    .as_deref()
    .map(parse_sources)
    .unwrap_or_default();
  let mut domains: HashSet<String> = HashSet::new();
  domains.insert(source_domain(&model.source_url));
  for url in &sources {
    domains.insert(source_domain(url));
  }

  if !domains.insert(source_domain(new_source_url)) {
    return Ok(());
  }
  sources.push(new_source_url.to_owned());

  let trust = i32::try_from(domains.len()).unwrap_or(i32::MAX);
  let status = if trust >= required_domains as i32 {
    FactStatus::Trusted
  } else {
    FactStatus::Uncorroborated
  };

  let mut active = model.into_active_model();
  active.trust_score = Set(trust);
  active.status = Set(status.to_string());
  active.corroborating_sources = Set(Some(
    serde_json::to_string(&sources).expect("source list serializes"),
  ));
  facts::Entity::update(active).exec(db).await?;
  Ok(())
}

/// Mark a contradiction pair. The incoming sentence (if provided) is inserted
/// as a disputed fact; both rows end up pointing at each other through
/// `contradicts_fact_id`.
pub async fn mark_disputed(
  db: &DatabaseConnection,
  existing_id: &str,
  new_id: &str,
  new_content: Option<&str>,
  new_source_url: Option<&str>,
) -> Result<(), AxiomError> {
  if let (Some(content), Some(source_url)) = (new_content, new_source_url) {
    let inserted = facts::Entity::insert(
      facts::Model {
        fact_id: new_id.to_owned(),
        fact_content: compress(content),
        source_url: source_url.to_owned(),
        ingest_timestamp_utc: utc_now_iso(),
        trust_score: 1,
        status: FactStatus::Disputed.to_string(),
        corroborating_sources: None,
        contradicts_fact_id: Some(existing_id.to_owned()),
        lexically_processed: false,
        adl_summary: String::new(),
        fragment_state: FragmentState::Unknown.to_string(),
        fragment_score: 0.0,
        fragment_reason: None,
      }
      .into_active_model(),
    )
    .on_conflict(
      OnConflict::column(facts::Column::FactId)
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    if inserted == 0 {
      set_disputed(db, new_id, existing_id).await?;
    }
  } else {
    set_disputed(db, new_id, existing_id).await?;
  }

  set_disputed(db, existing_id, new_id).await
}

async fn set_disputed(
  db: &DatabaseConnection,
  fact_id: &str,
  contradicts: &str,
) -> Result<(), AxiomError> {
  facts::Entity::update_many()
    .col_expr(
      facts::Column::Status,
      Expr::value(FactStatus::Disputed.to_string()),
    )
    .col_expr(
      facts::Column::ContradictsFactId,
      Expr::value(contradicts.to_owned()),
    )
    .filter(facts::Column::FactId.eq(fact_id))
    .exec(db)
    .await?;
  Ok(())
}

pub async fn get_fact(
  db: &DatabaseConnection,
  fact_id: &str,
) -> Result<Option<facts::Model>, AxiomError> {
  Ok(facts::Entity::find_by_id(fact_id).one(db).await?)
}

pub async fn get_facts_by_ids(
  db: &DatabaseConnection,
  fact_ids: &[String],
) -> Result<Vec<facts::Model>, AxiomError> {
  if fact_ids.is_empty() {
    return Ok(Vec::new());
  }
  Ok(
    facts::Entity::find()
      .filter(facts::Column::FactId.is_in(fact_ids.iter().cloned()))
      .all(db)
      .await?,
  )
}

pub async fn get_facts_for_analysis(
  db: &DatabaseConnection,
) -> Result<Vec<facts::Model>, AxiomError> {
  Ok(facts::Entity::find().all(db).await?)
}

pub async fn get_all_fact_ids(db: &DatabaseConnection) -> Result<Vec<String>, AxiomError> {
  Ok(
    facts::Entity::find()
      .select_only()
      .column(facts::Column::FactId)
      .into_tuple()
      .all(db)
      .await?,
  )
}

pub async fn count_facts(db: &DatabaseConnection) -> Result<u64, AxiomError> {
  Ok(facts::Entity::find().count(db).await?)
}

/// Facts the mesh has not absorbed yet. Disputed facts never feed the mesh.
pub async fn get_unprocessed_for_mesh(
  db: &DatabaseConnection,
) -> Result<Vec<facts::Model>, AxiomError> {
  Ok(
    facts::Entity::find()
      .filter(facts::Column::LexicallyProcessed.eq(false))
      .filter(facts::Column::Status.ne(FactStatus::Disputed.to_string()))
      .all(db)
      .await?,
  )
}

pub async fn mark_processed(db: &DatabaseConnection, fact_id: &str) -> Result<(), AxiomError> {
  facts::Entity::update_many()
    .col_expr(facts::Column::LexicallyProcessed, Expr::value(true))
    .filter(facts::Column::FactId.eq(fact_id))
    .exec(db)
    .await?;
  Ok(())
}

/// Undirected relationship edge; the pair is stored ordered and duplicate
/// pairs are ignored.
pub async fn insert_relationship(
  db: &DatabaseConnection,
  fact_id_a: &str,
  fact_id_b: &str,
  weight: i32,
) -> Result<(), AxiomError> {
  let (first, second) = if fact_id_a < fact_id_b {
    (fact_id_a, fact_id_b)
  } else {
    (fact_id_b, fact_id_a)
  };
  fact_relationships::Entity::insert(fact_relationships::ActiveModel {
    fact_id_1: Set(first.to_owned()),
    fact_id_2: Set(second.to_owned()),
    weight: Set(weight),
    ..Default::default()
  })
  .on_conflict(
    OnConflict::columns([
      fact_relationships::Column::FactId1,
      fact_relationships::Column::FactId2,
    ])
    .do_nothing()
    .to_owned(),
  )
  .exec_without_returning(db)
  .await?;
  Ok(())
}

pub async fn update_atom(
  db: &DatabaseConnection,
  word: &str,
  pos_tag: &str,
) -> Result<(), AxiomError> {
  lexicon::Entity::insert(lexicon::ActiveModel {
    word: Set(word.to_lowercase()),
    pos_tag: Set(pos_tag.to_owned()),
    occurrence_count: Set(1),
  })
  .on_conflict(
    OnConflict::columns([lexicon::Column::Word, lexicon::Column::PosTag])
      .value(
        lexicon::Column::OccurrenceCount,
        Expr::col(lexicon::Column::OccurrenceCount).add(1),
      )
      .to_owned(),
  )
  .exec_without_returning(db)
  .await?;
  Ok(())
}

pub async fn update_synapse(
  db: &DatabaseConnection,
  word_a: &str,
  word_b: &str,
  relation_type: &str,
) -> Result<(), AxiomError> {
  let (a, b) = (word_a.to_lowercase(), word_b.to_lowercase());
  let (first, second) = if a <= b { (a, b) } else { (b, a) };
  synapses::Entity::insert(synapses::ActiveModel {
    word_a: Set(first),
    word_b: Set(second),
    relation_type: Set(relation_type.to_owned()),
    strength: Set(1),
  })
  .on_conflict(
    OnConflict::columns([
      synapses::Column::WordA,
      synapses::Column::WordB,
      synapses::Column::RelationType,
    ])
    .value(
      synapses::Column::Strength,
      Expr::col(synapses::Column::Strength).add(1),
    )
    .to_owned(),
  )
  .exec_without_returning(db)
  .await?;
  Ok(())
}

/// Ingest a fact received from a peer. Content arrives decompressed and
/// already hash-verified; it enters at trust 1, uncorroborated, regardless of
/// the trust the peer reported. Collisions are silently skipped.
pub async fn insert_peer_fact(
  db: &DatabaseConnection,
  wire: &crate::WireFact,
) -> Result<bool, AxiomError> {
  let inserted = facts::Entity::insert(
    facts::Model {
      fact_id: wire.fact_id.clone(),
      fact_content: compress(&wire.fact_content),
      source_url: wire.source_url.clone(),
      ingest_timestamp_utc: wire.ingest_timestamp_utc.clone(),
      trust_score: 1,
      status: FactStatus::Uncorroborated.to_string(),
      corroborating_sources: None,
      contradicts_fact_id: None,
      lexically_processed: false,
      adl_summary: String::new(),
      fragment_state: FragmentState::Unknown.to_string(),
      fragment_score: 0.0,
      fragment_reason: None,
    }
    .into_active_model(),
  )
  .on_conflict(
    OnConflict::column(facts::Column::FactId)
      .do_nothing()
      .to_owned(),
  )
  .exec_without_returning(db)
  .await?;
  Ok(inserted > 0)
}

/// Random sample of non-disputed facts, for idle relinking and audits.
pub async fn sample_non_disputed(
  db: &DatabaseConnection,
  limit: u64,
) -> Result<Vec<facts::Model>, AxiomError> {
  Ok(
    facts::Entity::find()
      .filter(facts::Column::Status.ne(FactStatus::Disputed.to_string()))
      .order_by(Expr::cust("RANDOM()"), Order::Asc)
      .limit(limit)
      .all(db)
      .await?,
  )
}

/// Random sample of corroborated or trusted facts, for synapse reinforcement.
pub async fn sample_high_trust(
  db: &DatabaseConnection,
  limit: u64,
) -> Result<Vec<facts::Model>, AxiomError> {
  Ok(
    facts::Entity::find()
      .filter(facts::Column::Status.ne(FactStatus::Disputed.to_string()))
      .filter(
        facts::Column::TrustScore
          .gte(2)
          .or(facts::Column::Status.eq(FactStatus::Trusted.to_string())),
      )
      .order_by(Expr::cust("RANDOM()"), Order::Asc)
      .limit(limit)
      .all(db)
      .await?,
  )
}

pub async fn update_fragment(
  db: &DatabaseConnection,
  fact_id: &str,
  state: FragmentState,
  score: f64,
  reason: Option<&str>,
) -> Result<(), AxiomError> {
  facts::Entity::update_many()
    .col_expr(facts::Column::FragmentState, Expr::value(state.to_string()))
    .col_expr(facts::Column::FragmentScore, Expr::value(score))
    .col_expr(
      facts::Column::FragmentReason,
      Expr::value(reason.map(str::to_owned)),
    )
    .filter(facts::Column::FactId.eq(fact_id))
    .exec(db)
    .await?;
  Ok(())
}

/// Housekeeping: drop uncorroborated facts older than the cutoff that never
/// attracted a second source.
pub async fn prune_uncorroborated_before(
  db: &DatabaseConnection,
  cutoff_iso: &str,
) -> Result<u64, AxiomError> {
  let result = facts::Entity::delete_many()
    .filter(facts::Column::IngestTimestampUtc.lt(cutoff_iso))
    .filter(facts::Column::Status.eq(FactStatus::Uncorroborated.to_string()))
    .filter(
      facts::Column::CorroboratingSources
        .is_null()
        .or(facts::Column::CorroboratingSources.eq(""))
        .or(facts::Column::CorroboratingSources.eq("[]")),
    )
    .exec(db)
    .await?;
  Ok(result.rows_affected)
}

/// Metacognitive prune: stale, low-trust facts whose ADL fingerprint is too
/// shallow to be structurally useful.
pub async fn prune_stale_shallow(
  db: &DatabaseConnection,
  cutoff_iso: &str,
  max_trust: i32,
  min_adl_len: u32,
) -> Result<u64, AxiomError> {
  let result = facts::Entity::delete_many()
    .filter(facts::Column::IngestTimestampUtc.lt(cutoff_iso))
    .filter(facts::Column::TrustScore.lte(max_trust))
    .filter(Expr::cust_with_values(
      "LENGTH(adl_summary) < ?",
      [min_adl_len],
    ))
    .exec(db)
    .await?;
  Ok(result.rows_affected)
}

/// Startup self-healing: rewrite any legacy plaintext `fact_content` row into
/// the compressed form every other code path expects.
pub async fn migrate_legacy_plaintext(db: &DatabaseConnection) -> Result<u64, AxiomError> {
  let rows = facts::Entity::find().all(db).await?;
  let mut migrated = 0;
  for model in rows {
    if is_zlib(&model.fact_content) {
      continue;
    }
    let text = String::from_utf8_lossy(&model.fact_content).into_owned();
    if text.is_empty() {
      continue;
    }
    let mut active = model.into_active_model();
    active.fact_content = Set(compress(&text));
    facts::Entity::update(active).exec(db).await?;
    migrated += 1;
  }
  Ok(migrated)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{new_fact, test_db};

  #[tokio::test]
  async fn duplicate_insert_yields_exactly_one_row() {
    let db = test_db().await;
    let fact = new_fact("Company X acquired Company Y in 2023.", "https://a.example/story");
    assert_eq!(
      insert_candidate_fact(&db, &fact).await.unwrap(),
      InsertOutcome::Created
    );
    assert_eq!(
      insert_candidate_fact(&db, &fact).await.unwrap(),
      InsertOutcome::Duplicate
    );
    assert_eq!(count_facts(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn corroboration_across_three_domains_reaches_trusted() {
    let db = test_db().await;
    let fact = new_fact("Company X acquired Company Y in 2023.", "https://a.example/story");
    insert_candidate_fact(&db, &fact).await.unwrap();

    corroborate(&db, &fact.fact_id, "https://b.example/other", 3)
      .await
      .unwrap();
    corroborate(&db, &fact.fact_id, "https://c.example/third", 3)
      .await
      .unwrap();

    let stored = Fact::from_model(get_fact(&db, &fact.fact_id).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.trust_score, 3);
    assert_eq!(stored.status, FactStatus::Trusted);
    assert_eq!(stored.corroborating_sources.len(), 2);
  }

  #[tokio::test]
  async fn same_domain_source_does_not_corroborate() {
    let db = test_db().await;
    let fact = new_fact("Company X acquired Company Y in 2023.", "https://a.example/story");
    insert_candidate_fact(&db, &fact).await.unwrap();

    corroborate(&db, &fact.fact_id, "https://news.a.example/mirror", 3)
      .await
      .unwrap();

    let stored = Fact::from_model(get_fact(&db, &fact.fact_id).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.trust_score, 1);
    assert_eq!(stored.status, FactStatus::Uncorroborated);
    assert!(stored.corroborating_sources.is_empty());
  }

  #[tokio::test]
  async fn trust_is_monotonic_across_repeat_corroborations() {
    let db = test_db().await;
    let fact = new_fact("Company X acquired Company Y in 2023.", "https://a.example/story");
    insert_candidate_fact(&db, &fact).await.unwrap();

    corroborate(&db, &fact.fact_id, "https://b.example/one", 100)
      .await
      .unwrap();
    corroborate(&db, &fact.fact_id, "https://b.example/two", 100)
      .await
      .unwrap();

    let stored = Fact::from_model(get_fact(&db, &fact.fact_id).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.trust_score, 2);
    assert_eq!(stored.corroborating_sources.len(), 1);
  }

  #[tokio::test]
  async fn contradiction_marks_both_parties_disputed() {
    let db = test_db().await;
    let existing = new_fact(
      "The treaty entered into force on 2024-06-01.",
      "https://a.example/story",
    );
    insert_candidate_fact(&db, &existing).await.unwrap();

    let new_content = "The treaty did not enter into force on 2024-06-01.";
    let new_id = crate::fact_id(new_content);
    mark_disputed(
      &db,
      &existing.fact_id,
      &new_id,
      Some(new_content),
      Some("https://b.example/denial"),
    )
    .await
    .unwrap();

    let a = Fact::from_model(get_fact(&db, &existing.fact_id).await.unwrap().unwrap()).unwrap();
    let b = Fact::from_model(get_fact(&db, &new_id).await.unwrap().unwrap()).unwrap();
    assert_eq!(a.status, FactStatus::Disputed);
    assert_eq!(b.status, FactStatus::Disputed);
    assert_eq!(a.contradicts_fact_id.as_deref(), Some(new_id.as_str()));
    assert_eq!(
      b.contradicts_fact_id.as_deref(),
      Some(existing.fact_id.as_str())
    );
    // Disputed rows stay dark to corroboration.
    corroborate(&db, &a.fact_id, "https://c.example/late", 2)
      .await
      .unwrap();
    let still = Fact::from_model(get_fact(&db, &a.fact_id).await.unwrap().unwrap()).unwrap();
    assert_eq!(still.status, FactStatus::Disputed);
  }

  #[tokio::test]
  async fn relationship_pair_is_ordered_and_unique() {
    let db = test_db().await;
    insert_relationship(&db, "bbb", "aaa", 3).await.unwrap();
    insert_relationship(&db, "aaa", "bbb", 5).await.unwrap();

    let rows = fact_relationships::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fact_id_1, "aaa");
    assert_eq!(rows[0].fact_id_2, "bbb");
    assert_eq!(rows[0].weight, 3);
  }

  #[tokio::test]
  async fn atom_and_synapse_upserts_increment() {
    let db = test_db().await;
    update_atom(&db, "Treaty", "NOUN").await.unwrap();
    update_atom(&db, "treaty", "NOUN").await.unwrap();
    update_synapse(&db, "force", "entered", "dobj").await.unwrap();
    update_synapse(&db, "entered", "force", "dobj").await.unwrap();

    let atom = lexicon::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(atom.word, "treaty");
    assert_eq!(atom.occurrence_count, 2);

    let synapse = synapses::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!((synapse.word_a.as_str(), synapse.word_b.as_str()), ("entered", "force"));
    assert_eq!(synapse.strength, 2);
  }

  #[tokio::test]
  async fn legacy_plaintext_rows_are_recompressed() {
    let db = test_db().await;
    let fact = new_fact("A legacy row stored as plaintext.", "https://a.example/x");
    let mut model = fact.to_model();
    model.fact_content = fact.content.clone().into_bytes();
    facts::Entity::insert(model.into_active_model())
      .exec_without_returning(&db)
      .await
      .unwrap();

    assert_eq!(migrate_legacy_plaintext(&db).await.unwrap(), 1);
    let stored = get_fact(&db, &fact.fact_id).await.unwrap().unwrap();
    assert!(is_zlib(&stored.fact_content));
    assert_eq!(crate::decompress(&stored.fact_content).unwrap(), fact.content);
    // Second pass is a no-op.
    assert_eq!(migrate_legacy_plaintext(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn stale_uncorroborated_rows_are_pruned() {
    let db = test_db().await;
    let mut old = new_fact("An old unloved fact about nothing much.", "https://a.example/old");
    old.ingest_timestamp_utc = "2020-01-01T00:00:00.000000+00:00".to_owned();
    insert_candidate_fact(&db, &old).await.unwrap();
    let fresh = new_fact("A brand new fact from this cycle.", "https://a.example/new");
    insert_candidate_fact(&db, &fresh).await.unwrap();

    let deleted = prune_uncorroborated_before(&db, "2025-01-01T00:00:00.000000+00:00")
      .await
      .unwrap();
    assert_eq!(deleted, 1);
    assert!(get_fact(&db, &fresh.fact_id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn shallow_stale_rows_are_pruned_but_deep_ones_kept() {
    let db = test_db().await;
    let mut shallow = new_fact("Short one.", "https://a.example/s");
    shallow.ingest_timestamp_utc = "2020-01-01T00:00:00.000000+00:00".to_owned();
    shallow.adl_summary = "x|y|".to_owned();
    insert_candidate_fact(&db, &shallow).await.unwrap();

    let mut deep = new_fact("A structurally rich old sentence.", "https://a.example/d");
    deep.ingest_timestamp_utc = "2020-01-01T00:00:00.000000+00:00".to_owned();
    deep.adl_summary = "treaty|enter|GPE_ORG".to_owned();
    insert_candidate_fact(&db, &deep).await.unwrap();

    let deleted = prune_stale_shallow(&db, "2025-01-01T00:00:00.000000+00:00", 1, 10)
      .await
      .unwrap();
    assert_eq!(deleted, 1);
    assert!(get_fact(&db, &deep.fact_id).await.unwrap().is_some());
    assert!(get_fact(&db, &shallow.fact_id).await.unwrap().is_none());
  }
}
