use axiom_migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use crate::{Fact, FactStatus, FragmentMeta, fact_id, utc_now_iso};

pub async fn test_db() -> DatabaseConnection {
  let db = Database::connect("sqlite::memory:")
    .await
    .expect("in-memory sqlite");
  Migrator::up(&db, None).await.expect("schema migrates");
  db
}

pub fn new_fact(content: &str, source_url: &str) -> Fact {
  Fact {
    fact_id: fact_id(content),
    content: content.to_owned(),
    source_url: source_url.to_owned(),
    ingest_timestamp_utc: utc_now_iso(),
    trust_score: 1,
    status: FactStatus::Uncorroborated,
    corroborating_sources: Vec::new(),
    contradicts_fact_id: None,
    lexically_processed: false,
    adl_summary: String::new(),
    fragment: FragmentMeta::default(),
  }
}
