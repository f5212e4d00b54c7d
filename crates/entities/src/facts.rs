use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ledger row. `fact_content` is the zlib-compressed canonical UTF-8
/// sentence; `fact_id` is the sha256 of the decompressed form.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "facts")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub fact_id: String,
  pub fact_content: Vec<u8>,
  pub source_url: String,
  pub ingest_timestamp_utc: String,
  pub trust_score: i32,
  pub status: String,
  /// JSON array of additional corroborating source URLs.
  pub corroborating_sources: Option<String>,
  pub contradicts_fact_id: Option<String>,
  pub lexically_processed: bool,
  pub adl_summary: String,
  pub fragment_state: String,
  pub fragment_score: f64,
  pub fragment_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
