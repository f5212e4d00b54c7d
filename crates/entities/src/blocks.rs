use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One chain block. `fact_ids` is a JSON array of hex fact ids; `block_id` is
/// the sha256 of the canonical payload (sorted keys, sorted fact ids).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blocks")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub block_id: String,
  pub previous_block_id: String,
  pub height: i64,
  pub created_at_utc: String,
  pub fact_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
