use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Typed, weighted edge between two words. `word_a <= word_b`; relation types
/// are dependency labels plus `shared_context` and `conceptual_bridge`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "synapses")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub word_a: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub word_b: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub relation_type: String,
  pub strength: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
