use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lexical atom keyed on `(word, pos_tag)`, counting occurrences across every
/// fact the mesh has absorbed.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lexicon")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub word: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub pos_tag: String,
  pub occurrence_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
