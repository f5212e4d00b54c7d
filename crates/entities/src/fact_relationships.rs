use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Undirected edge between two facts. `fact_id_1 < fact_id_2`
/// lexicographically, unique under that ordering.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fact_relationships")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub fact_id_1: String,
  pub fact_id_2: String,
  pub weight: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
