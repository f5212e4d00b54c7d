use sea_orm_migration::{
  prelude::*,
  schema::{integer, pk_auto, text},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(FactRelationships::Table)
          .if_not_exists()
          .col(pk_auto(FactRelationships::Id))
          .col(text(FactRelationships::FactId1))
          .col(text(FactRelationships::FactId2))
          .col(integer(FactRelationships::Weight))
          .to_owned(),
      )
      .await?;

    // The undirected pair is stored ordered, so one unique index covers it.
    manager
      .create_index(
        Index::create()
          .name("idx_fact_relationships_pair")
          .table(FactRelationships::Table)
          .col(FactRelationships::FactId1)
          .col(FactRelationships::FactId2)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(FactRelationships::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum FactRelationships {
  Table,
  Id,
  // lexicographically smaller fact id
  #[iden = "fact_id_1"]
  FactId1,
  #[iden = "fact_id_2"]
  FactId2,
  // summed shared-entity relevance
  Weight,
}
