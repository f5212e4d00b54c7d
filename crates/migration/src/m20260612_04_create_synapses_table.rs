use sea_orm_migration::{
  prelude::*,
  schema::{integer, text},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Synapses::Table)
          .if_not_exists()
          .col(text(Synapses::WordA))
          .col(text(Synapses::WordB))
          .col(text(Synapses::RelationType))
          .col(integer(Synapses::Strength).default(1))
          .primary_key(
            Index::create()
              .col(Synapses::WordA)
              .col(Synapses::WordB)
              .col(Synapses::RelationType),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_synapse_a")
          .table(Synapses::Table)
          .col(Synapses::WordA)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_synapse_b")
          .table(Synapses::Table)
          .col(Synapses::WordB)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Synapses::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Synapses {
  Table,
  // lexicographically smaller word
  WordA,
  WordB,
  // dependency label, shared_context, or conceptual_bridge
  RelationType,
  Strength,
}
