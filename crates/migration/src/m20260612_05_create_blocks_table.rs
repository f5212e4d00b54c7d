use sea_orm_migration::{
  prelude::*,
  schema::{big_integer, text},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Blocks::Table)
          .if_not_exists()
          .col(text(Blocks::BlockId).primary_key())
          .col(text(Blocks::PreviousBlockId))
          .col(big_integer(Blocks::Height))
          .col(text(Blocks::CreatedAtUtc))
          .col(text(Blocks::FactIds))
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_blocks_height")
          .table(Blocks::Table)
          .col(Blocks::Height)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Blocks::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Blocks {
  Table,
  BlockId,
  PreviousBlockId,
  Height,
  CreatedAtUtc,
  // JSON array of hex fact ids
  FactIds,
}
