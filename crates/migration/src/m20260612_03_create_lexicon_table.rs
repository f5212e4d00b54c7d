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
          .table(Lexicon::Table)
          .if_not_exists()
          .col(text(Lexicon::Word))
          .col(text(Lexicon::PosTag))
          .col(integer(Lexicon::OccurrenceCount).default(1))
          .primary_key(Index::create().col(Lexicon::Word).col(Lexicon::PosTag))
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_lexicon_word")
          .table(Lexicon::Table)
          .col(Lexicon::Word)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Lexicon::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Lexicon {
  Table,
  // lowercased token text
  Word,
  PosTag,
  OccurrenceCount,
}
