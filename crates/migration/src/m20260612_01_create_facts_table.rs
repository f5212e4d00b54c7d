use sea_orm_migration::{
  prelude::*,
  schema::{binary, boolean, double, integer, text, text_null},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Facts::Table)
          .if_not_exists()
          .col(text(Facts::FactId).primary_key())
          .col(binary(Facts::FactContent))
          .col(text(Facts::SourceUrl))
          .col(text(Facts::IngestTimestampUtc))
          .col(integer(Facts::TrustScore).default(1))
          .col(text(Facts::Status).default("uncorroborated"))
          .col(text_null(Facts::CorroboratingSources))
          .col(text_null(Facts::ContradictsFactId))
          .col(boolean(Facts::LexicallyProcessed).default(false))
          .col(text(Facts::AdlSummary).default(""))
          .col(text(Facts::FragmentState).default("unknown"))
          .col(double(Facts::FragmentScore).default(0.0))
          .col(text_null(Facts::FragmentReason))
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_facts_processed")
          .table(Facts::Table)
          .col(Facts::LexicallyProcessed)
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_facts_fragment_state")
          .table(Facts::Table)
          .col(Facts::FragmentState)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(Facts::Table).to_owned())
      .await
  }
}

#[derive(Iden)]
pub enum Facts {
  Table,
  // hex sha256 of the decompressed content
  FactId,
  // zlib-compressed canonical UTF-8 sentence
  FactContent,
  SourceUrl,
  // ISO-8601 UTC
  IngestTimestampUtc,
  // 1 + distinct corroborating domains
  TrustScore,
  // uncorroborated | trusted | disputed
  Status,
  // JSON array of additional source URLs
  CorroboratingSources,
  ContradictsFactId,
  LexicallyProcessed,
  // subject|root_verb|SORTED_ENTITY_LABELS
  AdlSummary,
  // unknown | suspected_fragment | confirmed_fragment | rejected_fragment
  FragmentState,
  FragmentScore,
  FragmentReason,
}
