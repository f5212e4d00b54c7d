pub use sea_orm_migration::*;

mod m20260612_01_create_facts_table;
mod m20260612_02_create_fact_relationships_table;
mod m20260612_03_create_lexicon_table;
mod m20260612_04_create_synapses_table;
mod m20260612_05_create_blocks_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260612_01_create_facts_table::Migration),
      Box::new(m20260612_02_create_fact_relationships_table::Migration),
      Box::new(m20260612_03_create_lexicon_table::Migration),
      Box::new(m20260612_04_create_synapses_table::Migration),
      Box::new(m20260612_05_create_blocks_table::Migration),
    ]
  }
}
