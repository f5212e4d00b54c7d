//! Block-structured ledger: ordered blocks committing sets of fact ids.
//! Integrity via `previous_block_id`; longest chain wins on sync.

use axiom_entities::blocks;
use axiom_shared::AxiomError;
use sea_orm::{
  ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
  IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
  sea_query::OnConflict,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{block_id, fact::utc_now_iso};

pub const GENESIS_BLOCK_ID: &str = "axiom_genesis_v1";
pub const GENESIS_PREVIOUS: &str = "";
/// Fixed literal so every node seeds an identical genesis record.
pub const GENESIS_CREATED_AT: &str = "2024-01-01T00:00:00.000000+00:00";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Block {
  pub block_id: String,
  pub previous_block_id: String,
  pub height: i64,
  pub created_at_utc: String,
  pub fact_ids: Vec<String>,
}

impl Block {
  /// Normalize a block received over JSON so hash validation is
  /// deterministic: trim ids, drop empties. The received order is preserved;
  /// the hash is computed over the sorted ids either way.
  #[must_use]
  pub fn normalized(mut self) -> Self {
    self.block_id = self.block_id.trim().to_owned();
    self.previous_block_id = self.previous_block_id.trim().to_owned();
    self.fact_ids = self
      .fact_ids
      .into_iter()
      .map(|id| id.trim().to_owned())
      .filter(|id| !id.is_empty())
      .collect();
    self
  }

  pub fn from_model(model: blocks::Model) -> Result<Self, AxiomError> {
    Ok(Self {
      fact_ids: serde_json::from_str(&model.fact_ids)
        .map_err(|e| AxiomError::Decode(format!("block fact_ids: {e}")))?,
      block_id: model.block_id,
      previous_block_id: model.previous_block_id,
      height: model.height,
      created_at_utc: model.created_at_utc,
    })
  }

  pub fn to_model(&self) -> blocks::Model {
    blocks::Model {
      block_id: self.block_id.clone(),
      previous_block_id: self.previous_block_id.clone(),
      height: self.height,
      created_at_utc: self.created_at_utc.clone(),
      fact_ids: serde_json::to_string(&self.fact_ids).expect("fact id list serializes"),
    }
  }
}

/// Verify block hash and chain link against the expected predecessor.
pub fn validate_block(
  block: &Block,
  expected_previous: &str,
  expected_height: i64,
) -> Result<(), AxiomError> {
  let computed = block_id(
    &block.previous_block_id,
    block.height,
    &block.created_at_utc,
    &block.fact_ids,
  );
  if computed != block.block_id {
    return Err(AxiomError::Validation(format!(
      "hash mismatch (computed {}..., received {}...)",
      &computed[..16.min(computed.len())],
      &block.block_id[..16.min(block.block_id.len())]
    )));
  }
  if block.previous_block_id != expected_previous || block.height != expected_height {
    return Err(AxiomError::Validation(
      "link mismatch (previous or height)".to_owned(),
    ));
  }
  Ok(())
}

/// Seed the deterministic genesis record if the blocks table is empty.
pub async fn ensure_genesis<C: ConnectionTrait>(db: &C) -> Result<(), AxiomError> {
  if blocks::Entity::find().one(db).await?.is_some() {
    return Ok(());
  }
  blocks::Entity::insert(blocks::ActiveModel {
    block_id: Set(GENESIS_BLOCK_ID.to_owned()),
    previous_block_id: Set(GENESIS_PREVIOUS.to_owned()),
    height: Set(0),
    created_at_utc: Set(GENESIS_CREATED_AT.to_owned()),
    fact_ids: Set("[]".to_owned()),
  })
  .exec_without_returning(db)
  .await?;
  tracing::debug!("genesis block created");
  Ok(())
}

/// `(block_id, height)` of the current chain tip.
pub async fn chain_head<C: ConnectionTrait>(db: &C) -> Result<Option<(String, i64)>, AxiomError> {
  let head = blocks::Entity::find()
    .order_by_desc(blocks::Column::Height)
    .one(db)
    .await?;
  Ok(head.map(|b| (b.block_id, b.height)))
}

/// Create a new block extending the current head, committing `fact_ids`.
/// Returns `None` when a concurrent append won the race on `block_id`.
pub async fn create_block(
  db: &DatabaseConnection,
  fact_ids: Vec<String>,
) -> Result<Option<Block>, AxiomError> {
  ensure_genesis(db).await?;
  let Some((previous_block_id, height)) = chain_head(db).await? else {
    return Ok(None);
  };
  let block = Block {
    height: height + 1,
    created_at_utc: utc_now_iso(),
    block_id: String::new(),
    previous_block_id,
    fact_ids,
  };
  let block = Block {
    block_id: block_id(
      &block.previous_block_id,
      block.height,
      &block.created_at_utc,
      &block.fact_ids,
    ),
    ..block
  };

  let inserted = blocks::Entity::insert(block.to_model().into_active_model())
    .on_conflict(
      OnConflict::column(blocks::Column::BlockId)
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
  if inserted == 0 {
    tracing::warn!("block creation failed (race?)");
    return Ok(None);
  }
  Ok(Some(block))
}

/// Append a peer block. It must extend the current head exactly and its
/// recomputed id must match. Returns false when rejected or duplicate.
pub async fn append_block(db: &DatabaseConnection, block: Block) -> Result<bool, AxiomError> {
  ensure_genesis(db).await?;
  let block = block.normalized();
  let Some((prev_id, prev_height)) = chain_head(db).await? else {
    tracing::warn!("append failed: no local chain head");
    return Ok(false);
  };
  if block.previous_block_id != prev_id || block.height != prev_height + 1 {
    tracing::warn!(
      peer_height = block.height,
      local_height = prev_height,
      "append failed: chain divergence"
    );
    return Ok(false);
  }
  if let Err(err) = validate_block(&block, &prev_id, prev_height + 1) {
    tracing::warn!(%err, "append failed: block validation");
    return Ok(false);
  }

  let inserted = blocks::Entity::insert(block.to_model().into_active_model())
    .on_conflict(
      OnConflict::column(blocks::Column::BlockId)
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
  Ok(inserted > 0)
}

/// Blocks with height strictly greater than `height`, ascending.
pub async fn get_blocks_after(
  db: &DatabaseConnection,
  height: i64,
) -> Result<Vec<Block>, AxiomError> {
  let models = blocks::Entity::find()
    .filter(blocks::Column::Height.gt(height))
    .order_by_asc(blocks::Column::Height)
    .all(db)
    .await?;
  models.into_iter().map(Block::from_model).collect()
}

/// Longest-chain wins: atomically replace every non-genesis block with the
/// peer's blocks (ordered by ascending height, starting at height 1). Each
/// block is link- and hash-validated while walking; any failure rolls the
/// whole transaction back and leaves the local chain untouched.
pub async fn replace_chain(
  db: &DatabaseConnection,
  peer_blocks: &[Block],
) -> Result<bool, AxiomError> {
  if peer_blocks.is_empty() {
    return Ok(false);
  }
  ensure_genesis(db).await?;

  let txn = db.begin().await?;
  blocks::Entity::delete_many()
    .filter(blocks::Column::Height.gt(0))
    .exec(&txn)
    .await?;

  let mut prev_id = GENESIS_BLOCK_ID.to_owned();
  let mut prev_height = 0;
  for wire in peer_blocks {
    let block = wire.clone().normalized();
    if let Err(err) = validate_block(&block, &prev_id, prev_height + 1) {
      tracing::error!(height = block.height, %err, "chain replace aborted");
      txn.rollback().await?;
      return Ok(false);
    }
    blocks::Entity::insert(block.to_model().into_active_model())
      .exec_without_returning(&txn)
      .await?;
    prev_id = block.block_id;
    prev_height = block.height;
  }

  txn.commit().await?;
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::test_db;

  fn forged(previous: &str, height: i64, fact_ids: &[&str]) -> Block {
    let fact_ids: Vec<String> = fact_ids.iter().map(|s| (*s).to_owned()).collect();
    let created_at_utc = format!("2026-06-0{height}T00:00:00.000000+00:00");
    Block {
      block_id: block_id(previous, height, &created_at_utc, &fact_ids),
      previous_block_id: previous.to_owned(),
      height,
      created_at_utc,
      fact_ids,
    }
  }

  #[tokio::test]
  async fn genesis_is_deterministic_across_nodes() {
    let a = test_db().await;
    let b = test_db().await;
    ensure_genesis(&a).await.unwrap();
    ensure_genesis(&b).await.unwrap();
    assert_eq!(chain_head(&a).await.unwrap(), chain_head(&b).await.unwrap());
    assert_eq!(
      chain_head(&a).await.unwrap().unwrap(),
      (GENESIS_BLOCK_ID.to_owned(), 0)
    );
  }

  #[tokio::test]
  async fn create_block_extends_the_head() {
    let db = test_db().await;
    let block = create_block(&db, vec!["f1".to_owned(), "f2".to_owned()])
      .await
      .unwrap()
      .unwrap();
    assert_eq!(block.height, 1);
    assert_eq!(block.previous_block_id, GENESIS_BLOCK_ID);
    assert_eq!(chain_head(&db).await.unwrap().unwrap().1, 1);
    // The inserted id satisfies the hash invariant.
    validate_block(&block, GENESIS_BLOCK_ID, 1).unwrap();
  }

  #[tokio::test]
  async fn append_rejects_bad_link_and_tampered_hash() {
    let db = test_db().await;
    ensure_genesis(&db).await.unwrap();

    let orphan = forged("somewhere_else", 1, &["f1"]);
    assert!(!append_block(&db, orphan).await.unwrap());

    let mut tampered = forged(GENESIS_BLOCK_ID, 1, &["f1"]);
    tampered.fact_ids.push("injected".to_owned());
    assert!(!append_block(&db, tampered).await.unwrap());

    let good = forged(GENESIS_BLOCK_ID, 1, &["f1"]);
    assert!(append_block(&db, good.clone()).await.unwrap());
    // Duplicate append is rejected quietly.
    assert!(!append_block(&db, good).await.unwrap());
  }

  #[tokio::test]
  async fn longest_chain_replacement_swaps_all_non_genesis_blocks() {
    let db = test_db().await;
    ensure_genesis(&db).await.unwrap();
    let local = create_block(&db, vec!["mine".to_owned()]).await.unwrap().unwrap();

    // A taller, diverged peer chain.
    let p1 = forged(GENESIS_BLOCK_ID, 1, &["theirs-1"]);
    let p2 = forged(&p1.block_id, 2, &["theirs-2"]);
    let peer_chain = vec![p1.clone(), p2.clone()];

    assert!(replace_chain(&db, &peer_chain).await.unwrap());
    let blocks = get_blocks_after(&db, -1).await.unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].block_id, GENESIS_BLOCK_ID);
    assert_eq!(blocks[1], p1);
    assert_eq!(blocks[2], p2);
    assert!(!blocks.iter().any(|b| b.block_id == local.block_id));
  }

  #[tokio::test]
  async fn failed_replacement_rolls_back_to_the_prior_chain() {
    let db = test_db().await;
    ensure_genesis(&db).await.unwrap();
    let local = create_block(&db, vec!["mine".to_owned()]).await.unwrap().unwrap();

    let p1 = forged(GENESIS_BLOCK_ID, 1, &["theirs-1"]);
    let broken = forged("wrong_parent", 2, &["theirs-2"]);
    assert!(!replace_chain(&db, &[p1, broken]).await.unwrap());

    let blocks = get_blocks_after(&db, 0).await.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].block_id, local.block_id);
  }

  #[tokio::test]
  async fn replacing_with_the_identical_chain_is_a_no_op() {
    let db = test_db().await;
    ensure_genesis(&db).await.unwrap();
    create_block(&db, vec!["f1".to_owned()]).await.unwrap().unwrap();
    let before = get_blocks_after(&db, 0).await.unwrap();

    assert!(replace_chain(&db, &before).await.unwrap());
    assert_eq!(get_blocks_after(&db, 0).await.unwrap(), before);
  }
}
