//! Pull-based peer synchronization: gossip peer discovery, fact-id diff with
//! batched fetch, and chain tail sync with longest-chain fallback.

use std::collections::HashSet;
use std::time::Duration;

use axiom_core::{Block, FragmentOpinion, WireFact, chain, fact_id, ledger};
use axiom_shared::AxiomError;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::PeerTable;

const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);
const BULK_FACTS_TIMEOUT: Duration = Duration::from_secs(20);
const BLOCKS_TIMEOUT: Duration = Duration::from_secs(15);
const OPINION_TIMEOUT: Duration = Duration::from_secs(3);
const FACT_CHUNK_SIZE: usize = 50;

/// Outcome tag of one facts-sync pass; drives reputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
  UpToDate,
  NewFacts(usize),
  ConnectionFailed,
  SyncError,
}

/// A peer fact is only admissible when its id is the hash of its content.
#[must_use]
pub fn verify_wire_fact(fact: &WireFact) -> bool {
  !fact.fact_content.is_empty() && fact_id(&fact.fact_content) == fact.fact_id
}

#[derive(Deserialize)]
struct PeersResponse {
  #[serde(default)]
  peers: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct FactIdsResponse {
  #[serde(default)]
  fact_ids: Vec<String>,
}

#[derive(Deserialize)]
struct FactsResponse {
  #[serde(default)]
  facts: Vec<WireFact>,
}

#[derive(Deserialize)]
struct ChainHeadResponse {
  #[allow(dead_code)]
  block_id: Option<String>,
  height: i64,
}

#[derive(Deserialize)]
struct BlocksResponse {
  #[serde(default)]
  blocks: Vec<Block>,
}

fn json_error(err: reqwest::Error) -> AxiomError {
  if err.is_decode() {
    AxiomError::Decode(format!("malformed peer JSON: {err}"))
  } else {
    AxiomError::Network(err.to_string())
  }
}

/// HTTP client half of the mesh. Every outbound call carries the node's
/// advertised URL in `X-Axiom-Peer` so the callee can register the caller.
pub struct SyncClient {
  http: reqwest::Client,
  advertised_url: String,
}

impl SyncClient {
  #[must_use]
  pub fn new(advertised_url: &str) -> Self {
    Self {
      http: reqwest::Client::new(),
      advertised_url: advertised_url.trim_end_matches('/').to_owned(),
    }
  }

  fn get(&self, url: String, timeout: Duration) -> reqwest::RequestBuilder {
    self
      .http
      .get(url)
      .timeout(timeout)
      .header("X-Axiom-Peer", self.advertised_url.as_str())
  }

  /// Synchronize the local fact set from one peer, registering any peers it
  /// gossips about along the way.
  pub async fn sync_facts_with_peer(
    &self,
    db: &DatabaseConnection,
    peers: &PeerTable,
    peer_url: &str,
  ) -> SyncOutcome {
    tracing::debug!(peer = %peer_url, "facts sync starting");
    match self.sync_facts_inner(db, peers, peer_url).await {
      Ok(outcome) => outcome,
      Err(AxiomError::Network(err)) => {
        tracing::warn!(peer = %peer_url, %err, "facts sync connection failed");
        SyncOutcome::ConnectionFailed
      }
      Err(err) => {
        tracing::warn!(peer = %peer_url, %err, "facts sync error");
        SyncOutcome::SyncError
      }
    }
  }

  async fn sync_facts_inner(
    &self,
    db: &DatabaseConnection,
    peers: &PeerTable,
    peer_url: &str,
  ) -> Result<SyncOutcome, AxiomError> {
    // Gossip discovery keeps the mesh connected even when this sync fails
    // later; failures here are not the peer's fault.
    if let Ok(response) = self
      .get(format!("{peer_url}/get_peers"), CONTROL_TIMEOUT)
      .send()
      .await
    {
      if let Ok(discovered) = response.json::<PeersResponse>().await {
        for url in discovered.peers.keys() {
          peers.add_or_update(url).await;
        }
      }
    }

    let peer_ids: HashSet<String> = self
      .get(format!("{peer_url}/get_fact_ids"), Duration::from_secs(10))
      .send()
      .await?
      .error_for_status()?
      .json::<FactIdsResponse>()
      .await
      .map_err(json_error)?
      .fact_ids
      .into_iter()
      .collect();

    let local_ids: HashSet<String> = ledger::get_all_fact_ids(db).await?.into_iter().collect();
    let missing: Vec<String> = peer_ids.difference(&local_ids).cloned().collect();
    if missing.is_empty() {
      tracing::debug!(peer = %peer_url, "ledger already up to date");
      return Ok(SyncOutcome::UpToDate);
    }
    tracing::info!(peer = %peer_url, count = missing.len(), "requesting missing facts");

    let mut added = 0;
    let mut dropped = 0;
    for chunk in missing.chunks(FACT_CHUNK_SIZE) {
      let batch = match self
        .http
        .post(format!("{peer_url}/get_facts_by_id"))
        .timeout(BULK_FACTS_TIMEOUT)
        .header("X-Axiom-Peer", self.advertised_url.as_str())
        .json(&serde_json::json!({ "fact_ids": chunk }))
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
      {
        Ok(response) => match response.json::<FactsResponse>().await {
          Ok(batch) => batch.facts,
          Err(err) => {
            tracing::warn!(peer = %peer_url, %err, "undecodable fact batch skipped");
            continue;
          }
        },
        Err(err) => {
          tracing::warn!(peer = %peer_url, %err, "fact batch fetch failed");
          continue;
        }
      };

      for fact in &batch {
        if !verify_wire_fact(fact) {
          tracing::warn!(peer = %peer_url, fact_id = %fact.fact_id, "invalid hash from peer, dropping");
          dropped += 1;
          continue;
        }
        // Remote trust is never imported; the fact starts over locally.
        if ledger::insert_peer_fact(db, fact).await? {
          added += 1;
        }
      }
    }

    if added > 0 {
      tracing::info!(peer = %peer_url, added, dropped, "sync created new local records");
      Ok(SyncOutcome::NewFacts(added))
    } else if dropped > 0 {
      // Everything the peer offered failed verification: treat the pass as a
      // sync error so reputation takes the penalty.
      Err(AxiomError::Validation(format!(
        "{dropped} facts failed hash verification"
      )))
    } else {
      Ok(SyncOutcome::UpToDate)
    }
  }

  /// Chain sync: append the peer's tail when it extends our head; on
  /// divergence fall back to wholesale longest-chain replacement. Returns
  /// `(blocks_appended, peer_height)`; network problems report `(0, -1)`.
  pub async fn sync_chain_with_peer(
    &self,
    db: &DatabaseConnection,
    peer_url: &str,
  ) -> (u64, i64) {
    match self.sync_chain_inner(db, peer_url).await {
      Ok(result) => result,
      Err(err) => {
        tracing::debug!(peer = %peer_url, %err, "chain sync failed");
        (0, -1)
      }
    }
  }

  async fn sync_chain_inner(
    &self,
    db: &DatabaseConnection,
    peer_url: &str,
  ) -> Result<(u64, i64), AxiomError> {
    let head = self
      .get(format!("{peer_url}/get_chain_head"), CONTROL_TIMEOUT)
      .send()
      .await?
      .error_for_status()?
      .json::<ChainHeadResponse>()
      .await
      .map_err(json_error)?;
    if head.height < 0 {
      return Ok((0, head.height));
    }

    let local_height = chain::chain_head(db).await?.map_or(-1, |(_, h)| h);
    if head.height <= local_height {
      return Ok((0, head.height));
    }

    let tail = self
      .get(
        format!("{peer_url}/get_blocks_after?height={local_height}"),
        BLOCKS_TIMEOUT,
      )
      .send()
      .await?
      .error_for_status()?
      .json::<BlocksResponse>()
      .await
      .map_err(json_error)?
      .blocks;
    if tail.is_empty() {
      return Ok((0, head.height));
    }

    let mut appended = 0;
    let mut diverged = false;
    for block in tail {
      if chain::append_block(db, block).await? {
        appended += 1;
      } else {
        diverged = true;
        break;
      }
    }

    if diverged {
      // Their chain is taller but does not extend ours: fetch it wholesale
      // and let replacement validate every link from genesis.
      let full_chain = self
        .get(format!("{peer_url}/get_blocks_after?height=0"), BLOCKS_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json::<BlocksResponse>()
        .await
        .map_err(json_error)?
        .blocks;
      if (full_chain.len() as i64) > local_height && chain::replace_chain(db, &full_chain).await? {
        tracing::info!(peer = %peer_url, height = head.height, "chain replaced by longer peer chain");
      }
    } else if appended > 0 {
      tracing::info!(peer = %peer_url, appended, "appended peer blocks");
    }
    Ok((appended, head.height))
  }

  /// Ask one peer what it thinks about a suspected fragment. Best-effort.
  pub async fn fetch_fragment_opinion(
    &self,
    peer_url: &str,
    fact_id: &str,
  ) -> Option<FragmentOpinion> {
    self
      .get(
        format!("{peer_url}/fragment_opinion?fact_id={fact_id}"),
        OPINION_TIMEOUT,
      )
      .send()
      .await
      .ok()?
      .error_for_status()
      .ok()?
      .json::<FragmentOpinion>()
      .await
      .ok()
  }
}

#[cfg(test)]
mod tests {
  use axiom_core::{FactStatus, block_id, utc_now_iso};
  use axiom_migration::{Migrator, MigratorTrait};
  use axum::{Json, Router, extract::Query, routing::{get, post}};
  use sea_orm::{Database, DatabaseConnection};

  use super::*;
  use crate::ReputationConfig;

  async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
  }

  fn wire_fact(content: &str, source: &str) -> WireFact {
    WireFact {
      fact_id: fact_id(content),
      fact_content: content.to_owned(),
      source_url: source.to_owned(),
      ingest_timestamp_utc: utc_now_iso(),
      trust_score: 87,
      status: FactStatus::Trusted,
    }
  }

  fn forged_block(previous: &str, height: i64, fact_ids: &[&str]) -> Block {
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

  #[derive(serde::Deserialize)]
  struct HeightParam {
    height: i64,
  }

  /// Serve a canned peer on an ephemeral port.
  async fn spawn_peer(facts: Vec<WireFact>, blocks: Vec<Block>) -> String {
    let ids: Vec<String> = facts.iter().map(|f| f.fact_id.clone()).collect();
    let head = blocks.last().cloned();
    let app = Router::new()
      .route("/get_peers", get(|| async { Json(serde_json::json!({ "peers": {} })) }))
      .route(
        "/get_fact_ids",
        get(move || {
          let ids = ids.clone();
          async move { Json(serde_json::json!({ "fact_ids": ids })) }
        }),
      )
      .route(
        "/get_facts_by_id",
        post(move |_body: Json<serde_json::Value>| {
          let facts = facts.clone();
          async move { Json(serde_json::json!({ "facts": facts })) }
        }),
      )
      .route(
        "/get_chain_head",
        get(move || {
          let head = head.clone();
          async move {
            match head {
              Some(block) => Json(
                serde_json::json!({ "block_id": block.block_id, "height": block.height }),
              ),
              None => Json(serde_json::json!({ "block_id": null, "height": -1 })),
            }
          }
        }),
      )
      .route(
        "/get_blocks_after",
        get(move |Query(param): Query<HeightParam>| {
          let blocks = blocks.clone();
          async move {
            let tail: Vec<Block> = blocks
              .into_iter()
              .filter(|b| b.height > param.height)
              .collect();
            Json(serde_json::json!({ "blocks": tail }))
          }
        }),
      );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn facts_sync_imports_verified_facts_and_drops_forgeries() {
    let db = test_db().await;
    let good = wire_fact(
      "The Hargreaves expedition mapped the southern trench in detail.",
      "https://a.example/1",
    );
    let mut forged = wire_fact("Another sentence entirely.", "https://a.example/2");
    forged.fact_content = "Tampered content that no longer matches.".to_owned();

    let peer_url = spawn_peer(vec![good.clone(), forged], Vec::new()).await;
    let peers = PeerTable::new(Vec::new(), ReputationConfig::default());
    let client = SyncClient::new("http://127.0.0.1:9");

    let outcome = client.sync_facts_with_peer(&db, &peers, &peer_url).await;
    assert_eq!(outcome, SyncOutcome::NewFacts(1));

    // Remote trust was not imported.
    let stored = ledger::get_fact(&db, &good.fact_id).await.unwrap().unwrap();
    assert_eq!(stored.trust_score, 1);
    assert_eq!(stored.status, "uncorroborated");
    assert!(axiom_core::is_zlib(&stored.fact_content));

    // Second pass finds nothing new.
    let outcome = client.sync_facts_with_peer(&db, &peers, &peer_url).await;
    assert_eq!(outcome, SyncOutcome::UpToDate);
  }

  #[tokio::test]
  async fn a_batch_of_pure_forgeries_is_a_sync_error() {
    let db = test_db().await;
    let mut forged = wire_fact("Original sentence before tampering.", "https://a.example/1");
    forged.fact_content = "Tampered content.".to_owned();

    let peer_url = spawn_peer(vec![forged], Vec::new()).await;
    let peers = PeerTable::new(Vec::new(), ReputationConfig::default());
    let client = SyncClient::new("http://127.0.0.1:9");

    let outcome = client.sync_facts_with_peer(&db, &peers, &peer_url).await;
    assert_eq!(outcome, SyncOutcome::SyncError);
    assert!(ledger::get_all_fact_ids(&db).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn unreachable_peer_reports_connection_failed() {
    let db = test_db().await;
    let peers = PeerTable::new(Vec::new(), ReputationConfig::default());
    let client = SyncClient::new("http://127.0.0.1:9");
    let outcome = client
      .sync_facts_with_peer(&db, &peers, "http://127.0.0.1:1")
      .await;
    assert_eq!(outcome, SyncOutcome::ConnectionFailed);
  }

  #[tokio::test]
  async fn chain_sync_appends_a_clean_tail() {
    let db = test_db().await;
    chain::ensure_genesis(&db).await.unwrap();

    let b1 = forged_block(chain::GENESIS_BLOCK_ID, 1, &["f1"]);
    let b2 = forged_block(&b1.block_id, 2, &["f2"]);
    let peer_url = spawn_peer(Vec::new(), vec![b1, b2.clone()]).await;
    let client = SyncClient::new("http://127.0.0.1:9");

    let (appended, peer_height) = client.sync_chain_with_peer(&db, &peer_url).await;
    assert_eq!((appended, peer_height), (2, 2));
    assert_eq!(
      chain::chain_head(&db).await.unwrap().unwrap(),
      (b2.block_id, 2)
    );
  }

  #[tokio::test]
  async fn diverged_longer_chain_triggers_wholesale_replacement() {
    let db = test_db().await;
    chain::ensure_genesis(&db).await.unwrap();
    let local = chain::create_block(&db, vec!["mine".to_owned()])
      .await
      .unwrap()
      .unwrap();

    let p1 = forged_block(chain::GENESIS_BLOCK_ID, 1, &["theirs-1"]);
    let p2 = forged_block(&p1.block_id, 2, &["theirs-2"]);
    let p3 = forged_block(&p2.block_id, 3, &["theirs-3"]);
    let peer_url = spawn_peer(Vec::new(), vec![p1, p2, p3.clone()]).await;
    let client = SyncClient::new("http://127.0.0.1:9");

    let (_, peer_height) = client.sync_chain_with_peer(&db, &peer_url).await;
    assert_eq!(peer_height, 3);
    let head = chain::chain_head(&db).await.unwrap().unwrap();
    assert_eq!(head, (p3.block_id, 3));
    assert!(
      !chain::get_blocks_after(&db, 0)
        .await
        .unwrap()
        .iter()
        .any(|b| b.block_id == local.block_id)
    );
  }
}
