use std::sync::{Arc, atomic::AtomicBool};
use std::time::Duration;

use axiom_core::{chain, ledger};
use axiom_migration::{Migrator, MigratorTrait};
use axiom_nlp::HttpNlpEngine;
use axiom_p2p::{PeerTable, ReputationConfig, SyncClient};
use axiom_server::server;
use axiom_shared::{APP_ENV, AppError, AxiomError};
use axiom_worker::{HttpContentGateway, IdleTelemetry, NodeContext, WorkerConfig, worker};
use sea_orm::Database;
use tokio::sync::{Mutex, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let env = &*APP_ENV;
  tracing::info!(url = %env.advertised_url, "axiom identity");

  let db = Database::connect(env.database_url().as_str())
    .await
    .map_err(|e| AxiomError::Config(format!("unreadable database {}: {e}", env.db_path)))?;

  // Apply all pending migrations, then self-heal any legacy plaintext rows
  // and seed the deterministic genesis block.
  Migrator::up(&db, None).await?;
  let migrated = ledger::migrate_legacy_plaintext(&db).await?;
  if migrated > 0 {
    tracing::info!(migrated, "migrated legacy facts to compressed storage");
  }
  chain::ensure_genesis(&db).await?;

  // Collaborators. An unreachable NLP engine is fatal; the content gateway is
  // only exercised from cycles and may come up later.
  let nlp = HttpNlpEngine::new(&env.nlp_url);
  nlp.probe().await?;
  let gateway = HttpContentGateway::new(&env.content_gateway_url);

  let self_url = format!("http://127.0.0.1:{}", env.port);
  let peers = PeerTable::new(
    vec![env.advertised_url.clone(), self_url.clone()],
    ReputationConfig {
      initial: env.peer_rep_initial,
      penalty: env.peer_rep_penalty,
      reward_uptime: env.peer_rep_reward_uptime,
      reward_new_data: env.peer_rep_reward_new_data,
    },
  );
  let bootstrapped = match &env.bootstrap_peer {
    Some(peer) => peers.add_or_update(peer).await,
    None => false,
  };

  let ctx = Arc::new(NodeContext {
    db,
    nlp: Arc::new(nlp),
    gateway: Arc::new(gateway),
    peers: Arc::new(peers),
    sync: Arc::new(SyncClient::new(&env.advertised_url)),
    write_lock: Mutex::new(()),
    chain_updated: AtomicBool::new(false),
    patterns: RwLock::new(Vec::new()),
    idle: RwLock::new(IdleTelemetry::default()),
    config: WorkerConfig {
      port: env.port,
      node_role: if env.bootstrap_peer.is_some() { "peer" } else { "bootstrap" }.to_owned(),
      advertised_url: env.advertised_url.clone(),
      self_url,
      db_path: env.db_path.clone(),
      main_cycle_interval: Duration::from_secs(env.main_cycle_interval),
      idle_suite_interval: Duration::from_secs_f64(env.idle_suite_interval),
      idle_tick_interval: Duration::from_secs_f64(env.idle_tick_interval),
      required_corroborating_domains: env.required_corroborating_domains,
    },
  });
  ctx.seed_patterns().await;

  if bootstrapped {
    axiom_worker::bootstrap_sync(&ctx).await;
  }

  let _ = tokio::try_join!(worker(ctx.clone()), server(ctx));

  Ok(())
}
