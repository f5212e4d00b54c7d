//! The node scheduler: one background task driving the main ingestion cycle
//! and the throttled idle suite, cooperatively cancellable at every sleep.

pub mod gateway;
pub use gateway::{ContentGateway, HttpContentGateway, SourceDocument, StubGateway};

mod telemetry;
pub use telemetry::{IdleTelemetry, SelfCheckResult};

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use axiom_core::{
  ConversationPattern, Fact, FragmentState, chain, conversation, extractor, health, ledger, mesh,
  meta, quality, synthesizer,
};
use axiom_nlp::NlpEngine;
use axiom_p2p::{PeerTable, SyncClient};
use axiom_shared::AppError;
use chrono::{Duration as ChronoDuration, Utc};
use sea_orm::DatabaseConnection;
use tokio::sync::{Mutex, RwLock};

/// Scheduler and node-identity configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
  pub port: u16,
  pub node_role: String,
  pub advertised_url: String,
  pub self_url: String,
  pub db_path: String,
  pub main_cycle_interval: Duration,
  pub idle_suite_interval: Duration,
  pub idle_tick_interval: Duration,
  pub required_corroborating_domains: u32,
}

/// Everything the scheduler and the API surface share. The write mutex
/// serializes multi-statement writers; it is never held across an outbound
/// HTTP call.
pub struct NodeContext {
  pub db: DatabaseConnection,
  pub nlp: Arc<dyn NlpEngine>,
  pub gateway: Arc<dyn ContentGateway>,
  pub peers: Arc<PeerTable>,
  pub sync: Arc<SyncClient>,
  pub write_lock: Mutex<()>,
  /// Raised whenever the chain advances outside the main cycle (handshake
  /// sync, bootstrap). Sealing re-reads the head either way; the flag only
  /// records that the parent moved mid-cycle.
  pub chain_updated: AtomicBool,
  pub patterns: RwLock<Vec<ConversationPattern>>,
  pub idle: RwLock<IdleTelemetry>,
  pub config: WorkerConfig,
}

impl NodeContext {
  pub async fn seed_patterns(&self) {
    let mut patterns = self.patterns.write().await;
    if patterns.is_empty() {
      *patterns = conversation::seed_patterns();
    }
  }
}

const HOUSEKEEPING_PRUNE_DAYS: i64 = 1;
const IDLE_LOG_THROTTLE: Duration = Duration::from_secs(60);

struct Throttle {
  name: &'static str,
  interval: Duration,
  last_run: Option<Instant>,
  last_log: Option<Instant>,
}

impl Throttle {
  fn new(name: &'static str, interval: Duration) -> Self {
    Self {
      name,
      interval,
      last_run: None,
      last_log: None,
    }
  }

  /// Whether the task may run now; when throttled, log at most once per
  /// minute about it.
  fn ready(&mut self) -> bool {
    let now = Instant::now();
    let ready = self
      .last_run
      .is_none_or(|last| now.duration_since(last) >= self.interval);
    if ready {
      return true;
    }
    if self
      .last_log
      .is_none_or(|last| now.duration_since(last) >= IDLE_LOG_THROTTLE)
    {
      let elapsed = self.last_run.map_or(0, |last| now.duration_since(last).as_secs());
      let remaining = self.interval.as_secs().saturating_sub(elapsed);
      tracing::debug!(task = self.name, remaining, elapsed, "idle task throttled");
      self.last_log = Some(now);
    }
    false
  }

  fn mark(&mut self) {
    self.last_run = Some(Instant::now());
  }
}

struct IdleThrottles {
  learning: Throttle,
  code: Throttle,
  data_quality: Throttle,
  fragment_audit: Throttle,
  health: Throttle,
  self_checks: Throttle,
}

impl IdleThrottles {
  fn new() -> Self {
    Self {
      learning: Throttle::new("learning", Duration::from_secs(300)),
      code: Throttle::new("code", Duration::from_secs(3600)),
      data_quality: Throttle::new("data", Duration::from_secs(900)),
      fragment_audit: Throttle::new("fragment_audit", Duration::from_secs(300)),
      health: Throttle::new("health", Duration::from_secs(600)),
      self_checks: Throttle::new("selfcheck", Duration::from_secs(10_800)),
    }
  }
}

pub struct Scheduler {
  ctx: Arc<NodeContext>,
  topic_rotation: usize,
  compiled_index: usize,
  throttles: IdleThrottles,
}

impl Scheduler {
  #[must_use]
  pub fn new(ctx: Arc<NodeContext>) -> Self {
    Self {
      ctx,
      topic_rotation: rand::random::<usize>() % 10,
      compiled_index: 0,
      throttles: IdleThrottles::new(),
    }
  }

  /// One full main cycle: fetch a topic, extract and link facts, seal a
  /// block, sync every peer, then reflect and housekeep. A failing step never
  /// aborts the cycle.
  pub async fn main_cycle(&mut self) {
    let started = Instant::now();
    tracing::info!("engine cycle start");
    self.ctx.chain_updated.store(false, Ordering::SeqCst);

    let new_facts = self.ingest_phase().await;

    if !new_facts.is_empty() {
      // The synthesizer talks to the NLP collaborator, so it runs unlocked;
      // the scheduler is the only writer of the relationship tables.
      if let Err(err) =
        synthesizer::link_related_facts(self.ctx.nlp.as_ref(), &self.ctx.db, &new_facts).await
      {
        tracing::warn!(%err, "synthesizer pass failed");
      }

      let _guard = self.ctx.write_lock.lock().await;
      if self.ctx.chain_updated.swap(false, Ordering::SeqCst) {
        tracing::debug!("chain advanced mid-cycle, sealing on the new head");
      }
      let fact_ids: Vec<String> = new_facts.iter().map(|f| f.fact_id.clone()).collect();
      match chain::create_block(&self.ctx.db, fact_ids).await {
        Ok(Some(block)) => {
          tracing::info!(
            height = block.height,
            facts = block.fact_ids.len(),
            "committed block"
          );
        }
        Ok(None) => tracing::warn!("failed to commit block, head moved"),
        Err(err) => tracing::warn!(%err, "block creation failed"),
      }
    }

    self.sync_all_peers().await;

    if let Err(err) = mesh::run_reflection(self.ctx.nlp.as_ref(), &self.ctx.db).await {
      tracing::warn!(%err, "reflection failed");
    }
    {
      let _guard = self.ctx.write_lock.lock().await;
      if let Err(err) = meta::run_metacognitive_cycle(&self.ctx.db).await {
        tracing::warn!(%err, "metacognitive cycle failed");
      }
      self.prune_ledger().await;
    }

    self.ctx.idle.write().await.last_main_cycle_ts = Some(Utc::now().timestamp());
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "engine cycle finish");
  }

  async fn ingest_phase(&mut self) -> Vec<Fact> {
    let topics = match self.ctx.gateway.trending_topics(100).await {
      Ok(topics) if !topics.is_empty() => topics,
      Ok(_) => {
        tracing::debug!("no trending topics this cycle");
        return Vec::new();
      }
      Err(err) => {
        tracing::warn!(%err, "topic discovery failed");
        return Vec::new();
      }
    };
    let topic = topics[self.topic_rotation % topics.len()].clone();
    self.topic_rotation += 1;
    tracing::info!(%topic, "selected topic for this cycle");

    let documents = match self.ctx.gateway.find_and_extract(&topic, 3).await {
      Ok(documents) => documents,
      Err(err) => {
        tracing::warn!(%err, "article fetch failed");
        return Vec::new();
      }
    };

    let mut new_facts = Vec::new();
    for document in documents {
      // Extraction parses through the NLP collaborator; the write mutex is
      // never held across that I/O.
      match extractor::extract_facts_from_text(
        self.ctx.nlp.as_ref(),
        &self.ctx.db,
        &document.source_url,
        &document.content,
        self.ctx.config.required_corroborating_domains,
      )
      .await
      {
        Ok(facts) => new_facts.extend(facts),
        Err(err) => tracing::warn!(%err, source = %document.source_url, "extraction failed"),
      }
    }
    new_facts
  }

  /// Sync facts and chain with every peer, highest reputation first.
  async fn sync_all_peers(&self) {
    for peer_url in self.ctx.peers.sorted_by_reputation().await {
      let outcome = self
        .ctx
        .sync
        .sync_facts_with_peer(&self.ctx.db, &self.ctx.peers, &peer_url)
        .await;
      self.ctx.peers.apply_outcome(&peer_url, &outcome).await;

      let (appended, _) = self.ctx.sync.sync_chain_with_peer(&self.ctx.db, &peer_url).await;
      if appended > 0 {
        self.ctx.chain_updated.store(true, Ordering::SeqCst);
      }
    }
  }

  async fn prune_ledger(&self) {
    let cutoff = (Utc::now() - ChronoDuration::days(HOUSEKEEPING_PRUNE_DAYS))
      .format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
      .to_string();
    match ledger::prune_uncorroborated_before(&self.ctx.db, &cutoff).await {
      Ok(deleted) if deleted > 0 => {
        tracing::info!(deleted, "pruned stale uncorroborated records");
      }
      Ok(_) => {}
      Err(err) => tracing::warn!(%err, "housekeeping prune failed"),
    }
  }

  /// Run the idle tasks in a fixed sequence; each throttles itself.
  pub async fn idle_suite(&mut self) {
    self.idle_learning().await;
    self.idle_conversation_training().await;
    self.idle_code_introspection().await;
    self.idle_data_quality().await;
    self.idle_fragment_audit().await;
    self.idle_health_snapshot().await;
    self.idle_self_checks().await;
  }

  /// Relationship rediscovery on a random sample plus mesh reinforcement of a
  /// few high-trust facts.
  async fn idle_learning(&mut self) {
    if !self.throttles.learning.ready() {
      return;
    }
    let db = &self.ctx.db;
    let sample = match ledger::sample_non_disputed(db, 30).await {
      Ok(rows) => rows,
      Err(err) => {
        tracing::debug!(%err, "learning cycle skipped");
        return;
      }
    };
    if sample.is_empty() {
      return;
    }

    let facts: Vec<Fact> = sample.into_iter().filter_map(|m| Fact::from_model(m).ok()).collect();
    if !facts.is_empty() {
      tracing::debug!(count = facts.len(), "relationship rediscovery");
      if let Err(err) = synthesizer::link_related_facts(self.ctx.nlp.as_ref(), db, &facts).await {
        tracing::debug!(%err, "relinking failed");
      }
    }

    if let Ok(reinforce) = ledger::sample_high_trust(db, 5).await {
      let mut reinforced = 0;
      for model in reinforce {
        if let Ok(fact) = Fact::from_model(model) {
          if mesh::integrate_fact_to_mesh(self.ctx.nlp.as_ref(), db, &fact.content)
            .await
            .is_ok()
          {
            reinforced += 1;
          }
        }
      }
      if reinforced > 0 {
        tracing::debug!(reinforced, "synapse reinforcement complete");
      }
    }

    self.throttles.learning.mark();
    self.ctx.idle.write().await.last_learning_ts = Some(Utc::now().timestamp());
  }

  /// Compile a bounded batch of conversation patterns per pass.
  async fn idle_conversation_training(&mut self) {
    self.ctx.seed_patterns().await;
    let mut patterns = self.ctx.patterns.write().await;
    let upper = (self.compiled_index + 2).min(patterns.len());
    if self.compiled_index >= upper {
      return;
    }
    for pattern in &mut patterns[self.compiled_index..upper] {
      pattern.compile();
    }
    self.compiled_index = upper;
    if upper == patterns.len() {
      tracing::info!(count = patterns.len(), "conversation patterns ready");
    }
  }

  async fn idle_code_introspection(&mut self) {
    if !self.throttles.code.ready() {
      return;
    }
    // The registry is static; the refresh republishes it and stamps the age.
    tracing::info!(
      modules = axiom_core::introspection::SUBSYSTEMS.len(),
      endpoints = axiom_core::introspection::ENDPOINT_REGISTRY.len(),
      "refreshed code map"
    );
    self.throttles.code.mark();
    self.ctx.idle.write().await.last_code_introspection_ts = Some(Utc::now().timestamp());
  }

  async fn idle_data_quality(&mut self) {
    if !self.throttles.data_quality.ready() {
      return;
    }
    let duplicates = quality::find_duplicate_candidates(&self.ctx.db, 300).await;
    let conflicts = quality::find_conflict_candidates(&self.ctx.db, 300).await;
    match (duplicates, conflicts) {
      (Ok(duplicates), Ok(conflicts)) => {
        tracing::info!(
          duplicate_groups = duplicates.len(),
          conflict_groups = conflicts.len(),
          "sampled data quality"
        );
        let mut idle = self.ctx.idle.write().await;
        idle.duplicate_groups = duplicates.len();
        idle.conflict_groups = conflicts.len();
        idle.last_data_quality_ts = Some(Utc::now().timestamp());
        self.throttles.data_quality.mark();
      }
      (Err(err), _) | (_, Err(err)) => tracing::debug!(%err, "data quality scan skipped"),
    }
  }

  /// Re-score a bounded sample of facts and, for suspected fragments, seek
  /// simple consensus from the highest-reputation peers.
  async fn idle_fragment_audit(&mut self) {
    if !self.throttles.fragment_audit.ready() {
      return;
    }
    let sample = match ledger::sample_non_disputed(&self.ctx.db, 40).await {
      Ok(rows) => rows,
      Err(err) => {
        tracing::debug!(%err, "fragment audit skipped");
        return;
      }
    };
    if sample.is_empty() {
      self.throttles.fragment_audit.mark();
      self.ctx.idle.write().await.last_fragment_audit_ts = Some(Utc::now().timestamp());
      return;
    }

    let peer_urls: Vec<String> = self
      .ctx
      .peers
      .sorted_by_reputation()
      .await
      .into_iter()
      .take(3)
      .collect();

    let audited = sample.len();
    let mut updated = 0;
    for model in sample {
      let Ok(text) = axiom_core::decompress(&model.fact_content) else {
        continue;
      };
      if text.trim().is_empty() {
        continue;
      }
      let (score, reasons) = meta::audit_score(&text);
      let current: FragmentState = model.fragment_state.parse().unwrap_or(FragmentState::Unknown);
      let mut new_state = meta::refine_state(current, score);

      if new_state == FragmentState::SuspectedFragment && !peer_urls.is_empty() {
        let mut opinions = Vec::new();
        for peer_url in &peer_urls {
          if let Some(opinion) = self
            .ctx
            .sync
            .fetch_fragment_opinion(peer_url, &model.fact_id)
            .await
          {
            opinions.push(opinion);
          }
        }
        if let Some(consensus) = meta::fragment_consensus(&opinions) {
          new_state = consensus;
        }
      }

      if new_state != current || (score - model.fragment_score).abs() > 0.05 {
        let reason = if reasons.is_empty() {
          None
        } else {
          Some(reasons.join(","))
        };
        if ledger::update_fragment(
          &self.ctx.db,
          &model.fact_id,
          new_state,
          score,
          reason.as_deref(),
        )
        .await
        .is_ok()
        {
          updated += 1;
        }
      }
    }

    if updated > 0 {
      tracing::info!(audited, updated, "fragment audit updated classifications");
    }
    self.throttles.fragment_audit.mark();
    self.ctx.idle.write().await.last_fragment_audit_ts = Some(Utc::now().timestamp());
  }

  async fn idle_health_snapshot(&mut self) {
    if !self.throttles.health.ready() {
      return;
    }
    match health::compute_health_snapshot(&self.ctx.db).await {
      Ok(snapshot) => {
        if snapshot.is_anomalous() {
          tracing::warn!(
            blocks = snapshot.total_blocks,
            "anomaly: chain has blocks but the facts table is empty"
          );
        }
        tracing::info!(
          facts = snapshot.total_facts,
          blocks = snapshot.total_blocks,
          height = snapshot.chain_height,
          "updated health snapshot"
        );
        let mut idle = self.ctx.idle.write().await;
        idle.health = Some(snapshot);
        idle.last_health_snapshot_ts = Some(Utc::now().timestamp());
        self.throttles.health.mark();
      }
      Err(err) => tracing::debug!(%err, "health snapshot skipped"),
    }
  }

  /// Deterministic self-queries against our own `/think` endpoint.
  async fn idle_self_checks(&mut self) {
    if !self.throttles.self_checks.ready() {
      return;
    }
    let results = run_self_checks(&self.ctx.config.self_url).await;
    tracing::info!(
      passed = results.iter().filter(|r| r.ok).count(),
      total = results.len(),
      "self-checks complete"
    );
    let mut idle = self.ctx.idle.write().await;
    idle.self_check_results = results;
    idle.last_self_check_ts = Some(Utc::now().timestamp());
    self.throttles.self_checks.mark();
  }

  /// The scheduler loop: main cycle on its deadline, idle suite on its own,
  /// sleeping at most one tick in between. Exits cleanly on shutdown signal.
  pub async fn run(mut self) -> Result<(), AppError> {
    tracing::info!("starting continuous background cycle");
    let mut next_cycle = Instant::now();
    let mut next_idle = Instant::now() + self.ctx.config.idle_suite_interval;

    loop {
      let now = Instant::now();
      if now >= next_cycle {
        self.main_cycle().await;
        next_cycle = now + self.ctx.config.main_cycle_interval;
      } else if now >= next_idle {
        self.idle_suite().await;
        next_idle = now + self.ctx.config.idle_suite_interval;
      } else {
        let sleep_for = self
          .ctx
          .config
          .idle_tick_interval
          .min(next_cycle.saturating_duration_since(now))
          .min(next_idle.saturating_duration_since(now));
        tokio::select! {
          () = tokio::time::sleep(sleep_for) => {}
          _ = tokio::signal::ctrl_c() => {
            tracing::info!("scheduler shutting down");
            return Ok(());
          }
        }
      }
    }
  }
}

/// Entry point matching the server half: build the scheduler and run it until
/// shutdown.
pub async fn worker(ctx: Arc<NodeContext>) -> Result<(), AppError> {
  Scheduler::new(ctx).run().await
}

struct SelfCheckCase {
  query: &'static str,
  must_contain: &'static [&'static str],
}

const SELF_CHECKS: &[SelfCheckCase] = &[
  SelfCheckCase {
    query: "what is the lexical mesh",
    must_contain: &["lexical mesh"],
  },
  SelfCheckCase {
    query: "explain the extractor",
    must_contain: &["extractor"],
  },
  SelfCheckCase {
    query: "what can you do",
    must_contain: &["ingest"],
  },
];

async fn run_self_checks(base_url: &str) -> Vec<SelfCheckResult> {
  let client = reqwest::Client::new();
  let mut results = Vec::new();
  for case in SELF_CHECKS {
    let response = client
      .get(format!("{base_url}/think"))
      .query(&[("query", case.query)])
      .timeout(Duration::from_secs(3))
      .send()
      .await
      .and_then(reqwest::Response::error_for_status);
    match response {
      Ok(response) => {
        let answer = response
          .json::<serde_json::Value>()
          .await
          .ok()
          .and_then(|v| v.get("response").and_then(|r| r.as_str()).map(str::to_lowercase))
          .unwrap_or_default();
        let missing: Vec<String> = case
          .must_contain
          .iter()
          .filter(|kw| !answer.contains(&kw.to_lowercase()))
          .map(|kw| (*kw).to_owned())
          .collect();
        results.push(SelfCheckResult {
          query: case.query.to_owned(),
          ok: missing.is_empty(),
          missing_keywords: missing,
          error: None,
        });
      }
      Err(err) => results.push(SelfCheckResult {
        query: case.query.to_owned(),
        ok: false,
        missing_keywords: Vec::new(),
        error: Some(err.to_string()),
      }),
    }
  }
  results
}

/// One facts+chain pass against every configured peer, used before the
/// background loop starts on bootstrapped nodes.
pub async fn bootstrap_sync(ctx: &NodeContext) {
  if ctx.peers.is_empty().await {
    tracing::info!("no bootstrap peers defined, starting as genesis node");
    return;
  }
  tracing::info!("performing initial sync with bootstrap peers");
  for peer_url in ctx.peers.sorted_by_reputation().await {
    let outcome = ctx.sync.sync_facts_with_peer(&ctx.db, &ctx.peers, &peer_url).await;
    ctx.peers.apply_outcome(&peer_url, &outcome).await;
    let (appended, _) = ctx.sync.sync_chain_with_peer(&ctx.db, &peer_url).await;
    if appended > 0 {
      ctx.chain_updated.store(true, Ordering::SeqCst);
    }
  }
}

/// Short-delay background sync attempt against a newly discovered peer.
pub fn spawn_handshake(ctx: Arc<NodeContext>, peer_url: String) {
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_secs(2)).await;
    let outcome = ctx.sync.sync_facts_with_peer(&ctx.db, &ctx.peers, &peer_url).await;
    ctx.peers.apply_outcome(&peer_url, &outcome).await;
  });
}

#[cfg(test)]
mod tests {
  use axiom_migration::{Migrator, MigratorTrait};
  use axiom_nlp::{SentenceBuilder, StubNlp};
  use axiom_p2p::ReputationConfig;
  use sea_orm::Database;

  use super::*;

  async fn context(gateway: StubGateway, nlp: StubNlp) -> Arc<NodeContext> {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    chain::ensure_genesis(&db).await.unwrap();
    Arc::new(NodeContext {
      db,
      nlp: Arc::new(nlp),
      gateway: Arc::new(gateway),
      peers: Arc::new(PeerTable::new(Vec::new(), ReputationConfig::default())),
      sync: Arc::new(SyncClient::new("http://127.0.0.1:9")),
      write_lock: Mutex::new(()),
      chain_updated: AtomicBool::new(false),
      patterns: RwLock::new(Vec::new()),
      idle: RwLock::new(IdleTelemetry::default()),
      config: WorkerConfig {
        port: 9,
        node_role: "peer".to_owned(),
        advertised_url: "http://127.0.0.1:9".to_owned(),
        self_url: "http://127.0.0.1:9".to_owned(),
        db_path: ":memory:".to_owned(),
        main_cycle_interval: Duration::from_secs(900),
        idle_suite_interval: Duration::from_secs(150),
        idle_tick_interval: Duration::from_secs(1),
        required_corroborating_domains: 100,
      },
    })
  }

  #[tokio::test]
  async fn main_cycle_ingests_seals_and_reflects() {
    let sentence = "The Meridian consortium completed the tidal barrage in Rotterdam.";
    let gateway = StubGateway {
      topics: vec!["Meridian".to_owned()],
      documents: vec![SourceDocument {
        source_url: "https://a.example/meridian".to_owned(),
        content: sentence.to_owned(),
      }],
    };
    let nlp = StubNlp::new().script(
      sentence,
      vec![
        SentenceBuilder::new(sentence)
          .token("consortium", "consortium", "NOUN", "nsubj", "completed")
          .token("completed", "complete", "VERB", "ROOT", "completed")
          .entity("Meridian", "ORG")
          .entity("Rotterdam", "GPE")
          .build(),
      ],
    );
    let ctx = context(gateway, nlp).await;

    Scheduler::new(ctx.clone()).main_cycle().await;

    // The fact exists, is committed to a height-1 block, and the mesh
    // absorbed it.
    let ids = ledger::get_all_fact_ids(&ctx.db).await.unwrap();
    assert_eq!(ids.len(), 1);
    let (_, height) = chain::chain_head(&ctx.db).await.unwrap().unwrap();
    assert_eq!(height, 1);
    let blocks = chain::get_blocks_after(&ctx.db, 0).await.unwrap();
    assert_eq!(blocks[0].fact_ids, ids);
    assert!(ledger::get_unprocessed_for_mesh(&ctx.db).await.unwrap().is_empty());
    assert!(ctx.idle.read().await.last_main_cycle_ts.is_some());
  }

  #[tokio::test]
  async fn empty_gateway_leaves_the_chain_alone() {
    let ctx = context(StubGateway::default(), StubNlp::new()).await;
    Scheduler::new(ctx.clone()).main_cycle().await;
    let (_, height) = chain::chain_head(&ctx.db).await.unwrap().unwrap();
    assert_eq!(height, 0);
  }

  #[tokio::test]
  async fn idle_suite_compiles_patterns_and_snapshots_health() {
    let ctx = context(StubGateway::default(), StubNlp::new()).await;
    let mut scheduler = Scheduler::new(ctx.clone());
    // Enough passes to compile every seed pattern two at a time.
    for _ in 0..10 {
      scheduler.idle_suite().await;
    }

    let patterns = ctx.patterns.read().await;
    assert!(!patterns.is_empty());
    assert!(patterns.iter().all(ConversationPattern::is_compiled));

    let idle = ctx.idle.read().await;
    assert!(idle.health.is_some());
    assert!(idle.last_health_snapshot_ts.is_some());
    assert!(idle.last_fragment_audit_ts.is_some());
    // Self-checks ran (and failed cleanly, there is no server here).
    assert_eq!(idle.self_check_results.len(), 3);
    assert!(idle.self_check_results.iter().all(|r| !r.ok));
  }

  async fn insert_stub_fact(ctx: &NodeContext, content: &str) -> String {
    let fact = axiom_core::Fact {
      fact_id: axiom_core::fact_id(content),
      content: content.to_owned(),
      source_url: "https://a.example/stub".to_owned(),
      ingest_timestamp_utc: axiom_core::utc_now_iso(),
      trust_score: 1,
      status: axiom_core::FactStatus::Uncorroborated,
      corroborating_sources: Vec::new(),
      contradicts_fact_id: None,
      lexically_processed: false,
      adl_summary: String::new(),
      fragment: axiom_core::FragmentMeta::default(),
    };
    ledger::insert_candidate_fact(&ctx.db, &fact).await.unwrap();
    fact.fact_id
  }

  async fn spawn_opinion_peer(opinion: serde_json::Value) -> String {
    use axum::{Json, Router, routing::get};
    let app = Router::new().route(
      "/fragment_opinion",
      get(move || {
        let opinion = opinion.clone();
        async move { Json(opinion) }
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
  async fn fragment_audit_confirms_with_unanimous_peer_consensus() {
    let ctx = context(StubGateway::default(), StubNlp::new()).await;
    // Two words, terminal punctuation: audit score 0.6, suspected.
    let fact_id = insert_stub_fact(&ctx, "Short stub.").await;

    let peer = spawn_opinion_peer(serde_json::json!({ "seen": false })).await;
    ctx.peers.add_or_update(&peer).await;

    let mut scheduler = Scheduler::new(ctx.clone());
    scheduler.idle_fragment_audit().await;

    let stored = ledger::get_fact(&ctx.db, &fact_id).await.unwrap().unwrap();
    assert_eq!(stored.fragment_state, "confirmed_fragment");
    assert!((stored.fragment_score - 0.6).abs() < 1e-9);
  }

  #[tokio::test]
  async fn fragment_audit_demotes_when_a_peer_trusts_the_fact() {
    let ctx = context(StubGateway::default(), StubNlp::new()).await;
    let fact_id = insert_stub_fact(&ctx, "Short stub.").await;

    let peer = spawn_opinion_peer(serde_json::json!({
      "seen": true,
      "status": "trusted",
      "trust_score": 4.0,
      "fragment_state": "unknown",
      "fragment_score": 0.0,
    }))
    .await;
    ctx.peers.add_or_update(&peer).await;

    let mut scheduler = Scheduler::new(ctx.clone());
    scheduler.idle_fragment_audit().await;

    let stored = ledger::get_fact(&ctx.db, &fact_id).await.unwrap().unwrap();
    assert_eq!(stored.fragment_state, "rejected_fragment");
  }

  #[tokio::test]
  async fn fragment_audit_releases_stale_suspicion_without_peers() {
    let ctx = context(StubGateway::default(), StubNlp::new()).await;
    let content = "The committee approved the accord after months of careful negotiation.";
    let fact_id = insert_stub_fact(&ctx, content).await;
    ledger::update_fragment(
      &ctx.db,
      &fact_id,
      FragmentState::SuspectedFragment,
      0.7,
      Some("short_sentence"),
    )
    .await
    .unwrap();

    let mut scheduler = Scheduler::new(ctx.clone());
    scheduler.idle_fragment_audit().await;

    let stored = ledger::get_fact(&ctx.db, &fact_id).await.unwrap().unwrap();
    assert_eq!(stored.fragment_state, "rejected_fragment");
    // Ten words: only the moderately-short term applies now.
    assert!((stored.fragment_score - 0.3).abs() < 1e-9);
  }

  #[test]
  fn throttle_blocks_until_interval_elapses() {
    let mut throttle = Throttle::new("test", Duration::from_secs(300));
    assert!(throttle.ready());
    throttle.mark();
    assert!(!throttle.ready());
    throttle.last_run = Some(Instant::now() - Duration::from_secs(301));
    assert!(throttle.ready());
  }
}
