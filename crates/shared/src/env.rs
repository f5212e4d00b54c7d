use std::env;
use std::sync::LazyLock;

fn string_env(key: &str, default: &str) -> String {
  env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn int_env<T: std::str::FromStr>(key: &str, default: T) -> T {
  env::var(key)
    .ok()
    .and_then(|raw| raw.parse().ok())
    .unwrap_or(default)
}

fn float_env(key: &str, default: f64) -> f64 {
  env::var(key)
    .ok()
    .and_then(|raw| raw.parse().ok())
    .unwrap_or(default)
}

/// Node configuration. Tunables are environment variables; restart the node
/// after changing them.
pub struct AxiomEnv {
  /// Listen port. Also parameterizes the default database filename so
  /// multiple nodes can share a host.
  pub port: u16,
  /// SQLite file backing this node's ledger.
  pub db_path: String,
  /// URL other peers should use to reach this node.
  pub advertised_url: String,
  /// Optional peer to sync from on startup. Accepts a full URL, `host:port`,
  /// or a bare port (interpreted as a local node).
  pub bootstrap_peer: Option<String>,
  /// Seconds between main ingestion cycles.
  pub main_cycle_interval: u64,
  /// Seconds between idle suite runs.
  pub idle_suite_interval: f64,
  /// Upper bound on a single scheduler sleep.
  pub idle_tick_interval: f64,
  /// Distinct source domains required before a fact becomes `trusted`.
  /// 100 is deliberately strict; anything below 2 is meaningless.
  pub required_corroborating_domains: u32,
  pub peer_rep_initial: f64,
  pub peer_rep_penalty: f64,
  pub peer_rep_reward_uptime: f64,
  pub peer_rep_reward_new_data: f64,
  /// Base URL of the NLP collaborator service.
  pub nlp_url: String,
  /// Base URL of the article/RSS content gateway.
  pub content_gateway_url: String,
}

impl AxiomEnv {
  fn new() -> Self {
    dotenvy::dotenv().ok();

    let port: u16 = int_env("AXIOM_PORT", 8009);
    let db_path = string_env("AXIOM_DB_PATH", &format!("axiom_ledger_{port}.db"));
    let advertised_url = string_env("ADVERTISED_URL", &format!("http://127.0.0.1:{port}"));

    Self {
      port,
      db_path,
      advertised_url,
      bootstrap_peer: env::var("BOOTSTRAP_PEER").ok().filter(|s| !s.trim().is_empty()),
      main_cycle_interval: int_env("AXIOM_MAIN_CYCLE_INTERVAL", 900),
      idle_suite_interval: float_env("AXIOM_IDLE_SUITE_INTERVAL", 150.0),
      idle_tick_interval: float_env("AXIOM_IDLE_TICK_INTERVAL", 1.0),
      required_corroborating_domains: int_env("AXIOM_REQUIRED_CORROBORATING_DOMAINS", 100),
      peer_rep_initial: float_env("AXIOM_PEER_REP_INITIAL", 0.2),
      peer_rep_penalty: float_env("AXIOM_PEER_REP_PENALTY", 0.05),
      peer_rep_reward_uptime: float_env("AXIOM_PEER_REP_REWARD_UPTIME", 0.001),
      peer_rep_reward_new_data: float_env("AXIOM_PEER_REP_REWARD_NEW_DATA", 0.01),
      nlp_url: string_env("AXIOM_NLP_URL", "http://127.0.0.1:8090"),
      content_gateway_url: string_env("AXIOM_CONTENT_GATEWAY_URL", "http://127.0.0.1:8091"),
    }
  }

  /// Connection string for the node's ledger file, creating it on first use.
  #[must_use]
  pub fn database_url(&self) -> String {
    format!("sqlite://{}?mode=rwc", self.db_path)
  }
}

pub static APP_ENV: LazyLock<AxiomEnv> = LazyLock::new(AxiomEnv::new);
