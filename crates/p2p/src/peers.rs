//! The in-memory peer table and reputation scoring. Mutated from the
//! scheduler and from request handlers registering `X-Axiom-Peer` callers;
//! reads take a cloned snapshot so no iteration happens under the lock.

use std::collections::HashMap;

use axiom_core::utc_now_iso;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::SyncOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PeerInfo {
  /// Scalar in [0, 1]; sort key for sync ordering.
  pub reputation: f64,
  pub first_seen: String,
  pub last_seen: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ReputationConfig {
  pub initial: f64,
  pub penalty: f64,
  pub reward_uptime: f64,
  pub reward_new_data: f64,
}

impl Default for ReputationConfig {
  fn default() -> Self {
    Self {
      initial: 0.2,
      penalty: 0.05,
      reward_uptime: 0.001,
      reward_new_data: 0.01,
    }
  }
}

/// Normalize a configured or gossiped peer reference into a URL. Accepts a
/// full URL, `host:port`, or a bare port (treated as a local node).
#[must_use]
pub fn normalize_peer_url(raw: &str) -> Option<String> {
  let raw = raw.trim().trim_end_matches('/');
  if raw.is_empty() {
    return None;
  }
  if raw.starts_with("http://") || raw.starts_with("https://") {
    return Some(raw.to_owned());
  }
  if raw.chars().all(|c| c.is_ascii_digit()) {
    return Some(format!("http://127.0.0.1:{raw}"));
  }
  Some(format!("http://{raw}"))
}

pub struct PeerTable {
  peers: RwLock<HashMap<String, PeerInfo>>,
  self_urls: Vec<String>,
  config: ReputationConfig,
}

impl PeerTable {
  #[must_use]
  pub fn new(self_urls: Vec<String>, config: ReputationConfig) -> Self {
    Self {
      peers: RwLock::new(HashMap::new()),
      self_urls,
      config,
    }
  }

  /// Register a peer or refresh its `last_seen`. Self-references are ignored.
  /// Returns true when the peer is new to this node.
  pub async fn add_or_update(&self, peer_url: &str) -> bool {
    let Some(url) = normalize_peer_url(peer_url) else {
      return false;
    };
    if self.self_urls.iter().any(|own| own == &url) {
      return false;
    }

    let mut peers = self.peers.write().await;
    let now = utc_now_iso();
    if let Some(info) = peers.get_mut(&url) {
      info.last_seen = now;
      return false;
    }
    peers.insert(
      url.clone(),
      PeerInfo {
        reputation: self.config.initial,
        first_seen: now.clone(),
        last_seen: now,
      },
    );
    tracing::info!(peer = %url, "new node identified");
    true
  }

  pub async fn snapshot(&self) -> HashMap<String, PeerInfo> {
    self.peers.read().await.clone()
  }

  pub async fn is_empty(&self) -> bool {
    self.peers.read().await.is_empty()
  }

  /// Peer URLs ordered by reputation descending. The URL tie-break keeps the
  /// order deterministic within a cycle.
  pub async fn sorted_by_reputation(&self) -> Vec<String> {
    let peers = self.peers.read().await;
    let mut entries: Vec<(&String, f64)> = peers
      .iter()
      .map(|(url, info)| (url, info.reputation))
      .collect();
    entries.sort_by(|a, b| {
      b.1
        .partial_cmp(&a.1)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.0.cmp(b.0))
    });
    entries.into_iter().map(|(url, _)| url.clone()).collect()
  }

  /// Adjust reputation from a sync outcome: failures cost a flat penalty,
  /// uptime earns a trickle, new data earns log-scaled extra. Clamped to
  /// [0, 1].
  pub async fn apply_outcome(&self, peer_url: &str, outcome: &SyncOutcome) {
    let mut peers = self.peers.write().await;
    let Some(info) = peers.get_mut(peer_url) else {
      return;
    };
    let delta = match outcome {
      SyncOutcome::ConnectionFailed | SyncOutcome::SyncError => -self.config.penalty,
      SyncOutcome::UpToDate => self.config.reward_uptime,
      SyncOutcome::NewFacts(count) => {
        self.config.reward_uptime + ((1.0 + *count as f64).log10() * self.config.reward_new_data)
      }
    };
    info.reputation = (info.reputation + delta).clamp(0.0, 1.0);
  }

  pub async fn reputation_of(&self, peer_url: &str) -> Option<f64> {
    self.peers.read().await.get(peer_url).map(|p| p.reputation)
  }
}
