use std::sync::Arc;

use axiom_core::WireFact;
use axiom_worker::NodeContext;
use axum::http::HeaderMap;
use tokio::sync::Mutex;

/// The last inference hit list, retained so "show more" can page through the
/// remaining corroborating streams.
#[derive(Debug, Default)]
pub struct ThinkSession {
  pub hits: Vec<WireFact>,
  pub cursor: usize,
}

#[derive(Clone)]
pub struct AppState {
  pub ctx: Arc<NodeContext>,
  pub think_session: Arc<Mutex<Option<ThinkSession>>>,
}

impl AppState {
  #[must_use]
  pub fn new(ctx: Arc<NodeContext>) -> Self {
    Self {
      ctx,
      think_session: Arc::new(Mutex::new(None)),
    }
  }

  /// Register the calling node if it advertised itself. New peers get a
  /// delayed handshake sync in the background.
  pub async fn register_sync_caller(&self, headers: &HeaderMap) {
    let Some(caller) = headers
      .get("X-Axiom-Peer")
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
    else {
      return;
    };
    if self.ctx.peers.add_or_update(caller).await {
      axiom_worker::spawn_handshake(self.ctx.clone(), caller.trim_end_matches('/').to_owned());
    }
  }
}
