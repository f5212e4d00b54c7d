use axiom_shared::AppError;
use axum::{Json, extract::State, http::HeaderMap};

use crate::utils::AppState;

/// The caller-visible peer table with reputations
#[utoipa::path(
  get,
  path = "/get_peers",
  responses((status = 200, description = "Known peers keyed by URL"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub async fn get_peers(
  State(state): State<AppState>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
  state.register_sync_caller(&headers).await;
  let peers = state.ctx.peers.snapshot().await;
  Ok(Json(serde_json::json!({ "peers": peers })))
}
