use axiom_core::chain;
use axiom_shared::AppError;
use axum::{
  Json,
  extract::{Query, State},
  http::HeaderMap,
};
use serde::Deserialize;

use crate::utils::AppState;

/// Current chain tip
#[utoipa::path(
  get,
  path = "/get_chain_head",
  responses((status = 200, description = "block_id and height; height -1 when no chain"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub async fn get_chain_head(
  State(state): State<AppState>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
  state.register_sync_caller(&headers).await;
  match chain::chain_head(&state.ctx.db).await? {
    Some((block_id, height)) => Ok(Json(
      serde_json::json!({ "block_id": block_id, "height": height }),
    )),
    None => Ok(Json(serde_json::json!({ "block_id": null, "height": -1 }))),
  }
}

#[derive(Debug, Deserialize)]
pub struct BlocksAfterParams {
  height: Option<i64>,
}

/// Blocks above a height, ascending
#[utoipa::path(
  get,
  path = "/get_blocks_after",
  params(("height" = i64, Query, description = "Exclusive lower height bound")),
  responses((status = 200, description = "Blocks with height > bound"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub async fn get_blocks_after(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<BlocksAfterParams>,
) -> Result<Json<serde_json::Value>, AppError> {
  state.register_sync_caller(&headers).await;
  let blocks = chain::get_blocks_after(&state.ctx.db, params.height.unwrap_or(-1)).await?;
  Ok(Json(serde_json::json!({ "blocks": blocks })))
}
