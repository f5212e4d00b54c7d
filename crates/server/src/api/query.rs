use axiom_core::{mesh, search};
use axiom_shared::AppError;
use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
};
use serde::Deserialize;

use crate::utils::AppState;

fn is_true(raw: Option<&str>) -> bool {
  raw.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[derive(Debug, Deserialize)]
pub struct LocalQueryParams {
  #[serde(default)]
  term: String,
  include_uncorroborated: Option<String>,
}

/// Search the local ledger for facts containing the term
#[utoipa::path(
  get,
  path = "/local_query",
  params(
    ("term" = String, Query, description = "Substring to search for"),
    ("include_uncorroborated" = Option<String>, Query, description = "Include uncorroborated facts")
  ),
  responses((status = 200, description = "Matching facts, disputed excluded"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub async fn local_query(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<LocalQueryParams>,
) -> Result<Json<serde_json::Value>, AppError> {
  state.register_sync_caller(&headers).await;
  let results = search::search_ledger(
    &state.ctx.db,
    &params.term,
    is_true(params.include_uncorroborated.as_deref()),
    false,
  )
  .await?;
  Ok(Json(serde_json::json!({ "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct MeshQueryParams {
  term: Option<String>,
}

/// Navigate the synapses of the lexical mesh around one word
#[utoipa::path(
  get,
  path = "/mesh_query",
  params(("term" = String, Query, description = "Word to look up")),
  responses(
    (status = 200, description = "Atom properties and strongest associations"),
    (status = 400, description = "Missing term")
  )
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state))]
pub async fn mesh_query(
  State(state): State<AppState>,
  Query(params): Query<MeshQueryParams>,
) -> Result<Json<serde_json::Value>, AppError> {
  let Some(term) = params.term.filter(|t| !t.trim().is_empty()) else {
    return Err(AppError::with_status(
      StatusCode::BAD_REQUEST,
      anyhow::anyhow!("missing term"),
    ));
  };
  let view = mesh::query_mesh(&state.ctx.db, term.trim()).await?;
  Ok(Json(serde_json::to_value(view)?))
}
