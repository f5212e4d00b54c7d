use axiom_core::{Fact, FactStatus, FragmentOpinion, FragmentState, WireFact, ledger};
use axiom_shared::AppError;
use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::utils::AppState;

/// Every fact id this node holds
#[utoipa::path(
  get,
  path = "/get_fact_ids",
  responses((status = 200, description = "All local fact ids"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub async fn get_fact_ids(
  State(state): State<AppState>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
  state.register_sync_caller(&headers).await;
  let fact_ids = ledger::get_all_fact_ids(&state.ctx.db).await?;
  Ok(Json(serde_json::json!({ "fact_ids": fact_ids })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GetFactsById {
  #[serde(default)]
  pub fact_ids: Vec<String>,
}

/// Bulk fact fetch for peer sync; content travels decompressed
#[utoipa::path(
  post,
  path = "/get_facts_by_id",
  request_body = GetFactsById,
  responses((status = 200, description = "Requested facts in wire form"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers, payload), fields(requested = payload.fact_ids.len()))]
pub async fn get_facts_by_id(
  State(state): State<AppState>,
  headers: HeaderMap,
  Json(payload): Json<GetFactsById>,
) -> Result<Json<serde_json::Value>, AppError> {
  state.register_sync_caller(&headers).await;
  let models = ledger::get_facts_by_ids(&state.ctx.db, &payload.fact_ids).await?;
  let facts: Vec<WireFact> = models
    .into_iter()
    .filter_map(|model| Fact::from_model(model).ok())
    .map(|fact| WireFact::from(&fact))
    .collect();
  Ok(Json(serde_json::json!({ "facts": facts })))
}

#[derive(Debug, Deserialize)]
pub struct FragmentOpinionParams {
  fact_id: Option<String>,
}

/// This node's opinion about one fact's fragment status
#[utoipa::path(
  get,
  path = "/fragment_opinion",
  params(("fact_id" = String, Query, description = "Fact to give an opinion on")),
  responses(
    (status = 200, body = FragmentOpinion),
    (status = 400, description = "Missing fact_id")
  )
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state, headers))]
pub async fn fragment_opinion(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<FragmentOpinionParams>,
) -> Result<Json<FragmentOpinion>, AppError> {
  state.register_sync_caller(&headers).await;
  let Some(fact_id) = params.fact_id.filter(|id| !id.trim().is_empty()) else {
    return Err(AppError::with_status(
      StatusCode::BAD_REQUEST,
      anyhow::anyhow!("missing fact_id"),
    ));
  };

  let Some(model) = ledger::get_fact(&state.ctx.db, fact_id.trim()).await? else {
    return Ok(Json(FragmentOpinion::unseen()));
  };
  Ok(Json(FragmentOpinion {
    seen: true,
    status: model.status.parse::<FactStatus>().ok(),
    trust_score: Some(f64::from(model.trust_score)),
    fragment_state: Some(
      model
        .fragment_state
        .parse()
        .unwrap_or(FragmentState::Unknown),
    ),
    fragment_score: Some(model.fragment_score),
  }))
}
