use axiom_core::{WireFact, conversation, inference, introspection};
use axiom_shared::AppError;
use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

use crate::utils::{AppState, ThinkSession};

const STREAM_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ThinkParams {
  #[serde(default)]
  query: String,
}

/// Free-text query over the distilled ledger
#[utoipa::path(
  get,
  path = "/think",
  params(("query" = String, Query, description = "Natural language query")),
  responses((status = 200, description = "Answer text; grounding failures are descriptive, not errors"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state))]
pub async fn think(
  State(state): State<AppState>,
  Query(params): Query<ThinkParams>,
) -> Result<Json<serde_json::Value>, AppError> {
  let query = params.query.trim();
  if query.is_empty() {
    return Ok(respond("System standby. Awaiting input."));
  }

  // Macro-style meta commands that never touch the ledger.
  let normalized = query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
  match normalized.as_str() {
    "axiom: status" | "show health" => {
      return Ok(respond(&health_summary(&state).await));
    }
    "axiom: map" | "list modules" => {
      return Ok(respond(&introspection::system_map_summary()));
    }
    "show endpoints" => {
      return Ok(respond(&introspection::endpoints_summary()));
    }
    _ => {}
  }

  if conversation::is_show_more(query) {
    return Ok(respond(&next_stream_page(&state).await));
  }

  // Fast, non-ledger conversational routing next.
  {
    let patterns = state.ctx.patterns.read().await;
    if let Some(answer) = conversation::match_query(query, &patterns) {
      return Ok(respond(&answer));
    }
  }

  let result = inference::think(state.ctx.nlp.as_ref(), &state.ctx.db, query).await?;
  *state.think_session.lock().await = Some(ThinkSession {
    hits: result.hits,
    cursor: 1,
  });
  Ok(respond(&result.response))
}

fn respond(text: &str) -> Json<serde_json::Value> {
  Json(serde_json::json!({ "response": text }))
}

async fn health_summary(state: &AppState) -> String {
  let config = &state.ctx.config;
  let idle = state.ctx.idle.read().await;
  let Some(health) = &idle.health else {
    return "Health snapshot is not ready yet. Idle health checks will compute it.".to_owned();
  };
  let mut parts = vec![
    format!(
      "Node {} ({} node) at {}.",
      config.port, config.node_role, config.advertised_url
    ),
    format!(
      "Facts: {}, Blocks: {}, Chain height: {}.",
      health.total_facts, health.total_blocks, health.chain_height
    ),
    format!("Status counts: {:?}.", health.status_counts),
  ];
  if let Some(avg) = health.avg_trust_score {
    parts.push(format!("Average trust score: {avg:.3}."));
  }
  parts.join(" ")
}

fn format_stream_entry(index: usize, hit: &WireFact) -> String {
  let mut content = hit.fact_content.trim().to_owned();
  if content.chars().count() > 200 {
    content = content.chars().take(197).collect::<String>() + "...";
  }
  let source: String = hit.source_url.chars().take(60).collect();
  format!(
    "  [{index}] ({}, trust {})\n  \"{content}\"\n  Source: {source}",
    hit.status, hit.trust_score
  )
}

async fn next_stream_page(state: &AppState) -> String {
  let mut session = state.think_session.lock().await;
  let Some(session) = session.as_mut() else {
    return "No previous query to expand. Ask me something first.".to_owned();
  };
  if session.cursor >= session.hits.len() {
    return "No further corroborated streams for the last query.".to_owned();
  }
  let upper = (session.cursor + STREAM_PAGE_SIZE).min(session.hits.len());
  let entries: Vec<String> = session.hits[session.cursor..upper]
    .iter()
    .enumerate()
    .map(|(offset, hit)| format_stream_entry(session.cursor + offset + 1, hit))
    .collect();
  let remaining = session.hits.len() - upper;
  session.cursor = upper;

  let mut response = format!("Corroborating streams:\n{}", entries.join("\n"));
  if remaining > 0 {
    response.push_str(&format!("\n({remaining} more; say \"show more\" again.)"));
  }
  response
}
