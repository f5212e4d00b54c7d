use axiom_shared::AppError;
use axum::{Json, extract::State};
use chrono::Utc;

use crate::utils::AppState;

fn age(now: i64, ts: Option<i64>) -> Option<i64> {
  ts.map(|t| (now - t).max(0))
}

/// Idle scheduling introspection for debugging
#[utoipa::path(
  get,
  path = "/debug/idle_state",
  responses((status = 200, description = "Scheduler intervals, last-run ages, cached idle results"))
)]
#[axum::debug_handler]
#[tracing::instrument(skip(state))]
pub async fn idle_state(
  State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
  let config = &state.ctx.config;
  let idle = state.ctx.idle.read().await;
  let now = Utc::now().timestamp();
  Ok(Json(serde_json::json!({
    "node_port": config.port,
    "node_role": config.node_role,
    "advertised_url": config.advertised_url,
    "db_path": config.db_path,
    "main_cycle_interval_sec": config.main_cycle_interval.as_secs(),
    "idle_suite_interval_sec": config.idle_suite_interval.as_secs(),
    "last_main_cycle_age_sec": age(now, idle.last_main_cycle_ts),
    "last_idle_learning_age_sec": age(now, idle.last_learning_ts),
    "last_code_introspection_age_sec": age(now, idle.last_code_introspection_ts),
    "last_data_quality_age_sec": age(now, idle.last_data_quality_ts),
    "last_health_snapshot_age_sec": age(now, idle.last_health_snapshot_ts),
    "last_self_check_age_sec": age(now, idle.last_self_check_ts),
    "last_fragment_audit_age_sec": age(now, idle.last_fragment_audit_ts),
    "duplicate_groups": idle.duplicate_groups,
    "conflict_groups": idle.conflict_groups,
    "health": idle.health,
    "self_check_results": idle.self_check_results,
  })))
}
