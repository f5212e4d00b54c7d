use axiom_core::HealthSnapshot;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SelfCheckResult {
  pub query: String,
  pub ok: bool,
  pub missing_keywords: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Last-run bookkeeping for the idle suite, exposed via `/debug/idle_state`.
/// Timestamps are UTC epoch seconds; the endpoint reports ages.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct IdleTelemetry {
  pub last_main_cycle_ts: Option<i64>,
  pub last_learning_ts: Option<i64>,
  pub last_code_introspection_ts: Option<i64>,
  pub last_data_quality_ts: Option<i64>,
  pub last_health_snapshot_ts: Option<i64>,
  pub last_self_check_ts: Option<i64>,
  pub last_fragment_audit_ts: Option<i64>,
  pub duplicate_groups: usize,
  pub conflict_groups: usize,
  pub health: Option<HealthSnapshot>,
  pub self_check_results: Vec<SelfCheckResult>,
}
