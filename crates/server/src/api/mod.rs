use axum::{
  Json, Router,
  routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::utils::AppState;

mod chain;
mod debug;
mod facts;
mod peers;
mod query;
mod think;

pub use facts::GetFactsById;

#[derive(OpenApi)]
#[openapi(
  info(
    title = "Axiom Node API",
    version = "0.1.0",
    description = "Intra-mesh and client endpoints of one Axiom node"
  ),
  paths(
    query::local_query,
    query::mesh_query,
    peers::get_peers,
    chain::get_chain_head,
    chain::get_blocks_after,
    facts::get_fact_ids,
    facts::get_facts_by_id,
    facts::fragment_opinion,
    think::think,
    debug::idle_state
  ),
  components(schemas(
    GetFactsById,
    axiom_core::WireFact,
    axiom_core::FactStatus,
    axiom_core::FragmentState,
    axiom_core::Block,
    axiom_core::FragmentOpinion,
    axiom_core::HealthSnapshot,
    axiom_p2p::PeerInfo,
    axiom_worker::IdleTelemetry,
    axiom_worker::SelfCheckResult,
  ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
  Json(ApiDoc::openapi())
}

pub fn app() -> Router<AppState> {
  Router::new()
    .route("/local_query", get(query::local_query))
    .route("/mesh_query", get(query::mesh_query))
    .route("/get_peers", get(peers::get_peers))
    .route("/get_chain_head", get(chain::get_chain_head))
    .route("/get_blocks_after", get(chain::get_blocks_after))
    .route("/get_fact_ids", get(facts::get_fact_ids))
    .route("/get_facts_by_id", post(facts::get_facts_by_id))
    .route("/think", get(think::think))
    .route("/fragment_opinion", get(facts::fragment_opinion))
    .route("/debug/idle_state", get(debug::idle_state))
    .route("/openapi.json", get(openapi_json))
    .merge(Scalar::with_url("/openapi/", ApiDoc::openapi()))
}
