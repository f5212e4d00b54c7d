//! Static registry of subsystems and HTTP endpoints, backing the `axiom: map`
//! and `show endpoints` meta commands. Refreshed (trivially) by the hourly
//! idle task; the registry is the authoritative route table.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EndpointInfo {
  pub method: &'static str,
  pub path: &'static str,
  pub handler: &'static str,
}

pub const SUBSYSTEMS: &[(&str, &str)] = &[
  ("extractor", "sentence filters and fact extraction"),
  ("ledger", "relational store over facts, relationships, mesh, blocks"),
  ("chain", "block-structured ledger with longest-chain replacement"),
  ("synthesizer", "entity-overlap relationship linking"),
  ("mesh", "lexical atoms and typed synapses"),
  ("p2p", "peer discovery, fact and chain sync, reputation"),
  ("scheduler", "main ingestion cycle and throttled idle suite"),
  ("inference", "trust-ranked query answering"),
  ("metacognition", "integrity pruning and fragment audits"),
];

pub const ENDPOINT_REGISTRY: &[EndpointInfo] = &[
  EndpointInfo { method: "GET", path: "/local_query", handler: "local_query" },
  EndpointInfo { method: "GET", path: "/mesh_query", handler: "mesh_query" },
  EndpointInfo { method: "GET", path: "/get_peers", handler: "get_peers" },
  EndpointInfo { method: "GET", path: "/get_chain_head", handler: "get_chain_head" },
  EndpointInfo { method: "GET", path: "/get_blocks_after", handler: "get_blocks_after" },
  EndpointInfo { method: "GET", path: "/get_fact_ids", handler: "get_fact_ids" },
  EndpointInfo { method: "POST", path: "/get_facts_by_id", handler: "get_facts_by_id" },
  EndpointInfo { method: "GET", path: "/think", handler: "think" },
  EndpointInfo { method: "GET", path: "/fragment_opinion", handler: "fragment_opinion" },
  EndpointInfo { method: "GET", path: "/debug/idle_state", handler: "idle_state" },
];

#[must_use]
pub fn system_map_summary() -> String {
  let names: Vec<&str> = SUBSYSTEMS.iter().map(|(name, _)| *name).collect();
  format!(
    "I currently run {} subsystems. Key components include: {}.",
    SUBSYSTEMS.len(),
    names.join(", ")
  )
}

#[must_use]
pub fn endpoints_summary() -> String {
  let lines: Vec<String> = ENDPOINT_REGISTRY
    .iter()
    .map(|ep| format!("{} {} -> {}", ep.method, ep.path, ep.handler))
    .collect();
  format!("Exposed HTTP endpoints:\n{}", lines.join("\n"))
}
