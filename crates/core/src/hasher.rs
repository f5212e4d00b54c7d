use serde::Serialize;
use sha2::{Digest, Sha256};

/// Identity of a fact: sha256 over the canonical UTF-8 content, lowercase hex.
/// Hashing always happens on the decompressed text — hashing compressed bytes
/// would tie identity to compressor output.
#[must_use]
pub fn fact_id(content: &str) -> String {
  hex::encode(Sha256::digest(content.as_bytes()))
}

/// Canonical block payload for hashing. Keys sorted, no whitespace, fact ids
/// sorted lexicographically. Any deviation makes peers disagree on block
/// identity.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
  created_at_utc: &'a str,
  fact_ids: Vec<&'a str>,
  height: i64,
  previous: &'a str,
}

#[must_use]
pub fn block_payload(
  previous_block_id: &str,
  height: i64,
  created_at_utc: &str,
  fact_ids: &[String],
) -> String {
  let mut sorted: Vec<&str> = fact_ids.iter().map(String::as_str).collect();
  sorted.sort_unstable();
  let canonical = CanonicalBlock {
    created_at_utc,
    fact_ids: sorted,
    height,
    previous: previous_block_id,
  };
  serde_json::to_string(&canonical).expect("canonical block payload serializes")
}

#[must_use]
pub fn block_id(
  previous_block_id: &str,
  height: i64,
  created_at_utc: &str,
  fact_ids: &[String],
) -> String {
  let payload = block_payload(previous_block_id, height, created_at_utc, fact_ids);
  hex::encode(Sha256::digest(payload.as_bytes()))
}
