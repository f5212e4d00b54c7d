mod hasher;
pub use hasher::{block_id, block_payload, fact_id};

mod compress;
pub use compress::{compress, decompress, is_zlib};

mod fact;
pub use fact::{Fact, FactStatus, FragmentMeta, FragmentState, WireFact, utc_now_iso};

pub mod ledger;
pub use ledger::InsertOutcome;

pub mod chain;
pub use chain::Block;

mod indicators;
pub use indicators::{IGNORED_ENTITIES, QUALIFYING_ENTITY_LABELS, SUBJECTIVITY_INDICATORS};

pub mod extractor;

pub mod synthesizer;

pub mod mesh;

pub mod inference;
pub use inference::ThinkResult;

pub mod search;

pub mod meta;
pub use meta::FragmentOpinion;

pub mod quality;

pub mod health;
pub use health::HealthSnapshot;

pub mod conversation;
pub use conversation::ConversationPattern;

pub mod introspection;

#[cfg(test)]
pub(crate) mod test_support;
