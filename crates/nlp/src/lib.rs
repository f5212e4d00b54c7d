mod types;
pub use types::{NamedEntity, ParsedSentence, ParsedToken};

mod engine;
pub use engine::{HttpNlpEngine, NlpEngine};

mod stub;
pub use stub::{SentenceBuilder, StubNlp};
