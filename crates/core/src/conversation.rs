//! Rule-based conversational routing for `/think`: slot templates compiled to
//! regexes during idle, matched ahead of the inference path.

use std::sync::LazyLock;

use regex::Regex;

fn normalize(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Lightweight pattern for fast command → response matching. `<slot>` in the
/// template becomes a non-greedy capture; literal text is escaped.
#[derive(Debug, Clone)]
pub struct ConversationPattern {
  pub raw_template: String,
  pub response: String,
  pub weight: f64,
  regex: Option<Regex>,
}

impl ConversationPattern {
  #[must_use]
  pub fn new(raw_template: &str, response: &str, weight: f64) -> Self {
    Self {
      raw_template: raw_template.to_owned(),
      response: response.to_owned(),
      weight,
      regex: None,
    }
  }

  pub fn compile(&mut self) {
    let mut pattern = String::new();
    let mut rest = self.raw_template.as_str();
    while let Some(start) = rest.find('<') {
      pattern.push_str(&regex::escape(&rest[..start]));
      match rest[start..].find('>') {
        Some(offset) => {
          pattern.push_str("(.+?)");
          rest = &rest[start + offset + 1..];
        }
        None => {
          pattern.push_str(&regex::escape(&rest[start..]));
          rest = "";
        }
      }
    }
    pattern.push_str(&regex::escape(rest));
    // Allow any run of whitespace wherever the template has a single space.
    let pattern = pattern.replace("\\ ", "\\s+").replace(' ', "\\s+");
    self.regex = Regex::new(&format!("(?i)^{pattern}$")).ok();
  }

  #[must_use]
  pub const fn is_compiled(&self) -> bool {
    self.regex.is_some()
  }
}

static SHOW_MORE_PHRASES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
  vec![
    "show me more",
    "show more",
    "tell me more",
    "what else",
    "more streams",
    "more corroboration",
    "other streams",
    "other corroboration",
    "more",
  ]
});

/// Does this query ask to page through the previous answer's streams?
/// Multi-word phrases match anywhere; the bare "more" only as the whole query.
#[must_use]
pub fn is_show_more(query: &str) -> bool {
  let normalized = normalize(query);
  let normalized = normalized.trim_end_matches(['.', '?', '!']);
  SHOW_MORE_PHRASES.iter().any(|phrase| {
    if phrase.contains(' ') {
      normalized.contains(phrase)
    } else {
      normalized == *phrase
    }
  })
}

/// Ledger-independent seed patterns compiled incrementally during idle.
#[must_use]
pub fn seed_patterns() -> Vec<ConversationPattern> {
  vec![
    ConversationPattern::new(
      "help",
      "I am Axiom. Ask me about current events or my internal engines. Try: 'explain the extractor' or 'what is the lexical mesh'.",
      1.5,
    ),
    ConversationPattern::new(
      "what can you do",
      "I continuously ingest public feeds, extract facts, cross-corroborate them, commit them to a replicated chain, and answer queries from that distilled knowledge.",
      1.5,
    ),
    ConversationPattern::new(
      "explain the extractor",
      "The extractor ingests raw text, keeps only grounded declarative sentences, and feeds them into the ledger and the lexical mesh.",
      2.0,
    ),
    ConversationPattern::new(
      "what is the lexical mesh",
      "The lexical mesh is a semantic layer grown from facts: word atoms and typed synapses that support fast association queries.",
      2.0,
    ),
    ConversationPattern::new(
      "what is axiom",
      "Axiom is an always-on knowledge node that ingests, verifies, and replicates facts instead of waiting for prompts.",
      2.0,
    ),
    ConversationPattern::new(
      "who are you",
      "I am the Axiom node you are connected to. I maintain a fact ledger and respond from that evolving state.",
      1.2,
    ),
    ConversationPattern::new(
      "what is <topic>",
      "You asked for a definition. I will consult my ledger for grounded records on that subject.",
      1.0,
    ),
    ConversationPattern::new(
      "tell me about <topic>",
      "You want an overview. I can answer from my current knowledge and ongoing ingestion cycles.",
      1.0,
    ),
    ConversationPattern::new(
      "how does <system> work",
      "You are asking how one of my subsystems operates. I can describe its components and how they interact.",
      1.0,
    ),
    ConversationPattern::new("axiom: status", "Reporting my current internal health and ledger status.", 2.0),
    ConversationPattern::new("show health", "Summarizing my current system and ledger health.", 1.5),
    ConversationPattern::new("axiom: map", "Describing my core modules and subsystems.", 1.5),
    ConversationPattern::new("list modules", "Listing key modules and subsystems that make up Axiom.", 1.5),
    ConversationPattern::new("show endpoints", "Listing HTTP endpoints I currently expose.", 1.5),
  ]
}

/// Try to match a query against known patterns. Deterministic scoring: exact
/// normalized match 1.0·w, regex match 0.8·w, containment (slot-free
/// templates only) 0.7·w; accepted at 0.6.
#[must_use]
pub fn match_query(query: &str, patterns: &[ConversationPattern]) -> Option<String> {
  const MIN_SCORE: f64 = 0.6;
  let q_norm = normalize(query);
  if q_norm.is_empty() || patterns.is_empty() {
    return None;
  }

  let mut best_score = 0.0;
  let mut best_response = None;
  for pattern in patterns {
    let base = if pattern.weight > 0.0 { pattern.weight } else { 1.0 };
    let template_norm = normalize(&pattern.raw_template);

    let score = if q_norm == template_norm {
      1.0 * base
    } else if pattern.regex.as_ref().is_some_and(|r| r.is_match(query.trim())) {
      0.8 * base
    } else if !pattern.raw_template.contains('<')
      && !template_norm.is_empty()
      && q_norm.contains(&template_norm)
    {
      0.7 * base
    } else {
      0.0
    };

    if score > best_score {
      best_score = score;
      best_response = Some(pattern.response.clone());
    }
  }

  if best_score >= MIN_SCORE { best_response } else { None }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn compiled() -> Vec<ConversationPattern> {
    let mut patterns = seed_patterns();
    for p in &mut patterns {
      p.compile();
    }
    patterns
  }

  #[test]
  fn normalized_and_containment_matches_resolve() {
    let patterns = compiled();
    // Exact after whitespace/case normalization.
    let answer = match_query("  what CAN you   do", &patterns).unwrap();
    assert!(answer.contains("ingest"));
    // Containment on a slot-free template.
    let answer = match_query("please show health now", &patterns).unwrap();
    assert!(answer.contains("health"));
  }

  #[test]
  fn slot_templates_match_through_the_regex() {
    let patterns = compiled();
    let answer = match_query("what is the Dead Sea", &patterns).unwrap();
    assert!(answer.contains("definition"));
    let answer = match_query("how does the chain replica work", &patterns).unwrap();
    assert!(answer.contains("subsystems"));
  }

  #[test]
  fn unrelated_queries_fall_through_to_inference() {
    let patterns = compiled();
    assert!(match_query("latest on the Kyoto accord ratification", &patterns).is_none());
  }

  #[test]
  fn show_more_phrases_are_recognized() {
    assert!(is_show_more("show more"));
    assert!(is_show_more("Tell me more."));
    assert!(is_show_more("what else?"));
    assert!(!is_show_more("more about Kyoto"));
  }
}
