//! The ingestion pipeline: raw article text in, persisted candidate facts out.
//! Every filter short-circuits; a sentence that survives them all is hashed,
//! fragment-scored, and inserted as `uncorroborated`.

use std::sync::LazyLock;

use axiom_nlp::{NlpEngine, ParsedSentence};
use axiom_shared::{AxiomError, source_domain};
use regex::Regex;
use sea_orm::DatabaseConnection;

use crate::{
  Fact, FactStatus, FragmentMeta, FragmentState, QUALIFYING_ENTITY_LABELS,
  SUBJECTIVITY_INDICATORS, decompress, fact_id,
  fact::utc_now_iso,
  ledger::{self, InsertOutcome},
};

const MIN_SENTENCE_CHARS: usize = 25;
const MAX_SENTENCE_CHARS: usize = 400;
const MIN_SENTENCE_WORDS: usize = 8;
const MAX_SENTENCE_WORDS: usize = 100;
const CORROBORATION_PREFIX_CHARS: usize = 60;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("regex"));
static READ_MORE_TRAILER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)read more.*").expect("regex"));
static YEAR_RUN_ON: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(\d{4})([A-Z])").expect("regex"));

/// Clean up text before NLP processing: strip markup, collapse whitespace,
/// drop boilerplate trailers, and split run-on sentences where a year butts
/// against a capitalized word.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
  let text = HTML_TAG.replace_all(text, "");
  let text = YEAR_RUN_ON.replace_all(&text, "${1}. ${2}");
  let text = WHITESPACE.replace_all(text.trim(), " ");
  READ_MORE_TRAILER.replace_all(&text, "").trim().to_owned()
}

fn contains_subjectivity(text: &str) -> bool {
  let lower = text.to_lowercase();
  let tokens: Vec<&str> = lower
    .split_whitespace()
    .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation() && c != '-' && c != '\''))
    .collect();
  SUBJECTIVITY_INDICATORS.iter().any(|indicator| {
    if indicator.contains(' ') {
      lower.contains(indicator)
    } else {
      tokens.contains(indicator)
    }
  })
}

fn starts_first_person(text: &str) -> bool {
  let lower = text.to_lowercase();
  ["i ", "we ", "my ", "our "]
    .iter()
    .any(|p| lower.starts_with(p))
}

/// Compact structural fingerprint: `subject_lemma|root_verb_lemma|LABELS`
/// with entity labels sorted.
#[must_use]
pub fn adl_summary(sentence: &ParsedSentence) -> String {
  let subject = sentence
    .subject_lemma()
    .unwrap_or_else(|| "UNK_SUBJ".to_owned());
  let root = sentence
    .root_lemma()
    .unwrap_or_else(|| "UNK_ROOT".to_owned());
  let mut labels: Vec<&str> = sentence
    .entities_in(QUALIFYING_ENTITY_LABELS)
    .iter()
    .map(|e| e.label.as_str())
    .collect();
  labels.sort_unstable();
  format!("{subject}|{root}|{}", labels.join("_"))
}

const PRONOUN_STARTS: &[&str] = &[
  "he ", "she ", "they ", "it ", "this ", "that ", "these ", "those ",
];

/// Deterministic fragment scoring; no model inference beyond the provided
/// parse.
#[must_use]
pub fn fragment_metadata(sentence: &ParsedSentence) -> FragmentMeta {
  let text = sentence.text.trim();
  if text.is_empty() {
    return FragmentMeta {
      state: FragmentState::ConfirmedFragment,
      score: 1.0,
      reason: Some("empty".to_owned()),
    };
  }

  let word_count = sentence.word_count();
  let lower = text.to_lowercase();
  let mut score: f64 = 0.0;
  let mut reasons = Vec::new();

  if word_count <= 8 {
    score += 0.6;
    reasons.push("short_sentence");
  } else if word_count <= 12 {
    score += 0.3;
    reasons.push("moderately_short");
  }
  if sentence.entities_in(QUALIFYING_ENTITY_LABELS).is_empty() {
    score += 0.25;
    reasons.push("no_named_entities");
  }
  if PRONOUN_STARTS.iter().any(|p| lower.starts_with(p)) {
    score += 0.25;
    reasons.push("pronoun_start");
  }
  if !text.ends_with(['.', '!', '?']) {
    score += 0.15;
    reasons.push("nonterminal_punctuation");
  }
  if text.chars().next().is_some_and(char::is_lowercase) {
    score += 0.1;
    reasons.push("lowercase_start");
  }

  let score = score.clamp(0.0, 1.0);
  FragmentMeta {
    state: if score >= 0.5 {
      FragmentState::SuspectedFragment
    } else {
      FragmentState::Unknown
    },
    score,
    reason: if reasons.is_empty() {
      None
    } else {
      Some(reasons.join(","))
    },
  }
}

/// Structural digest of an existing fact used by the contradiction probe.
struct ProbeEntry {
  fact_id: String,
  subject: String,
  root: String,
  negated: bool,
}

/// Analyze text from one source and persist every sentence that survives the
/// filter chain. Returns the newly created facts.
pub async fn extract_facts_from_text(
  nlp: &dyn NlpEngine,
  db: &DatabaseConnection,
  source_url: &str,
  raw_text: &str,
  required_domains: u32,
) -> Result<Vec<Fact>, AxiomError> {
  tracing::debug!(source = %source_url, "analyzing content");

  let text = sanitize_text(raw_text);
  if text.is_empty() {
    return Ok(Vec::new());
  }

  let existing = ledger::get_facts_for_analysis(db).await?;
  let new_domain = source_domain(source_url);

  // Decompress and structurally digest the ledger once per call; the
  // contradiction probe compares every sentence against all of it.
  let mut probe_entries = Vec::new();
  let mut corroboration_pool = Vec::new();
  for model in &existing {
    let Ok(content) = decompress(&model.fact_content) else {
      continue;
    };
    if model.status != FactStatus::Disputed.to_string() {
      if let Some(first) = nlp.parse(&content).await?.into_iter().next() {
        probe_entries.push(ProbeEntry {
          fact_id: model.fact_id.clone(),
          subject: first.subject_lemma().unwrap_or_default(),
          root: first.root_lemma().unwrap_or_default(),
          negated: first.has_negation,
        });
      }
    }
    corroboration_pool.push((
      model.fact_id.clone(),
      source_domain(&model.source_url),
      content.to_lowercase(),
    ));
  }

  let mut created = Vec::new();
  let mut contradictions = 0;

  'sentences: for sentence in nlp.parse(&text).await? {
    let raw = sentence.text.trim();
    let chars = raw.chars().count();
    if !(MIN_SENTENCE_CHARS..=MAX_SENTENCE_CHARS).contains(&chars) {
      continue;
    }
    let words = sentence.word_count();
    if !(MIN_SENTENCE_WORDS..=MAX_SENTENCE_WORDS).contains(&words) {
      continue;
    }
    if starts_first_person(raw) || contains_subjectivity(raw) {
      continue;
    }
    if sentence.entities_in(QUALIFYING_ENTITY_LABELS).is_empty() {
      continue;
    }
    if !sentence.has_nominal_subject() || !sentence.has_verb() {
      continue;
    }

    let new_id = fact_id(raw);
    let subject = sentence.subject_lemma().unwrap_or_default();
    let root = sentence.root_lemma().unwrap_or_default();

    // Same subject and root, opposite negation parity: both parties dispute.
    for entry in &probe_entries {
      if !entry.subject.is_empty()
        && entry.subject == subject
        && entry.root == root
        && entry.negated != sentence.has_negation
      {
        ledger::mark_disputed(db, &entry.fact_id, &new_id, Some(raw), Some(source_url)).await?;
        contradictions += 1;
        continue 'sentences;
      }
    }

    // An existing fact with the same 60-char prefix from a different domain
    // is the same fact seen elsewhere: corroborate instead of inserting.
    let prefix: String = raw.to_lowercase().chars().take(CORROBORATION_PREFIX_CHARS).collect();
    for (existing_id, domain, content_lower) in &corroboration_pool {
      if domain != &new_domain && content_lower.starts_with(&prefix) {
        ledger::corroborate(db, existing_id, source_url, required_domains).await?;
        continue 'sentences;
      }
    }

    let fact = Fact {
      fact_id: new_id,
      content: raw.to_owned(),
      source_url: source_url.to_owned(),
      ingest_timestamp_utc: utc_now_iso(),
      trust_score: 1,
      status: FactStatus::Uncorroborated,
      corroborating_sources: Vec::new(),
      contradicts_fact_id: None,
      lexically_processed: false,
      adl_summary: adl_summary(&sentence),
      fragment: fragment_metadata(&sentence),
    };
    if ledger::insert_candidate_fact(db, &fact).await? == InsertOutcome::Created {
      created.push(fact);
    }
  }

  if contradictions > 0 {
    tracing::info!(contradictions, "analysis found contradictions");
  }
  if created.is_empty() {
    tracing::debug!("analysis complete, no high-confidence facts extracted");
  } else {
    tracing::info!(count = created.len(), "created new facts");
  }
  Ok(created)
}

#[cfg(test)]
mod tests {
  use axiom_nlp::{SentenceBuilder, StubNlp};

  use super::*;
  use crate::test_support::test_db;

  fn qualifying(text: &str) -> axiom_nlp::ParsedSentence {
    SentenceBuilder::new(text)
      .declarative("committee", "approve")
      .entity("Geneva", "GPE")
      .build()
  }

  #[test]
  fn sanitize_strips_markup_and_fixes_run_ons() {
    let cleaned = sanitize_text("<p>The  pact was\nsigned in 2023Leaders met.</p> Read more at example.com");
    assert_eq!(cleaned, "The pact was signed in 2023. Leaders met.");
  }

  #[test]
  fn adl_is_subject_root_and_sorted_labels() {
    let sentence = SentenceBuilder::new("The committee approved the Geneva accord.")
      .declarative("committee", "approve")
      .entity("Geneva", "GPE")
      .entity("Accord Council", "ORG")
      .build();
    assert_eq!(adl_summary(&sentence), "committee|approve|GPE_ORG");
  }

  #[test]
  fn fragment_scoring_follows_the_published_weights() {
    let stub = SentenceBuilder::new("he left").build();
    let meta = fragment_metadata(&stub);
    // short (0.6) + no entities (0.25) + pronoun (0.25) + punctuation (0.15)
    // + lowercase (0.1), clamped.
    assert_eq!(meta.score, 1.0);
    assert_eq!(meta.state, FragmentState::SuspectedFragment);

    let solid = qualifying("The committee approved the Geneva accord after months of talks.");
    let meta = fragment_metadata(&solid);
    assert!(meta.score < 0.5);
    assert_eq!(meta.state, FragmentState::Unknown);
  }

  #[tokio::test]
  async fn eight_words_with_one_entity_is_accepted_seven_rejected() {
    let db = test_db().await;
    let accepted = "The Geneva committee approved the accord on Tuesday.";
    let rejected = "Geneva committee approved the accord on Tuesday.";
    let nlp = StubNlp::new()
      .script(accepted, vec![qualifying(accepted)])
      .script(rejected, vec![qualifying(rejected)]);

    let created =
      extract_facts_from_text(&nlp, &db, "https://a.example/story", accepted, 100)
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].status, FactStatus::Uncorroborated);
    assert_eq!(created[0].fact_id, fact_id(accepted));

    let created =
      extract_facts_from_text(&nlp, &db, "https://b.example/story", rejected, 100)
        .await
        .unwrap();
    assert!(created.is_empty());
  }

  #[tokio::test]
  async fn subjective_and_first_person_sentences_are_rejected() {
    let db = test_db().await;
    let hedged = "The Geneva committee reportedly approved the accord on Tuesday.";
    let first_person = "We watched the Geneva committee approve the accord on Tuesday.";
    let nlp = StubNlp::new()
      .script(hedged, vec![qualifying(hedged)])
      .script(first_person, vec![qualifying(first_person)]);

    for text in [hedged, first_person] {
      let created = extract_facts_from_text(&nlp, &db, "https://a.example/story", text, 100)
        .await
        .unwrap();
      assert!(created.is_empty(), "{text:?} should be filtered");
    }
  }

  #[tokio::test]
  async fn missing_subject_or_entity_is_rejected() {
    let db = test_db().await;
    let no_entity = "The committee approved the measure late on Tuesday evening.";
    let no_subject = "Approved by the Geneva committee late on Tuesday evening.";
    let nlp = StubNlp::new()
      .script(
        no_entity,
        vec![SentenceBuilder::new(no_entity).declarative("committee", "approve").build()],
      )
      .script(
        no_subject,
        vec![
          SentenceBuilder::new(no_subject)
            .token("Approved", "approve", "VERB", "ROOT", "Approved")
            .entity("Geneva", "GPE")
            .build(),
        ],
      );

    for text in [no_entity, no_subject] {
      let created = extract_facts_from_text(&nlp, &db, "https://a.example/story", text, 100)
        .await
        .unwrap();
      assert!(created.is_empty(), "{text:?} should be filtered");
    }
  }

  #[tokio::test]
  async fn contradiction_disputes_both_parties() {
    let db = test_db().await;
    let positive = "The treaty entered into force on the first of June.";
    let negative = "The treaty did not enter into force on the first of June.";
    let nlp = StubNlp::new()
      .script(
        positive,
        vec![
          SentenceBuilder::new(positive)
            .declarative("treaty", "enter")
            .entity("June", "EVENT")
            .build(),
        ],
      )
      .script(
        negative,
        vec![
          SentenceBuilder::new(negative)
            .declarative("treaty", "enter")
            .entity("June", "EVENT")
            .negated()
            .build(),
        ],
      );

    let first = extract_facts_from_text(&nlp, &db, "https://a.example/story", positive, 100)
      .await
      .unwrap();
    assert_eq!(first.len(), 1);

    let second = extract_facts_from_text(&nlp, &db, "https://b.example/denial", negative, 100)
      .await
      .unwrap();
    assert!(second.is_empty());

    let a = Fact::from_model(ledger::get_fact(&db, &fact_id(positive)).await.unwrap().unwrap())
      .unwrap();
    let b = Fact::from_model(ledger::get_fact(&db, &fact_id(negative)).await.unwrap().unwrap())
      .unwrap();
    assert_eq!(a.status, FactStatus::Disputed);
    assert_eq!(b.status, FactStatus::Disputed);
    assert_eq!(a.contradicts_fact_id.as_deref(), Some(b.fact_id.as_str()));
    assert_eq!(b.contradicts_fact_id.as_deref(), Some(a.fact_id.as_str()));
  }

  #[tokio::test]
  async fn shared_prefix_from_another_domain_corroborates_instead_of_inserting() {
    let db = test_db().await;
    let original = "The Geneva committee approved the accord on Tuesday after months of talks.";
    let near_copy = "The Geneva committee approved the accord on Tuesday after months of debate.";
    let nlp = StubNlp::new()
      .script(original, vec![qualifying(original)])
      .script(near_copy, vec![qualifying(near_copy)]);

    extract_facts_from_text(&nlp, &db, "https://a.example/story", original, 2)
      .await
      .unwrap();
    let created = extract_facts_from_text(&nlp, &db, "https://b.example/wire", near_copy, 2)
      .await
      .unwrap();
    assert!(created.is_empty());

    let stored =
      Fact::from_model(ledger::get_fact(&db, &fact_id(original)).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.trust_score, 2);
    assert_eq!(stored.status, FactStatus::Trusted);
    assert_eq!(ledger::count_facts(&db).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn same_domain_near_copy_is_not_corroboration() {
    let db = test_db().await;
    let original = "The Geneva committee approved the accord on Tuesday after months of talks.";
    let near_copy = "The Geneva committee approved the accord on Tuesday after months of debate.";
    let nlp = StubNlp::new()
      .script(original, vec![qualifying(original)])
      .script(near_copy, vec![qualifying(near_copy)]);

    extract_facts_from_text(&nlp, &db, "https://a.example/story", original, 2)
      .await
      .unwrap();
    let created = extract_facts_from_text(&nlp, &db, "https://news.a.example/mirror", near_copy, 2)
      .await
      .unwrap();
    // Same base domain: the near-copy is a fresh candidate, not corroboration.
    assert_eq!(created.len(), 1);

    let stored =
      Fact::from_model(ledger::get_fact(&db, &fact_id(original)).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.trust_score, 1);
  }
}
