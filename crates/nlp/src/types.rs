use serde::{Deserialize, Serialize};

/// One token of a parsed sentence, as produced by the NLP collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedToken {
  pub text: String,
  pub lemma: String,
  /// Universal POS tag (`NOUN`, `PROPN`, `VERB`, `PUNCT`, …).
  pub pos: String,
  /// Dependency label (`nsubj`, `dobj`, `neg`, `ROOT`, …).
  pub dep: String,
  /// Text of the syntactic head token.
  pub head: String,
}

impl ParsedToken {
  #[must_use]
  pub fn is_punct_or_space(&self) -> bool {
    self.pos == "PUNCT" || self.pos == "SPACE"
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedEntity {
  pub text: String,
  /// Entity label (`PERSON`, `ORG`, `GPE`, …).
  pub label: String,
}

/// A fully analyzed sentence. This is the entire capability surface the node
/// consumes from the NLP collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedSentence {
  pub text: String,
  pub tokens: Vec<ParsedToken>,
  pub entities: Vec<NamedEntity>,
  pub has_negation: bool,
}

impl ParsedSentence {
  /// Whitespace word count of the raw sentence text.
  #[must_use]
  pub fn word_count(&self) -> usize {
    self.text.split_whitespace().count()
  }

  /// Lowercased lemma of the first nominal subject, if any.
  #[must_use]
  pub fn subject_lemma(&self) -> Option<String> {
    self
      .tokens
      .iter()
      .find(|t| t.dep.contains("subj"))
      .map(|t| t.lemma.to_lowercase())
  }

  /// Lowercased lemma of the root token, if any.
  #[must_use]
  pub fn root_lemma(&self) -> Option<String> {
    self
      .tokens
      .iter()
      .find(|t| t.dep == "ROOT")
      .map(|t| t.lemma.to_lowercase())
  }

  #[must_use]
  pub fn has_nominal_subject(&self) -> bool {
    self
      .tokens
      .iter()
      .any(|t| t.dep == "nsubj" || t.dep == "nsubjpass")
  }

  #[must_use]
  pub fn has_verb(&self) -> bool {
    self.tokens.iter().any(|t| t.pos == "VERB")
  }

  /// Distinct `(text, label)` named entities restricted to `labels`.
  #[must_use]
  pub fn entities_in<'a>(&'a self, labels: &[&str]) -> Vec<&'a NamedEntity> {
    let mut seen = std::collections::HashSet::new();
    self
      .entities
      .iter()
      .filter(|e| labels.contains(&e.label.as_str()))
      .filter(|e| seen.insert((e.text.clone(), e.label.clone())))
      .collect()
  }
}
