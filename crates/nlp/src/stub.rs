use std::collections::HashMap;

use axiom_shared::AxiomError;

use crate::{NamedEntity, NlpEngine, ParsedSentence, ParsedToken};

/// Fluent construction of scripted parses for tests.
pub struct SentenceBuilder {
  sentence: ParsedSentence,
}

impl SentenceBuilder {
  #[must_use]
  pub fn new(text: &str) -> Self {
    Self {
      sentence: ParsedSentence {
        text: text.to_owned(),
        tokens: Vec::new(),
        entities: Vec::new(),
        has_negation: false,
      },
    }
  }

  #[must_use]
  pub fn token(mut self, text: &str, lemma: &str, pos: &str, dep: &str, head: &str) -> Self {
    self.sentence.tokens.push(ParsedToken {
      text: text.to_owned(),
      lemma: lemma.to_owned(),
      pos: pos.to_owned(),
      dep: dep.to_owned(),
      head: head.to_owned(),
    });
    self
  }

  /// Shorthand for the minimal declarative skeleton: a nominal subject and a
  /// root verb.
  #[must_use]
  pub fn declarative(self, subject: &str, root_verb: &str) -> Self {
    self
      .token(subject, subject, "NOUN", "nsubj", root_verb)
      .token(root_verb, root_verb, "VERB", "ROOT", root_verb)
  }

  #[must_use]
  pub fn entity(mut self, text: &str, label: &str) -> Self {
    self.sentence.entities.push(NamedEntity {
      text: text.to_owned(),
      label: label.to_owned(),
    });
    self
  }

  #[must_use]
  pub fn negated(mut self) -> Self {
    self.sentence.has_negation = true;
    self
  }

  #[must_use]
  pub fn build(self) -> ParsedSentence {
    self.sentence
  }
}

/// Scripted NLP double. Exact input texts map to prepared parses; anything
/// unscripted falls back to a crude deterministic parse (first word as
/// subject, second as root, `not`/`never` as negation, no entities) so that
/// incidental re-parses of stored content stay comparable.
#[derive(Default)]
pub struct StubNlp {
  scripts: HashMap<String, Vec<ParsedSentence>>,
}

impl StubNlp {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn script(mut self, text: &str, sentences: Vec<ParsedSentence>) -> Self {
    self.scripts.insert(text.trim().to_owned(), sentences);
    self
  }

  fn naive_parse(text: &str) -> ParsedSentence {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut tokens = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
      let lemma = word
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
      let (pos, dep) = if lemma == "not" || lemma == "never" {
        ("PART", "neg")
      } else if i == 0 {
        ("NOUN", "nsubj")
      } else if i == 1 {
        ("VERB", "ROOT")
      } else {
        ("NOUN", "dobj")
      };
      tokens.push(ParsedToken {
        text: (*word).to_owned(),
        lemma,
        pos: pos.to_owned(),
        dep: dep.to_owned(),
        head: words.get(1).copied().unwrap_or(*word).to_owned(),
      });
    }
    let has_negation = tokens.iter().any(|t| t.dep == "neg");
    ParsedSentence {
      text: text.to_owned(),
      tokens,
      entities: Vec::new(),
      has_negation,
    }
  }
}

#[async_trait::async_trait]
impl NlpEngine for StubNlp {
  async fn parse(&self, text: &str) -> Result<Vec<ParsedSentence>, AxiomError> {
    if let Some(sentences) = self.scripts.get(text.trim()) {
      return Ok(sentences.clone());
    }
    Ok(vec![Self::naive_parse(text)])
  }
}
