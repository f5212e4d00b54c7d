//! Fixed configuration sets used by the extraction and synthesis filters.

/// Entity labels that qualify a sentence as grounded enough to be a fact, and
/// that feed the ADL fingerprint.
pub const QUALIFYING_ENTITY_LABELS: &[&str] = &[
  "PERSON",
  "ORG",
  "GPE",
  "EVENT",
  "LAW",
  "LOC",
  "WORK_OF_ART",
  "PRODUCT",
];

/// Subjectivity and non-fact indicators. A sentence containing any of these is
/// rejected outright: single words are matched on token boundaries, phrases by
/// substring. Union of both extractor variants.
pub const SUBJECTIVITY_INDICATORS: &[&str] = &[
  // Direct opinions and beliefs
  "believe",
  "think",
  "feel",
  "feels",
  "felt",
  "thought",
  "suspect",
  "assume",
  "presume",
  "reckons",
  "opines",
  "imagines",
  "estimates",
  "opinion",
  "view",
  "perspective",
  "stance",
  "i believe",
  "we believe",
  "i think",
  "we think",
  "in my opinion",
  "in our view",
  "personally",
  "in my view",
  "it seems to me",
  "i contend",
  "i argue",
  "we maintain",
  // Hedges and speculation
  "seems",
  "appears",
  "suggests",
  "indicates",
  "implies",
  "hints",
  "speculates",
  "likely",
  "unlikely",
  "probably",
  "possibly",
  "maybe",
  "perhaps",
  "conceivably",
  "arguably",
  "potentially",
  "seemingly",
  "ostensibly",
  "could be",
  "might be",
  "may be",
  "looks like",
  // Judgment adverbs
  "unfortunately",
  "fortunately",
  "luckily",
  "tragically",
  "sadly",
  "regrettably",
  "hopefully",
  "remarkably",
  "surprisingly",
  "astonishingly",
  "incredibly",
  "clearly",
  "obviously",
  "evidently",
  "undoubtedly",
  "unquestionably",
  "certainly",
  "definitely",
  // Unverified claims and allegations
  "allegedly",
  "purportedly",
  "supposedly",
  "reportedly",
  "rumored",
  "claims",
  "contends",
  "asserts",
  "insists",
  "according to sources",
  "sources say",
  "it is said",
  "it is claimed",
  "widely believed",
  // Meta-commentary
  "this article",
  "this report",
  "this piece",
  "we explore",
  "we examine",
  "we investigate",
  "we analyze",
  "we discuss",
  "we recommend",
  "we suggest",
  "our list",
  "our picks",
  "as you read",
  "note that",
  "keep in mind",
  "it's worth noting",
  "let's examine",
  "look no further",
  "for example",
  "for instance",
  // Vague generalizations
  "in today's world",
  "in this day and age",
  "now more than ever",
  "needless to say",
  "it goes without saying",
  "the fact remains",
  "the reality is",
  "truth be told",
  "at its core",
  "ultimately",
  "fundamentally",
  // Promotional language
  "game-changer",
  "revolutionary",
  "groundbreaking",
  "innovative",
  "world-class",
  "best-in-class",
  "award-winning",
  "state-of-the-art",
  "cutting-edge",
  "next-generation",
  "stunning",
  "breathtaking",
  "must-see",
  "must-have",
  "highly recommended",
  // Inferential connectives
  "therefore",
  "thus",
  "hence",
  "consequently",
  "accordingly",
  "as a result",
  "for this reason",
  "which means",
  "it follows that",
  "in conclusion",
  "to conclude",
  "in summary",
  "to summarize",
  "in short",
  "overall",
];

/// Entities too generic or temporal to carry linking signal. Skipped by the
/// synthesizer and by trending-topic selection.
pub const IGNORED_ENTITIES: &[&str] = &[
  // Temporal nouns
  "today",
  "yesterday",
  "tomorrow",
  "monday",
  "tuesday",
  "wednesday",
  "thursday",
  "friday",
  "saturday",
  "sunday",
  "january",
  "february",
  "march",
  "april",
  "may",
  "june",
  "july",
  "august",
  "september",
  "october",
  "november",
  "december",
  "year",
  "years",
  "week",
  "weeks",
  "day",
  "days",
  "morning",
  "night",
  // Quantities
  "percent",
  "millions",
  "billions",
  "one",
  "two",
  "first",
  "second",
  // Generic organs of state
  "government",
  "police",
  "state",
  "city",
  // Media-source names and newsroom furniture
  "news",
  "report",
  "study",
  "press",
  "bbc",
  "reuters",
  "cnn",
  "npr",
  "ap",
  "associated press",
  "bloomberg",
  "new york times",
  "image",
  "photo",
];
