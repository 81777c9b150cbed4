//! Lexicon-based query classification.
//!
//! A query is personal, and so needs spreadsheet context, when it contains a
//! first-person or possessive marker from the [`TriggerLexicon`].
//!
//! [`SubstringClassifier`] is the reference behavior and matches markers as
//! raw substrings of the lower-cased query. That is deliberately imprecise:
//! `"i"` matches inside "is" and "capital", `"me"` inside "time". So
//! "What is the capital of France?" classifies as [`Classification::NeedsContext`].
//! [`WordBoundaryClassifier`] is the stricter alternative that only matches
//! whole words and whole phrases.

use sheetwise_config::ClassifierKind;
use sheetwise_core::query::{Classification, Query, QueryClassifier};

/// Markers shipped with every deployment.
const DEFAULT_MARKERS: [&str; 11] = [
    "my",
    "mine",
    "i",
    "me",
    "we",
    "our",
    "why do i",
    "what do i",
    "how do i",
    "when do i",
    "where do i",
];

/// The fixed set of personal markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerLexicon {
    markers: Vec<String>,
}

impl Default for TriggerLexicon {
    fn default() -> Self {
        Self::new(DEFAULT_MARKERS)
    }
}

impl TriggerLexicon {
    /// Build a lexicon; markers are stored lower-cased.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(|m| m.as_str())
    }
}

/// Naive substring matching over the lower-cased query.
#[derive(Debug, Clone, Default)]
pub struct SubstringClassifier {
    lexicon: TriggerLexicon,
}

impl SubstringClassifier {
    pub fn new(lexicon: TriggerLexicon) -> Self {
        Self { lexicon }
    }
}

impl QueryClassifier for SubstringClassifier {
    fn name(&self) -> &str {
        "substring"
    }

    fn classify(&self, query: &Query) -> Classification {
        let lowered = query.as_str().to_lowercase();
        if self.lexicon.markers().any(|m| lowered.contains(m)) {
            Classification::NeedsContext
        } else {
            Classification::GeneralKnowledge
        }
    }
}

/// Whole-word matching: the query is split into alphanumeric words and a
/// marker matches only as a run of complete words. `I'm` splits into `i`
/// and `m`, so it still counts as first person.
#[derive(Debug, Clone, Default)]
pub struct WordBoundaryClassifier {
    lexicon: TriggerLexicon,
}

impl WordBoundaryClassifier {
    pub fn new(lexicon: TriggerLexicon) -> Self {
        Self { lexicon }
    }
}

impl QueryClassifier for WordBoundaryClassifier {
    fn name(&self) -> &str {
        "word_boundary"
    }

    fn classify(&self, query: &Query) -> Classification {
        let lowered = query.as_str().to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let matched = self.lexicon.markers().any(|marker| {
            let phrase: Vec<&str> = marker.split_whitespace().collect();
            words.windows(phrase.len()).any(|window| window == phrase.as_slice())
        });

        if matched {
            Classification::NeedsContext
        } else {
            Classification::GeneralKnowledge
        }
    }
}

/// The configured classifier over the default lexicon.
pub fn from_kind(kind: ClassifierKind) -> Box<dyn QueryClassifier> {
    match kind {
        ClassifierKind::Substring => Box::new(SubstringClassifier::default()),
        ClassifierKind::WordBoundary => Box::new(WordBoundaryClassifier::default()),
    }
}
