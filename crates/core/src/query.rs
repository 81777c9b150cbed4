//! Query input and classification types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QueryError;

/// A validated natural-language question.
///
/// The text is kept verbatim; composition embeds it literally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Query(String);

impl Query {
    /// The input gate for every request: empty or whitespace-only text is
    /// rejected before anything else runs.
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        if raw.trim().is_empty() {
            return Err(QueryError::Input);
        }
        Ok(Self(raw.to_string()))
    }

    /// Like [`Query::parse`], for inputs where the field itself may be absent.
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, QueryError> {
        raw.map_or(Err(QueryError::Input), Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a query needs grounding data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Personal question: fetch tabular context before asking the model.
    NeedsContext,
    /// Anything else: the model answers from its own knowledge.
    GeneralKnowledge,
}

impl Classification {
    pub fn needs_context(self) -> bool {
        matches!(self, Self::NeedsContext)
    }
}

/// Decides whether a query needs grounding data.
///
/// Implementations must be pure: no I/O, deterministic, infallible.
pub trait QueryClassifier: Send + Sync {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &str;

    fn classify(&self, query: &Query) -> Classification;
}
