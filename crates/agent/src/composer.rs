//! Prompt composer — builds the exact text sent to the model.
//!
//! Layout, sections separated by one blank line:
//!
//! ```text
//! [persona block]
//! Available data:          <- NeedsContext only
//! <rendered context block>
//! User query: <query>
//! Please analyze the data and respond to the query.   <- NeedsContext only
//! Remember:                <- persona only, when there are reminders
//! - <reminder>
//! ```
//!
//! `GeneralKnowledge` without a persona is the raw query, unchanged.

use sheetwise_core::error::QueryError;
use sheetwise_core::query::{Classification, Query};
use sheetwise_core::sheet::ContextBlock;
use std::fmt;
use tracing::error;

use crate::persona::{PersonaTemplate, apply_persona};

const ANALYZE_INSTRUCTION: &str = "Please analyze the data and respond to the query.";

/// The final prompt text for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt(String);

impl ComposedPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ComposedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct PromptComposer;

impl PromptComposer {
    /// Compose the prompt for a classified query.
    ///
    /// A context block must be present exactly when the classification
    /// needs one; anything else is a caller defect reported as
    /// [`QueryError::ComposerInvariant`].
    pub fn compose(
        query: &Query,
        classification: Classification,
        context: Option<&ContextBlock>,
        persona: Option<&PersonaTemplate>,
    ) -> Result<ComposedPrompt, QueryError> {
        let text = match (classification, context) {
            (Classification::NeedsContext, Some(block)) => {
                let mut sections = vec![
                    format!("Available data:\n{}", block.render()),
                    format!("User query: {query}"),
                    ANALYZE_INSTRUCTION.to_string(),
                ];
                if let Some(p) = persona {
                    sections.extend(remember_section(&p.reminders(true)));
                }
                apply_persona(&sections.join("\n\n"), persona)
            }
            (Classification::GeneralKnowledge, None) => match persona {
                None => query.as_str().to_string(),
                Some(p) => {
                    let mut sections = vec![format!("User query: {query}")];
                    sections.extend(remember_section(&p.reminders(false)));
                    apply_persona(&sections.join("\n\n"), Some(p))
                }
            },
            (Classification::NeedsContext, None) => {
                error!("Prompt composition without context for a personal query");
                return Err(QueryError::ComposerInvariant(
                    "NeedsContext requires a context block".into(),
                ));
            }
            (Classification::GeneralKnowledge, Some(_)) => {
                error!("Prompt composition with context for a general query");
                return Err(QueryError::ComposerInvariant(
                    "GeneralKnowledge must not carry a context block".into(),
                ));
            }
        };

        Ok(ComposedPrompt(text))
    }
}

fn remember_section(reminders: &[String]) -> Option<String> {
    if reminders.is_empty() {
        return None;
    }
    let lines: Vec<String> = reminders.iter().map(|r| format!("- {r}")).collect();
    Some(format!("Remember:\n{}", lines.join("\n")))
}
