//! The answer pipeline for sheetwise.
//!
//! A request flows through:
//!
//! 1. **Validate** the raw text into a [`Query`](sheetwise_core::Query)
//! 2. **Classify** it against the trigger lexicon
//! 3. **Fetch** the configured spreadsheet range, personal queries only
//! 4. **Compose** the prompt, wrapped in the persona when configured
//! 5. **Invoke** the model once and assemble the result envelope
//!
//! The tool-mediated mode replaces steps 2–4 with a bounded loop in which
//! the model reads the spreadsheet through tools itself.

pub mod accessor;
pub mod classifier;
pub mod composer;
pub mod envelope;
pub mod persona;
pub mod pipeline;
pub mod tool_mediated;

#[cfg(test)]
mod test_helpers;

pub use accessor::ContextAccessor;
pub use classifier::{SubstringClassifier, TriggerLexicon, WordBoundaryClassifier};
pub use composer::{ComposedPrompt, PromptComposer};
pub use envelope::{FailureKind, ResultEnvelope, SecretScrubber, assemble};
pub use persona::{PersonaTemplate, apply_persona};
pub use pipeline::{ClassifiedPipeline, QueryEngine, build_engine_from_config, respond};
pub use tool_mediated::{AgentOutcome, ToolMediatedAgent};
