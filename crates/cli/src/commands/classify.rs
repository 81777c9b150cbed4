//! `sheetwise classify` — Offline classification and prompt preview.

use sheetwise_agent::classifier::from_kind;
use sheetwise_agent::{PersonaTemplate, PromptComposer};
use sheetwise_config::PromptVariant;
use sheetwise_core::query::{Query, QueryClassifier};
use sheetwise_core::sheet::ContextBlock;
use std::path::Path;

pub fn run(
    config_path: Option<&Path>,
    raw: &str,
    compose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let query = Query::parse(raw)?;

    let classifier = from_kind(config.pipeline.classifier);
    let classification = classifier.classify(&query);
    println!("classification: {}", serde_json::to_string(&classification)?.trim_matches('"'));
    println!("classifier:     {}", classifier.name());

    if compose {
        let persona = match config.pipeline.variant {
            PromptVariant::Persona => PersonaTemplate::from_config(&config.persona)?,
            PromptVariant::Direct => None,
        };

        // No network: personal queries get an empty placeholder block.
        let placeholder = classification.needs_context().then(|| {
            ContextBlock::new(config.sheets.sheet.clone().unwrap_or_default(), Vec::new())
        });

        let prompt =
            PromptComposer::compose(&query, classification, placeholder.as_ref(), persona.as_ref())?;
        println!("\n--- prompt ---\n{prompt}");
    }

    Ok(())
}
