//! `sheetwise ask` — Answer one query and print the result envelope.

use sheetwise_agent::{SecretScrubber, build_engine_from_config, respond};
use std::path::Path;
use tracing::debug;

pub async fn run(config_path: Option<&Path>, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    config.require_credentials()?;

    let engine = build_engine_from_config(&config)?;
    let scrubber = SecretScrubber::new(config.secret_values());
    debug!(mode = engine.mode(), "Engine built");

    let envelope = respond(engine.as_ref(), &scrubber, Some(query)).await;
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if !envelope.is_success() {
        return Err("query failed".into());
    }
    Ok(())
}
