//! `sheetwise doctor` — Check every collaborator, then run one full query.

use sheetwise_agent::{SecretScrubber, build_engine_from_config, respond};
use sheetwise_config::{AppConfig, SheetsBackend};
use sheetwise_core::provider::{Provider, ProviderRequest};
use sheetwise_core::sheet::TabularSource;
use sheetwise_sheets::ServiceAccountInfo;
use std::path::Path;

const MODEL_CHECK_PROMPT: &str = "Reply with the single word: ready";
const FLOW_CHECK_QUERY: &str = "What sheets are available?";

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("sheetwise doctor");
    println!("================\n");

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ok    Config loaded");
            config
        }
        Err(e) => {
            println!("  FAIL  {e}");
            return Ok(());
        }
    };
    let scrubber = SecretScrubber::new(config.secret_values());

    let mut issues = 0;

    match config.require_credentials() {
        Ok(()) => println!("  ok    Required variables present"),
        Err(e) => {
            println!("  FAIL  {e}");
            issues += 1;
        }
    }

    if let Some(raw) = &config.sheets.service_account {
        match ServiceAccountInfo::parse(raw) {
            Ok(info) => println!("  ok    Service account parsed ({})", info.client_email),
            Err(e) => {
                println!("{}", failure_line("Service account", &e, &scrubber));
                issues += 1;
            }
        }
    }

    issues += check_spreadsheet(&config, &scrubber).await;
    issues += check_model(&config, &scrubber).await;

    if issues == 0 {
        match build_engine_from_config(&config) {
            Ok(engine) => {
                let envelope = respond(engine.as_ref(), &scrubber, Some(FLOW_CHECK_QUERY)).await;
                if envelope.is_success() {
                    println!("  ok    Full query flow ({} mode)", engine.mode());
                } else {
                    println!("  FAIL  Full query flow");
                    issues += 1;
                }
                println!("        {}", serde_json::to_string(&envelope)?);
            }
            Err(e) => {
                println!("{}", failure_line("Engine", &e, &scrubber));
                issues += 1;
            }
        }
    } else {
        println!("  skip  Full query flow (fix the issues above first)");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// One `FAIL` line. Every error text passes through the scrubber since
/// collaborator errors may quote configured values.
fn failure_line(label: &str, err: &dyn std::fmt::Display, scrubber: &SecretScrubber) -> String {
    format!("  FAIL  {label}: {}", scrubber.scrub(&err.to_string()))
}

async fn check_spreadsheet(config: &AppConfig, scrubber: &SecretScrubber) -> usize {
    match config.sheets.backend {
        SheetsBackend::Google => {
            let result = match sheetwise_sheets::google_from_config(config) {
                Ok(source) => source.metadata().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(meta) => {
                    println!(
                        "  ok    Spreadsheet '{}' ({} sheet(s))",
                        meta.title,
                        meta.sheets.len()
                    );
                    0
                }
                Err(e) => {
                    println!("{}", failure_line("Spreadsheet", &e, scrubber));
                    1
                }
            }
        }
        SheetsBackend::Fixture => {
            let result = match sheetwise_sheets::build_from_config(config) {
                Ok(source) => source.sheet_names().await,
                Err(e) => Err(e),
            };
            match result {
                Ok(names) => {
                    println!("  ok    Fixture sheets: {}", names.join(", "));
                    0
                }
                Err(e) => {
                    println!("{}", failure_line("Fixture", &e, scrubber));
                    1
                }
            }
        }
    }
}

async fn check_model(config: &AppConfig, scrubber: &SecretScrubber) -> usize {
    let Some(provider) = sheetwise_providers::build_from_config(config).default_provider() else {
        println!("  FAIL  No provider registered for '{}'", config.model.provider);
        return 1;
    };

    let request = ProviderRequest::prompt(&config.model.model, MODEL_CHECK_PROMPT)
        .with_temperature(config.model.temperature);
    match provider.complete(request).await {
        Ok(response) => {
            let first_line = response.message.content.lines().next().unwrap_or("").trim().to_string();
            println!("  ok    Model {} replied: {first_line}", response.model);
            0
        }
        Err(e) => {
            println!("{}", failure_line("Model", &e, scrubber));
            1
        }
    }
}
