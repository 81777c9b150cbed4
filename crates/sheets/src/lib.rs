//! Spreadsheet data sources for sheetwise.
//!
//! All sources implement `sheetwise_core::TabularSource`:
//! - [`GoogleSheetsSource`]: the Google Sheets v4 REST API
//! - [`FixtureSource`]: in-memory rows, optionally loaded from JSON
//!
//! [`tools`] exposes a source to the model for tool-mediated retrieval.

pub mod credentials;
pub mod fixture;
pub mod google;
pub mod tools;

pub use credentials::ServiceAccountInfo;
pub use fixture::FixtureSource;
pub use google::{GoogleSheetsSource, SheetsCredential, SpreadsheetMetadata};
pub use tools::sheet_tools;

use sheetwise_config::{AppConfig, SheetsBackend, env};
use sheetwise_core::error::SheetError;
use sheetwise_core::sheet::TabularSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Render a JSON cell the way a spreadsheet shows it: strings as-is,
/// `null` as empty, everything else in its JSON form.
pub(crate) fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build the configured Google Sheets client.
pub fn google_from_config(config: &AppConfig) -> Result<GoogleSheetsSource, SheetError> {
    let sheets = &config.sheets;

    let spreadsheet_id = sheets
        .spreadsheet_id
        .clone()
        .ok_or_else(|| SheetError::NotConfigured(format!("{} is not set", env::SPREADSHEET_ID)))?;

    if let Some(raw) = &sheets.service_account {
        let info = ServiceAccountInfo::parse(raw)?;
        debug!(client_email = %info.client_email, "Service account content parsed");
    }

    let credential = match (&sheets.access_token, &sheets.api_key) {
        (Some(token), _) => SheetsCredential::AccessToken(token.clone()),
        (None, Some(key)) => SheetsCredential::ApiKey(key.clone()),
        (None, None) => {
            return Err(SheetError::NotConfigured(format!(
                "set {} (for example from `gcloud auth print-access-token`) or {}",
                env::SHEETS_ACCESS_TOKEN,
                env::SHEETS_API_KEY
            )));
        }
    };

    Ok(GoogleSheetsSource::new(
        spreadsheet_id,
        credential,
        Duration::from_secs(sheets.timeout_secs),
    ))
}

/// Build the configured tabular source.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn TabularSource>, SheetError> {
    let source: Arc<dyn TabularSource> = match config.sheets.backend {
        SheetsBackend::Google => Arc::new(google_from_config(config)?),
        SheetsBackend::Fixture => {
            let path = config.sheets.fixture_path.as_deref().ok_or_else(|| {
                SheetError::NotConfigured("sheets.fixture_path is not set".into())
            })?;
            Arc::new(FixtureSource::from_json_file(path)?)
        }
    };

    info!(source = source.name(), "Tabular source configured");
    Ok(source)
}
