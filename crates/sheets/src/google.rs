//! Google Sheets v4 REST client.
//!
//! Read-only: `spreadsheets.values.get` for ranges and `spreadsheets.get`
//! (with a field mask) for metadata. Credentials go in headers only.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use sheetwise_core::error::SheetError;
use sheetwise_core::sheet::{CellRange, TabularSource};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cell_to_string;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// How requests to the Sheets API are authorized.
#[derive(Clone)]
pub enum SheetsCredential {
    /// OAuth2 access token, sent as a bearer token
    AccessToken(String),
    /// API key, for spreadsheets shared publicly
    ApiKey(String),
}

impl std::fmt::Debug for SheetsCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken([REDACTED])"),
            Self::ApiKey(_) => f.write_str("ApiKey([REDACTED])"),
        }
    }
}

/// Spreadsheet title and sheet titles in spreadsheet order.
#[derive(Debug, Clone)]
pub struct SpreadsheetMetadata {
    pub title: String,
    pub sheets: Vec<String>,
}

#[derive(Debug)]
pub struct GoogleSheetsSource {
    spreadsheet_id: String,
    credential: SheetsCredential,
    base_url: String,
    client: reqwest::Client,
}

impl GoogleSheetsSource {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        credential: SheetsCredential,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            spreadsheet_id: spreadsheet_id.into(),
            credential,
            base_url: DEFAULT_BASE_URL.into(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `{base}/spreadsheets/{id}[/values/{range}]`, each segment
    /// percent-encoded.
    fn url(&self, range: Option<&str>) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetError::NotConfigured(format!("invalid Sheets base URL: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SheetError::NotConfigured("invalid Sheets base URL".into()))?;
            segments.pop_if_empty();
            segments.push("spreadsheets").push(&self.spreadsheet_id);
            if let Some(range) = range {
                segments.push("values").push(range);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            SheetsCredential::AccessToken(token) => request.bearer_auth(token),
            SheetsCredential::ApiKey(key) => request.header("x-goog-api-key", key),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SheetError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| SheetError::Network(e.without_url().to_string()))
    }

    async fn status_error(&self, response: reqwest::Response, range: Option<&str>) -> SheetError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, spreadsheet = %self.spreadsheet_id, "Sheets API returned error");
        map_status(status, &body, &self.spreadsheet_id, range)
    }

    /// Fetch the spreadsheet title and its sheet titles.
    pub async fn metadata(&self) -> Result<SpreadsheetMetadata, SheetError> {
        let mut url = self.url(None)?;
        url.query_pairs_mut()
            .append_pair("fields", "properties.title,sheets.properties.title");

        let response = self.send(self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(self.status_error(response, None).await);
        }

        let body: SpreadsheetResponse = response
            .json()
            .await
            .map_err(|e| SheetError::MalformedResponse(e.without_url().to_string()))?;

        Ok(SpreadsheetMetadata {
            title: body.properties.map(|p| p.title).unwrap_or_default(),
            sheets: body
                .sheets
                .into_iter()
                .filter_map(|s| s.properties.map(|p| p.title))
                .collect(),
        })
    }
}

/// Map a non-success Sheets status. `range` is set for value reads so a 400
/// is reported as a bad range. A 404 names only the spreadsheet id.
fn map_status(status: u16, body: &str, spreadsheet_id: &str, range: Option<&str>) -> SheetError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string());

    match (status, range) {
        (401 | 403, _) => SheetError::AuthenticationFailed(message),
        (404, _) => SheetError::NotFound(format!("spreadsheet '{spreadsheet_id}'")),
        (400, Some(range)) => SheetError::InvalidRange {
            range: range.to_string(),
            reason: message,
        },
        _ => SheetError::ApiError {
            status_code: status,
            message,
        },
    }
}

#[async_trait]
impl TabularSource for GoogleSheetsSource {
    fn name(&self) -> &str {
        "google_sheets"
    }

    async fn get_range(
        &self,
        sheet_name: &str,
        cells: &CellRange,
    ) -> Result<Vec<Vec<String>>, SheetError> {
        let range = cells.qualified(sheet_name);
        let mut url = self.url(Some(&range))?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");

        debug!(range = %range, "Reading sheet range");

        let response = self.send(self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(self.status_error(response, Some(&range)).await);
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::MalformedResponse(e.without_url().to_string()))?;

        Ok(body.into_rows())
    }

    async fn sheet_names(&self) -> Result<Vec<String>, SheetError> {
        Ok(self.metadata().await?.sheets)
    }
}

// --- Sheets API types (internal) ---

#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent when the range holds no data
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl ValueRange {
    fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    properties: Option<TitleProperties>,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    #[serde(default)]
    properties: Option<TitleProperties>,
}

#[derive(Debug, Deserialize)]
struct TitleProperties {
    #[serde(default)]
    title: String,
}
