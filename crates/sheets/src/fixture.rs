//! In-memory tabular source, loadable from a JSON fixture file.
//!
//! File format: `[{"name": "Tasks", "rows": [["Task", "Status"], ...]}]`.
//! Cells may be any JSON scalar; they are stringified on load.

use async_trait::async_trait;
use serde::Deserialize;
use sheetwise_core::error::SheetError;
use sheetwise_core::sheet::{CellRange, TabularSource};
use std::path::Path;

use crate::cell_to_string;

#[derive(Debug, Clone, Deserialize)]
struct FixtureSheet {
    name: String,
    #[serde(default)]
    rows: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    sheets: Vec<(String, Vec<Vec<String>>)>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet. Order of insertion is spreadsheet order.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        self.sheets.push((name.into(), rows));
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, SheetError> {
        let sheets: Vec<FixtureSheet> = serde_json::from_str(json)
            .map_err(|e| SheetError::MalformedResponse(format!("fixture: {e}")))?;

        Ok(Self {
            sheets: sheets
                .into_iter()
                .map(|s| {
                    let rows = s
                        .rows
                        .iter()
                        .map(|row| row.iter().map(cell_to_string).collect())
                        .collect();
                    (s.name, rows)
                })
                .collect(),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SheetError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SheetError::NotConfigured(format!("cannot read fixture {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }
}

#[async_trait]
impl TabularSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn get_range(
        &self,
        sheet_name: &str,
        cells: &CellRange,
    ) -> Result<Vec<Vec<String>>, SheetError> {
        let (_, rows) = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .ok_or_else(|| SheetError::NotFound(format!("sheet '{sheet_name}'")))?;
        Ok(cells.slice(rows))
    }

    async fn sheet_names(&self) -> Result<Vec<String>, SheetError> {
        Ok(self.sheets.iter().map(|(name, _)| name.clone()).collect())
    }
}
