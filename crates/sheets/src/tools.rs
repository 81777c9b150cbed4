//! Spreadsheet access exposed as model-callable tools.

use async_trait::async_trait;
use sheetwise_core::error::ToolError;
use sheetwise_core::sheet::{CellRange, ContextBlock, TabularSource};
use sheetwise_core::tool::{Tool, ToolRegistry, ToolResult};
use std::sync::Arc;

/// Lists the titles of every sheet in the spreadsheet.
pub struct ListSheetsTool {
    source: Arc<dyn TabularSource>,
}

impl ListSheetsTool {
    pub fn new(source: Arc<dyn TabularSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for ListSheetsTool {
    fn name(&self) -> &str {
        "list_sheets"
    }

    fn description(&self) -> &str {
        "List the names of all sheets in the user's spreadsheet."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let names = self
            .source
            .sheet_names()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        let output = if names.is_empty() {
            "(no sheets)".to_string()
        } else {
            names.join("\n")
        };

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output,
        })
    }
}

/// Reads a cell range from one sheet and renders it as text rows.
pub struct ReadSheetRangeTool {
    source: Arc<dyn TabularSource>,
}

impl ReadSheetRangeTool {
    pub fn new(source: Arc<dyn TabularSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for ReadSheetRangeTool {
    fn name(&self) -> &str {
        "read_sheet_range"
    }

    fn description(&self) -> &str {
        "Read cells from one sheet of the user's spreadsheet. Returns one line per row with cells separated by ' | '."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "sheet": {
                    "type": "string",
                    "description": "Sheet name, as returned by list_sheets"
                },
                "range": {
                    "type": "string",
                    "description": "Cell range in A1 notation, e.g. A1:Z10"
                }
            },
            "required": ["sheet", "range"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let sheet = arguments["sheet"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'sheet' argument".into()))?;
        let range = arguments["range"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'range' argument".into()))?;
        let cells =
            CellRange::parse(range).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let rows = self
            .source
            .get_range(sheet, &cells)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: ContextBlock::new(sheet, rows).render(),
        })
    }
}

/// Registry holding both sheet tools over one source.
pub fn sheet_tools(source: Arc<dyn TabularSource>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ListSheetsTool::new(source.clone())));
    registry.register(Box::new(ReadSheetRangeTool::new(source)));
    registry
}
