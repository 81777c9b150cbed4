//! Data context accessor — reads the fixed range that grounds personal
//! queries.

use sheetwise_core::error::{QueryError, SheetError};
use sheetwise_core::sheet::{ContextBlock, RangeSpec, TabularSource};
use std::sync::Arc;
use tracing::debug;

pub struct ContextAccessor {
    source: Arc<dyn TabularSource>,
    range: RangeSpec,
}

impl ContextAccessor {
    pub fn new(source: Arc<dyn TabularSource>, range: RangeSpec) -> Self {
        Self { source, range }
    }

    pub fn range(&self) -> &RangeSpec {
        &self.range
    }

    /// Read the configured range.
    ///
    /// With a sheet name this is a single range read. Without one, the
    /// spreadsheet's sheet list is read first and the first sheet is used;
    /// the list is kept on the block. An empty range is a valid, empty block.
    /// Nothing is cached or retried.
    pub async fn fetch(&self) -> Result<ContextBlock, QueryError> {
        let block = match &self.range.sheet {
            Some(sheet) => {
                let rows = self.source.get_range(sheet, &self.range.cells).await?;
                ContextBlock::new(sheet.clone(), rows)
            }
            None => {
                let sheets = self.source.sheet_names().await?;
                let first = sheets.first().cloned().ok_or(SheetError::NoSheets)?;
                let rows = self.source.get_range(&first, &self.range.cells).await?;
                ContextBlock::new(first, rows).with_available_sheets(sheets)
            }
        };

        debug!(
            source = self.source.name(),
            sheet = %block.sheet,
            rows = block.rows.len(),
            "Context fetched"
        );
        Ok(block)
    }
}
