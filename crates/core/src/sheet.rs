//! Tabular data types — the grounding side of the pipeline.
//!
//! A [`TabularSource`] is the read-only spreadsheet collaborator. Ranges are
//! addressed in A1 notation ([`CellRange`]) and the rows it returns are
//! wrapped in a [`ContextBlock`] whose text rendering is stable, so identical
//! data always yields identical prompt text.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::SheetError;

/// One corner of an A1 range. Columns are zero-based; rows are one-based
/// as written, and absent for whole-column references like `A:Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRef {
    col: u32,
    row: Option<u32>,
}

impl CellRef {
    fn parse(s: &str) -> Option<Self> {
        let split = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);
        if letters.is_empty() || letters.len() > 3 {
            return None;
        }

        let col = letters
            .chars()
            .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
            - 1;

        let row = if digits.is_empty() {
            None
        } else {
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            match digits.parse::<u32>() {
                Ok(0) | Err(_) => return None,
                Ok(n) => Some(n),
            }
        };

        Some(Self { col, row })
    }

    fn column_letters(&self) -> String {
        let mut n = self.col + 1;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        out.iter().rev().collect()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_letters())?;
        if let Some(row) = self.row {
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

/// A rectangular cell range in A1 notation: `A1:Z10`, `A:Z`, `B2:D`, `C5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    start: CellRef,
    end: CellRef,
    single: bool,
}

impl CellRange {
    pub fn parse(raw: &str) -> Result<Self, SheetError> {
        let invalid = |reason: &str| SheetError::InvalidRange {
            range: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("range is empty"));
        }

        let (start_raw, end_raw) = match trimmed.split_once(':') {
            Some((a, b)) => (a, Some(b)),
            None => (trimmed, None),
        };

        let start = CellRef::parse(start_raw).ok_or_else(|| invalid("bad start cell"))?;
        let Some(end_raw) = end_raw else {
            if start.row.is_none() {
                return Err(invalid("a single cell needs a row number"));
            }
            return Ok(Self { start, end: start, single: true });
        };

        let end = CellRef::parse(end_raw).ok_or_else(|| invalid("bad end cell"))?;
        if end.col < start.col {
            return Err(invalid("end column precedes start column"));
        }
        if let (Some(s), Some(e)) = (start.row, end.row) {
            if e < s {
                return Err(invalid("end row precedes start row"));
            }
        }

        Ok(Self { start, end, single: false })
    }

    /// Cut this range out of a full sheet given as rows of cells.
    ///
    /// Rows or cells that do not exist in the source are simply absent from
    /// the result, the way the Sheets API omits them: trailing rows with no
    /// cells inside the range are dropped, interior ones are kept empty.
    pub fn slice(&self, rows: &[Vec<String>]) -> Vec<Vec<String>> {
        let first_row = self.start.row.unwrap_or(1) as usize - 1;
        let last_row = self.end.row.map(|r| r as usize).unwrap_or(rows.len());
        let first_col = self.start.col as usize;
        let last_col = self.end.col as usize;

        let mut sliced: Vec<Vec<String>> = rows
            .iter()
            .take(last_row)
            .skip(first_row)
            .map(|row| {
                row.iter()
                    .take(last_col + 1)
                    .skip(first_col)
                    .cloned()
                    .collect()
            })
            .collect();

        while sliced.last().is_some_and(Vec::is_empty) {
            sliced.pop();
        }
        sliced
    }

    /// Qualify this range with a sheet name for the Sheets API:
    /// `'Sheet Name'!A1:Z10`. Single quotes inside the name are doubled.
    pub fn qualified(&self, sheet_name: &str) -> String {
        format!("'{}'!{}", sheet_name.replace('\'', "''"), self)
    }
}

/// `A1:Z10`, the sample range read when none is configured.
impl Default for CellRange {
    fn default() -> Self {
        Self {
            start: CellRef { col: 0, row: Some(1) },
            end: CellRef { col: 25, row: Some(10) },
            single: false,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.single {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CellRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Where the data context is read from. Fixed per deployment, never derived
/// from the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    /// Sheet to read. `None` means the first sheet of the spreadsheet.
    pub sheet: Option<String>,
    pub cells: CellRange,
}

/// Rows retrieved to ground a response. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextBlock {
    /// Sheet the rows were read from
    pub sheet: String,

    /// All sheet titles, when the spreadsheet metadata was consulted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_sheets: Vec<String>,

    pub rows: Vec<Vec<String>>,
}

impl ContextBlock {
    pub fn new(sheet: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            sheet: sheet.into(),
            available_sheets: Vec::new(),
            rows,
        }
    }

    pub fn with_available_sheets(mut self, sheets: Vec<String>) -> Self {
        self.available_sheets = sheets;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable, human-readable text form: one line per row, cells joined by
    /// ` | `, preceded by the sheet list when known.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(self.rows.len() + 1);

        if !self.available_sheets.is_empty() {
            lines.push(format!("Available sheets: {}", self.available_sheets.join(", ")));
        }

        if self.rows.is_empty() {
            lines.push("(no data found)".to_string());
        } else {
            lines.extend(self.rows.iter().map(|row| row.join(" | ")));
        }

        lines.join("\n")
    }
}

/// The read-only tabular store.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// A human-readable name for this source (e.g., "google_sheets").
    fn name(&self) -> &str;

    /// Read a range from one sheet. An empty range is `Ok(vec![])`.
    async fn get_range(
        &self,
        sheet_name: &str,
        cells: &CellRange,
    ) -> Result<Vec<Vec<String>>, SheetError>;

    /// Titles of all sheets, in spreadsheet order.
    async fn sheet_names(&self) -> Result<Vec<String>, SheetError>;
}
