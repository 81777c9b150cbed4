//! # sheetwise core
//!
//! Domain types, traits, and error definitions for sheetwise: a service that
//! answers natural-language questions, grounding the personal ones in rows
//! read from a spreadsheet before handing a composed prompt to a language
//! model.
//!
//! Every external collaborator (the model, the tabular store, the tools the
//! model may call) is a trait here. Implementations live in their own crates,
//! so the pipeline can be exercised with stubs and swapped via configuration.

pub mod error;
pub mod message;
pub mod provider;
pub mod query;
pub mod sheet;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, QueryError, Result, SheetError, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use query::{Classification, Query, QueryClassifier};
pub use sheet::{CellRange, ContextBlock, RangeSpec, TabularSource};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
