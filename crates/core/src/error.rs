//! Error types for the sheetwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; [`QueryError`] is the
//! request-level taxonomy every failure path converges into.

use thiserror::Error;

/// The top-level error type for sheetwise operations outside a request.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the generative model collaborator.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Response blocked by content policy: {0}")]
    ContentBlocked(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the tabular data source collaborator.
#[derive(Debug, Clone, Error)]
pub enum SheetError {
    #[error("Sheet source not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("Sheets API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Spreadsheet has no sheets")]
    NoSheets,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

/// Request-level failure taxonomy.
///
/// `Input` is raised before any external call. `ContextFetch` and
/// `ModelInvocation` wrap collaborator failures and are never retried.
/// `ComposerInvariant` signals a programming defect.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("No query provided")]
    Input,

    #[error("Failed to retrieve sheet data: {0}")]
    ContextFetch(#[from] SheetError),

    #[error("Error processing query: {0}")]
    ModelInvocation(#[from] ProviderError),

    #[error("Composer invariant violated: {0}")]
    ComposerInvariant(String),
}
