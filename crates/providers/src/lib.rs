//! Generative model providers for sheetwise.
//!
//! All providers implement the `sheetwise_core::Provider` trait.
//! The router selects the configured provider.

pub mod gemini;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};

use sheetwise_core::error::ProviderError;
use std::time::Duration;

/// Build an HTTP client with a per-request timeout.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a transport-level failure, keeping timeouts distinct. The URL is
/// stripped since it may carry a key in its query string.
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    let timed_out = e.is_timeout();
    let message = e.without_url().to_string();
    if timed_out {
        ProviderError::Timeout(message)
    } else {
        ProviderError::Network(message)
    }
}
