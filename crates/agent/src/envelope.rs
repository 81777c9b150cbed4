//! Response assembler — every request ends in exactly one envelope.

use serde::Serialize;
use sheetwise_core::error::QueryError;
use tracing::error;

/// Placeholder substituted for secrets in outbound messages.
pub const REDACTED: &str = "[REDACTED]";

/// Which stage failed. Not serialized; the HTTP layer maps it to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Input,
    ContextFetch,
    ModelInvocation,
    Internal,
}

/// `{"response": ...}` on success, `{"error": ...}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResultEnvelope {
    Success {
        response: String,
    },
    Failure {
        error: String,
        #[serde(skip)]
        kind: FailureKind,
    },
}

impl ResultEnvelope {
    /// Model text, carried verbatim.
    pub fn success(response: impl Into<String>) -> Self {
        Self::Success {
            response: response.into(),
        }
    }

    /// Convert a pipeline error into its user-visible form, scrubbing any
    /// configured secret from the message.
    pub fn from_error(err: &QueryError, scrubber: &SecretScrubber) -> Self {
        let (kind, message) = match err {
            QueryError::Input => (FailureKind::Input, err.to_string()),
            QueryError::ContextFetch(_) => (FailureKind::ContextFetch, err.to_string()),
            QueryError::ModelInvocation(_) => (FailureKind::ModelInvocation, err.to_string()),
            QueryError::ComposerInvariant(detail) => {
                error!(detail = %detail, "Composer invariant violated");
                (
                    FailureKind::Internal,
                    "Internal error while composing prompt".to_string(),
                )
            }
        };

        Self::Failure {
            error: scrubber.scrub(&message),
            kind,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Collapse a pipeline outcome into its envelope.
pub fn assemble(result: Result<String, QueryError>, scrubber: &SecretScrubber) -> ResultEnvelope {
    match result {
        Ok(text) => ResultEnvelope::success(text),
        Err(e) => ResultEnvelope::from_error(&e, scrubber),
    }
}

/// Replaces known secret values with [`REDACTED`].
///
/// Secrets shorter than four characters are ignored; replacing them would
/// mangle ordinary text.
#[derive(Debug, Clone, Default)]
pub struct SecretScrubber {
    secrets: Vec<String>,
}

impl SecretScrubber {
    pub fn new<I>(secrets: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut secrets: Vec<String> = secrets.into_iter().filter(|s| s.len() >= 4).collect();
        // Longest first, so a secret containing another is replaced whole.
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        secrets.dedup();
        Self { secrets }
    }

    pub fn scrub(&self, text: &str) -> String {
        let mut out = text.to_string();
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), REDACTED);
            }
        }
        out
    }
}
