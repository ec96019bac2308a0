// ── Core error types ──
//
// Nothing in the state layer is fatal. Backend payloads that fail to decode
// are dropped by the sink; local intents that fail validation come back to
// the caller. Either way the target cell keeps its last good value.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Local intent errors ──────────────────────────────────────────
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Backend payload errors ───────────────────────────────────────
    #[error("Malformed '{topic}' payload: {reason}")]
    MalformedPayload { topic: String, reason: String },

    #[error("Unknown backend topic: {topic}")]
    UnknownTopic { topic: String },

    #[error("Duplicate {kind} id: {key}")]
    DuplicateKey { kind: &'static str, key: String },

    // ── Sink lifecycle ───────────────────────────────────────────────
    #[error("Update sink is closed")]
    SinkClosed,
}

impl CoreError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(topic: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            topic: topic.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from a backend payload (as opposed to a
    /// rejected local intent).
    pub fn is_backend_fault(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. } | Self::UnknownTopic { .. } | Self::DuplicateKey { .. }
        )
    }
}
