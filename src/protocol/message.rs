//! Message definitions.
//!
//! Host and context messages are adjacently tagged
//! (`{"type":"UPDATE_COMPONENT","payload":{"code":"..."}}`), worker messages
//! are internally tagged (`{"type":"TRANSFORM_SUCCESS","transformedCode":"...","seq":1}`).

use serde::{Deserialize, Serialize};

use super::RenderOutcome;
use crate::core::{ContentHash, SubmissionSeq};

// =============================================================================
// Host <-> Context
// =============================================================================

/// Messages from the host bridge to a rendering context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMsg {
    /// Replace the mounted component with one compiled from `code`
    UpdateComponent { code: String },
    /// Stop the context (sent by the bridge during disposal)
    Shutdown,
}

/// Messages from a rendering context to its host bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextMsg {
    /// Context exists and accepts submissions. Sent once per context.
    InitComplete,
    /// Terminal outcome of the latest submission
    RenderResult(RenderResult),
}

/// Payload of `RENDER_RESULT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// Hash of the submitted source this outcome belongs to
    pub source_hash: ContentHash,
    pub outcome: RenderOutcome,
    /// Serialized document of the context after this submission
    pub document: String,
}

// =============================================================================
// Context <-> Transformer
// =============================================================================

/// Requests to the transformer worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum WorkerRequest {
    TransformCode { code: String, seq: SubmissionSeq },
}

/// Responses from the transformer worker. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum WorkerResponse {
    TransformSuccess {
        transformed_code: String,
        seq: SubmissionSeq,
    },
    TransformError { error: String, seq: SubmissionSeq },
}

impl WorkerResponse {
    /// Sequence number of the request this answers.
    pub fn seq(&self) -> SubmissionSeq {
        match self {
            Self::TransformSuccess { seq, .. } | Self::TransformError { seq, .. } => *seq,
        }
    }
}
