//! Messages exchanged with observers over the duplex channel.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ActionKind;

/// An inbound request to act on the creature: `{ "type": "nourrir" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionRequest {
    /// Which action to perform.
    #[serde(rename = "type")]
    pub kind: ActionKind,
}

/// Machine-readable category of an [`ErrorPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ErrorCode {
    /// The request could not be parsed or named an unknown action.
    InvalidRequest,
    /// The request was valid but processing failed on the server.
    Internal,
}

/// Error reported to the single observer whose request failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ErrorPayload {
    /// Human-readable description.
    pub error: String,
    /// Error category.
    pub code: ErrorCode,
}

impl ErrorPayload {
    /// Build an `invalid_request` payload.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: ErrorCode::InvalidRequest,
        }
    }

    /// Build an `internal` payload.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: ErrorCode::Internal,
        }
    }
}
