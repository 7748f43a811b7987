use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Switch,
    ScriptActivation,
    Envelope,
    States,
}

/// Inbound data that could not be decoded into the shape its topic promises.
#[derive(Debug, Error)]
#[error("malformed {kind:?} payload: {message}")]
pub struct PayloadError {
    pub kind: PayloadKind,
    pub message: String,
}

impl PayloadError {
    pub fn new(kind: PayloadKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_json(kind: PayloadKind, err: serde_json::Error) -> Self {
        Self::new(kind, err.to_string())
    }
}
