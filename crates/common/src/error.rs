//! Common error types.

use thiserror::Error;

/// Main error type for the capture pipeline.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Target already hooked: {0}")]
    AlreadyHooked(String),

    #[error("Hook error: {0}")]
    Hook(String),

    #[error("Transport error: {0}")]
    Transport(#[from] serde_json::Error),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;

impl CaptureError {
    pub fn already_hooked(msg: impl Into<String>) -> Self {
        Self::AlreadyHooked(msg.into())
    }

    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
