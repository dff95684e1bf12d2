//! Error types for the browser test harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("CDP protocol error: {0}")]
    Protocol(String),

    #[error("{what} not satisfied after {timeout_ms} ms")]
    WaitTimeout { what: String, timeout_ms: u64 },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("no actor at index {0}")]
    UnknownActor(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail the current scenario with an assertion error unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}
