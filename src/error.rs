use thiserror::Error;

/// Faults that can occur while answering a carrier webhook.
///
/// A ticket that does not exist is not one of them: lookups report it as
/// `Ok(None)` and the call flow answers it like any other input.
#[derive(Debug, Error)]
pub enum IvrError {
    /// The ticket store could not be reached, timed out, or is not configured.
    #[error("ticket store unavailable: {0}")]
    StoreUnavailable(String),

    /// The carrier request could not be read.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Anything else that went wrong while computing or rendering a step.
    #[error("internal fault: {0}")]
    InternalFault(String),
}

/// Errors raised by a ticket store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid credentials: {0}")]
    Credentials(String),

    #[error("token exchange failed: {0}")]
    Token(String),

    #[error("store not configured: {0}")]
    Unconfigured(String),
}

impl From<StoreError> for IvrError {
    fn from(err: StoreError) -> Self {
        IvrError::StoreUnavailable(err.to_string())
    }
}

/// Errors raised by the carrier REST client used for test calls.
#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("carrier API returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("missing carrier setting: {0}")]
    MissingSetting(&'static str),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
