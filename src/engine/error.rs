//! Client error taxonomy.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors raised by [`super::Coqui`] operations.
#[derive(Error, Debug)]
pub enum CoquiError {
    /// An authenticated operation was attempted before a successful login.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Voice cloning failed: {0}")]
    CloneVoice(String),

    #[error("Quality estimation failed: {0}")]
    EstimateQuality(String),

    /// Any GraphQL query error on an upload or mutation path ends up here,
    /// whatever its actual cause.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(#[source] BackendError),

    /// Reserved; no operation currently raises it.
    #[error("Billing limit exceeded: {0}")]
    BillingLimitExceeded(String),

    /// The caller misused the API.
    #[error("Usage error: {0}")]
    Usage(String),

    /// A bounded poll policy ran out before the sample audio was rendered.
    #[error("Sample {sample_id} not ready after {attempts} polls")]
    SampleNotReady { sample_id: String, attempts: u32 },

    #[error("Blocking API called from within an async runtime; use the async method instead")]
    BlockingInAsyncContext,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
