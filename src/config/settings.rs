//! Client configuration.

use std::time::Duration;

use crate::backend::DEFAULT_CHUNK_SIZE;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://app.coqui.ai";

/// Path of the GraphQL endpoint below the base URL.
pub const API_PATH: &str = "/api/v1";

/// How `synthesize` waits for a sample's audio to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollPolicy {
    /// Maximum number of refetches; `None` polls until the audio is ready.
    pub max_attempts: Option<u32>,
    /// Pause before each refetch.
    pub interval: Duration,
}

impl PollPolicy {
    /// Poll at most `max_attempts` times.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Default::default()
        }
    }

    /// Set the pause between refetches.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Configuration threaded through [`crate::engine::Coqui`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll: PollPolicy,
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Use `base_url` if given, the production host otherwise.
    pub fn from_base_url(base_url: Option<String>) -> Self {
        base_url.map(Self::new).unwrap_or_default()
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// The GraphQL endpoint, `<base_url>/api/v1`.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), API_PATH)
    }
}
