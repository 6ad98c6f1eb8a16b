//! Client configuration and credential persistence.

mod credentials;
mod settings;

pub use credentials::{CredentialError, CredentialStore};
pub use settings::{API_PATH, ClientConfig, DEFAULT_BASE_URL, PollPolicy};
