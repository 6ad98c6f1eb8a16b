//! Persisted API token.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the credential file.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Not logged in: run `coqui login --token <TOKEN>` first")]
    NotLoggedIn,

    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Stores the API token as a JSON string on disk.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store at the default location, `~/.coqui/credentials`.
    pub fn new() -> Result<Self, CredentialError> {
        let path = dirs::home_dir()
            .ok_or(CredentialError::NoHomeDir)?
            .join(".coqui")
            .join("credentials");

        Ok(Self { path })
    }

    /// Create a store backed by a custom file.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the credential file path.
    pub fn path(&self) -> PathBuf {
        self.path.clone()
    }

    /// Save a token, creating parent directories as needed.
    pub fn save(&self, token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, json)?;

        Ok(())
    }

    /// Load the saved token, if any.
    pub fn load(&self) -> Result<Option<String>, CredentialError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)?;
        let token = serde_json::from_str::<Option<String>>(&json)?;

        Ok(token)
    }

    /// Load the saved token, failing if there is none.
    pub fn require(&self) -> Result<String, CredentialError> {
        self.load()?.ok_or(CredentialError::NotLoggedIn)
    }
}
