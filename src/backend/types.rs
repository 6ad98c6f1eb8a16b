//! GraphQL request/response types.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when communicating with the backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server answered with a GraphQL `errors` array.
    #[error("Query failed: {}", join_messages(.0))]
    Query(Vec<GraphQLError>),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_messages(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }
}

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse {
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQLError>>,
}

impl GraphQLResponse {
    /// Split the envelope into its `data` payload, turning `errors` into [`BackendError::Query`].
    pub fn into_data(self) -> Result<Value, BackendError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            return Err(BackendError::Query(errors));
        }

        match self.data {
            Some(Value::Null) | None => Err(BackendError::InvalidResponse(
                "No data in response".to_string(),
            )),
            Some(data) => Ok(data),
        }
    }
}

/// Decode a `data` payload into a typed response.
pub fn decode<T: DeserializeOwned>(data: Value) -> Result<T, BackendError> {
    serde_json::from_value(data).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

/// A file attached to an operation under one of its variables.
#[derive(Debug, Clone)]
pub struct Upload {
    pub variable: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// One GraphQL operation: document, variables and an optional file upload.
#[derive(Debug, Clone)]
pub struct Operation {
    name: String,
    query: String,
    variables: Map<String, Value>,
    upload: Option<Upload>,
}

impl Operation {
    /// Create an operation for the named query or mutation document.
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            variables: Map::new(),
            upload: None,
        }
    }

    /// Set a variable.
    pub fn variable(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }

    /// Attach a file to the given variable.
    ///
    /// The variable is sent as `null` and the file travels as a separate
    /// multipart part referenced from the `map` field.
    pub fn upload(mut self, variable: &str, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        self.variables.insert(variable.to_string(), Value::Null);
        self.upload = Some(Upload {
            variable: variable.to_string(),
            file_name: file_name.into(),
            data,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn attachment(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    pub fn into_parts(self) -> (Value, Option<Upload>) {
        let body = self.body();
        (body, self.upload)
    }

    /// JSON body (`query`, `variables`, `operationName`).
    pub fn body(&self) -> Value {
        serde_json::json!({
            "query": self.query,
            "variables": self.variables,
            "operationName": self.name,
        })
    }

    /// The multipart `map` field for this operation's upload, if any.
    pub fn upload_map(&self) -> Option<Value> {
        self.upload.as_ref().map(|upload| {
            serde_json::json!({ "0": [format!("variables.{}", upload.variable)] })
        })
    }
}

/// Audio supplied to an upload operation.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// File on disk, read when the request is built.
    Path(PathBuf),
    /// Audio already in memory.
    Bytes { data: Vec<u8>, file_name: String },
}

impl AudioSource {
    /// In-memory audio with a file name.
    pub fn bytes(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self::Bytes {
            data,
            file_name: file_name.into(),
        }
    }

    /// Resolve into `(file_name, data)`.
    pub async fn load(self) -> Result<(String, Vec<u8>), BackendError> {
        match self {
            AudioSource::Path(path) => {
                let data = tokio::fs::read(&path)
                    .await
                    .map_err(|_| BackendError::FileNotFound(path.display().to_string()))?;

                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string();

                Ok((file_name, data))
            }
            AudioSource::Bytes { data, file_name } => Ok((file_name, data)),
        }
    }
}

impl From<PathBuf> for AudioSource {
    fn from(path: PathBuf) -> Self {
        AudioSource::Path(path)
    }
}

impl From<&std::path::Path> for AudioSource {
    fn from(path: &std::path::Path) -> Self {
        AudioSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for AudioSource {
    fn from(data: Vec<u8>) -> Self {
        AudioSource::bytes(data, "audio.wav")
    }
}

/// Options for opening one session against the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub endpoint: String,
    /// Sent as `X-Api-Key` when present.
    pub api_key: Option<String>,
}
