//! HTTP client for the GraphQL endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::types::{BackendError, GraphQLResponse, Operation, SessionConfig};
use super::{Connector, Transport};

/// Header carrying the account token on authenticated requests.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Opens reqwest-backed GraphQL sessions.
#[derive(Debug, Default, Clone)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn Transport>, BackendError> {
        Ok(Box::new(GraphQLSession::new(config)?))
    }
}

/// A GraphQL transport bound to one endpoint and, optionally, one token.
pub struct GraphQLSession {
    endpoint: String,
    client: reqwest::Client,
}

impl GraphQLSession {
    /// Create a session for the endpoint described by `config`.
    pub fn new(config: &SessionConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| BackendError::RequestFailed(format!("Invalid API key: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    /// Get the endpoint this session posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the multipart form for an operation carrying a file.
    fn multipart_form(operation: Operation) -> Result<Form, BackendError> {
        let map = operation.upload_map().unwrap_or(Value::Null);
        let (body, upload) = operation.into_parts();

        let mut form = Form::new()
            .text("operations", body.to_string())
            .text("map", map.to_string());

        if let Some(upload) = upload {
            let part = Part::bytes(upload.data)
                .file_name(upload.file_name)
                .mime_str("application/octet-stream")
                .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
            form = form.part("0", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl Transport for GraphQLSession {
    async fn execute(&self, operation: Operation) -> Result<Value, BackendError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            operation = operation.name(),
            upload = operation.attachment().is_some(),
            "Executing GraphQL operation"
        );

        let request = if operation.attachment().is_some() {
            self.client
                .post(&self.endpoint)
                .multipart(Self::multipart_form(operation)?)
        } else {
            self.client.post(&self.endpoint).json(&operation.body())
        };

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let envelope: GraphQLResponse = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(BackendError::RequestFailed(format!("Status: {status}")));
            }
            Err(e) => return Err(BackendError::InvalidResponse(e.to_string())),
        };

        envelope.into_data()
    }
}
