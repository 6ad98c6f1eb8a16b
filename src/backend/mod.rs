//! Backend communication with the Coqui GraphQL API.
//!
//! Provides the transport traits, the reqwest-based GraphQL session, the
//! request/response types and the chunked audio downloader.

mod client;
mod download;
mod types;

pub use client::{API_KEY_HEADER, GraphQLSession, HttpConnector};
pub use download::{BlockingSink, DEFAULT_CHUNK_SIZE, copy_chunked, download_file};
pub use types::{
    AudioSource, BackendError, GraphQLError, GraphQLResponse, Operation, SessionConfig, Upload,
    decode,
};

use async_trait::async_trait;
use serde_json::Value;

/// One GraphQL channel, used for the duration of a single client operation.
///
/// This trait abstracts the HTTP communication with the API server,
/// allowing for mock implementations in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute an operation and return its `data` payload.
    async fn execute(&self, operation: Operation) -> Result<Value, BackendError>;
}

/// Opens fresh transports.
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    /// Open a transport for the endpoint and credentials in `config`.
    fn connect(&self, config: &SessionConfig) -> Result<Box<dyn Transport>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::NamedTempFile;
    use tokio::io::{AsyncRead, ReadBuf};

    // ===========================================
    // Operation encoding
    // ===========================================

    #[test]
    fn test_operation_body_carries_name_and_variables() {
        let operation = Operation::new("Samples", "query Samples($voice_id: String!) { x }")
            .variable("voice_id", "v-1");

        let body = operation.body();
        assert_eq!(body["operationName"], "Samples");
        assert_eq!(body["variables"]["voice_id"], "v-1");
        assert!(body["query"].as_str().unwrap().starts_with("query Samples"));
        assert!(operation.upload_map().is_none());
    }

    #[test]
    fn test_operation_upload_nulls_variable_and_builds_map() {
        let operation = Operation::new("CreateVoice", "mutation CreateVoice { x }")
            .variable("name", "my voice")
            .upload("voice", "ref.wav", b"RIFF".to_vec());

        assert_eq!(operation.variables()["voice"], serde_json::Value::Null);
        assert_eq!(operation.upload_map().unwrap(), json!({"0": ["variables.voice"]}));

        let upload = operation.attachment().unwrap();
        assert_eq!(upload.file_name, "ref.wav");
        assert_eq!(upload.data, b"RIFF");
    }

    // ===========================================
    // Response envelope
    // ===========================================

    #[test]
    fn test_response_with_errors_is_query_error() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "Invalid token"}, {"message": "Try again"}]
        }))
        .unwrap();

        let err = response.into_data().unwrap_err();
        assert!(matches!(err, BackendError::Query(ref errors) if errors.len() == 2));
        assert_eq!(err.to_string(), "Query failed: Invalid token; Try again");
    }

    #[test]
    fn test_response_without_data_is_invalid() {
        let response: GraphQLResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response.into_data().unwrap_err(),
            BackendError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_response_with_empty_errors_returns_data() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": {"profile": {"email": "a@b.c"}},
            "errors": []
        }))
        .unwrap();

        let data = response.into_data().unwrap();
        assert_eq!(data["profile"]["email"], "a@b.c");
    }

    // ===========================================
    // Audio sources
    // ===========================================

    #[tokio::test]
    async fn test_audio_source_path_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"RIFF fake wav").unwrap();

        let (name, data) = AudioSource::from(file.path()).load().await.unwrap();
        assert_eq!(data, b"RIFF fake wav");
        assert_eq!(name, file.path().file_name().unwrap().to_str().unwrap());
    }

    #[tokio::test]
    async fn test_audio_source_missing_file() {
        let source = AudioSource::from(PathBuf::from("/nonexistent/ref.wav"));
        assert!(matches!(
            source.load().await.unwrap_err(),
            BackendError::FileNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_audio_source_bytes_default_name() {
        let (name, data) = AudioSource::from(b"abc".to_vec()).load().await.unwrap();
        assert_eq!(name, "audio.wav");
        assert_eq!(data, b"abc");
    }

    // ===========================================
    // Chunked copy
    // ===========================================

    /// Yields one queued buffer per read and counts the reads.
    struct ChunkedReader {
        chunks: std::collections::VecDeque<Vec<u8>>,
        reads: usize,
    }

    impl ChunkedReader {
        fn new(sizes: &[usize]) -> Self {
            let chunks = sizes
                .iter()
                .enumerate()
                .map(|(i, size)| vec![i as u8 + 1; *size])
                .collect();
            Self { chunks, reads: 0 }
        }
    }

    impl AsyncRead for ChunkedReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let this = self.get_mut();
            this.reads += 1;
            if let Some(mut chunk) = this.chunks.pop_front() {
                let n = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..n]);
                if n < chunk.len() {
                    this.chunks.push_front(chunk.split_off(n));
                }
            }
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_copy_chunked_large_body_in_order() {
        const MIB: usize = 1024 * 1024;
        let mut reader = ChunkedReader::new(&[5 * MIB, 5 * MIB, 2 * MIB]);
        let mut sink = Vec::new();

        let written = copy_chunked(&mut reader, &mut sink, DEFAULT_CHUNK_SIZE)
            .await
            .unwrap();

        assert_eq!(written, 12 * MIB as u64);
        assert_eq!(sink.len(), 12 * MIB);
        assert!(sink[..5 * MIB].iter().all(|b| *b == 1));
        assert!(sink[5 * MIB..10 * MIB].iter().all(|b| *b == 2));
        assert!(sink[10 * MIB..].iter().all(|b| *b == 3));
        // Three data reads, then the zero-length read that ends the copy.
        assert_eq!(reader.reads, 4);
    }

    #[tokio::test]
    async fn test_copy_chunked_fills_chunk_from_short_reads() {
        let mut reader = tokio_test::io::Builder::new()
            .read(b"ab")
            .read(b"cd")
            .read(b"efg")
            .build();
        let mut sink = Vec::new();

        let written = copy_chunked(&mut reader, &mut sink, 4).await.unwrap();

        assert_eq!(written, 7);
        assert_eq!(sink, b"abcdefg");
    }

    #[tokio::test]
    async fn test_copy_chunked_empty_body() {
        let mut reader = ChunkedReader::new(&[]);
        let mut sink = Vec::new();

        let written = copy_chunked(&mut reader, &mut sink, 8).await.unwrap();

        assert_eq!(written, 0);
        assert!(sink.is_empty());
        assert_eq!(reader.reads, 1);
    }

    #[tokio::test]
    async fn test_copy_chunked_rejects_zero_chunk_size() {
        let mut reader = ChunkedReader::new(&[3]);
        let mut sink = Vec::new();

        let err = copy_chunked(&mut reader, &mut sink, 0).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_blocking_sink_writes_through() {
        let mut reader = ChunkedReader::new(&[3, 3]);
        let mut sink = BlockingSink(Vec::new());

        copy_chunked(&mut reader, &mut sink, 4).await.unwrap();
        assert_eq!(sink.0, vec![1, 1, 1, 2, 2, 2]);
    }

    // ===========================================
    // Connector
    // ===========================================

    #[test]
    fn test_graphql_session_endpoint() {
        let session = GraphQLSession::new(&SessionConfig {
            endpoint: "http://localhost:8000/api/v1".to_string(),
            api_key: Some("token".to_string()),
        })
        .unwrap();
        assert_eq!(session.endpoint(), "http://localhost:8000/api/v1");
    }

    #[test]
    fn test_graphql_session_rejects_unprintable_key() {
        let result = GraphQLSession::new(&SessionConfig {
            endpoint: "http://localhost:8000/api/v1".to_string(),
            api_key: Some("bad\nkey".to_string()),
        });
        assert!(matches!(result, Err(BackendError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_mock_connector_hands_out_transport() {
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .withf(|config| config.api_key.as_deref() == Some("token"))
            .times(1)
            .returning(|_| {
                let mut transport = MockTransport::new();
                transport
                    .expect_execute()
                    .returning(|_| Ok(json!({"profile": {"email": "a@b.c"}})));
                Ok(Box::new(transport) as Box<dyn Transport>)
            });

        let transport = connector
            .connect(&SessionConfig {
                endpoint: "http://localhost/api/v1".to_string(),
                api_key: Some("token".to_string()),
            })
            .unwrap();
        let data = transport
            .execute(Operation::new("Profile", "query Profile { profile { email } }"))
            .await
            .unwrap();
        assert_eq!(data["profile"]["email"], "a@b.c");
    }
}
