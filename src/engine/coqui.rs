//! The Coqui API client.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncWrite;

use crate::backend::{
    self, AudioSource, BackendError, BlockingSink, Connector, HttpConnector, Operation,
    SessionConfig, Transport, decode,
};
use crate::config::ClientConfig;
use crate::voice::{ClonedVoice, QualityEstimate, Sample};

use super::blocking::{block_on, blocking_api};
use super::request::{QualityInput, QualitySource, format_speed};
use super::CoquiError;

const PROFILE_QUERY: &str = r#"
query Profile {
    profile {
        email
    }
}"#;

const VOICES_QUERY: &str = r#"
query Voices {
    voices {
        id
        name
        samples_count
        created_at
    }
}"#;

const CREATE_VOICE_MUTATION: &str = r#"
mutation CreateVoice($name: String!, $voice: Upload!) {
    createVoice(name: $name, voice: $voice) {
        errors {
            field
            errors
        }
        voice {
            id
            name
            created_at
        }
    }
}"#;

const ESTIMATE_QUALITY_QUERY: &str = r#"
query EstimateQuality($sample: Upload, $url: String) {
    estimateQuality(sample: $sample, url: $url) {
        quality
        errors
    }
}"#;

const SAMPLES_QUERY: &str = r#"
query Samples($voice_id: String!) {
    samples(voice_id: $voice_id) {
        id
        name
        text
        created_at
        audio_url
    }
}"#;

const CREATE_SAMPLE_MUTATION: &str = r#"
mutation createSample($name: String!, $voice_id: String!, $text: String!, $speed: String!) {
    createSample(name: $name, voice_id: $voice_id, text: $text, speed: $speed) {
        errors {
            field
            errors
        }
        sample {
            id
            name
            text
            created_at
            audio_url
        }
    }
}"#;

const SAMPLE_QUERY: &str = r#"
query Sample($id: String!) {
    sample(id: $id) {
        id
        name
        text
        created_at
        audio_url
    }
}"#;

/// Server-side validation errors for one input field.
#[derive(Debug, Deserialize)]
struct FieldErrors {
    field: String,
    errors: Vec<String>,
}

/// Render as `field: err1, err2` lines.
fn aggregate(errors: &[FieldErrors]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.errors.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<ClonedVoice>,
}

#[derive(Deserialize)]
struct CreateVoiceResponse {
    #[serde(rename = "createVoice")]
    create_voice: CreateVoicePayload,
}

#[derive(Deserialize)]
struct CreateVoicePayload {
    #[serde(default)]
    errors: Option<Vec<FieldErrors>>,
    voice: Option<ClonedVoice>,
}

#[derive(Deserialize)]
struct EstimateQualityResponse {
    #[serde(rename = "estimateQuality")]
    estimate_quality: EstimateQualityPayload,
}

#[derive(Deserialize)]
struct EstimateQualityPayload {
    quality: Option<f64>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct SamplesResponse {
    samples: Vec<Sample>,
}

#[derive(Deserialize)]
struct CreateSampleResponse {
    #[serde(rename = "createSample")]
    create_sample: CreateSamplePayload,
}

#[derive(Deserialize)]
struct CreateSamplePayload {
    #[serde(default)]
    errors: Option<Vec<FieldErrors>>,
    sample: Option<Sample>,
}

#[derive(Deserialize)]
struct SampleResponse {
    sample: Sample,
}

/// Map a query error on an upload or mutation path to `RateLimitExceeded`.
fn rate_limited(err: BackendError) -> CoquiError {
    match err {
        BackendError::Query(_) => {
            tracing::warn!(error = %err, "Query error treated as rate limit");
            CoquiError::RateLimitExceeded(err)
        }
        other => other.into(),
    }
}

/// Reject a zero download chunk size before any request is sent.
pub fn check_chunk_size(chunk_size: usize) -> Result<(), CoquiError> {
    if chunk_size == 0 {
        return Err(CoquiError::Usage(
            "Download chunk size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Which credentials a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No `X-Api-Key` header.
    Anonymous,
    /// The stored token, without requiring a prior login.
    Probe,
    /// The stored token; refused unless logged in.
    Authenticated,
}

/// A transport scoped to one client operation. Closed on drop.
pub struct Session {
    transport: Box<dyn Transport>,
    access: Access,
}

impl Session {
    pub fn access(&self) -> Access {
        self.access
    }

    pub async fn execute(&self, operation: Operation) -> Result<Value, BackendError> {
        self.transport.execute(operation).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::trace!(access = ?self.access, "Session closed");
    }
}

struct ClientInner {
    config: ClientConfig,
    connector: Box<dyn Connector>,
    api_token: RwLock<Option<String>>,
    logged_in: AtomicBool,
}

/// Entry point for all API usage.
///
/// Cloning is cheap; clones share the token and login state.
#[derive(Clone)]
pub struct Coqui {
    inner: Arc<ClientInner>,
}

/// Non-owning reference to a [`Coqui`] client, kept by listed records.
#[derive(Clone)]
pub struct ClientHandle(Weak<ClientInner>);

impl ClientHandle {
    /// The client, if it is still alive.
    pub fn upgrade(&self) -> Option<Coqui> {
        self.0.upgrade().map(|inner| Coqui { inner })
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for Coqui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coqui")
            .field("config", &self.inner.config)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl Default for Coqui {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Coqui {
    /// Create a client talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, HttpConnector)
    }

    /// Create a client with a custom transport connector.
    pub fn with_connector(config: ClientConfig, connector: impl Connector + 'static) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                connector: Box::new(connector),
                api_token: RwLock::new(None),
                logged_in: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Whether this client has successfully authenticated with the backend.
    pub fn is_logged_in(&self) -> bool {
        self.inner.logged_in.load(Ordering::Acquire)
    }

    pub fn handle(&self) -> ClientHandle {
        ClientHandle(Arc::downgrade(&self.inner))
    }

    /// Open a session on the GraphQL endpoint.
    ///
    /// `Access::Authenticated` fails without touching the network unless a
    /// login has succeeded.
    pub fn session(&self, access: Access) -> Result<Session, CoquiError> {
        if access == Access::Authenticated && !self.is_logged_in() {
            return Err(CoquiError::Authentication(
                "Tried to create authenticated session without logging in.".to_string(),
            ));
        }

        let api_key = match access {
            Access::Anonymous => None,
            Access::Probe | Access::Authenticated => self.inner.api_token.read().clone(),
        };

        let transport = self.inner.connector.connect(&SessionConfig {
            endpoint: self.inner.config.endpoint(),
            api_key,
        })?;

        Ok(Session { transport, access })
    }

    /// Store `token` and validate it.
    ///
    /// Once a login has succeeded the client stays logged in, so a later call
    /// returns `true` without checking the new token.
    pub async fn login(&self, token: &str) -> Result<bool, CoquiError> {
        *self.inner.api_token.write() = Some(token.to_string());
        self.validate_login().await
    }

    /// Check the stored token against the API.
    ///
    /// A GraphQL error means the token is invalid and yields `false`; other
    /// failures are returned as errors.
    pub async fn validate_login(&self) -> Result<bool, CoquiError> {
        if self.is_logged_in() {
            return Ok(true);
        }

        let session = self.session(Access::Probe)?;
        match session.execute(Operation::new("Profile", PROFILE_QUERY)).await {
            Ok(_) => self.inner.logged_in.store(true, Ordering::Release),
            Err(BackendError::Query(errors)) => {
                tracing::debug!(?errors, "Login probe rejected");
                self.inner.logged_in.store(false, Ordering::Release);
            }
            Err(e) => return Err(e.into()),
        }

        let logged_in = self.is_logged_in();
        tracing::info!(logged_in, "Validated login");
        Ok(logged_in)
    }

    /// List the cloned voices of this account.
    pub async fn cloned_voices(&self) -> Result<Vec<ClonedVoice>, CoquiError> {
        let session = self.session(Access::Authenticated)?;
        let data = session.execute(Operation::new("Voices", VOICES_QUERY)).await?;

        let response: VoicesResponse = decode(data)?;
        Ok(response
            .voices
            .into_iter()
            .map(|voice| voice.bind(self))
            .collect())
    }

    /// Clone a voice from reference audio.
    pub async fn clone_voice(
        &self,
        audio: AudioSource,
        name: &str,
    ) -> Result<ClonedVoice, CoquiError> {
        let session = self.session(Access::Authenticated)?;
        let (file_name, audio) = audio.load().await?;

        let operation = Operation::new("CreateVoice", CREATE_VOICE_MUTATION)
            .variable("name", name)
            .upload("voice", file_name, audio);

        let data = session.execute(operation).await.map_err(rate_limited)?;
        let payload = decode::<CreateVoiceResponse>(data)?.create_voice;

        if let Some(errors) = payload.errors
            && !errors.is_empty()
        {
            return Err(CoquiError::CloneVoice(aggregate(&errors)));
        }

        payload.voice.ok_or_else(|| {
            BackendError::InvalidResponse("createVoice returned no voice".to_string()).into()
        })
    }

    /// Estimate the quality of reference audio.
    pub async fn estimate_quality(
        &self,
        input: QualityInput,
    ) -> Result<QualityEstimate, CoquiError> {
        let source = input.resolve()?;
        let session = self.session(Access::Authenticated)?;

        let operation = Operation::new("EstimateQuality", ESTIMATE_QUALITY_QUERY);
        let operation = match source {
            QualitySource::Url(url) => operation.variable("url", url),
            QualitySource::Upload(audio) => {
                let (file_name, audio) = audio.load().await?;
                operation.upload("sample", file_name, audio)
            }
        };

        let data = session.execute(operation).await.map_err(rate_limited)?;
        let payload = decode::<EstimateQualityResponse>(data)?.estimate_quality;

        if let Some(errors) = payload.errors
            && !errors.is_empty()
        {
            return Err(CoquiError::EstimateQuality(errors.join("\n")));
        }

        let raw = payload.quality.ok_or_else(|| {
            BackendError::InvalidResponse("estimateQuality returned no quality".to_string())
        })?;

        Ok(QualityEstimate::from(raw))
    }

    /// List the samples created with a cloned voice.
    pub async fn list_samples(&self, voice_id: &str) -> Result<Vec<Sample>, CoquiError> {
        let session = self.session(Access::Authenticated)?;
        let operation = Operation::new("Samples", SAMPLES_QUERY).variable("voice_id", voice_id);
        let data = session.execute(operation).await?;

        Ok(decode::<SamplesResponse>(data)?
            .samples
            .into_iter()
            .map(|sample| sample.bind(self))
            .collect())
    }

    /// Synthesize `text` with a cloned voice.
    ///
    /// The server renders audio asynchronously, so the new sample is
    /// refetched until its `audio_url` is set, following the configured
    /// [`crate::config::PollPolicy`].
    ///
    /// `text` is limited to 250 characters by the server. `speed` ranges over
    /// `(0.0, 2.0]`; a sample at `2.0` lasts half as long as at `1.0`.
    pub async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        speed: f32,
        name: &str,
    ) -> Result<Sample, CoquiError> {
        let session = self.session(Access::Authenticated)?;

        let operation = Operation::new("createSample", CREATE_SAMPLE_MUTATION)
            .variable("name", name)
            .variable("voice_id", voice_id)
            .variable("text", text)
            .variable("speed", format_speed(speed));

        let data = session.execute(operation).await.map_err(rate_limited)?;
        let payload = decode::<CreateSampleResponse>(data)?.create_sample;

        if let Some(errors) = payload.errors
            && !errors.is_empty()
        {
            return Err(CoquiError::Synthesis(aggregate(&errors)));
        }

        let mut sample = payload.sample.ok_or_else(|| {
            BackendError::InvalidResponse("createSample returned no sample".to_string())
        })?;

        let policy = self.inner.config.poll;
        let mut attempts = 0u32;

        while !sample.is_ready() {
            if let Some(max) = policy.max_attempts
                && attempts >= max
            {
                return Err(CoquiError::SampleNotReady {
                    sample_id: sample.id,
                    attempts,
                });
            }

            if !policy.interval.is_zero() {
                tokio::time::sleep(policy.interval).await;
            }

            attempts = attempts.saturating_add(1);
            tracing::debug!(
                sample_id = %sample.id,
                attempt = attempts,
                "Sample audio not ready, refetching"
            );

            let operation =
                Operation::new("Sample", SAMPLE_QUERY).variable("id", sample.id.as_str());
            let data = session.execute(operation).await?;
            sample = decode::<SampleResponse>(data)?.sample;
        }

        Ok(sample.bind(self))
    }

    /// Stream a file from `url` into `sink`, `chunk_size` bytes at a time.
    ///
    /// A zero `chunk_size` is a usage error raised before the request is sent.
    pub async fn download_file<W>(
        url: &str,
        sink: &mut W,
        chunk_size: usize,
    ) -> Result<u64, CoquiError>
    where
        W: AsyncWrite + Unpin,
    {
        check_chunk_size(chunk_size)?;
        Ok(backend::download_file(url, sink, chunk_size).await?)
    }

    /// Blocking version of [`Coqui::download_file`] for a [`Write`] sink.
    pub fn download_file_sync<W: Write>(
        url: &str,
        sink: &mut W,
        chunk_size: usize,
    ) -> Result<u64, CoquiError> {
        check_chunk_size(chunk_size)?;
        block_on(Self::download_file(url, &mut BlockingSink(sink), chunk_size))
    }

    blocking_api! {
        /// Blocking version of [`Coqui::login`].
        login_sync => login(token: &str) -> bool;
        /// Blocking version of [`Coqui::validate_login`].
        validate_login_sync => validate_login() -> bool;
        /// Blocking version of [`Coqui::cloned_voices`].
        cloned_voices_sync => cloned_voices() -> Vec<ClonedVoice>;
        /// Blocking version of [`Coqui::clone_voice`].
        clone_voice_sync => clone_voice(audio: AudioSource, name: &str) -> ClonedVoice;
        /// Blocking version of [`Coqui::estimate_quality`].
        estimate_quality_sync => estimate_quality(input: QualityInput) -> QualityEstimate;
        /// Blocking version of [`Coqui::list_samples`].
        list_samples_sync => list_samples(voice_id: &str) -> Vec<Sample>;
        /// Blocking version of [`Coqui::synthesize`].
        synthesize_sync => synthesize(
            voice_id: &str,
            text: &str,
            speed: f32,
            name: &str,
        ) -> Sample;
    }
}
