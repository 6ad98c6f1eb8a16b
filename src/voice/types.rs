//! Records returned by the API.

use std::fmt;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::AsyncWrite;

use super::timestamp;
use crate::backend::{BlockingSink, DEFAULT_CHUNK_SIZE};
use crate::engine::{ClientHandle, Coqui, CoquiError, block_on, blocking_api, check_chunk_size};

/// Quality level of a reference sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    High,
    Average,
    Poor,
}

impl QualityLevel {
    /// Scores at or above this are `High`.
    pub const HIGH_THRESHOLD: f64 = 2.5;
    /// Scores at or above this (and below `HIGH_THRESHOLD`) are `Average`.
    pub const AVERAGE_THRESHOLD: f64 = 1.5;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            QualityLevel::High
        } else if score >= Self::AVERAGE_THRESHOLD {
            QualityLevel::Average
        } else {
            QualityLevel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::High => "high",
            QualityLevel::Average => "average",
            QualityLevel::Poor => "poor",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a quality estimate: the level and the raw score it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityEstimate {
    pub level: QualityLevel,
    pub raw: f64,
}

impl From<f64> for QualityEstimate {
    fn from(raw: f64) -> Self {
        Self {
            level: QualityLevel::from_score(raw),
            raw,
        }
    }
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

/// A voice cloned from a reference recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonedVoice {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub samples_count: u32,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    client: Option<ClientHandle>,
}

impl ClonedVoice {
    /// Field names available to [`ClonedVoice::field`].
    pub const FIELDS: &'static [&'static str] = &["id", "name", "samples_count", "created_at"];

    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        samples_count: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            samples_count,
            created_at,
            client: None,
        }
    }

    /// Remember the client this record came from.
    pub(crate) fn bind(mut self, client: &Coqui) -> Self {
        self.client = Some(client.handle());
        self
    }

    /// Whether the record still knows its originating client.
    pub fn is_bound(&self) -> bool {
        self.client
            .as_ref()
            .is_some_and(|handle| handle.upgrade().is_some())
    }

    /// Look up a field by name, rendered as text.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "samples_count" => Some(self.samples_count.to_string()),
            "created_at" => Some(timestamp::format(&self.created_at)),
            _ => None,
        }
    }

    /// List the samples synthesized with this voice.
    ///
    /// Uses `client` when given, otherwise the client this record was
    /// listed from.
    pub async fn samples(&self, client: Option<&Coqui>) -> Result<Vec<Sample>, CoquiError> {
        let bound;
        let client = match client {
            Some(client) => client,
            None => {
                bound = self
                    .client
                    .as_ref()
                    .and_then(ClientHandle::upgrade)
                    .ok_or_else(|| {
                        CoquiError::Usage(
                            "ClonedVoice is not bound to a Coqui client, so one must be passed"
                                .to_string(),
                        )
                    })?;
                &bound
            }
        };

        client.list_samples(&self.id).await
    }

    blocking_api! {
        /// Blocking version of [`ClonedVoice::samples`].
        samples_sync => samples(client: Option<&Coqui>) -> Vec<Sample>;
    }
}

impl PartialEq for ClonedVoice {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.samples_count == other.samples_count
            && self.created_at == other.created_at
    }
}

impl fmt::Display for ClonedVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(f, "  Samples: {}", self.samples_count)?;
        write!(f, "  Created: {}", timestamp::format(&self.created_at))
    }
}

/// Speech synthesized with a cloned voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub name: String,
    pub text: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// `None` until the server has rendered the audio.
    pub audio_url: Option<String>,
    #[serde(skip)]
    client: Option<ClientHandle>,
}

impl Sample {
    /// Field names available to [`Sample::field`].
    pub const FIELDS: &'static [&'static str] = &["id", "name", "text", "created_at", "audio_url"];

    /// Remember the client this record came from.
    pub(crate) fn bind(mut self, client: &Coqui) -> Self {
        self.client = Some(client.handle());
        self
    }

    /// Download chunk size: the originating client's setting, or the default
    /// for unbound records.
    pub fn chunk_size(&self) -> usize {
        self.client
            .as_ref()
            .and_then(ClientHandle::upgrade)
            .map_or(DEFAULT_CHUNK_SIZE, |client| client.config().chunk_size)
    }

    /// Whether the audio is ready for download.
    pub fn is_ready(&self) -> bool {
        self.audio_url.is_some()
    }

    /// Look up a field by name, rendered as text.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "text" => Some(self.text.clone()),
            "created_at" => Some(timestamp::format(&self.created_at)),
            "audio_url" => Some(self.audio_url.clone().unwrap_or_default()),
            _ => None,
        }
    }

    fn ready_url(&self) -> Result<&str, CoquiError> {
        self.audio_url.as_deref().ok_or_else(|| {
            CoquiError::Usage(format!("Sample {} has no audio URL yet", self.id))
        })
    }

    /// Stream the audio into `sink`, [`Sample::chunk_size`] bytes at a time.
    /// Returns the number of bytes written.
    pub async fn download<W>(&self, sink: &mut W) -> Result<u64, CoquiError>
    where
        W: AsyncWrite + Unpin,
    {
        self.download_with(sink, self.chunk_size()).await
    }

    /// Stream the audio into `sink` with an explicit chunk size.
    pub async fn download_with<W>(
        &self,
        sink: &mut W,
        chunk_size: usize,
    ) -> Result<u64, CoquiError>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.ready_url()?;
        Coqui::download_file(url, sink, chunk_size).await
    }

    /// Download the audio to a file, replacing it if it exists.
    pub async fn download_to(&self, path: &Path) -> Result<u64, CoquiError> {
        self.ready_url()?;
        check_chunk_size(self.chunk_size())?;
        let mut file = tokio::fs::File::create(path).await?;
        self.download(&mut file).await
    }

    /// Blocking version of [`Sample::download`] for a [`Write`] sink.
    pub fn download_sync<W: Write>(&self, sink: &mut W) -> Result<u64, CoquiError> {
        let mut sink = BlockingSink(sink);
        block_on(self.download(&mut sink))
    }

    blocking_api! {
        /// Blocking version of [`Sample::download_to`].
        download_to_sync => download_to(path: &Path) -> u64;
    }
}

impl PartialEq for Sample {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.text == other.text
            && self.created_at == other.created_at
            && self.audio_url == other.audio_url
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(f, "  Text: {}", self.text)?;
        writeln!(f, "  Created: {}", timestamp::format(&self.created_at))?;
        write!(
            f,
            "  Audio: {}",
            self.audio_url.as_deref().unwrap_or("(rendering)")
        )
    }
}
