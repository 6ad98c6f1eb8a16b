//! Operation inputs.

use std::path::PathBuf;

use crate::backend::AudioSource;

use super::CoquiError;

/// Audio to estimate the quality of. Exactly one source is used.
///
/// When several are set, the URL wins over the path, and the path over the
/// in-memory file.
#[derive(Debug, Clone, Default)]
pub struct QualityInput {
    pub audio_file: Option<Vec<u8>>,
    pub audio_path: Option<PathBuf>,
    pub audio_url: Option<String>,
}

/// The source picked from a [`QualityInput`].
#[derive(Debug, Clone)]
pub enum QualitySource {
    Url(String),
    Upload(AudioSource),
}

impl QualityInput {
    /// Estimate in-memory audio.
    pub fn with_file(mut self, data: Vec<u8>) -> Self {
        self.audio_file = Some(data);
        self
    }

    /// Estimate an audio file on disk.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(path.into());
        self
    }

    /// Estimate publicly reachable audio.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Pick the source to send.
    pub fn resolve(self) -> Result<QualitySource, CoquiError> {
        if let Some(url) = self.audio_url.filter(|u| !u.is_empty()) {
            return Ok(QualitySource::Url(url));
        }
        if let Some(path) = self.audio_path {
            return Ok(QualitySource::Upload(AudioSource::Path(path)));
        }
        if let Some(data) = self.audio_file {
            return Ok(QualitySource::Upload(AudioSource::from(data)));
        }

        Err(CoquiError::Usage(
            "Must specify exactly one of: audio_file, audio_path, audio_url".to_string(),
        ))
    }
}

/// Encode a synthesis speed the way the API expects it: a decimal string
/// with at least one fractional digit.
pub fn format_speed(speed: f32) -> String {
    let text = speed.to_string();
    if speed.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}
