//! Value objects returned by the API.
//!
//! Cloned voices, synthesized samples and quality estimates, plus the
//! codec for the server's timestamp format.

pub mod timestamp;
mod types;

pub use types::{ClonedVoice, QualityEstimate, QualityLevel, Sample};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Coqui, CoquiError};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    // ===========================================
    // Quality thresholds
    // ===========================================

    #[test]
    fn test_quality_level_thresholds() {
        assert_eq!(QualityLevel::from_score(2.5), QualityLevel::High);
        assert_eq!(QualityLevel::from_score(4.0), QualityLevel::High);
        assert_eq!(QualityLevel::from_score(2.49), QualityLevel::Average);
        assert_eq!(QualityLevel::from_score(1.5), QualityLevel::Average);
        assert_eq!(QualityLevel::from_score(1.49), QualityLevel::Poor);
        assert_eq!(QualityLevel::from_score(0.0), QualityLevel::Poor);
    }

    #[test]
    fn test_quality_estimate_keeps_raw_score() {
        let estimate = QualityEstimate::from(1.75);
        assert_eq!(estimate.level, QualityLevel::Average);
        assert_eq!(estimate.raw, 1.75);
        assert_eq!(
            serde_json::to_value(estimate).unwrap(),
            json!({"level": "average", "raw": 1.75})
        );
    }

    // ===========================================
    // Timestamps
    // ===========================================

    #[test]
    fn test_timestamp_strips_zone_designator() {
        let parsed = timestamp::parse("2022-06-14T20:15:33.016Z").unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 6, 14, 20, 15, 33).unwrap()
            + chrono::Duration::milliseconds(16);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_timestamp_without_fraction() {
        let parsed = timestamp::parse("2022-06-15T08:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2022, 6, 15, 8, 0, 0).unwrap());
        assert_eq!(timestamp::format(&parsed), "2022-06-15T08:00:00Z");
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(timestamp::parse("").is_err());
        assert!(timestamp::parse("yesterday").is_err());
    }

    // ===========================================
    // Records
    // ===========================================

    #[test]
    fn test_cloned_voice_round_trip() {
        let raw = json!({
            "id": "c97d34da-a677-4219-b4b2-9ec198c948e0",
            "name": "My voice",
            "samples_count": 4,
            "created_at": "2022-06-14T20:15:33.016Z"
        });

        let voice: ClonedVoice = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(voice.samples_count, 4);
        assert_eq!(serde_json::to_value(&voice).unwrap(), raw);
    }

    #[test]
    fn test_cloned_voice_missing_samples_count_defaults_to_zero() {
        let voice: ClonedVoice = serde_json::from_value(json!({
            "id": "v-1",
            "name": "New",
            "created_at": "2022-06-14T20:15:33Z"
        }))
        .unwrap();
        assert_eq!(voice.samples_count, 0);
        assert!(!voice.is_bound());
    }

    #[test]
    fn test_sample_round_trip() {
        let raw = json!({
            "id": "62151ee3-858f-4398-935d-e48481263927",
            "name": "test from the command line",
            "text": "Hello",
            "created_at": "2022-06-14T20:15:33.016Z",
            "audio_url": "https://samples.example.com/sample_GAh7vFe.wav"
        });

        let sample: Sample = serde_json::from_value(raw.clone()).unwrap();
        assert!(sample.is_ready());
        assert_eq!(serde_json::to_value(&sample).unwrap(), raw);
    }

    #[test]
    fn test_sample_fields() {
        let sample: Sample = serde_json::from_value(json!({
            "id": "s-1",
            "name": "greeting",
            "text": "Hi",
            "created_at": "2022-06-14T20:15:33Z",
            "audio_url": null
        }))
        .unwrap();

        assert_eq!(sample.field("text").as_deref(), Some("Hi"));
        assert_eq!(sample.field("audio_url").as_deref(), Some(""));
        assert_eq!(
            sample.field("created_at").as_deref(),
            Some("2022-06-14T20:15:33Z")
        );
        assert_eq!(sample.field("voice"), None);
        assert!(Sample::FIELDS.iter().all(|f| sample.field(f).is_some()));
    }

    #[test]
    fn test_cloned_voice_fields() {
        let created = Utc.with_ymd_and_hms(2022, 6, 14, 20, 15, 33).unwrap();
        let voice = ClonedVoice::new("v-1", "Alice", 2, created);

        assert_eq!(voice.field("samples_count").as_deref(), Some("2"));
        assert!(ClonedVoice::FIELDS.iter().all(|f| voice.field(f).is_some()));
    }

    // ===========================================
    // Convenience accessors
    // ===========================================

    #[tokio::test]
    async fn test_unbound_voice_requires_client() {
        let voice = ClonedVoice::new("v-1", "Alice", 0, Utc::now());

        let err = voice.samples(None).await.unwrap_err();
        assert!(matches!(err, CoquiError::Usage(_)));
    }

    #[tokio::test]
    async fn test_voice_samples_with_explicit_client() {
        let voice = ClonedVoice::new("v-1", "Alice", 0, Utc::now());
        let client = Coqui::default();

        // The passed client is used, and it is not logged in.
        let err = voice.samples(Some(&client)).await.unwrap_err();
        assert!(matches!(err, CoquiError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_download_requires_audio_url() {
        let sample: Sample = serde_json::from_value(json!({
            "id": "s-1",
            "name": "greeting",
            "text": "Hi",
            "created_at": "2022-06-14T20:15:33Z",
            "audio_url": null
        }))
        .unwrap();

        let mut sink = Vec::new();
        let err = sample.download(&mut sink).await.unwrap_err();
        assert!(matches!(err, CoquiError::Usage(_)));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_unbound_sample_download_settings() {
        let sample: Sample = serde_json::from_value(json!({
            "id": "s-1",
            "name": "greeting",
            "text": "Hi",
            "created_at": "2022-06-14T20:15:33Z",
            "audio_url": "http://127.0.0.1:9/s-1.wav"
        }))
        .unwrap();
        assert_eq!(sample.chunk_size(), crate::backend::DEFAULT_CHUNK_SIZE);

        // Rejected before the (unreachable) URL is contacted.
        let mut sink = Vec::new();
        let err = sample.download_with(&mut sink, 0).await.unwrap_err();
        assert!(matches!(err, CoquiError::Usage(_)));
    }
}
