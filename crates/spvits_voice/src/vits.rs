//! VITS simple-api client.
//!
//! The endpoint takes everything as query parameters on a GET and answers
//! with a WAV body.

use crate::tts::TextToSpeech;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use spvits_core::VitsConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("VITS API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("VITS API returned an empty audio body")]
    EmptyAudio,
}

/// Fixed voice parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub speaker: u32,
    pub length: f32,
    pub noise: f32,
    pub noisew: f32,
}

impl From<&VitsConfig> for VoiceParams {
    fn from(cfg: &VitsConfig) -> Self {
        Self {
            speaker: cfg.speaker,
            length: cfg.length,
            noise: cfg.noise,
            noisew: cfg.noisew,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VitsClient {
    client: Client,
    api_url: String,
    params: VoiceParams,
    voice_id: String,
}

impl VitsClient {
    pub fn new(api_url: &str, params: VoiceParams) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            voice_id: params.speaker.to_string(),
            params,
        }
    }

    pub fn from_config(cfg: &VitsConfig) -> Self {
        Self::new(&cfg.api_url, VoiceParams::from(cfg))
    }

    pub fn params(&self) -> &VoiceParams {
        &self.params
    }

    /// One GET round-trip; any non-2xx status is a failure.
    pub async fn fetch(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let query = [
            ("text", text.to_string()),
            ("speaker", self.params.speaker.to_string()),
            ("length", self.params.length.to_string()),
            ("noise", self.params.noise.to_string()),
            ("noisew", self.params.noisew.to_string()),
        ];

        let response = self.client.get(&self.api_url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TextToSpeech for VitsClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!("VITS synthesize {} chars with speaker {}", text.chars().count(), self.voice_id);
        Ok(self.fetch(text).await?)
    }

    fn voice_id(&self) -> &str {
        &self.voice_id
    }

    fn provider_name(&self) -> &'static str {
        "vits"
    }
}
