//! Text-to-Speech (TTS) trait definition

use anyhow::Result;
use async_trait::async_trait;

/// Output format for synthesized audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Wav,
}

impl OutputFormat {
    /// File extension clips of this format are stored under
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
        }
    }
}

/// Text-to-Speech trait for synthesizing audio from text
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize text to audio
    ///
    /// # Returns
    /// Raw audio bytes in `default_format()`
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Get the format `synthesize` returns
    fn default_format(&self) -> OutputFormat {
        OutputFormat::Wav
    }

    /// Get the voice identifier being used
    fn voice_id(&self) -> &str;

    /// Get the name of this TTS provider
    fn provider_name(&self) -> &'static str;
}
