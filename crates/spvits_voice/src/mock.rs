//! Mock TTS Provider — deterministic audio for testing without a VITS server.

use crate::tts::TextToSpeech;
use anyhow::Result;
use async_trait::async_trait;

const SAMPLE_RATE: u32 = 22050;

#[derive(Debug, Clone, Default)]
pub struct MockTts;

impl MockTts {
    pub fn new() -> Self {
        Self
    }
}

/// A mono 16-bit WAV of silence, one sample per input char.
fn silent_wav(samples: u32) -> Vec<u8> {
    let data_len = samples * 2;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        Ok(silent_wav(text.chars().count() as u32))
    }

    fn voice_id(&self) -> &str {
        "mock"
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
