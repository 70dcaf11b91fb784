//! Voice synthesis for spvits
//!
//! The VITS HTTP client, the sentence splitter that sizes text for it, and
//! the size-bounded temp store the resulting clips are written to.

pub mod mock;
pub mod segment;
pub mod store;
mod tts;
pub mod vits;

pub use mock::MockTts;
pub use segment::split_text;
pub use store::{directory_size, StoreReport, TempAudioFile, TempStore};
pub use tts::{OutputFormat, TextToSpeech};
pub use vits::{SynthesisError, VitsClient, VoiceParams};
