//! Chat-facing side of spvits: commands, the auto-voice toggle and the
//! LLM-reply hook, on top of `spvits_voice`.

mod command;
mod plugin;

pub use command::Command;
pub use plugin::{VitsPlugin, VoiceOutcome, SAY_USAGE};
