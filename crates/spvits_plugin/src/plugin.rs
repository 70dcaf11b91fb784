use crate::command::Command;
use anyhow::Result;
use spvits_core::{Reply, ReplySink, SpvitsConfig};
use spvits_voice::{split_text, TempStore, TextToSpeech};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const SAY_PREFIX: &str = "vits";
const LLM_PREFIX: &str = "vits_llm";

pub const SAY_USAGE: &str = "请输入要转换的文本，例如：/say 你好，世界！";

/// Result of voicing an LLM reply.
///
/// A failure here must never reach the conversation, so it is handed back
/// as a value for the caller to log and drop instead of an `Err` to bubble.
#[derive(Debug)]
pub enum VoiceOutcome {
    /// Auto-voice is off or the reply was blank
    Skipped,
    /// This many clips were delivered
    Voiced(usize),
    /// Stopped at the first failing segment; earlier clips were delivered
    Failed { delivered: usize, error: anyhow::Error },
}

impl VoiceOutcome {
    /// Log a failure and discard it.
    pub fn log_failure(self) {
        if let VoiceOutcome::Failed { delivered, error } = self {
            tracing::error!("LLM回复转语音失败: {} ({} clips delivered)", error, delivered);
        }
    }
}

pub struct VitsPlugin {
    tts: Arc<dyn TextToSpeech>,
    store: TempStore,
    max_text_length: usize,
    evict_on_auto: bool,
    llm_voice_mode: AtomicBool,
}

impl VitsPlugin {
    pub fn new(config: &SpvitsConfig, tts: Arc<dyn TextToSpeech>) -> Self {
        Self {
            tts,
            store: TempStore::new(config.temp.dir.clone(), config.temp.max_size_mb),
            max_text_length: config.vits.max_text_length,
            evict_on_auto: config.plugin.evict_on_auto,
            llm_voice_mode: AtomicBool::new(config.plugin.llm_voice_mode_default),
        }
    }

    pub fn store(&self) -> &TempStore {
        &self.store
    }

    pub fn voice_mode(&self) -> bool {
        self.llm_voice_mode.load(Ordering::SeqCst)
    }

    /// Create the temp dir and trim it to budget once.
    pub fn initialize(&self) -> Result<()> {
        tracing::info!("VITS plugin loaded");
        tracing::info!(
            "Provider={}, speaker={}, format={}, temp dir={} (max {}MB)",
            self.tts.provider_name(),
            self.tts.voice_id(),
            self.tts.default_format().extension(),
            self.store.dir().display(),
            self.store.max_size_mb()
        );
        self.store.ensure_dir()?;
        self.evict();
        Ok(())
    }

    pub fn terminate(&self) {
        tracing::info!("VITS plugin unloaded");
    }

    fn evict(&self) {
        if let Err(e) = self.store.enforce_budget() {
            tracing::error!("Failed to trim temp dir: {}", e);
        }
    }

    /// Route a chat message. Returns `None` when it isn't a plugin command.
    pub async fn dispatch(&self, body: &str) -> Option<Vec<Reply>> {
        let reply = match Command::parse(body)? {
            Command::Say(text) => self.say(&text).await,
            Command::ToggleVoiceMode => self.toggle_voice_mode(),
            Command::ClearTemp => self.clear_temp(),
        };
        Some(vec![reply])
    }

    /// `/say`: voice the whole text as one clip.
    pub async fn say(&self, text: &str) -> Reply {
        let text = text.trim();
        let text = text.strip_prefix("/say").unwrap_or(text).trim();
        if text.is_empty() {
            return Reply::text(SAY_USAGE);
        }

        self.evict();

        let result = match self.store.ensure_dir() {
            Ok(()) => self.synthesize_to_store(SAY_PREFIX, text).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(path) => Reply::Voice(path),
            Err(e) => {
                let msg = format!("语音合成失败: {}", e);
                tracing::error!("{}", msg);
                Reply::Text(msg)
            }
        }
    }

    /// `/voice_mode`: flip auto-voice for LLM replies.
    pub fn toggle_voice_mode(&self) -> Reply {
        let enabled = !self.llm_voice_mode.fetch_xor(true, Ordering::SeqCst);
        let status = if enabled { "开启" } else { "关闭" };
        tracing::info!("LLM voice mode {}", if enabled { "on" } else { "off" });
        Reply::Text(format!("已{}LLM回复语音模式", status))
    }

    /// `/clear_temp`: remove every clip and report the sizes.
    pub fn clear_temp(&self) -> Reply {
        match self.store.clear_all() {
            Ok(report) => Reply::Text(format!(
                "临时文件清理完成！\n清理前: {:.2}MB\n清理后: {:.2}MB",
                report.before_mb(),
                report.after_mb()
            )),
            Err(e) => {
                let msg = format!("清理临时文件失败: {}", e);
                tracing::error!("{}", msg);
                Reply::Text(msg)
            }
        }
    }

    /// Voice a host-generated reply, one clip per segment, in order.
    ///
    /// Each clip is pushed to `sink` before the next segment is requested.
    /// Eviction only runs here when `evict_on_auto` is set.
    pub async fn on_llm_response(&self, text: &str, sink: &dyn ReplySink) -> VoiceOutcome {
        if !self.voice_mode() {
            return VoiceOutcome::Skipped;
        }
        let text = text.trim();
        if text.is_empty() {
            return VoiceOutcome::Skipped;
        }

        if let Err(error) = self.store.ensure_dir() {
            return VoiceOutcome::Failed { delivered: 0, error };
        }
        if self.evict_on_auto {
            self.evict();
        }

        let mut delivered = 0;
        for segment in split_text(text, self.max_text_length) {
            let result: Result<()> = async {
                let path = self.synthesize_to_store(LLM_PREFIX, &segment).await?;
                sink.send(Reply::Voice(path)).await
            }
            .await;

            if let Err(error) = result {
                return VoiceOutcome::Failed { delivered, error };
            }
            delivered += 1;
        }

        VoiceOutcome::Voiced(delivered)
    }

    async fn synthesize_to_store(&self, prefix: &str, text: &str) -> Result<PathBuf> {
        let audio = self.tts.synthesize(text).await?;
        self.store.write_clip(prefix, text, &audio).await
    }
}
