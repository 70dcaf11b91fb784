use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpvitsConfig {
    pub vits: VitsConfig,
    pub plugin: PluginConfig,
    pub temp: TempStoreConfig,
    pub onebot: Option<OneBotConfig>,
}

impl SpvitsConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SpvitsConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VITS_API_URL") {
            self.vits.api_url = v;
        }
        if let Ok(v) = std::env::var("VITS_SPEAKER") {
            if let Ok(n) = v.parse() {
                self.vits.speaker = n;
            }
        }
        if let Ok(v) = std::env::var("VITS_MAX_TEXT_LENGTH") {
            if let Ok(n) = v.parse() {
                self.vits.max_text_length = n;
            }
        }
        if let Ok(v) = std::env::var("SPVITS_TEMP_DIR") {
            self.temp.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SPVITS_MAX_TEMP_MB") {
            if let Ok(n) = v.parse() {
                self.temp.max_size_mb = n;
            }
        }
        // OneBot env overrides
        if let Ok(url) = std::env::var("ONEBOT_WS_URL") {
            let token = std::env::var("ONEBOT_ACCESS_TOKEN").ok();
            self.onebot = Some(OneBotConfig {
                ws_url: url,
                access_token: token,
            });
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Remote VITS endpoint and the fixed voice parameters sent with every request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VitsConfig {
    pub api_url: String,
    pub speaker: u32,
    /// Length scale; larger is slower speech.
    pub length: f32,
    pub noise: f32,
    pub noisew: f32,
    /// Maximum characters per synthesis request when voicing LLM replies.
    pub max_text_length: usize,
}

impl Default for VitsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://artrajz-vits-simple-api.hf.space/voice/vits".to_string(),
            speaker: 281,
            length: 1.5,
            noise: 0.33,
            noisew: 0.5,
            max_text_length: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Initial state of the auto-voice toggle.
    pub llm_voice_mode_default: bool,
    /// Also run eviction before voicing LLM replies. Off by default: only
    /// startup and interactive `/say` keep the store under budget.
    pub evict_on_auto: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TempStoreConfig {
    pub dir: PathBuf,
    pub max_size_mb: u64,
}

impl Default for TempStoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("temp"),
            max_size_mb: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneBotConfig {
    pub ws_url: String,
    pub access_token: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SpvitsConfig::default();
        assert_eq!(cfg.vits.speaker, 281);
        assert_eq!(cfg.vits.max_text_length, 100);
        assert_eq!(cfg.temp.max_size_mb, 50);
        assert_eq!(cfg.temp.dir, PathBuf::from("temp"));
        assert!(!cfg.plugin.llm_voice_mode_default);
        assert!(!cfg.plugin.evict_on_auto);
        assert!(cfg.onebot.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[vits]
speaker = 12
"#;
        let cfg: SpvitsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.vits.speaker, 12);
        // Defaults for unspecified fields
        assert_eq!(cfg.vits.noise, 0.33);
        assert_eq!(cfg.temp.max_size_mb, 50);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[vits]
api_url = "http://localhost:23456/voice/vits"
speaker = 3
length = 1.2
noise = 0.6
noisew = 0.8
max_text_length = 40

[plugin]
llm_voice_mode_default = true
evict_on_auto = true

[temp]
dir = "/var/cache/spvits"
max_size_mb = 10

[onebot]
ws_url = "ws://localhost:8080"
access_token = "secret"
"#;
        let cfg: SpvitsConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.vits.api_url, "http://localhost:23456/voice/vits");
        assert_eq!(cfg.vits.length, 1.2);
        assert_eq!(cfg.vits.max_text_length, 40);
        assert!(cfg.plugin.llm_voice_mode_default);
        assert!(cfg.plugin.evict_on_auto);
        assert_eq!(cfg.temp.dir, PathBuf::from("/var/cache/spvits"));
        assert_eq!(cfg.temp.max_size_mb, 10);
        let onebot = cfg.onebot.unwrap();
        assert_eq!(onebot.ws_url, "ws://localhost:8080");
        assert_eq!(onebot.access_token, Some("secret".to_string()));
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("VITS_SPEAKER", "42");
        std::env::set_var("SPVITS_MAX_TEMP_MB", "not-a-number");

        let mut cfg = SpvitsConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.vits.speaker, 42);
        // Unparseable values leave the default alone
        assert_eq!(cfg.temp.max_size_mb, 50);

        std::env::remove_var("VITS_SPEAKER");
        std::env::remove_var("SPVITS_MAX_TEMP_MB");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = SpvitsConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.vits.speaker, 281);
    }
}
