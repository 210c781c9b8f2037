use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_build")]
    pub build_folder: String,

    #[serde(default = "default_report")]
    pub report_path: String,

    /// Character catalog the store reads from and writes back to.
    #[serde(default = "default_catalog")]
    pub catalog_path: String,

    pub llm: LlmConfig,

    #[serde(default)]
    pub tts: TtsConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini", "ollama" or "openai"
    pub gemini: Option<GeminiConfig>,
    pub ollama: Option<OllamaConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsConfig {
    /// Sample rendering is best-effort; disabling it forces text-only
    /// evaluation without touching the rest of the pipeline.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tts_model")]
    pub model: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_tts_model(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditConfig {
    /// How many characters to pull into one audit run.
    #[serde(default = "default_target_characters")]
    pub target_characters: usize,

    /// Optional cap on candidate voices per character (quota relief).
    /// None means the full catalog.
    #[serde(default)]
    pub voice_limit: Option<usize>,

    #[serde(default = "default_extract_delay_ms")]
    pub extract_delay_ms: u64,
    #[serde(default = "default_dialogue_delay_ms")]
    pub dialogue_delay_ms: u64,
    #[serde(default = "default_tts_delay_ms")]
    pub tts_delay_ms: u64,
    #[serde(default = "default_eval_delay_ms")]
    pub eval_delay_ms: u64,

    /// Long pause taken every `long_pause_every` external calls.
    #[serde(default = "default_long_pause_every")]
    pub long_pause_every: u64,
    #[serde(default = "default_long_pause_secs")]
    pub long_pause_secs: u64,

    /// Rate-limit retries per judge call.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Minimum backoff unit for rate-limit retries; the wait is
    /// max(server hint, this * attempt number).
    #[serde(default = "default_retry_base_secs")]
    pub retry_base_secs: u64,

    /// Whether the applier flags the audited set as featured.
    #[serde(default = "default_true")]
    pub flag_featured: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            target_characters: default_target_characters(),
            voice_limit: None,
            extract_delay_ms: default_extract_delay_ms(),
            dialogue_delay_ms: default_dialogue_delay_ms(),
            tts_delay_ms: default_tts_delay_ms(),
            eval_delay_ms: default_eval_delay_ms(),
            long_pause_every: default_long_pause_every(),
            long_pause_secs: default_long_pause_secs(),
            max_retries: default_max_retries(),
            retry_base_secs: default_retry_base_secs(),
            flag_featured: true,
        }
    }
}

fn default_build() -> String {
    "build".to_string()
}
fn default_report() -> String {
    "build/voice-audit-report.md".to_string()
}
fn default_catalog() -> String {
    "characters.json".to_string()
}
fn default_true() -> bool {
    true
}
fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}
fn default_target_characters() -> usize {
    30
}
fn default_extract_delay_ms() -> u64 {
    200
}
fn default_dialogue_delay_ms() -> u64 {
    500
}
fn default_tts_delay_ms() -> u64 {
    500
}
fn default_eval_delay_ms() -> u64 {
    1000
}
fn default_long_pause_every() -> u64 {
    50
}
fn default_long_pause_secs() -> u64 {
    30
}
fn default_max_retries() -> usize {
    5
}
fn default_retry_base_secs() -> u64 {
    60
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.build_folder)?;
        if let Some(parent) = Path::new(&self.report_path).parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let yaml = r#"
llm:
  provider: gemini
  gemini:
    api_key: test-key
    model: gemini-2.5-flash
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.build_folder, "build");
        assert_eq!(config.audit.target_characters, 30);
        assert_eq!(config.audit.max_retries, 5);
        assert_eq!(config.audit.retry_base_secs, 60);
        assert!(config.tts.enabled);
        assert!(config.audit.voice_limit.is_none());
    }

    #[test]
    fn test_overrides() {
        let yaml = r#"
build_folder: out
llm:
  provider: ollama
  ollama:
    base_url: http://localhost:11434
    model: llama3
tts:
  enabled: false
audit:
  target_characters: 5
  voice_limit: 5
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.build_folder, "out");
        assert!(!config.tts.enabled);
        assert_eq!(config.audit.voice_limit, Some(5));
        assert_eq!(config.audit.target_characters, 5);
    }
}
