//! Configuration (§6.A). Loaded once at startup, held for the process
//! lifetime, mutations persist by rewriting the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Message,
    Content,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::Message
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub interval_seconds: u64,
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    pub enabled: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            quality: 60,
            max_width: 1280,
            max_height: 720,
            enabled: true,
        }
    }
}

impl CaptureConfig {
    /// Clamp the configured interval to the §4.6 minimum of 1 second.
    pub fn effective_interval_seconds(&self) -> u64 {
        self.interval_seconds.max(1)
    }

    /// §4.1: out-of-range quality falls back to 60.
    pub fn effective_quality(&self) -> u8 {
        if self.quality == 0 || self.quality > 100 {
            60
        } else {
            self.quality
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub cerebras_api_key: String,
    pub cerebras_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234/v1".to_string(),
            model: "local-vision-model".to_string(),
            max_tokens: 512,
            temperature: 0.2,
            timeout_seconds: 30,
            cerebras_api_key: String::new(),
            cerebras_model: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_id: String,
    pub collection_name: String,
    pub dialect: Dialect,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_key: String::new(),
            user_id: "default-user".to_string(),
            collection_name: "ambient-memory".to_string(),
            dialect: Dialect::Message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub verbose: bool,
    pub process_on_capture: bool,
    pub memory_window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            process_on_capture: true,
            memory_window: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 7345,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub app: AppConfig,
    pub extension: ExtensionConfig,
}

impl Config {
    /// Read `path` as YAML, falling back to defaults if the file doesn't
    /// exist, then apply the four documented environment-variable
    /// overrides (§6.A).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LM_STUDIO_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("MEM0_URL") {
            self.memory.base_url = v;
        }
        if let Ok(v) = std::env::var("MEM0_API_KEY") {
            self.memory.api_key = v;
        }
        if let Ok(v) = std::env::var("CEREBRAS_API_KEY") {
            self.llm.cerebras_api_key = v;
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ambient-memory")
            .join("config.yaml")
    }
}

/// Persists `Config` mutations to disk with an atomic write-temp-then-rename,
/// mirroring the donor orchestrator's `SystemPromptRepository`.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    path: PathBuf,
}

impl ConfigRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(config).map_err(|source| ConfigError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;

        let dir = self
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ConfigError::Write {
                path: dir.display().to_string(),
                source,
            })?;

        let tmp_path = dir.join(format!("config.yaml.tmp-{}", Uuid::new_v4()));

        tokio::fs::write(&tmp_path, &yaml)
            .await
            .map_err(|source| ConfigError::Write {
                path: tmp_path.display().to_string(),
                source,
            })?;

        let _ = tokio::fs::remove_file(&self.path).await;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_spec_compliant() {
        let config = Config::default();
        assert_eq!(config.extension.port, 7345);
        assert_eq!(config.capture.effective_quality(), 60);
        assert_eq!(config.capture.effective_interval_seconds(), 60);
    }

    #[test]
    fn out_of_range_quality_falls_back_to_sixty() {
        let mut capture = CaptureConfig::default();
        capture.quality = 0;
        assert_eq!(capture.effective_quality(), 60);
        capture.quality = 255;
        assert_eq!(capture.effective_quality(), 60);
        capture.quality = 85;
        assert_eq!(capture.effective_quality(), 85);
    }

    #[test]
    fn interval_is_clamped_to_one_second() {
        let mut capture = CaptureConfig::default();
        capture.interval_seconds = 0;
        assert_eq!(capture.effective_interval_seconds(), 1);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let repo = ConfigRepository::new(path.clone());

        let mut config = Config::default();
        config.memory.user_id = "alice".to_string();
        repo.save(&config).await.unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.memory.user_id, "alice");
    }

    #[test]
    fn env_overrides_apply_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::env::set_var("MEM0_URL", "http://example.invalid:9000");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.memory.base_url, "http://example.invalid:9000");
        std::env::remove_var("MEM0_URL");
    }
}
