use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::scoring::VoteConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub web_root: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            web_root: "web/dist".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub api_base: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/local_storage.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub seed_demo_posts: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            seed_demo_posts: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub judge: JudgeConfig,
    pub scoring: VoteConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
}

impl AppConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                Self::parse(&contents)?
            }
            _ => AppConfig::default(),
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(host) = non_empty_var("COOKED_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty_var("COOKED_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                self.server.port = value;
            }
        }
        if let Some(web_root) = non_empty_var("COOKED_WEB_ROOT") {
            self.server.web_root = web_root;
        }
        if let Some(path) = non_empty_var("COOKED_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(weight) = non_empty_var("COOKED_AI_WEIGHT") {
            if let Ok(value) = weight.parse::<f64>() {
                self.scoring.ai_weight = value;
            }
        }
        if let Some(seed) = non_empty_var("COOKED_SEED_POSTS") {
            if let Ok(value) = seed.parse::<bool>() {
                self.feed.seed_demo_posts = value;
            }
        }
        if let Some(api_base) = non_empty_var("GEMINI_API_BASE") {
            self.judge.api_base = api_base;
        }
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            self.judge.model = model;
        }
        if let Some(timeout) = non_empty_var("GEMINI_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.judge.timeout_ms = value;
            }
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn default_config_path() -> Option<PathBuf> {
    non_empty_var("COOKED_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/cooked.toml")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_ai_weight() {
        let config = AppConfig::default();
        assert!((config.scoring.ai_weight - 1.0).abs() < 1e-9);
        assert_eq!(config.server.port, 8787);
        assert!(config.feed.seed_demo_posts);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::parse(
            r#"
[server]
port = 9000

[judge]
model = "gemini-2.5-flash"
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.judge.model, "gemini-2.5-flash");
        assert_eq!(config.judge.timeout_ms, 20_000);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = AppConfig::parse("[server\nport = 1").unwrap_err();
        assert!(err.starts_with("failed to parse config"));
    }

    #[test]
    fn write_then_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cooked.toml");
        let mut config = AppConfig::default();
        config.feed.seed_demo_posts = false;
        config.write(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded = AppConfig::parse(&contents).unwrap();
        assert!(!loaded.feed.seed_demo_posts);
    }
}
