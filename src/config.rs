use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{SocialKind, SocialLink};

const DEFAULT_ENV_PREFIX: &str = "MARQUEE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub sanity: SanityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_social")]
    pub social: Vec<SocialLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanityConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_use_cdn")]
    pub use_cdn: bool,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            dataset: default_dataset(),
            api_version: default_api_version(),
            use_cdn: default_use_cdn(),
        }
    }
}

fn default_project_id() -> String {
    "85zzbmzs".into()
}

fn default_dataset() -> String {
    "production".into()
}

fn default_api_version() -> String {
    "2023-05-03".into()
}

fn default_use_cdn() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff", with = "humantime_serde")]
    pub retry_backoff: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            fetch_timeout: default_fetch_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_social() -> Vec<SocialLink> {
    SocialKind::ALL
        .into_iter()
        .map(|kind| SocialLink {
            kind,
            url: String::new(),
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config {
        social: default_social(),
        ..Config::default()
    };

    if let Some(path) = options.config_file.as_ref() {
        anyhow::ensure!(path.exists(), "config: file {} not found", path.display());
        cfg = read_config_file(path)?;
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            cfg = read_config_file(&default_path)?;
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix, env::vars());

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn apply_env(cfg: &mut Config, prefix: &str, vars: impl IntoIterator<Item = (String, String)>) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "sanity.project_id" => cfg.sanity.project_id = value,
        "sanity.dataset" => cfg.sanity.dataset = value,
        "sanity.api_version" => cfg.sanity.api_version = value,
        "sanity.use_cdn" => {
            cfg.sanity.use_cdn = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        "cache.ttl" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.cache.ttl = duration;
            }
        }
        "cache.fetch_timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.cache.fetch_timeout = duration;
            }
        }
        "cache.retry_backoff" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.cache.retry_backoff = duration;
            }
        }
        "cache.max_retries" => {
            if let Ok(parsed) = value.parse::<u32>() {
                cfg.cache.max_retries = parsed;
            }
        }
        _ => {
            tracing::debug!(key, "Ignoring unknown config override");
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("marquee").join("config.yaml"))
}
