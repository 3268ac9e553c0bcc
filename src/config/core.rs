use super::{RunDefaults, RunFormat, Strategy};
use crate::parallel::PoolConfig;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml, Yaml},
};
use std::path::Path;
use tracing::{debug, warn};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

pub struct WorkpoolConfig {
    figment: Figment,
}

impl WorkpoolConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&str>) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG)); // Embedded defaults

        // A custom config replaces the user and repository layers
        if let Some(custom_path) = custom_config {
            if !Path::new(custom_path).exists() {
                warn!("Config file {custom_path} not found, using defaults");
            }
            figment = match Path::new(custom_path).extension().and_then(|e| e.to_str()) {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            let user_config = Self::user_config_path();
            figment = figment
                // User config - support multiple formats
                .merge(Toml::file(&user_config))
                .merge(Json::file(user_config.replace(".toml", ".json")))
                .merge(Yaml::file(user_config.replace(".toml", ".yaml")))
                .merge(Yaml::file(user_config.replace(".toml", ".yml")))
                // Repository config - support multiple formats
                .merge(Toml::file("workpool.toml"))
                .merge(Json::file("workpool.json"))
                .merge(Yaml::file("workpool.yaml"))
                .merge(Yaml::file("workpool.yml"));
        }

        // Environment variables always have highest priority
        figment = figment.merge(Env::prefixed("WORKPOOL_").split("__"));
        debug!("Configuration layers merged");

        Ok(WorkpoolConfig { figment })
    }

    /// Construction parameters for a pool
    pub fn pool_config(&self) -> Result<PoolConfig> {
        self.figment
            .extract_inner("pool")
            .context("Invalid [pool] configuration")
    }

    /// Defaults for the `run` command
    pub fn run_defaults(&self) -> Result<RunDefaults> {
        self.figment
            .extract_inner("run")
            .context("Invalid [run] configuration")
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/workpool/config.toml"),
            Err(_) => "~/.config/workpool/config.toml".to_string(),
        }
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            strategy: Strategy::Static,
            items: 20,
            delay_ms: 100,
            format: RunFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::{FailurePolicy, ThreadCount};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_loading() {
        let config = WorkpoolConfig::load();
        assert!(config.is_ok(), "Should load default config successfully");
    }

    #[test]
    fn test_embedded_defaults() {
        let config = WorkpoolConfig::load_with_custom_config(Some("non_existent.toml")).unwrap();

        let pool = config.pool_config().unwrap();
        assert_eq!(pool.threads, ThreadCount::Auto);
        assert!(pool.cache_results);
        assert!(!pool.verbose);
        assert_eq!(pool.failure_policy, FailurePolicy::SkipItem);
        assert_eq!(pool.hardware_threads, None);

        let run = config.run_defaults().unwrap();
        assert_eq!(run, RunDefaults::default());
    }

    #[test]
    fn test_custom_toml_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pool.toml");
        fs::write(
            &path,
            r#"
[pool]
threads = 3
failure_policy = "abort-worker"

[run]
strategy = "dynamic"
"#,
        )
        .unwrap();

        let config = WorkpoolConfig::load_with_custom_config(path.to_str()).unwrap();
        let pool = config.pool_config().unwrap();
        assert_eq!(pool.threads, ThreadCount::fixed(3).unwrap());
        assert_eq!(pool.failure_policy, FailurePolicy::AbortWorker);
        // Untouched keys keep their embedded defaults
        assert!(pool.cache_results);
        assert_eq!(config.run_defaults().unwrap().strategy, Strategy::Dynamic);
    }

    #[test]
    fn test_custom_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pool.json");
        fs::write(&path, r#"{"pool": {"threads": "auto", "cache_results": false}}"#).unwrap();

        let config = WorkpoolConfig::load_with_custom_config(path.to_str()).unwrap();
        assert!(!config.pool_config().unwrap().cache_results);
    }

    #[test]
    fn test_invalid_thread_count_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pool.toml");
        fs::write(&path, "[pool]\nthreads = 0\n").unwrap();

        let config = WorkpoolConfig::load_with_custom_config(path.to_str()).unwrap();
        assert!(config.pool_config().is_err());
    }

    #[test]
    fn test_sections() {
        let config = WorkpoolConfig::load_with_custom_config(Some("non_existent.toml")).unwrap();
        let section = config.get_section("pool").unwrap();
        assert_eq!(section["threads"], "auto");
        assert!(config.get_full_config().unwrap().get("run").is_some());
    }
}
