use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub const CONFIG_FILE: &str = ".hybridfix.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fallback: FallbackConfig,
    pub validation: ValidationConfig,
    pub transforms: TransformConfig,
    pub ignore: IgnoreConfig,
    /// Files processed concurrently.
    pub parallelism: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Upper bound on provider calls per run, retries included.
    pub max_invocations: usize,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    /// External command backing the fallback. Unset means no fallback.
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Lines a patch may touch beyond the finding's span.
    pub locality_margin: usize,
    pub signature_change_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub commented_code_threshold: f64,
    /// Categories whose deterministic transform is switched off.
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    pub paths: Vec<String>,
    pub categories: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback: FallbackConfig::default(),
            validation: ValidationConfig::default(),
            transforms: TransformConfig::default(),
            ignore: IgnoreConfig::default(),
            parallelism: 4,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_invocations: 10,
            timeout_secs: 30,
            max_concurrent: 2,
            command: None,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            locality_margin: 3,
            signature_change_categories: Vec::new(),
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            commented_code_threshold: 0.7,
            disabled: Vec::new(),
        }
    }
}

impl FallbackConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load(project_path: &Path) -> Self {
        let config_path = project_path.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_yaml::from_str::<Config>(&content) {
                    Ok(config) => return config,
                    Err(e) => warn!(path = %config_path.display(), error = %e, "invalid config, using defaults"),
                },
                Err(e) => warn!(path = %config_path.display(), error = %e, "unreadable config, using defaults"),
            }
        }
        Config::default()
    }

    pub fn is_ignored_path(&self, relative: &Path) -> bool {
        self.ignore
            .paths
            .iter()
            .any(|prefix| relative.starts_with(prefix))
    }

    pub fn is_ignored_category(&self, category: &str) -> bool {
        self.ignore.categories.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path());
        assert_eq!(config.fallback.max_invocations, 10);
        assert_eq!(config.validation.locality_margin, 3);
        assert!((config.transforms.commented_code_threshold - 0.7).abs() < f64::EPSILON);
        assert!(config.fallback.command.is_none());
        assert_eq!(config.parallelism, 4);
    }

    #[test]
    fn test_load_partial_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let yaml = "fallback:\n  max_invocations: 0\n  command: [\"llm\", \"--java\"]\nignore:\n  categories:\n    - commented-out-code\n  paths:\n    - generated\n";
        fs::write(tmp.path().join(CONFIG_FILE), yaml).unwrap();
        let config = Config::load(tmp.path());
        assert_eq!(config.fallback.max_invocations, 0);
        assert_eq!(config.fallback.timeout_secs, 30);
        assert_eq!(config.fallback.command.as_ref().unwrap()[0], "llm");
        assert!(config.is_ignored_category("commented-out-code"));
        assert!(config.is_ignored_path(Path::new("generated/Foo.java")));
        assert!(!config.is_ignored_path(Path::new("src/Foo.java")));
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "parallelism: [not a number").unwrap();
        let config = Config::load(tmp.path());
        assert_eq!(config.parallelism, 4);
    }
}
