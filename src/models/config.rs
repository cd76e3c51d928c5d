use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4";
pub const DEFAULT_COLLECTION: &str = "som_mindshift";
pub const DEFAULT_PERSIST_DIR: &str = "./mindshift_db";
pub const DEFAULT_DOCUMENTS_DIR: &str = "./som_documents";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_TOP_K: usize = 5;

const PROJECT_CONFIG_FILE: &str = "mindshift.toml";

/// Runtime configuration, built once and handed to every collaborator by reference.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mindshift").join("config.toml"))
    }

    pub fn project_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }

    /// The config file that `load` would read, if any exists.
    pub fn config_path() -> Option<PathBuf> {
        let project = Self::project_path();
        if project.exists() {
            return Some(project);
        }
        Self::global_path().filter(|p| p.exists())
    }

    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from an environment-style lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.openai.base_url = url;
        }
        if let Some(model) = get("MINDSHIFT_EMBEDDING_MODEL") {
            self.openai.embedding_model = model;
        }
        if let Some(model) = get("MINDSHIFT_COMPLETION_MODEL") {
            self.openai.completion_model = model;
        }
        if let Some(dir) = get("MINDSHIFT_DOCS_DIR") {
            self.ingest.documents_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("MINDSHIFT_PERSIST_DIR") {
            self.store.persist_directory = PathBuf::from(dir);
        }
        if let Some(name) = get("MINDSHIFT_COLLECTION") {
            self.store.collection = name;
        }
        if let Some(value) = get("MINDSHIFT_CHUNK_SIZE") {
            self.ingest.chunk_size = parse_usize("MINDSHIFT_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = get("MINDSHIFT_CHUNK_OVERLAP") {
            self.ingest.chunk_overlap = parse_usize("MINDSHIFT_CHUNK_OVERLAP", &value)?;
        }
        if let Some(value) = get("MINDSHIFT_TOP_K") {
            self.retrieval.top_k = parse_usize("MINDSHIFT_TOP_K", &value)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "collection name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The API credential; ingestion and query refuse to start without one.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.openai
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Read from the environment; never written back to disk.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_completion_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    64
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            completion_model: default_completion_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_persist_directory")]
    pub persist_directory: PathBuf,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_persist_directory() -> PathBuf {
    PathBuf::from(DEFAULT_PERSIST_DIR)
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_directory: default_persist_directory(),
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOCUMENTS_DIR)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["**/~$*".to_string(), "**/*.tmp".to_string()]
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            recursive: false,
            exclude_patterns: default_exclude_patterns(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            default_format: OutputFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.store.collection, DEFAULT_COLLECTION);
        assert_eq!(config.openai.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides_from(lookup(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("MINDSHIFT_CHUNK_SIZE", "500"),
                ("MINDSHIFT_CHUNK_OVERLAP", "50"),
                ("MINDSHIFT_TOP_K", "3"),
                ("MINDSHIFT_COLLECTION", "beliefs"),
                ("MINDSHIFT_PERSIST_DIR", "/tmp/store"),
            ]))
            .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.ingest.chunk_size, 500);
        assert_eq!(config.ingest.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.store.collection, "beliefs");
        assert_eq!(config.store.persist_directory, PathBuf::from("/tmp/store"));
    }

    #[test]
    fn test_invalid_numeric_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides_from(lookup(&[("MINDSHIFT_TOP_K", "many")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { .. }));
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = Config::default();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));

        config.openai.api_key = Some("   ".to_string());
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_validation_rejects_overlap_not_below_size() {
        let mut config = Config::default();
        config.ingest.chunk_size = 100;
        config.ingest.chunk_overlap = 100;
        assert!(config.validate().is_err());

        config.ingest.chunk_overlap = 99;
        assert!(config.validate().is_ok());

        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-secret".to_string());
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [ingest]
            chunk_size = 400
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.chunk_size, 400);
        assert_eq!(config.ingest.chunk_overlap, DEFAULT_CHUNK_OVERLAP);
        assert_eq!(config.retrieval.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.store.collection = "saved".to_string();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.store.collection, "saved");
        assert!(loaded.openai.api_key.is_none());
    }
}
