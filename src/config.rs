use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub providers: ProvidersConfig,

    pub executor: ExecutorConfig,

    pub dedup: DedupConfig,

    pub cache: CacheConfig,

    pub processing: ProcessingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            providers: ProvidersConfig::default(),
            executor: ExecutorConfig::default(),
            dedup: DedupConfig::default(),
            cache: CacheConfig::default(),
            processing: ProcessingConfig::default(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/fetcharr.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Providers queried when a request names none.
    pub default: Vec<String>,

    pub searxng: SearxngConfig,

    pub brave: BraveConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: vec!["searxng".to_string()],
            searxng: SearxngConfig::default(),
            brave: BraveConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearxngConfig {
    pub base_url: String,
}

impl Default for SearxngConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BraveConfig {
    pub base_url: String,

    pub api_key: String,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.search.brave.com/res/v1/web/search".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Deadline for one whole fan-out (default: 30)
    pub overall_timeout_seconds: u64,

    /// Deadline for a single provider call (default: 10)
    pub provider_timeout_seconds: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            overall_timeout_seconds: 30,
            provider_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Title similarity at or above this marks a duplicate (default: 0.85)
    pub title_similarity_threshold: f64,

    /// When true the normalized-URL pass is skipped; only byte-level
    /// URL equality and title similarity apply.
    pub strict_url_matching: bool,

    /// Domains exempt from normalized-URL matching.
    pub ignored_domains: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            title_similarity_threshold: 0.85,
            strict_url_matching: false,
            ignored_domains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache entry lifetime in seconds (default: 3600)
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Background worker count (default: 1, preserving queue order)
    pub workers: usize,

    /// Bounded queue capacity for background jobs (default: 64)
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6780,
            cors_allowed_origins: vec![
                "http://localhost:6780".to_string(),
                "http://127.0.0.1:6780".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "fetcharr".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fetcharr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".fetcharr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.providers.default.is_empty() {
            anyhow::bail!("At least one default provider must be configured");
        }

        if self
            .providers
            .default
            .iter()
            .any(|p| p == "brave")
            && self.providers.brave.api_key.is_empty()
        {
            anyhow::bail!("Brave API key cannot be empty when brave is a default provider");
        }

        if self.executor.overall_timeout_seconds == 0 || self.executor.provider_timeout_seconds == 0
        {
            anyhow::bail!("Executor timeouts must be > 0");
        }

        if !(0.0..=1.0).contains(&self.dedup.title_similarity_threshold) {
            anyhow::bail!("Title similarity threshold must be within [0, 1]");
        }

        if self.processing.workers == 0 {
            anyhow::bail!("Processing worker count must be > 0");
        }

        if self.cache.ttl_seconds == 0 {
            anyhow::bail!("Cache TTL must be > 0");
        }

        Ok(())
    }

    /// Dedup options derived from config, used when a request carries none.
    #[must_use]
    pub fn default_dedup_options(&self) -> crate::models::DeduplicationOptions {
        crate::models::DeduplicationOptions {
            title_similarity_threshold: self.dedup.title_similarity_threshold,
            strict_url_matching: self.dedup.strict_url_matching,
            ignored_domains: self.dedup.ignored_domains.clone(),
        }
    }
}
