use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub image: ImageConfig,
    pub jobs: JobConfig,
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Longest edge allowed after downscaling, in pixels.
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// How long a finished job stays pollable.
    pub retention_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub europeana_api_key: Option<String>,
    pub europeana_base_url: String,
    pub europeana_rows: u32,
    pub met_base_url: String,
    pub met_max_results: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                max_body_bytes: 20 * 1024 * 1024,
            },
            llm: LLMConfig {
                anthropic_api_key: String::new(),
                anthropic_base_url: "https://api.anthropic.com".to_string(),
                model: "claude-sonnet-4-5-20250929".to_string(),
                max_tokens: 8192,
                timeout_secs: 180,
            },
            image: ImageConfig {
                max_dimension: 800,
                jpeg_quality: 50,
            },
            jobs: JobConfig {
                retention_secs: 600,
            },
            enrichment: EnrichmentConfig {
                europeana_api_key: None,
                europeana_base_url: "https://api.europeana.eu".to_string(),
                europeana_rows: 5,
                met_base_url: "https://collectionapi.metmuseum.org/public/collection/v1".to_string(),
                met_max_results: 5,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            server: ServerConfig {
                port: env_or("PORT", defaults.server.port)?,
                host: env::var("HOST").unwrap_or(defaults.server.host),
                max_body_bytes: env_or("MAX_BODY_BYTES", defaults.server.max_body_bytes)?,
            },
            llm: LLMConfig {
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
                anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                    .unwrap_or(defaults.llm.anthropic_base_url),
                model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.llm.model),
                max_tokens: env_or("ANTHROPIC_MAX_TOKENS", defaults.llm.max_tokens)?,
                timeout_secs: env_or("LLM_TIMEOUT_SECS", defaults.llm.timeout_secs)?,
            },
            image: ImageConfig {
                max_dimension: env_or("IMAGE_MAX_DIMENSION", defaults.image.max_dimension)?,
                jpeg_quality: env_or("IMAGE_JPEG_QUALITY", defaults.image.jpeg_quality)?,
            },
            jobs: JobConfig {
                retention_secs: env_or("JOB_RETENTION_SECS", defaults.jobs.retention_secs)?,
            },
            enrichment: EnrichmentConfig {
                europeana_api_key: env::var("EUROPEANA_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                europeana_base_url: env::var("EUROPEANA_BASE_URL")
                    .unwrap_or(defaults.enrichment.europeana_base_url),
                europeana_rows: env_or("EUROPEANA_ROWS", defaults.enrichment.europeana_rows)?,
                met_base_url: env::var("MET_MUSEUM_BASE_URL")
                    .unwrap_or(defaults.enrichment.met_base_url),
                met_max_results: env_or("MET_MAX_RESULTS", defaults.enrichment.met_max_results)?,
            },
        })
    }
}

impl Config {
    /// Apply command-line `--host` / `--port` on top of the environment.
    pub fn with_listen_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}

impl JobConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl LLMConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parse an env var, falling back to `default` when it is unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
