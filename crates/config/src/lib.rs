//! Configuration loading, validation, and management for matric.
//!
//! Loads configuration from a TOML file (`$MATRIC_CONFIG`, `./matric.toml`,
//! or `~/.matric/config.toml`, first hit wins) with environment variable
//! overrides applied afterwards. Credentials are expected from the
//! environment: `GEMINI_API_KEY`, `PINECONE_API_KEY`, `PINECONE_INDEX_NAME`.
//!
//! Structural validation happens at load time; credential presence is
//! checked separately via [`AppConfig::require_credentials`] so commands
//! that never touch the hosted services (`config show`, `doctor`) can still
//! inspect a partial setup.

use matric_core::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default persona template, used when neither `persona` nor `persona_path`
/// is configured. The template is passed to the prompt builder verbatim.
pub const DEFAULT_PERSONA: &str = "You are Thuto, a friendly and knowledgeable South African tutor \
who helps CAPS and IEB learners in grades 8 to 12. You explain concepts clearly and accurately, \
with a focus on Life Sciences, and you encourage students to reason through problems step by step.";

/// The root configuration structure.
///
/// Maps directly to `matric.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Inline persona template override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,

    /// Path to a persona template file (takes precedence over `persona`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_path: Option<PathBuf>,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Retrieval pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Sampling parameters for the generation call
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Gemini (generation + embeddings) client configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Pinecone (vector index) client configuration
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Retry policy for external calls
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("persona", &self.persona.as_deref().map(|_| "<inline>"))
            .field("persona_path", &self.persona_path)
            .field("gateway", &self.gateway)
            .field("pipeline", &self.pipeline)
            .field("generation", &self.generation)
            .field("gemini", &self.gemini)
            .field("pinecone", &self.pinecone)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Include the diagnostic `debug` object in failure payloads
    #[serde(default)]
    pub expose_debug: bool,

    /// Hard per-request deadline enforced by the chat handler
    #[serde(default = "default_deadline_secs")]
    pub request_deadline_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_deadline_secs() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            expose_debug: false,
            request_deadline_secs: default_deadline_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Nearest neighbors requested from the index
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum passages assembled into the prompt
    #[serde(default = "default_max_passages")]
    pub max_passages: usize,

    /// Minimum similarity score for a passage to qualify
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Per-passage character cap before truncation
    #[serde(default = "default_passage_char_cap")]
    pub passage_char_cap: usize,
}

fn default_top_k() -> usize {
    5
}
fn default_max_passages() -> usize {
    3
}
fn default_relevance_threshold() -> f32 {
    0.5
}
fn default_passage_char_cap() -> usize {
    800
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_passages: default_max_passages(),
            relevance_threshold: default_relevance_threshold(),
            passage_char_cap: default_passage_char_cap(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (env: `GEMINI_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation model (env: `GEMINI_MODEL`)
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Embedding model (env: `GEMINI_EMBED_MODEL`)
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}
fn default_embed_model() -> String {
    "text-embedding-004".into()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_gemini_timeout_secs() -> u64 {
    30
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            embed_model: default_embed_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("embed_model", &self.embed_model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// API key (env: `PINECONE_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Index name (env: `PINECONE_INDEX_NAME`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    /// Data-plane host; resolved from the control plane when absent
    /// (env: `PINECONE_INDEX_HOST`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_host: Option<String>,

    #[serde(default = "default_pinecone_control_url")]
    pub control_url: String,

    #[serde(default = "default_pinecone_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pinecone_control_url() -> String {
    "https://api.pinecone.io".into()
}
fn default_pinecone_timeout_secs() -> u64 {
    10
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: None,
            index_host: None,
            control_url: default_pinecone_control_url(),
            timeout_secs: default_pinecone_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &redact(&self.api_key))
            .field("index_name", &self.index_name)
            .field("index_host", &self.index_host)
            .field("control_url", &self.control_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Presence booleans for the required credentials, reported in the
/// flag-gated debug payload and by `matric doctor`. Never carries values.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CredentialStatus {
    pub gemini_key: bool,
    pub pinecone_key: bool,
    pub index_name: bool,
}

impl CredentialStatus {
    pub fn all_present(&self) -> bool {
        self.gemini_key && self.pinecone_key && self.index_name
    }
}

fn is_missing(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

impl AppConfig {
    /// Load configuration from the default path with environment overrides.
    ///
    /// Environment variables win over file values, since credentials are
    /// expected from the environment in every deployment:
    /// - `GEMINI_API_KEY`, `PINECONE_API_KEY`, `PINECONE_INDEX_NAME`
    /// - `PINECONE_INDEX_HOST`, `GEMINI_MODEL`, `GEMINI_EMBED_MODEL`
    /// - `MATRIC_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;

        if let Some(key) = env_nonempty("GEMINI_API_KEY") {
            config.gemini.api_key = Some(key);
        }
        if let Some(key) = env_nonempty("PINECONE_API_KEY") {
            config.pinecone.api_key = Some(key);
        }
        if let Some(name) = env_nonempty("PINECONE_INDEX_NAME") {
            config.pinecone.index_name = Some(name);
        }
        if let Some(host) = env_nonempty("PINECONE_INDEX_HOST") {
            config.pinecone.index_host = Some(host);
        }
        if let Some(model) = env_nonempty("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(model) = env_nonempty("GEMINI_EMBED_MODEL") {
            config.gemini.embed_model = model;
        }
        if let Some(port) = env_nonempty("MATRIC_PORT") {
            config.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("MATRIC_PORT is not a valid port: {port}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the config file path: `$MATRIC_CONFIG`, then `./matric.toml`,
    /// then `~/.matric/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Some(path) = env_nonempty("MATRIC_CONFIG") {
            return PathBuf::from(path);
        }
        let local = PathBuf::from("matric.toml");
        if local.exists() {
            return local;
        }
        Self::config_dir().join("config.toml")
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".matric")
    }

    /// Validate structural settings (value ranges, not credential presence).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be between 0.0 and 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pipeline.relevance_threshold) {
            return Err(ConfigError::ValidationError(
                "pipeline.relevance_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.pipeline.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.top_k must be at least 1".into(),
            ));
        }
        if self.pipeline.max_passages == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_passages must be at least 1".into(),
            ));
        }
        if self.pipeline.passage_char_cap == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.passage_char_cap must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.gateway.request_deadline_secs == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.request_deadline_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Fail fast when any required credential is absent, naming every
    /// missing variable. Must pass before any external call is attempted.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if is_missing(&self.gemini.api_key) {
            missing.push("GEMINI_API_KEY");
        }
        if is_missing(&self.pinecone.api_key) {
            missing.push("PINECONE_API_KEY");
        }
        if is_missing(&self.pinecone.index_name) {
            missing.push("PINECONE_INDEX_NAME");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }

    /// Which required credentials are present (booleans only, no values).
    pub fn credential_status(&self) -> CredentialStatus {
        CredentialStatus {
            gemini_key: !is_missing(&self.gemini.api_key),
            pinecone_key: !is_missing(&self.pinecone.api_key),
            index_name: !is_missing(&self.pinecone.index_name),
        }
    }

    /// Resolve the persona template: `persona_path` file, then inline
    /// `persona`, then the built-in default.
    pub fn persona(&self) -> Result<String, ConfigError> {
        if let Some(path) = &self.persona_path {
            let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "persona file {} is empty",
                    path.display()
                )));
            }
            return Ok(trimmed.to_string());
        }
        if let Some(inline) = &self.persona {
            return Ok(inline.clone());
        }
        Ok(DEFAULT_PERSONA.to_string())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            persona: None,
            persona_path: None,
            gateway: GatewayConfig::default(),
            pipeline: PipelineConfig::default(),
            generation: GenerationConfig::default(),
            gemini: GeminiConfig::default(),
            pinecone: PineconeConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for matric_core::Error {
    fn from(err: ConfigError) -> Self {
        matric_core::Error::Config {
            message: err.to_string(),
        }
    }
}
