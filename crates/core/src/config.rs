//! Configuration management for the science tutor.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.tutor/config.yaml`, or `--config` / `TUTOR_CONFIG`)
//! - Environment variables (`TUTOR_*`)
//! - Command-line flags
//!
//! The resulting [`AppConfig`] is immutable once validated and is handed to
//! every component by reference.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Text-generation providers with a client implementation.
pub const KNOWN_PROVIDERS: [&str; 1] = ["ollama"];

/// Embedding providers with an implementation.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root; relative paths below are resolved against it
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Source document (PDF or page-structured text)
    pub pdf_path: PathBuf,

    /// Text-generation provider (e.g., "ollama")
    pub provider: String,

    /// Text-generation model identifier
    pub model: String,

    /// Provider endpoint
    pub endpoint: String,

    /// Sampling temperature passed to the generation model (model default when unset)
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens (model default when unset)
    pub max_tokens: Option<u32>,

    /// Embedding provider ("ollama" or "mock")
    pub embedding_provider: String,

    /// Embedding model identifier; must be the same for indexing and querying
    pub embedding_model: String,

    /// Expected embedding dimensions (taken from the provider when unset)
    pub embedding_dimensions: Option<usize>,

    /// Texts per embedding request batch
    pub embedding_batch_size: usize,

    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Directory holding the persisted vector index
    pub persist_dir: PathBuf,

    /// Logical namespace inside the vector index
    pub collection_name: String,

    /// Number of chunks retrieved per question
    pub top_k: usize,

    /// Upper bound for a single embedding or generation call
    pub request_timeout_secs: u64,

    /// Grade level the tutor prompt addresses
    pub grade_level: String,

    /// Prompt definition id (looked up under `.tutor/prompts/`)
    pub prompt_id: String,

    /// Directory for the daily log file and the query history
    pub log_dir: PathBuf,

    /// Query history file (defaults to `<log_dir>/query_history.json`)
    pub history_file: Option<PathBuf>,

    /// Address the web front end binds to
    pub bind: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    source: Option<SourceSection>,
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    index: Option<IndexSection>,
    tutor: Option<TutorSection>,
    logging: Option<LoggingSection>,
    server: Option<ServerSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    #[serde(rename = "batchSize")]
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexSection {
    #[serde(rename = "chunkSize")]
    chunk_size: Option<usize>,
    #[serde(rename = "chunkOverlap")]
    chunk_overlap: Option<usize>,
    #[serde(rename = "persistDir")]
    persist_dir: Option<String>,
    #[serde(rename = "collectionName")]
    collection_name: Option<String>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TutorSection {
    #[serde(rename = "gradeLevel")]
    grade_level: Option<String>,
    #[serde(rename = "promptId")]
    prompt_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    dir: Option<String>,
    #[serde(rename = "historyFile")]
    history_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

/// Command-line overrides applied on top of file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub model: Option<String>,
    pub embedding_provider: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            pdf_path: PathBuf::from("jesc101.pdf"),
            provider: "ollama".to_string(), // Local-first default
            model: "deepseek-r1:1.5b".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            temperature: None,
            max_tokens: None,
            embedding_provider: "ollama".to_string(),
            embedding_model: "deepseek-r1:1.5b".to_string(),
            embedding_dimensions: None,
            embedding_batch_size: 32,
            chunk_size: 1000,
            chunk_overlap: 200,
            persist_dir: PathBuf::from("vector_store"),
            collection_name: "textbook_docs".to_string(),
            top_k: 4,
            request_timeout_secs: 120,
            grade_level: "10th".to_string(),
            prompt_id: "tutor.answer.default".to_string(),
            log_dir: PathBuf::from("logs"),
            history_file: None,
            bind: "127.0.0.1:8501".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `TUTOR_WORKSPACE`: Override workspace path
    /// - `TUTOR_CONFIG`: Path to config file
    /// - `TUTOR_PDF`: Source document path
    /// - `TUTOR_MODEL`: Generation model
    /// - `TUTOR_EMBEDDING_MODEL`: Embedding model
    /// - `TUTOR_OLLAMA_URL`: Ollama endpoint
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// (from the command line) takes precedence over the environment.
    pub fn load_with(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> AppResult<Self> {
        let workspace =
            workspace.or_else(|| std::env::var("TUTOR_WORKSPACE").ok().map(PathBuf::from));
        let config_file =
            config_file.or_else(|| std::env::var("TUTOR_CONFIG").ok().map(PathBuf::from));

        let mut config = Self::from_workspace(workspace, config_file)?;

        // Environment variables override YAML config
        if let Ok(pdf) = std::env::var("TUTOR_PDF") {
            config.pdf_path = PathBuf::from(pdf);
        }

        if let Ok(model) = std::env::var("TUTOR_MODEL") {
            config.model = model;
        }

        if let Ok(model) = std::env::var("TUTOR_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        if let Ok(endpoint) = std::env::var("TUTOR_OLLAMA_URL") {
            config.endpoint = endpoint;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Build configuration from defaults and the workspace config file only.
    pub fn from_workspace(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => config.resolve(cf),
            None => config.tutor_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(source) = file.source {
            if let Some(path) = source.path {
                result.pdf_path = PathBuf::from(path);
            }
        }

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = endpoint;
            }
            if let Some(timeout) = llm.timeout_secs {
                result.request_timeout_secs = timeout;
            }
            if llm.temperature.is_some() {
                result.temperature = llm.temperature;
            }
            if llm.max_tokens.is_some() {
                result.max_tokens = llm.max_tokens;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if embedding.dimensions.is_some() {
                result.embedding_dimensions = embedding.dimensions;
            }
            if let Some(batch_size) = embedding.batch_size {
                result.embedding_batch_size = batch_size;
            }
        }

        if let Some(index) = file.index {
            if let Some(size) = index.chunk_size {
                result.chunk_size = size;
            }
            if let Some(overlap) = index.chunk_overlap {
                result.chunk_overlap = overlap;
            }
            if let Some(dir) = index.persist_dir {
                result.persist_dir = PathBuf::from(dir);
            }
            if let Some(name) = index.collection_name {
                result.collection_name = name;
            }
            if let Some(top_k) = index.top_k {
                result.top_k = top_k;
            }
        }

        if let Some(tutor) = file.tutor {
            if let Some(grade) = tutor.grade_level {
                result.grade_level = grade;
            }
            if let Some(prompt_id) = tutor.prompt_id {
                result.prompt_id = prompt_id;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(dir) = logging.dir {
                result.log_dir = PathBuf::from(dir);
            }
            if let Some(history) = logging.history_file {
                result.history_file = Some(PathBuf::from(history));
            }
        }

        if let Some(server) = file.server {
            if let Some(bind) = server.bind {
                result.bind = bind;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(pdf_path) = overrides.pdf_path {
            self.pdf_path = pdf_path;
        }

        if let Some(model) = overrides.model {
            self.model = model;
        }

        if let Some(provider) = overrides.embedding_provider {
            self.embedding_provider = provider;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a possibly relative path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get the path to the .tutor directory.
    pub fn tutor_dir(&self) -> PathBuf {
        self.workspace.join(".tutor")
    }

    /// Absolute path of the source document.
    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.pdf_path)
    }

    /// Absolute path of the vector index directory.
    pub fn persist_path(&self) -> PathBuf {
        self.resolve(&self.persist_dir)
    }

    /// Absolute path of the log directory.
    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_dir)
    }

    /// Absolute path of the query history file.
    pub fn history_path(&self) -> PathBuf {
        match self.history_file {
            Some(ref file) => self.resolve(file),
            None => self.log_path().join("query_history.json"),
        }
    }

    /// Validate the configuration before any component is built from it.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() || self.embedding_model.trim().is_empty() {
            return Err(AppError::Config("Model names cannot be empty".to_string()));
        }

        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be greater than zero".to_string()));
        }

        if self.embedding_batch_size == 0 {
            return Err(AppError::Config(
                "embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.embedding_dimensions == Some(0) {
            return Err(AppError::Config(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::Config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(AppError::Config(
                "max_tokens must be greater than zero".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        if self.collection_name.trim().is_empty() {
            return Err(AppError::Config(
                "collection_name cannot be empty".to_string(),
            ));
        }

        for (label, path) in [
            ("pdf_path", &self.pdf_path),
            ("persist_dir", &self.persist_dir),
            ("log_dir", &self.log_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", label)));
            }
        }

        let source = self.source_path();
        if !source.is_file() {
            return Err(AppError::Config(format!(
                "Source document not found: {:?}",
                source
            )));
        }

        Ok(())
    }
}
