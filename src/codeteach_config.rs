//! Unified configuration for codeteach.
//!
//! Reads `.codeteach/codeteach.toml` and layers it file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [model]
//! endpoint = "http://localhost:11434/v1"
//! name = "Hermes-3-Llama-3.1-8B"
//! api_key_env = "CODETEACH_API_KEY"
//!
//! [model.chat]
//! temperature = 0.7
//! max_tokens = 1500
//!
//! [model.summary]
//! temperature = 0.3
//! max_tokens = 200
//!
//! [conversation]
//! summarize_after_user_turns = 3
//! recent_window = 6
//!
//! [harness]
//! python_cmd = "python3"
//! retries = 1
//!
//! [storage]
//! problems_file = "problems.json"
//! progress_file = ".codeteach/progress.json"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::GenerationParams;

pub const CONFIG_DIR: &str = ".codeteach";
pub const CONFIG_FILE: &str = "codeteach.toml";

pub const ENV_ENDPOINT: &str = "CODETEACH_MODEL_ENDPOINT";
pub const ENV_MODEL: &str = "CODETEACH_MODEL";
pub const ENV_PYTHON: &str = "CODETEACH_PYTHON";

/// Sampling settings for one kind of model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingSection {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<SamplingSection> for GenerationParams {
    fn from(section: SamplingSection) -> Self {
        GenerationParams {
            temperature: section.temperature,
            max_tokens: section.max_tokens,
        }
    }
}

fn default_chat_sampling() -> SamplingSection {
    let params = GenerationParams::chat();
    SamplingSection {
        temperature: params.temperature,
        max_tokens: params.max_tokens,
    }
}

fn default_summary_sampling() -> SamplingSection {
    let params = GenerationParams::summary();
    SamplingSection {
        temperature: params.temperature,
        max_tokens: params.max_tokens,
    }
}

/// Model service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model name sent with every request
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Environment variable holding the API key, if the server wants one
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_chat_sampling")]
    pub chat: SamplingSection,
    #[serde(default = "default_summary_sampling")]
    pub summary: SamplingSection,
}

fn default_endpoint() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_model_name() -> String {
    "Hermes-3-Llama-3.1-8B".to_string()
}

fn default_api_key_env() -> String {
    "CODETEACH_API_KEY".to_string()
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            name: default_model_name(),
            api_key_env: default_api_key_env(),
            chat: default_chat_sampling(),
            summary: default_summary_sampling(),
        }
    }
}

/// Context-management thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSection {
    /// Summarize the oldest exchange once user turns exceed this
    #[serde(default = "default_summarize_after")]
    pub summarize_after_user_turns: usize,
    /// Turns sent verbatim; older ones are summarized per request
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_summarize_after() -> usize {
    crate::conversation::policy::DEFAULT_MAX_USER_TURNS
}

fn default_recent_window() -> usize {
    crate::conversation::prompt::DEFAULT_RECENT_WINDOW
}

impl Default for ConversationSection {
    fn default() -> Self {
        Self {
            summarize_after_user_turns: default_summarize_after(),
            recent_window: default_recent_window(),
        }
    }
}

/// Test harness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessSection {
    #[serde(default = "default_python_cmd")]
    pub python_cmd: String,
    /// Extra attempts after an interpreter transport failure
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_python_cmd() -> String {
    "python3".to_string()
}

fn default_retries() -> u32 {
    1
}

impl Default for HarnessSection {
    fn default() -> Self {
        Self {
            python_cmd: default_python_cmd(),
            retries: default_retries(),
        }
    }
}

/// File locations, relative to the project directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_problems_file")]
    pub problems_file: PathBuf,
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
}

fn default_problems_file() -> PathBuf {
    PathBuf::from("problems.json")
}

fn default_progress_file() -> PathBuf {
    Path::new(CONFIG_DIR).join("progress.json")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            problems_file: default_problems_file(),
            progress_file: default_progress_file(),
        }
    }
}

/// The complete codeteach.toml configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CodeteachToml {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub conversation: ConversationSection,
    #[serde(default)]
    pub harness: HarnessSection,
    #[serde(default)]
    pub storage: StorageSection,
}

impl CodeteachToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse codeteach.toml")
    }

    /// Load `codeteach.toml` from `config_dir`, or defaults if it is missing.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize codeteach.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Model endpoint (env → file).
    pub fn model_endpoint(&self) -> String {
        std::env::var(ENV_ENDPOINT).unwrap_or_else(|_| self.model.endpoint.clone())
    }

    /// Model name (env → file).
    pub fn model_name(&self) -> String {
        std::env::var(ENV_MODEL).unwrap_or_else(|_| self.model.name.clone())
    }

    /// Python command (env → file).
    pub fn python_cmd(&self) -> String {
        std::env::var(ENV_PYTHON).unwrap_or_else(|_| self.harness.python_cmd.clone())
    }

    /// API key read from the configured variable; empty counts as unset.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.model.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Check value ranges and return human-readable warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (label, sampling) in [
            ("model.chat", &self.model.chat),
            ("model.summary", &self.model.summary),
        ] {
            if !(0.0..=2.0).contains(&sampling.temperature) {
                warnings.push(format!(
                    "Invalid {}.temperature {}: should be between 0 and 2",
                    label, sampling.temperature
                ));
            }
            if sampling.max_tokens == 0 {
                warnings.push(format!("Invalid {}.max_tokens: must be non-zero", label));
            }
        }

        if self.conversation.recent_window == 0 {
            warnings.push("Invalid conversation.recent_window: must be non-zero".to_string());
        }
        if self.conversation.summarize_after_user_turns == 0 {
            warnings.push(
                "Invalid conversation.summarize_after_user_turns: must be non-zero".to_string(),
            );
        }

        if self.model.endpoint.trim().is_empty() {
            warnings.push("Invalid model.endpoint: must not be empty".to_string());
        } else if !self.model.endpoint.starts_with("http://")
            && !self.model.endpoint.starts_with("https://")
        {
            warnings.push(format!(
                "Invalid model.endpoint '{}': should start with http:// or https://",
                self.model.endpoint
            ));
        }

        warnings
    }
}

/// Configuration merged from codeteach.toml, environment, and CLI flags.
#[derive(Debug, Clone)]
pub struct CodeteachConfig {
    /// Path to the project directory
    pub project_dir: PathBuf,
    /// Path to the .codeteach directory
    pub config_dir: PathBuf,
    /// Parsed codeteach.toml configuration
    pub toml: CodeteachToml,
    pub verbose: bool,
    pub cli_endpoint: Option<String>,
    pub cli_model: Option<String>,
    pub cli_problems_file: Option<PathBuf>,
}

impl CodeteachConfig {
    /// Create a new CodeteachConfig from a project directory.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = CodeteachToml::load_or_default(&config_dir)?;

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            verbose: false,
            cli_endpoint: None,
            cli_model: None,
            cli_problems_file: None,
        })
    }

    /// Create CodeteachConfig with CLI overrides.
    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        endpoint: Option<String>,
        model: Option<String>,
        problems_file: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.cli_endpoint = endpoint;
        config.cli_model = model;
        config.cli_problems_file = problems_file;
        Ok(config)
    }

    /// Model endpoint (CLI → env → file).
    pub fn model_endpoint(&self) -> String {
        self.cli_endpoint
            .clone()
            .unwrap_or_else(|| self.toml.model_endpoint())
    }

    /// Model name (CLI → env → file).
    pub fn model_name(&self) -> String {
        self.cli_model
            .clone()
            .unwrap_or_else(|| self.toml.model_name())
    }

    pub fn python_cmd(&self) -> String {
        self.toml.python_cmd()
    }

    pub fn api_key(&self) -> Option<String> {
        self.toml.api_key()
    }

    pub fn chat_params(&self) -> GenerationParams {
        self.toml.model.chat.into()
    }

    pub fn summary_params(&self) -> GenerationParams {
        self.toml.model.summary.into()
    }

    /// Path to codeteach.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Path to the problem catalog (CLI → file setting).
    pub fn problems_file(&self) -> PathBuf {
        let path = self
            .cli_problems_file
            .clone()
            .unwrap_or_else(|| self.toml.storage.problems_file.clone());
        self.project_dir.join(path)
    }

    /// Path to progress.json.
    pub fn progress_file(&self) -> PathBuf {
        self.project_dir.join(&self.toml.storage.progress_file)
    }

    /// Path to log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
