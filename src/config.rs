use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::codeteach_config::CodeteachConfig;
use crate::conversation::{ChatCoordinator, PromptAssembler, SummarizationPolicy};
use crate::harness::{PythonInterpreter, TestHarness};
use crate::model::{GenerationParams, ModelService, OpenAiClient};
use crate::problem::Catalog;
use crate::progress::ProgressStore;

/// Runtime configuration for codeteach.
///
/// Resolves the layered [`CodeteachConfig`] into concrete values and builds
/// the services a command needs from them.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub problems_file: PathBuf,
    pub progress_file: PathBuf,
    pub log_dir: PathBuf,
    pub model_endpoint: String,
    pub model_name: String,
    pub api_key: Option<String>,
    pub python_cmd: String,
    pub retries: u32,
    pub chat_params: GenerationParams,
    pub summary_params: GenerationParams,
    pub summarize_after_user_turns: usize,
    pub recent_window: usize,
    pub verbose: bool,
}

impl Config {
    pub fn new(
        project_dir: PathBuf,
        verbose: bool,
        endpoint: Option<String>,
        model: Option<String>,
        problems_file: Option<PathBuf>,
    ) -> Result<Self> {
        let unified =
            CodeteachConfig::with_cli_args(project_dir, verbose, endpoint, model, problems_file)?;
        Ok(Self::from_unified(&unified))
    }

    pub fn from_unified(config: &CodeteachConfig) -> Self {
        Self {
            project_dir: config.project_dir.clone(),
            problems_file: config.problems_file(),
            progress_file: config.progress_file(),
            log_dir: config.log_dir(),
            model_endpoint: config.model_endpoint(),
            model_name: config.model_name(),
            api_key: config.api_key(),
            python_cmd: config.python_cmd(),
            retries: config.toml.harness.retries,
            chat_params: config.chat_params(),
            summary_params: config.summary_params(),
            summarize_after_user_turns: config.toml.conversation.summarize_after_user_turns,
            recent_window: config.toml.conversation.recent_window,
            verbose: config.verbose,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        if let Some(parent) = self.progress_file.parent() {
            std::fs::create_dir_all(parent).context("Failed to create progress directory")?;
        }
        Ok(())
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load(&self.problems_file)
    }

    pub fn progress_store(&self) -> ProgressStore {
        ProgressStore::open(&self.progress_file)
    }

    pub fn model_client(&self) -> OpenAiClient {
        OpenAiClient::new(
            &self.model_endpoint,
            &self.model_name,
            self.api_key.clone(),
        )
    }

    /// A coordinator wired to `model` with the configured thresholds.
    pub fn coordinator(&self, model: Arc<dyn ModelService>) -> ChatCoordinator {
        ChatCoordinator::with_settings(
            model,
            SummarizationPolicy::new(self.summarize_after_user_turns, self.summary_params),
            PromptAssembler::new(self.recent_window, self.summary_params),
            self.chat_params,
        )
    }

    pub fn harness(&self) -> TestHarness {
        TestHarness::new(
            Arc::new(PythonInterpreter::new(&self.python_cmd)),
            self.retries,
        )
    }
}
