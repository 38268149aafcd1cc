use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    Fs,
    Sqlite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Rule-based cases straight from the rows.
    #[default]
    Deterministic,
    /// Canned generative provider; deterministic, needs no network.
    Mock,
    /// OpenAI-compatible chat completions; failures degrade to deterministic.
    Openai,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Mock,
    Runner,
}

/// Pipeline construction parameters. All behavior toggles live here and are
/// threaded into components at construction time; no component consults
/// process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default)]
    pub generation: GenerationMode,
    #[serde(default)]
    pub execution: ExecutionMode,
    #[serde(default = "default_runner_program")]
    pub runner_program: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store: StoreKind::default(),
            generation: GenerationMode::default(),
            execution: ExecutionMode::default(),
            runner_program: default_runner_program(),
            timeout_seconds: default_timeout_seconds(),
            model: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".testforge")
}

fn default_runner_program() -> String {
    "pytest".to_string()
}

fn default_timeout_seconds() -> u64 {
    crate::engine::runner::DEFAULT_TIMEOUT_SECS
}
