use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use testforge_core::config::{ExecutionMode, GenerationMode, PipelineConfig, StoreKind};
use testforge_core::engine::runner::{ExecMode, ExecutionOrchestrator};
use testforge_core::pipeline::Pipeline;
use testforge_core::providers::llm::canned::CannedGenerator;
use testforge_core::providers::llm::openai::OpenAiGenerator;
use testforge_core::storage::fs::FsStore;
use testforge_core::storage::sqlite::SqliteStore;
use testforge_core::storage::{Layout, MetaStore};
use testforge_core::synth::{CaseSynthesizer, Strategy};

use crate::cli::args::{Cli, Command};

pub mod export;
pub mod generate;
pub mod report;
pub mod run;
pub mod upload;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let mut cfg = load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        cfg.data_dir = dir;
    }
    if let Some(store) = cli.store.as_deref() {
        cfg.store = parse_store(store)?;
    }

    match cli.cmd {
        Command::Upload(args) => upload::run(args, &cfg),
        Command::Versions(args) => upload::versions(args, &cfg),
        Command::GenerateCases(args) => generate::cases(args, cfg).await,
        Command::GenerateScripts(args) => generate::scripts(args, &cfg),
        Command::Run(args) => run::run(args, cfg).await,
        Command::Runs => report::runs(&cfg),
        Command::Report(args) => report::report(args, &cfg),
        Command::Results(args) => report::results(args, &cfg),
        Command::Artifact(args) => report::artifact(args, &cfg),
        Command::ExportScripts(args) => export::scripts(args, &cfg),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read config {}", p.display()))?;
            serde_yaml::from_str(&text).context("failed to parse config")
        }
        None => Ok(PipelineConfig::default()),
    }
}

pub fn parse_store(s: &str) -> anyhow::Result<StoreKind> {
    match s {
        "fs" => Ok(StoreKind::Fs),
        "sqlite" => Ok(StoreKind::Sqlite),
        other => anyhow::bail!("unknown store backing: {other} (expected fs|sqlite)"),
    }
}

pub fn parse_generation(s: &str) -> anyhow::Result<GenerationMode> {
    match s {
        "deterministic" => Ok(GenerationMode::Deterministic),
        "mock" => Ok(GenerationMode::Mock),
        "openai" => Ok(GenerationMode::Openai),
        other => anyhow::bail!(
            "unknown generation strategy: {other} (expected deterministic|mock|openai)"
        ),
    }
}

pub fn parse_execution(s: &str) -> anyhow::Result<ExecutionMode> {
    match s {
        "mock" => Ok(ExecutionMode::Mock),
        "runner" => Ok(ExecutionMode::Runner),
        other => anyhow::bail!("unknown execution mode: {other} (expected mock|runner)"),
    }
}

pub fn build_pipeline(cfg: &PipelineConfig) -> anyhow::Result<Pipeline> {
    let layout = Layout::new(&cfg.data_dir)?;

    let store: Arc<dyn MetaStore> = match cfg.store {
        StoreKind::Fs => Arc::new(FsStore::new(layout.clone())),
        StoreKind::Sqlite => Arc::new(SqliteStore::open(&cfg.data_dir.join("testforge.db"))?),
    };

    let synthesizer = match cfg.generation {
        GenerationMode::Deterministic => CaseSynthesizer::new(Strategy::Deterministic),
        GenerationMode::Mock => {
            CaseSynthesizer::new(Strategy::Generative(Arc::new(CannedGenerator::default())))
        }
        GenerationMode::Openai => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set for openai generation")?;
            let model = cfg.model.clone().unwrap_or_else(|| "gpt-4o-mini".into());
            CaseSynthesizer::new(Strategy::Generative(Arc::new(OpenAiGenerator::new(
                model, api_key,
            ))))
            .with_model(cfg.model.clone())
        }
    };

    let mode = match cfg.execution {
        ExecutionMode::Mock => ExecMode::Mock,
        ExecutionMode::Runner => ExecMode::Runner {
            program: cfg.runner_program.clone(),
        },
    };
    let orchestrator =
        ExecutionOrchestrator::new(mode).with_timeout(Duration::from_secs(cfg.timeout_seconds));

    Ok(Pipeline::new(store, layout, synthesizer, orchestrator))
}
