use crate::cli::args::RunArgs;
use crate::cli::commands::{build_pipeline, parse_execution};
use testforge_core::config::{ExecutionMode, PipelineConfig};
use testforge_core::model::RunStatus;

pub async fn run(args: RunArgs, mut cfg: PipelineConfig) -> anyhow::Result<i32> {
    if let Some(execution) = args.execution.as_deref() {
        cfg.execution = parse_execution(execution)?;
    }
    if let Some(runner) = args.runner {
        cfg.execution = ExecutionMode::Runner;
        cfg.runner_program = runner;
    }
    if let Some(timeout) = args.timeout {
        cfg.timeout_seconds = timeout;
    }

    let pipeline = build_pipeline(&cfg)?;
    let params = args
        .params
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    let selection = if args.cases.is_empty() {
        None
    } else {
        Some(args.cases)
    };

    let run = pipeline
        .execute(
            &args.job_id,
            args.triggered_by.as_deref(),
            params,
            selection.as_deref(),
        )
        .await?;

    let totals = run.totals.clone().unwrap_or_default();
    println!(
        "{} {} total={} passed={} failed={} skipped={}",
        run.id,
        run.status.as_str(),
        totals.total,
        totals.passed,
        totals.failed,
        totals.skipped
    );

    Ok(match run.status {
        RunStatus::Completed => 0,
        RunStatus::Failed => 1,
        _ => 2,
    })
}
