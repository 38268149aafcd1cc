use crate::cli::args::{ArtifactArgs, ReportArgs, ResultsArgs};
use crate::cli::commands::build_pipeline;
use testforge_core::config::PipelineConfig;

pub fn runs(cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let summaries = pipeline.list_runs()?;
    if summaries.is_empty() {
        println!("no runs");
        return Ok(0);
    }
    for s in summaries {
        println!(
            "{}  {}  {}  passed={} failed={} total={}",
            s.run_id,
            s.status.as_str(),
            s.created_at,
            s.totals.passed,
            s.totals.failed,
            s.totals.total
        );
    }
    Ok(0)
}

pub fn report(args: ReportArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let report = pipeline.get_report(&args.run_id)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

pub fn results(args: ResultsArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    if args.csv {
        let (name, content) = pipeline.export_results(&args.run_id)?;
        match args.out {
            Some(path) => {
                std::fs::write(&path, content)?;
                println!("wrote {}", path.display());
            }
            None => {
                std::fs::write(&name, content)?;
                println!("wrote {name}");
            }
        }
    } else {
        let results = pipeline.get_results(&args.run_id)?;
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(0)
}

pub fn artifact(args: ArtifactArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let path = pipeline.artifact_path(&args.run_id, &args.name)?;
    match args.out {
        Some(out) => {
            std::fs::copy(&path, &out)?;
            println!("copied {} -> {}", path.display(), out.display());
        }
        None => println!("{}", path.display()),
    }
    Ok(0)
}
