use crate::cli::args::{GenerateCasesArgs, GenerateScriptsArgs};
use crate::cli::commands::{build_pipeline, parse_generation};
use testforge_core::config::PipelineConfig;

pub async fn cases(args: GenerateCasesArgs, mut cfg: PipelineConfig) -> anyhow::Result<i32> {
    if let Some(generation) = args.generation.as_deref() {
        cfg.generation = parse_generation(generation)?;
    }
    if args.model.is_some() {
        cfg.model = args.model.clone();
    }

    let pipeline = build_pipeline(&cfg)?;
    let outcome = pipeline.generate_cases(&args.job_id).await?;
    println!(
        "generated {} cases for {} -> {}",
        outcome.count,
        outcome.job_id,
        outcome.cases_path.display()
    );
    Ok(0)
}

pub fn scripts(args: GenerateScriptsArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let outcome = pipeline.generate_scripts(&args.job_id, args.actor.as_deref())?;
    println!("generated {} script files for {}:", outcome.files.len(), outcome.job_id);
    for f in &outcome.files {
        println!("  {f}");
    }
    Ok(0)
}
