use crate::cli::args::ExportScriptsArgs;
use crate::cli::commands::build_pipeline;
use testforge_core::config::PipelineConfig;

pub fn scripts(args: ExportScriptsArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let (name, bytes) = pipeline.export_scripts(&args.job_id)?;
    let out = args.out.unwrap_or_else(|| name.clone().into());
    std::fs::write(&out, bytes)?;
    println!("wrote {}", out.display());
    Ok(0)
}
