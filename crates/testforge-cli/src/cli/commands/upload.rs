use crate::cli::args::{UploadArgs, VersionsArgs};
use crate::cli::commands::build_pipeline;
use testforge_core::config::PipelineConfig;

pub fn run(args: UploadArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let bytes = std::fs::read(&args.file)?;
    let name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string()),
    };

    let outcome = pipeline.upload(
        &name,
        &bytes,
        args.uploaded_by.as_deref(),
        args.notes.as_deref(),
    )?;
    println!(
        "uploaded {} (version {}, {} rows) -> {}",
        outcome.job_id, outcome.version, outcome.row_count, outcome.stored_filename
    );
    Ok(0)
}

pub fn versions(args: VersionsArgs, cfg: &PipelineConfig) -> anyhow::Result<i32> {
    let pipeline = build_pipeline(cfg)?;
    let versions = pipeline.list_versions(&args.name)?;
    for v in versions {
        println!(
            "v{}  {}  {}  {}",
            v.version, v.job_id, v.filename, v.created_at
        );
    }
    Ok(0)
}
