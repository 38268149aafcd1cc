use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "testforge",
    version,
    about = "Requirements-to-test-automation pipeline"
)]
pub struct Cli {
    /// Data directory for stored inputs, scripts, runs and reports
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Metadata store backing: fs | sqlite
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Optional YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Upload a requirements CSV as a new document version
    Upload(UploadArgs),
    /// List stored versions of a logical document name
    Versions(VersionsArgs),
    /// Synthesize test cases for an uploaded job
    GenerateCases(GenerateCasesArgs),
    /// Render test scripts from previously generated cases
    GenerateScripts(GenerateScriptsArgs),
    /// Trigger an execution run for a job
    Run(RunArgs),
    /// List all runs
    Runs,
    /// Print the aggregated report of a run
    Report(ReportArgs),
    /// Print or export the results of a run
    Results(ResultsArgs),
    /// Resolve or copy a run artifact by name
    Artifact(ArtifactArgs),
    /// Bundle a job's rendered scripts into a zip archive
    ExportScripts(ExportScriptsArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct UploadArgs {
    /// CSV file to upload
    pub file: PathBuf,

    /// Logical document name (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub uploaded_by: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct VersionsArgs {
    pub name: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateCasesArgs {
    pub job_id: String,

    /// Generation strategy: deterministic | mock | openai
    #[arg(long)]
    pub generation: Option<String>,

    /// Model name for the generative strategy
    #[arg(long, env = "MODEL_NAME")]
    pub model: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateScriptsArgs {
    pub job_id: String,

    /// Label recorded as the generating actor
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    pub job_id: String,

    #[arg(long)]
    pub triggered_by: Option<String>,

    /// Execution mode: mock | runner
    #[arg(long)]
    pub execution: Option<String>,

    /// Test runner program (implies runner mode)
    #[arg(long)]
    pub runner: Option<String>,

    /// Wall-clock timeout for the runner, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Restrict the run to specific case keys (repeatable)
    #[arg(long = "case")]
    pub cases: Vec<String>,

    /// Free-form run parameters as a JSON object
    #[arg(long)]
    pub params: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    pub run_id: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ResultsArgs {
    pub run_id: String,

    /// Export as delimited text instead of JSON
    #[arg(long)]
    pub csv: bool,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ArtifactArgs {
    pub run_id: String,

    /// Artifact file name inside the run's artifact directory
    pub name: String,

    /// Copy the artifact to this path
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ExportScriptsArgs {
    pub job_id: String,

    /// Output zip path (defaults to `<job_id>_scripts.zip`)
    #[arg(long)]
    pub out: Option<PathBuf>,
}
