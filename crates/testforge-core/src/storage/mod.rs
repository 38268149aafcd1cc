use crate::errors::PipelineError;
use crate::model::{JobRecord, Report, RunRecord, VersionEntry};

pub mod fs;
pub mod layout;
pub mod schema;
pub mod sqlite;

pub use layout::Layout;

/// Storage abstraction over the pipeline's metadata documents: one job
/// document per job id, one run document per run id, one report document per
/// run id, and a per-name version index. Writes are last-writer-wins; a
/// document is committed whole at each lifecycle transition.
pub trait MetaStore: Send + Sync {
    fn put_job(&self, job: &JobRecord) -> Result<(), PipelineError>;
    fn get_job(&self, id: &str) -> Result<Option<JobRecord>, PipelineError>;

    fn put_run(&self, run: &RunRecord) -> Result<(), PipelineError>;
    fn get_run(&self, id: &str) -> Result<Option<RunRecord>, PipelineError>;
    fn list_run_ids(&self) -> Result<Vec<String>, PipelineError>;

    fn put_report(&self, report: &Report) -> Result<(), PipelineError>;
    fn get_report(&self, run_id: &str) -> Result<Option<Report>, PipelineError>;

    /// Next version number under a logical document name: strictly
    /// increasing, starting at 1.
    fn next_version(&self, name: &str) -> Result<u32, PipelineError>;
    fn append_version(&self, name: &str, entry: &VersionEntry) -> Result<(), PipelineError>;
    fn list_versions(&self, name: &str) -> Result<Vec<VersionEntry>, PipelineError>;
}
