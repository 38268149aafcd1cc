use crate::errors::PipelineError;
use crate::model::{JobRecord, Report, RunRecord, VersionEntry};
use crate::storage::layout::{secure_file_name, Layout};
use crate::storage::MetaStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Filesystem backing: one pretty-printed JSON document per id.
#[derive(Debug, Clone)]
pub struct FsStore {
    layout: Layout,
}

impl FsStore {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    fn versions_path(&self, name: &str) -> PathBuf {
        self.layout
            .documents_dir()
            .join(format!("{}.json", secure_file_name(name)))
    }

    fn read_versions(&self, name: &str) -> Result<Vec<VersionEntry>, PipelineError> {
        read_doc(&self.versions_path(name)).map(Option::unwrap_or_default)
    }
}

fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), PipelineError> {
    let text = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, text)?;
    Ok(())
}

fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PipelineError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

impl MetaStore for FsStore {
    fn put_job(&self, job: &JobRecord) -> Result<(), PipelineError> {
        write_doc(&self.layout.jobs_dir().join(format!("{}.json", job.id)), job)
    }

    fn get_job(&self, id: &str) -> Result<Option<JobRecord>, PipelineError> {
        read_doc(&self.layout.jobs_dir().join(format!("{id}.json")))
    }

    fn put_run(&self, run: &RunRecord) -> Result<(), PipelineError> {
        let dir = self.layout.run_dir(&run.id)?;
        write_doc(&dir.join("run.json"), run)
    }

    fn get_run(&self, id: &str) -> Result<Option<RunRecord>, PipelineError> {
        read_doc(&self.layout.runs_dir().join(id).join("run.json"))
    }

    fn list_run_ids(&self) -> Result<Vec<String>, PipelineError> {
        let dir = self.layout.runs_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn put_report(&self, report: &Report) -> Result<(), PipelineError> {
        write_doc(&self.layout.report_path(&report.run_id), report)
    }

    fn get_report(&self, run_id: &str) -> Result<Option<Report>, PipelineError> {
        read_doc(&self.layout.report_path(run_id))
    }

    fn next_version(&self, name: &str) -> Result<u32, PipelineError> {
        let versions = self.read_versions(name)?;
        Ok(versions.iter().map(|v| v.version).max().unwrap_or(0) + 1)
    }

    fn append_version(&self, name: &str, entry: &VersionEntry) -> Result<(), PipelineError> {
        let mut versions = self.read_versions(name)?;
        versions.push(entry.clone());
        versions.sort_by_key(|v| v.version);
        write_doc(&self.versions_path(name), &versions)
    }

    fn list_versions(&self, name: &str) -> Result<Vec<VersionEntry>, PipelineError> {
        let mut versions = self.read_versions(name)?;
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }
}
