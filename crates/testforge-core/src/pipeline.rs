use crate::engine::runner::{ExecMode, ExecutionOrchestrator};
use crate::errors::{EntityKind, PipelineError};
use crate::fingerprint::sha256_hex;
use crate::model::{
    new_id, now_rfc3339, CaseBundle, InputRef, JobRecord, JobStatus, Report, ResultRow,
    ResultStatus, RunRecord, RunStatus, VersionEntry,
};
use crate::render;
use crate::report::{self, RunSummary};
use crate::storage::layout::{safe_join, secure_file_name};
use crate::storage::{Layout, MetaStore};
use crate::synth::CaseSynthesizer;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// The unified job/run lifecycle: upload, case generation, script
/// generation, execution, and read-only retrieval. Each stage persists
/// enough state that any stage can be re-run or inspected without repeating
/// earlier stages; re-running a stage overwrites its own output and
/// invalidates downstream metadata, never an already persisted report.
pub struct Pipeline {
    store: Arc<dyn MetaStore>,
    layout: Layout,
    synthesizer: CaseSynthesizer,
    orchestrator: ExecutionOrchestrator,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub job_id: String,
    pub version: u32,
    pub stored_filename: String,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateCasesOutcome {
    pub job_id: String,
    pub count: usize,
    pub cases_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateScriptsOutcome {
    pub job_id: String,
    pub files: Vec<String>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn MetaStore>,
        layout: Layout,
        synthesizer: CaseSynthesizer,
        orchestrator: ExecutionOrchestrator,
    ) -> Self {
        Self {
            store,
            layout,
            synthesizer,
            orchestrator,
        }
    }

    /// Validates and stores an uploaded requirements document as a new
    /// version under `name`. Nothing is persisted from an invalid document.
    pub fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        uploaded_by: Option<&str>,
        notes: Option<&str>,
    ) -> Result<UploadOutcome, PipelineError> {
        let validation = crate::validate::validate_requirements_csv(bytes)?;
        if !validation.valid {
            return Err(PipelineError::Validation(validation.errors));
        }

        let version = self.store.next_version(name)?;
        let job_id = new_id("job");
        let stored_filename = secure_file_name(&format!("{name}_v{version}.csv"));
        let path = self.layout.input_dir(&job_id)?.join(&stored_filename);
        std::fs::write(&path, bytes)?;

        let created_at = now_rfc3339();
        let job = JobRecord {
            id: job_id.clone(),
            name: name.to_string(),
            version,
            created_at: created_at.clone(),
            status: JobStatus::Uploaded,
            input: InputRef {
                filename: stored_filename.clone(),
                path,
                sha256: sha256_hex(bytes),
            },
            cases_count: None,
            scripts_count: None,
            script_files: Vec::new(),
            uploaded_by: uploaded_by.map(str::to_string),
            notes: notes.map(str::to_string),
            active: true,
        };
        self.store.put_job(&job)?;
        self.store.append_version(
            name,
            &VersionEntry {
                version,
                job_id: job_id.clone(),
                filename: stored_filename.clone(),
                sha256: job.input.sha256.clone(),
                created_at,
                notes: notes.map(str::to_string),
            },
        )?;
        tracing::info!(event = "uploaded", job_id = %job_id, name, version);

        Ok(UploadOutcome {
            job_id,
            version,
            stored_filename,
            row_count: validation.rows.len(),
        })
    }

    /// Re-reads and re-validates the stored input, synthesizes cases, and
    /// persists the case list. Re-running overwrites the previous list and
    /// invalidates any script metadata derived from it.
    pub async fn generate_cases(
        &self,
        job_id: &str,
    ) -> Result<GenerateCasesOutcome, PipelineError> {
        let mut job = self.load_job(job_id)?;

        let bytes = std::fs::read(&job.input.path)
            .map_err(|_| PipelineError::MissingInput(job.input.path.clone()))?;
        let validation = crate::validate::validate_requirements_csv(&bytes)?;
        if !validation.valid {
            // the stored document no longer validates
            return Err(PipelineError::Validation(validation.errors));
        }

        let cases = self.synthesizer.synthesize(&validation.rows).await;
        let bundle = CaseBundle {
            job_id: job_id.to_string(),
            generated_at: now_rfc3339(),
            test_cases: cases,
        };
        let cases_path = self.layout.cases_path(job_id)?;
        std::fs::write(&cases_path, serde_json::to_string_pretty(&bundle)?)?;

        job.status = JobStatus::CasesGenerated;
        job.cases_count = Some(bundle.test_cases.len());
        job.scripts_count = None;
        job.script_files.clear();
        self.store.put_job(&job)?;
        tracing::info!(event = "cases_generated", job_id, count = bundle.test_cases.len());

        Ok(GenerateCasesOutcome {
            job_id: job_id.to_string(),
            count: bundle.test_cases.len(),
            cases_path,
        })
    }

    /// Renders scripts for the job's generated cases. Requires cases to
    /// already exist; rendering is idempotent and overwrites in place.
    pub fn generate_scripts(
        &self,
        job_id: &str,
        actor: Option<&str>,
    ) -> Result<GenerateScriptsOutcome, PipelineError> {
        let mut job = self.load_job(job_id)?;
        let bundle = self.load_cases(job_id)?;

        let tests_dir = self.layout.tests_dir(job_id)?;
        std::fs::write(tests_dir.join("conftest.py"), render::CONFTEST)?;

        let scripts = render::render_scripts(&bundle.test_cases, actor);
        let mut files = Vec::new();
        for script in &scripts {
            std::fs::write(tests_dir.join(&script.filename), &script.code)?;
            files.push(script.filename.clone());
        }

        job.status = JobStatus::ScriptsGenerated;
        job.scripts_count = Some(files.len());
        job.script_files = files.clone();
        self.store.put_job(&job)?;
        tracing::info!(event = "scripts_generated", job_id, count = files.len());

        Ok(GenerateScriptsOutcome {
            job_id: job_id.to_string(),
            files,
        })
    }

    /// Creates a run with a snapshot of result rows for the selected cases
    /// and executes it synchronously. Environment failures surface in the
    /// returned run's status, not as errors.
    pub async fn execute(
        &self,
        job_id: &str,
        triggered_by: Option<&str>,
        params: Option<serde_json::Value>,
        selection: Option<&[String]>,
    ) -> Result<RunRecord, PipelineError> {
        let job = self.load_job(job_id)?;
        if job.status != JobStatus::ScriptsGenerated {
            return Err(PipelineError::Precondition {
                id: job_id.to_string(),
                needed: "test scripts",
                stage: "generate-scripts",
            });
        }
        let bundle = self.load_cases(job_id)?;

        let keys = render::case_keys(&bundle.test_cases);
        let selected: Vec<String> = match selection {
            Some(subset) => keys
                .iter()
                .filter(|k| subset.contains(*k))
                .cloned()
                .collect(),
            None => keys,
        };

        let run_id = new_id("run");
        let tests_dir = self.layout.tests_dir(job_id)?;
        let artifacts_dir = self.layout.artifacts_dir(&run_id)?;

        let mut run = RunRecord {
            id: run_id.clone(),
            job_id: job_id.to_string(),
            created_at: now_rfc3339(),
            triggered_by: triggered_by.map(str::to_string),
            status: RunStatus::Queued,
            started_at: None,
            finished_at: None,
            duration_seconds: None,
            selection: selection.map(|s| s.to_vec()),
            params: params.unwrap_or_else(|| serde_json::json!({})),
            totals: None,
            results: selected
                .iter()
                .enumerate()
                .map(|(idx, key)| ResultRow {
                    id: idx as u32 + 1,
                    case_key: key.clone(),
                    status: ResultStatus::Pending,
                    duration_seconds: None,
                    error_message: None,
                    log_path: None,
                    screenshot_path: None,
                    extra: serde_json::Value::Null,
                })
                .collect(),
            artifacts: Vec::new(),
            return_code: None,
            active: true,
        };
        self.store.put_run(&run)?;

        self.orchestrator
            .execute(&mut run, &tests_dir, &artifacts_dir, self.store.as_ref())
            .await?;

        // one report per run, written once at completion
        self.store.put_report(&report::assemble(&run))?;
        Ok(run)
    }

    pub fn get_run(&self, run_id: &str) -> Result<RunRecord, PipelineError> {
        self.store
            .get_run(run_id)?
            .filter(|r| r.active)
            .ok_or_else(|| PipelineError::not_found(EntityKind::Run, run_id))
    }

    pub fn get_report(&self, run_id: &str) -> Result<Report, PipelineError> {
        self.get_run(run_id)?;
        self.store
            .get_report(run_id)?
            .ok_or_else(|| PipelineError::not_found(EntityKind::Report, run_id))
    }

    pub fn get_results(&self, run_id: &str) -> Result<Vec<ResultRow>, PipelineError> {
        Ok(self.get_run(run_id)?.results)
    }

    /// Resolves an artifact by name inside the run's artifact directory;
    /// names resolving outside it are rejected.
    pub fn artifact_path(&self, run_id: &str, name: &str) -> Result<PathBuf, PipelineError> {
        self.get_run(run_id)?;
        let dir = self.layout.artifacts_dir(run_id)?;
        safe_join(&dir, name)
    }

    pub fn list_runs(&self) -> Result<Vec<RunSummary>, PipelineError> {
        report::list_runs(self.store.as_ref())
    }

    pub fn list_versions(&self, name: &str) -> Result<Vec<VersionEntry>, PipelineError> {
        let versions = self.store.list_versions(name)?;
        if versions.is_empty() {
            return Err(PipelineError::not_found(EntityKind::Document, name));
        }
        Ok(versions)
    }

    pub fn export_results(&self, run_id: &str) -> Result<(String, String), PipelineError> {
        let run = self.get_run(run_id)?;
        Ok(crate::export::results_csv(&run))
    }

    pub fn export_scripts(&self, job_id: &str) -> Result<(String, Vec<u8>), PipelineError> {
        self.load_job(job_id)?;
        let tests_dir = self.layout.tests_dir(job_id)?;
        crate::export::scripts_zip(job_id, &tests_dir)
    }

    fn load_job(&self, job_id: &str) -> Result<JobRecord, PipelineError> {
        self.store
            .get_job(job_id)?
            .filter(|j| j.active)
            .ok_or_else(|| PipelineError::not_found(EntityKind::Job, job_id))
    }

    fn load_cases(&self, job_id: &str) -> Result<CaseBundle, PipelineError> {
        let path = self.layout.cases_path(job_id)?;
        if !path.exists() {
            return Err(PipelineError::Precondition {
                id: job_id.to_string(),
                needed: "test cases",
                stage: "generate-cases",
            });
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
