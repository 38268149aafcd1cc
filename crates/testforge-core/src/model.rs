use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One normalized record from the ingested requirements document.
pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Uploaded,
    CasesGenerated,
    ScriptsGenerated,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::CasesGenerated => "cases_generated",
            JobStatus::ScriptsGenerated => "scripts_generated",
        }
    }
}

/// Reference to the uploaded input file a job is anchored to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRef {
    pub filename: String,
    pub path: PathBuf,
    pub sha256: String,
}

/// A tracked unit of pipeline work, from upload through script generation.
///
/// The persisted JSON document is the source of truth; in-memory values are
/// transient views and must be re-read after any stage transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub created_at: String,
    pub status: JobStatus,
    pub input: InputRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub script_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// One stored version under a logical document name. Versions are immutable
/// once written; re-uploading appends, never edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: u32,
    pub job_id: String,
    pub filename: String,
    pub sha256: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Generated,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOrigin {
    Deterministic,
    Generative,
}

/// One synthesized test scenario tied to a requirement identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub requirement_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_case_status")]
    pub status: CaseStatus,
    pub origin: CaseOrigin,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// The persisted case list for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseBundle {
    pub job_id: String,
    pub generated_at: String,
    pub test_cases: Vec<CaseRecord>,
}

/// Rendered source text implementing the cases of one requirement group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptFile {
    pub requirement_id: String,
    pub filename: String,
    pub language: String,
    pub framework: String,
    pub code: String,
    pub template: String,
    pub generated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Error,
    Timeout,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Error => "error",
            RunStatus::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Pending,
    Passed,
    Failed,
    Skipped,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Pending => "pending",
            ResultStatus::Passed => "passed",
            ResultStatus::Failed => "failed",
            ResultStatus::Skipped => "skipped",
        }
    }
}

/// Outcome of one case within one run. Written only by the execution
/// orchestrator; matched back by case identity, not position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: u32,
    pub case_key: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Script,
    Log,
    Report,
    Screenshot,
}

/// A named file under a run's artifact directory. Append-only: re-runs
/// supersede artifacts, they never edit them in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub name: String,
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Totals {
    /// Derives `passed` rather than trusting the counted value, so a
    /// partially malformed result file can never report more passes than
    /// `total - failed - skipped`.
    pub fn from_counts(total: u32, failed: u32, skipped: u32) -> Self {
        Totals {
            total,
            passed: total.saturating_sub(failed).saturating_sub(skipped),
            failed,
            skipped,
        }
    }
}

/// One execution attempt against a job's rendered scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub job_id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by: Option<String>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Vec<String>>,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,
    #[serde(default)]
    pub results: Vec<ResultRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junit_xml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

/// Derived summary of one run, written once at completion, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub run_id: String,
    pub job_id: String,
    pub created_at: String,
    pub status: RunStatus,
    pub duration_seconds: f64,
    pub totals: Totals,
    #[serde(default)]
    pub artifacts: ReportArtifacts,
}

pub(crate) fn default_true() -> bool {
    true
}

fn default_priority() -> String {
    "Medium".to_string()
}

fn default_case_status() -> CaseStatus {
    CaseStatus::Generated
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}
