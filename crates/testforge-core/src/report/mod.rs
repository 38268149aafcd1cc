use crate::errors::PipelineError;
use crate::model::{Report, ReportArtifacts, RunRecord, RunStatus, Totals};
use crate::storage::MetaStore;
use serde::{Deserialize, Serialize};

pub mod junit;

/// Assembles the immutable report for a finished run from its final status,
/// wall-clock duration, totals, and artifact references.
pub fn assemble(run: &RunRecord) -> Report {
    let find = |name: &str| {
        run.artifacts
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.name.clone())
    };
    Report {
        run_id: run.id.clone(),
        job_id: run.job_id.clone(),
        created_at: run
            .finished_at
            .clone()
            .unwrap_or_else(crate::model::now_rfc3339),
        status: run.status,
        duration_seconds: run.duration_seconds.unwrap_or(0.0),
        totals: run.totals.clone().unwrap_or_default(),
        artifacts: ReportArtifacts {
            junit_xml: find("junit.xml"),
            stdout: find("stdout.txt"),
            stderr: find("stderr.txt"),
        },
    }
}

/// Lightweight run-listing entry; loading it never requires a full report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub job_id: String,
    pub status: RunStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub totals: Totals,
}

/// Lists all runs. Resilient: a missing or partially written run or report
/// document skips that entry instead of failing the whole listing; totals
/// come from the report when present, metadata otherwise.
pub fn list_runs(store: &dyn MetaStore) -> Result<Vec<RunSummary>, PipelineError> {
    let mut summaries = Vec::new();
    for run_id in store.list_run_ids()? {
        let run = match store.get_run(&run_id) {
            Ok(Some(run)) if run.active => run,
            _ => continue,
        };
        let totals = match store.get_report(&run_id) {
            Ok(Some(report)) => report.totals,
            _ => run.totals.clone().unwrap_or_default(),
        };
        summaries.push(RunSummary {
            run_id: run.id.clone(),
            job_id: run.job_id.clone(),
            status: run.status,
            created_at: run.created_at.clone(),
            duration_seconds: run.duration_seconds,
            totals,
        });
    }
    Ok(summaries)
}
