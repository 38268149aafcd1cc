use crate::errors::PipelineError;
use crate::model::{
    now_rfc3339, ArtifactKind, ArtifactRef, ResultStatus, RunRecord, RunStatus, Totals,
};
use crate::report::junit;
use crate::storage::MetaStore;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::time::{timeout, Duration};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Execution mode, threaded in at construction so behavior is deterministic
/// per instance: `Mock` completes every pending result synthetically,
/// `Runner` shells out to an external test runner.
#[derive(Debug, Clone)]
pub enum ExecMode {
    Mock,
    Runner { program: String },
}

pub struct ExecutionOrchestrator {
    mode: ExecMode,
    timeout: Duration,
}

struct Captured {
    status: RunStatus,
    stdout: String,
    stderr: String,
    return_code: Option<i32>,
}

impl ExecutionOrchestrator {
    pub fn new(mode: ExecMode) -> Self {
        Self {
            mode,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Drives `run` from queued to its terminal status, committing the run
    /// document after every transition so pollers observe intermediate
    /// states. Environment failures (missing runner, timeout) land in the
    /// run's status and artifacts, never in the returned error.
    pub async fn execute(
        &self,
        run: &mut RunRecord,
        tests_dir: &Path,
        artifacts_dir: &Path,
        store: &dyn MetaStore,
    ) -> Result<(), PipelineError> {
        run.status = RunStatus::Running;
        run.started_at = Some(now_rfc3339());
        store.put_run(run)?;
        tracing::info!(event = "run_started", run_id = %run.id, job_id = %run.job_id);

        let started = std::time::Instant::now();
        match &self.mode {
            ExecMode::Mock => {
                self.complete_mock(run);
            }
            ExecMode::Runner { program } => {
                let captured = self
                    .invoke_runner(program, tests_dir, artifacts_dir)
                    .await?;
                self.complete_real(run, artifacts_dir, captured)?;
            }
        }

        run.duration_seconds = Some(started.elapsed().as_secs_f64());
        run.finished_at = Some(now_rfc3339());
        store.put_run(run)?;
        tracing::info!(
            event = "run_finished",
            run_id = %run.id,
            status = run.status.as_str()
        );
        Ok(())
    }

    /// Marks every pending result passed with a strictly increasing
    /// synthetic duration sequence.
    fn complete_mock(&self, run: &mut RunRecord) {
        for (idx, result) in run.results.iter_mut().enumerate() {
            result.status = ResultStatus::Passed;
            result.duration_seconds = Some(0.1 * (idx + 1) as f64);
            result.error_message = None;
        }
        let total = run.results.len() as u32;
        run.totals = Some(Totals::from_counts(total, 0, 0));
        run.status = RunStatus::Completed;
    }

    async fn invoke_runner(
        &self,
        program: &str,
        tests_dir: &Path,
        artifacts_dir: &Path,
    ) -> Result<Captured, PipelineError> {
        let junit_path = artifacts_dir.join("junit.xml");
        let mut cmd = tokio::process::Command::new(program);
        cmd.arg(tests_dir)
            .arg("-q")
            .arg(format!("--junitxml={}", junit_path.display()))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // environment problem, not a test failure
                return Ok(Captured {
                    status: RunStatus::Error,
                    stdout: String::new(),
                    stderr: format!("{program} not found in environment"),
                    return_code: None,
                });
            }
            Err(e) => {
                return Ok(Captured {
                    status: RunStatus::Error,
                    stdout: String::new(),
                    stderr: format!("failed to spawn {program}: {e}"),
                    return_code: None,
                });
            }
        };

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let out_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let err_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let wait = timeout(self.timeout, child.wait()).await;
        let (status, return_code) = match wait {
            Ok(Ok(exit)) => {
                let code = exit.code();
                if exit.success() {
                    (RunStatus::Completed, code)
                } else {
                    (RunStatus::Failed, code)
                }
            }
            Ok(Err(e)) => {
                let _ = child.kill().await;
                tracing::warn!(event = "runner_wait_error", error = %e);
                (RunStatus::Error, None)
            }
            Err(_) => {
                // cancellation of our wait, not of the runner's internal
                // work; killing closes the pipes so partial output drains
                let _ = child.kill().await;
                tracing::warn!(event = "runner_timeout", timeout_secs = self.timeout.as_secs());
                (RunStatus::Timeout, None)
            }
        };

        let stdout =
            String::from_utf8_lossy(&out_task.await.unwrap_or_default()).into_owned();
        let mut stderr =
            String::from_utf8_lossy(&err_task.await.unwrap_or_default()).into_owned();
        if status == RunStatus::Timeout {
            stderr.push_str("\ntimeout elapsed");
        }

        Ok(Captured {
            status,
            stdout,
            stderr,
            return_code,
        })
    }

    fn complete_real(
        &self,
        run: &mut RunRecord,
        artifacts_dir: &Path,
        captured: Captured,
    ) -> Result<(), PipelineError> {
        std::fs::write(artifacts_dir.join("stdout.txt"), &captured.stdout)?;
        std::fs::write(artifacts_dir.join("stderr.txt"), &captured.stderr)?;
        run.artifacts.push(ArtifactRef {
            name: "stdout.txt".into(),
            kind: ArtifactKind::Log,
            sha256: None,
        });
        run.artifacts.push(ArtifactRef {
            name: "stderr.txt".into(),
            kind: ArtifactKind::Log,
            sha256: None,
        });

        let junit_path = artifacts_dir.join("junit.xml");
        let junit_content = std::fs::read_to_string(&junit_path).ok();
        if junit_content.is_some() {
            run.artifacts.push(ArtifactRef {
                name: "junit.xml".into(),
                kind: ArtifactKind::Report,
                sha256: None,
            });
        }

        run.totals = Some(
            junit_content
                .as_deref()
                .map(junit::summarize)
                .unwrap_or_default(),
        );
        run.return_code = captured.return_code;
        run.status = captured.status;

        self.write_back_results(run, junit_content.as_deref());
        Ok(())
    }

    /// Prefers per-case outcomes from the structured result file; only when
    /// no entry matches does a result fall back to the uniform
    /// exit-code-derived status. Results of an errored or timed-out run
    /// that never appear in the manifest stay pending.
    fn write_back_results(&self, run: &mut RunRecord, junit_content: Option<&str>) {
        let outcomes = junit_content.map(junit::case_outcomes).unwrap_or_default();
        let uniform = match run.status {
            RunStatus::Completed => Some((ResultStatus::Passed, None)),
            RunStatus::Failed => Some((
                ResultStatus::Failed,
                Some("runner reported failures".to_string()),
            )),
            _ => None,
        };
        for result in run.results.iter_mut() {
            let fn_name = format!("test_{}", result.case_key);
            if let Some((_, status)) = outcomes.iter().find(|(name, _)| *name == fn_name) {
                result.status = *status;
                if *status == ResultStatus::Failed {
                    result.error_message = Some("runner reported failures".to_string());
                }
            } else if let Some((status, message)) = &uniform {
                result.status = *status;
                result.error_message = message.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{new_id, ResultRow};
    use crate::storage::fs::FsStore;
    use crate::storage::Layout;

    fn pending(id: u32, key: &str) -> ResultRow {
        ResultRow {
            id,
            case_key: key.to_string(),
            status: ResultStatus::Pending,
            duration_seconds: None,
            error_message: None,
            log_path: None,
            screenshot_path: None,
            extra: serde_json::Value::Null,
        }
    }

    fn queued_run(job_id: &str) -> RunRecord {
        RunRecord {
            id: new_id("run"),
            job_id: job_id.to_string(),
            created_at: now_rfc3339(),
            triggered_by: None,
            status: RunStatus::Queued,
            started_at: None,
            finished_at: None,
            duration_seconds: None,
            selection: None,
            params: serde_json::json!({}),
            totals: None,
            results: vec![pending(1, "req_1_1"), pending(2, "req_2_1")],
            artifacts: Vec::new(),
            return_code: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn mock_execution_passes_everything_with_increasing_durations() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path()).unwrap();
        let store = FsStore::new(layout.clone());
        let mut run = queued_run("job_x");
        let run_id = run.id.clone();
        let tests_dir = layout.tests_dir("job_x").unwrap();
        let artifacts_dir = layout.artifacts_dir(&run_id).unwrap();

        let orch = ExecutionOrchestrator::new(ExecMode::Mock);
        orch.execute(&mut run, &tests_dir, &artifacts_dir, &store)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        let durations: Vec<f64> = run
            .results
            .iter()
            .map(|r| r.duration_seconds.unwrap())
            .collect();
        assert!(durations.windows(2).all(|w| w[0] < w[1]));
        assert!(run
            .results
            .iter()
            .all(|r| r.status == ResultStatus::Passed));
        assert_eq!(run.totals.as_ref().unwrap().passed, 2);

        // persisted terminal state matches the in-memory view
        let stored = store.get_run(&run_id).unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn missing_runner_is_an_environment_error_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path()).unwrap();
        let store = FsStore::new(layout.clone());
        let mut run = queued_run("job_y");
        let tests_dir = layout.tests_dir("job_y").unwrap();
        let artifacts_dir = layout.artifacts_dir(&run.id).unwrap();

        let orch = ExecutionOrchestrator::new(ExecMode::Runner {
            program: "definitely-not-a-real-runner-1b2f".into(),
        });
        orch.execute(&mut run, &tests_dir, &artifacts_dir, &store)
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Error);
        assert!(run
            .results
            .iter()
            .all(|r| r.status == ResultStatus::Pending));
        let stderr = std::fs::read_to_string(artifacts_dir.join("stderr.txt")).unwrap();
        assert!(stderr.contains("not found"));
    }

    #[test]
    fn write_back_prefers_per_case_manifest_entries() {
        let orch = ExecutionOrchestrator::new(ExecMode::Mock);
        let mut run = queued_run("job_z");
        run.status = RunStatus::Failed;
        let junit = r#"<testsuite>
  <testcase name="test_req_1_1"/>
  <testcase name="test_req_2_1"><failure message="boom"/></testcase>
</testsuite>"#;
        orch.write_back_results(&mut run, Some(junit));
        assert_eq!(run.results[0].status, ResultStatus::Passed);
        assert_eq!(run.results[1].status, ResultStatus::Failed);
    }
}
