use testforge_core::model::{
    new_id, now_rfc3339, InputRef, JobRecord, JobStatus, Report, ReportArtifacts, RunRecord,
    RunStatus, Totals, VersionEntry,
};
use testforge_core::storage::fs::FsStore;
use testforge_core::storage::sqlite::SqliteStore;
use testforge_core::storage::{Layout, MetaStore};

fn sample_job(id: &str) -> JobRecord {
    JobRecord {
        id: id.to_string(),
        name: "specs".into(),
        version: 1,
        created_at: now_rfc3339(),
        status: JobStatus::Uploaded,
        input: InputRef {
            filename: "specs_v1.csv".into(),
            path: "input/specs_v1.csv".into(),
            sha256: "deadbeef".into(),
        },
        cases_count: None,
        scripts_count: None,
        script_files: Vec::new(),
        uploaded_by: Some("qa".into()),
        notes: None,
        active: true,
    }
}

fn sample_run(id: &str) -> RunRecord {
    RunRecord {
        id: id.to_string(),
        job_id: "job_1".into(),
        created_at: now_rfc3339(),
        triggered_by: Some("ci".into()),
        status: RunStatus::Completed,
        started_at: None,
        finished_at: None,
        duration_seconds: Some(2.0),
        selection: None,
        params: serde_json::json!({"headless": true}),
        totals: Some(Totals::from_counts(2, 0, 0)),
        results: Vec::new(),
        artifacts: Vec::new(),
        return_code: Some(0),
        active: true,
    }
}

fn exercise(store: &dyn MetaStore) {
    // job round-trip and overwrite
    let job_id = new_id("job");
    let mut job = sample_job(&job_id);
    store.put_job(&job).unwrap();
    let loaded = store.get_job(&job_id).unwrap().unwrap();
    assert_eq!(loaded.name, "specs");
    assert_eq!(loaded.status, JobStatus::Uploaded);

    job.status = JobStatus::CasesGenerated;
    job.cases_count = Some(2);
    store.put_job(&job).unwrap();
    let loaded = store.get_job(&job_id).unwrap().unwrap();
    assert_eq!(loaded.status, JobStatus::CasesGenerated);
    assert_eq!(loaded.cases_count, Some(2));

    assert!(store.get_job("job_unknown").unwrap().is_none());

    // run round-trip and listing
    let run_id = new_id("run");
    let run = sample_run(&run_id);
    store.put_run(&run).unwrap();
    let loaded = store.get_run(&run_id).unwrap().unwrap();
    assert_eq!(loaded.status, RunStatus::Completed);
    assert!(store.list_run_ids().unwrap().contains(&run_id));

    // report round-trip
    let report = Report {
        run_id: run_id.clone(),
        job_id: "job_1".into(),
        created_at: now_rfc3339(),
        status: RunStatus::Completed,
        duration_seconds: 2.0,
        totals: Totals::from_counts(2, 0, 0),
        artifacts: ReportArtifacts::default(),
    };
    store.put_report(&report).unwrap();
    let loaded = store.get_report(&run_id).unwrap().unwrap();
    assert_eq!(loaded.totals.passed, 2);

    // version index: strictly increasing from 1, ascending listing
    assert_eq!(store.next_version("specs").unwrap(), 1);
    for version in 1..=2 {
        store
            .append_version(
                "specs",
                &VersionEntry {
                    version,
                    job_id: format!("job_v{version}"),
                    filename: format!("specs_v{version}.csv"),
                    sha256: "cafe".into(),
                    created_at: now_rfc3339(),
                    notes: None,
                },
            )
            .unwrap();
    }
    assert_eq!(store.next_version("specs").unwrap(), 3);
    let versions = store.list_versions("specs").unwrap();
    assert_eq!(
        versions.iter().map(|v| v.version).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(store.list_versions("other").unwrap().is_empty());
}

#[test]
fn fs_store_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path()).unwrap();
    exercise(&FsStore::new(layout));
}

#[test]
fn sqlite_store_round_trips() {
    let store = SqliteStore::memory().unwrap();
    exercise(&store);
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.db");

    let store = SqliteStore::open(&path).unwrap();
    let job = sample_job("job_persist");
    store.put_job(&job).unwrap();
    drop(store);

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.get_job("job_persist").unwrap().is_some());
}

#[test]
fn listing_skips_broken_run_documents() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path()).unwrap();
    let store = FsStore::new(layout.clone());

    let run = sample_run("run_ok");
    store.put_run(&run).unwrap();

    // a half-written run document must not break the listing
    let broken_dir = layout.run_dir("run_broken").unwrap();
    std::fs::write(broken_dir.join("run.json"), "{ not json").unwrap();

    let summaries = testforge_core::report::list_runs(&store).unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].run_id, "run_ok");
}
