use assert_cmd::Command;
use predicates::prelude::*;

const CSV: &str = "requirement_id,title,description,priority\n\
                   REQ-1,Login,desc,High\n\
                   REQ-2,Logout,desc2,Low\n";

fn testforge(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("testforge").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn extract_job_id(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    text.split_whitespace()
        .find(|w| w.starts_with("job_"))
        .expect("job id in upload output")
        .to_string()
}

#[test]
fn full_mock_workflow_through_the_cli() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let csv_path = dir.path().join("specs.csv");
    std::fs::write(&csv_path, CSV).unwrap();

    let output = testforge(&data_dir)
        .arg("upload")
        .arg(&csv_path)
        .arg("--name")
        .arg("specs")
        .output()
        .unwrap();
    assert!(output.status.success());
    let job_id = extract_job_id(&output.stdout);

    testforge(&data_dir)
        .arg("generate-cases")
        .arg(&job_id)
        .assert()
        .success()
        .stdout(predicate::str::contains("generated 2 cases"));

    testforge(&data_dir)
        .arg("generate-scripts")
        .arg(&job_id)
        .assert()
        .success()
        .stdout(predicate::str::contains("test_req_1.py"))
        .stdout(predicate::str::contains("test_req_2.py"));

    testforge(&data_dir)
        .arg("run")
        .arg(&job_id)
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("passed=2"));

    testforge(&data_dir)
        .arg("runs")
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));

    testforge(&data_dir)
        .arg("versions")
        .arg("specs")
        .assert()
        .success()
        .stdout(predicate::str::contains("v1"));
}

#[test]
fn unknown_job_is_a_fatal_not_found() {
    let dir = tempfile::tempdir().unwrap();
    testforge(&dir.path().join("data"))
        .arg("generate-cases")
        .arg("job_does_not_exist")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn invalid_upload_names_the_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("bad.csv");
    std::fs::write(&csv_path, "requirement_id,description\nREQ-1,x\n").unwrap();

    testforge(&dir.path().join("data"))
        .arg("upload")
        .arg(&csv_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("title"))
        .stderr(predicate::str::contains("priority"));
}

#[test]
fn sqlite_store_backing_works_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let csv_path = dir.path().join("specs.csv");
    std::fs::write(&csv_path, CSV).unwrap();

    let output = testforge(&data_dir)
        .arg("--store")
        .arg("sqlite")
        .arg("upload")
        .arg(&csv_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let job_id = extract_job_id(&output.stdout);

    testforge(&data_dir)
        .arg("--store")
        .arg("sqlite")
        .arg("generate-cases")
        .arg(&job_id)
        .assert()
        .success();
}
