use crate::errors::{EntityKind, PipelineError};
use crate::model::RunRecord;
use std::io::{Cursor, Write};
use std::path::Path;

/// Results of a run as delimited text. The error message is always quoted,
/// with embedded double quotes doubled.
pub fn results_csv(run: &RunRecord) -> (String, String) {
    let mut lines = vec![
        "test_result_id,test_case_id,status,duration_seconds,error_message".to_string(),
    ];
    for r in &run.results {
        let duration = r
            .duration_seconds
            .map(|d| d.to_string())
            .unwrap_or_default();
        let message = r.error_message.as_deref().unwrap_or("").replace('"', "\"\"");
        lines.push(format!(
            "{},{},{},{},\"{}\"",
            r.id,
            r.case_key,
            r.status.as_str(),
            duration,
            message
        ));
    }
    (format!("{}_results.csv", run.id), lines.join("\n"))
}

/// Bundles a job's rendered scripts into a zip archive, one entry per
/// script. A job with no scripts yields a not-found condition rather than an
/// empty archive.
pub fn scripts_zip(job_id: &str, tests_dir: &Path) -> Result<(String, Vec<u8>), PipelineError> {
    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
    if tests_dir.exists() {
        for entry in std::fs::read_dir(tests_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("py") {
                let name = entry.file_name().to_string_lossy().into_owned();
                entries.push((name, std::fs::read(&path)?));
            }
        }
    }
    if entries.is_empty() {
        return Err(PipelineError::not_found(EntityKind::Scripts, job_id));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in &entries {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| PipelineError::Storage(e.to_string()))?;
            writer.write_all(content)?;
        }
        writer
            .finish()
            .map_err(|e| PipelineError::Storage(e.to_string()))?;
    }

    Ok((format!("{job_id}_scripts.zip"), buf.into_inner()))
}
