use crate::errors::{EntityKind, PipelineError};
use std::path::{Component, Path, PathBuf};

/// On-disk layout shared by every storage backing. File payloads (inputs,
/// rendered scripts, run artifacts) always live here; only the metadata
/// documents vary by backend.
#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base = base.into();
        for sub in ["input", "codebase", "runs", "reports", "jobs", "documents"] {
            std::fs::create_dir_all(base.join(sub))?;
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn input_dir(&self, job_id: &str) -> std::io::Result<PathBuf> {
        let d = self.base.join("input").join(job_id);
        std::fs::create_dir_all(&d)?;
        Ok(d)
    }

    pub fn cases_path(&self, job_id: &str) -> std::io::Result<PathBuf> {
        let d = self.base.join("codebase").join("test-cases");
        std::fs::create_dir_all(&d)?;
        Ok(d.join(format!("{job_id}.json")))
    }

    pub fn tests_dir(&self, job_id: &str) -> std::io::Result<PathBuf> {
        let d = self.base.join("codebase").join("tests").join(job_id);
        std::fs::create_dir_all(&d)?;
        Ok(d)
    }

    pub fn run_dir(&self, run_id: &str) -> std::io::Result<PathBuf> {
        let d = self.base.join("runs").join(run_id);
        std::fs::create_dir_all(&d)?;
        Ok(d)
    }

    pub fn artifacts_dir(&self, run_id: &str) -> std::io::Result<PathBuf> {
        let d = self.run_dir(run_id)?.join("artifacts");
        std::fs::create_dir_all(&d)?;
        Ok(d)
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.base.join("runs")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.base.join("jobs")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.base.join("documents")
    }

    pub fn report_path(&self, run_id: &str) -> PathBuf {
        self.base.join("reports").join(format!("{run_id}.json"))
    }
}

/// Joins a caller-supplied name onto a directory, rejecting anything that
/// would resolve outside it. The resolved path must be a descendant of the
/// directory or exactly equal to it.
pub fn safe_join(dir: &Path, name: &str) -> Result<PathBuf, PipelineError> {
    let candidate = Path::new(name);
    if candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        return Err(PipelineError::InvalidArtifactName(name.to_string()));
    }
    let dir_canon = dir.canonicalize()?;
    match dir.join(candidate).canonicalize() {
        Ok(p) if p == dir_canon || p.starts_with(&dir_canon) => Ok(p),
        Ok(_) => Err(PipelineError::InvalidArtifactName(name.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PipelineError::not_found(EntityKind::Artifact, name))
        }
        Err(e) => Err(e.into()),
    }
}

/// Filename-safe rendition of an arbitrary logical name.
pub fn secure_file_name(name: &str) -> String {
    const KEEP: [char; 6] = ['-', '_', '.', '(', ')', ' '];
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || KEEP.contains(c))
        .collect();
    let joined = sanitized.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "file".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_file_name_strips_hostile_characters() {
        assert_eq!(secure_file_name("my srs v2.csv"), "my_srs_v2.csv");
        assert_eq!(secure_file_name("../../etc/passwd"), "....etcpasswd");
        assert_eq!(secure_file_name("???"), "file");
    }

    #[test]
    fn safe_join_accepts_plain_names_and_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.txt"), "x").unwrap();

        let good = safe_join(dir.path(), "ok.txt").unwrap();
        assert!(good.ends_with("ok.txt"));

        let err = safe_join(dir.path(), "../../etc/passwd").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArtifactName(_)));

        let err = safe_join(dir.path(), "/etc/passwd").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidArtifactName(_)));

        let err = safe_join(dir.path(), "missing.txt").unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { .. }));
    }
}
