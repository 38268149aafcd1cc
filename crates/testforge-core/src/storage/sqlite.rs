use crate::errors::PipelineError;
use crate::model::{JobRecord, Report, RunRecord, VersionEntry};
use crate::storage::MetaStore;
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Relational backing: the same metadata documents, stored as JSON columns.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }
}

impl MetaStore for SqliteStore {
    fn put_job(&self, job: &JobRecord) -> Result<(), PipelineError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO jobs(id, doc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET doc=excluded.doc",
            params![job.id, serde_json::to_string(job)?],
        )?;
        Ok(())
    }

    fn get_job(&self, id: &str) -> Result<Option<JobRecord>, PipelineError> {
        let conn = self.conn.lock().unwrap();
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM jobs WHERE id=?1", params![id], |r| {
                r.get(0)
            })
            .optional()?;
        match doc {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn put_run(&self, run: &RunRecord) -> Result<(), PipelineError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO runs(id, created_at, doc) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET created_at=excluded.created_at, doc=excluded.doc",
            params![run.id, run.created_at, serde_json::to_string(run)?],
        )?;
        Ok(())
    }

    fn get_run(&self, id: &str) -> Result<Option<RunRecord>, PipelineError> {
        let conn = self.conn.lock().unwrap();
        let doc: Option<String> = conn
            .query_row("SELECT doc FROM runs WHERE id=?1", params![id], |r| {
                r.get(0)
            })
            .optional()?;
        match doc {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn list_run_ids(&self) -> Result<Vec<String>, PipelineError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id FROM runs ORDER BY created_at ASC, id ASC")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }

    fn put_report(&self, report: &Report) -> Result<(), PipelineError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO reports(run_id, doc) VALUES (?1, ?2)
             ON CONFLICT(run_id) DO UPDATE SET doc=excluded.doc",
            params![report.run_id, serde_json::to_string(report)?],
        )?;
        Ok(())
    }

    fn get_report(&self, run_id: &str) -> Result<Option<Report>, PipelineError> {
        let conn = self.conn.lock().unwrap();
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM reports WHERE run_id=?1",
                params![run_id],
                |r| r.get(0),
            )
            .optional()?;
        match doc {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn next_version(&self, name: &str) -> Result<u32, PipelineError> {
        let conn = self.conn.lock().unwrap();
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM document_versions WHERE name=?1",
            params![name],
            |r| r.get(0),
        )?;
        Ok(next as u32)
    }

    fn append_version(&self, name: &str, entry: &VersionEntry) -> Result<(), PipelineError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO document_versions(name, version, entry) VALUES (?1, ?2, ?3)",
            params![name, entry.version, serde_json::to_string(entry)?],
        )?;
        Ok(())
    }

    fn list_versions(&self, name: &str) -> Result<Vec<VersionEntry>, PipelineError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT entry FROM document_versions WHERE name=?1 ORDER BY version ASC",
        )?;
        let rows = stmt.query_map(params![name], |r| r.get::<_, String>(0))?;
        let mut versions = Vec::new();
        for entry in rows {
            versions.push(serde_json::from_str(&entry?)?);
        }
        Ok(versions)
    }
}
