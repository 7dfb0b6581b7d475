//! SQLite access: the database handle plus CSV ingestion and query execution.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::{Error, Result};

pub mod ingest;
pub mod names;
pub mod query;

pub use ingest::{CsvSource, IngestSummary};
pub use names::{quote_identifier, sql_name_from_string};

/// The connection every token in a run works against.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Unnamed database, gone when the process exits.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { conn, path: None })
    }

    /// Open or create a database file. `.db` is appended when missing.
    pub fn open(name: &str) -> Result<Self> {
        let path = db_path(name);
        let conn = Connection::open(&path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing this database, `None` for in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn db_path(name: &str) -> PathBuf {
    if name.ends_with(".db") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{name}.db"))
    }
}
