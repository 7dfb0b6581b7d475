//! Error types for csv2sql.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a run.
#[derive(Error, Debug)]
pub enum Error {
    /// A flag that takes a value was the last token
    #[error("{flag} requires an argument")]
    MissingValue { flag: &'static str },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    /// Reading a CSV or SQL file failed
    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read all of CSV from {source_name}: {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    /// The source had no header row to derive columns from
    #[error("no header row in CSV from {source_name}")]
    EmptyCsv { source_name: String },

    #[error("error opening database {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Writing results to the output stream failed
    #[error("error writing output: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Whether this is SQLite refusing to create a table that is already there.
    pub fn is_table_exists(&self) -> bool {
        match self {
            Error::Database(rusqlite::Error::SqliteFailure(_, Some(message))) => {
                message.contains("already exists")
            }
            _ => false,
        }
    }
}
