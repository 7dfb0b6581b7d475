//! Command-line token dispatch.
//!
//! Tokens are handled strictly left to right. Flags change the [`Session`],
//! CSV sources are loaded into tables and queries are executed against
//! whatever has been loaded so far. The first error ends the run.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::output::{row_writer, OutputFormat};
use crate::sqlite::{ingest, query, sql_name_from_string, CsvSource, Database};

/// Table name used for standard input unless `--table` overrides it.
pub const STDIN_TABLE: &str = "stdin";

/// One classified command-line token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `--db <name>`
    Db(String),
    /// `--table <name>`
    Table(String),
    /// `--headers` or `--no-headers`
    Headers(bool),
    Replace,
    PlainText,
    CsvFile(String),
    SqlFile(String),
    Stdin,
    Select(String),
}

impl Token {
    /// Classify `arg`, pulling the value for `--db` and `--table` from `rest`.
    pub fn parse<I>(arg: String, rest: &mut I) -> Result<Self>
    where
        I: Iterator<Item = String>,
    {
        let token = match arg.as_str() {
            "--plain-text" | "--plain" | "--text" => Token::PlainText,
            "--replace" => Token::Replace,
            "--db" => Token::Db(rest.next().ok_or(Error::MissingValue { flag: "--db" })?),
            "--table" => Token::Table(rest.next().ok_or(Error::MissingValue { flag: "--table" })?),
            "--no-headers" | "--no-header" => Token::Headers(false),
            "--headers" => Token::Headers(true),
            _ if arg.ends_with(".csv") => Token::CsvFile(arg),
            _ if arg.ends_with(".sql") => Token::SqlFile(arg),
            "stdin" => Token::Stdin,
            _ if arg.starts_with("select") => Token::Select(arg),
            _ => return Err(Error::UnknownArgument(arg)),
        };
        Ok(token)
    }
}

/// Mutable state carried across the tokens of one run.
pub struct Session<W: Write> {
    db: Database,
    headers: bool,
    replace: bool,
    format: OutputFormat,
    table: Option<String>,
    out: W,
}

impl<W: Write> Session<W> {
    /// Fresh session on an in-memory database, writing results to `out`.
    pub fn new(out: W) -> Result<Self> {
        Ok(Self {
            db: Database::in_memory()?,
            headers: true,
            replace: false,
            format: OutputFormat::default(),
            table: None,
            out,
        })
    }

    /// Process every token in order. `stdin` tokens read from `stdin`.
    pub fn run<I>(&mut self, args: I, stdin: &mut dyn Read) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let token = Token::parse(arg, &mut args)?;
            debug!(?token, "dispatching");
            self.apply(token, stdin)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, token: Token, stdin: &mut dyn Read) -> Result<()> {
        match token {
            Token::Db(name) => {
                self.db = Database::open(&name)?;
                if let Some(path) = self.db.path() {
                    info!("opened database {}", path.display());
                }
            }
            Token::Table(name) => self.table = Some(name),
            Token::Headers(on) => self.headers = on,
            Token::Replace => self.replace = true,
            Token::PlainText => self.format = OutputFormat::PlainText,
            Token::CsvFile(path) => {
                let table = self
                    .table
                    .take()
                    .unwrap_or_else(|| sql_name_from_string(&path));
                let source = CsvSource::open(Path::new(&path))?;
                self.load(&table, &source, &path)?;
            }
            Token::Stdin => {
                let table = self.table.take().unwrap_or_else(|| STDIN_TABLE.to_string());
                let source = CsvSource::read_all(stdin, STDIN_TABLE)?;
                self.load(&table, &source, STDIN_TABLE)?;
            }
            Token::SqlFile(path) => {
                let sql = fs::read_to_string(&path).map_err(|source| Error::Io {
                    path: PathBuf::from(&path),
                    source,
                })?;
                self.query(&sql)?;
            }
            Token::Select(sql) => {
                self.query(&sql)?;
            }
        }
        Ok(())
    }

    fn load(&mut self, table: &str, source: &CsvSource, source_name: &str) -> Result<()> {
        let summary = ingest::ingest(self.db.conn(), table, source, source_name, self.replace)?;
        info!(
            "loaded {} rows into {} ({} columns) from {}",
            summary.rows,
            summary.table,
            summary.columns.len(),
            source_name
        );
        Ok(())
    }

    /// Run `sql` and write its results in the current format.
    pub fn query(&mut self, sql: &str) -> Result<usize> {
        let mut writer = row_writer(self.format, &mut self.out);
        let rows = query::execute(self.db.conn(), sql, self.headers, writer.as_mut())?;
        writer.flush()?;
        Ok(rows)
    }

    pub fn headers(&self) -> bool {
        self.headers
    }

    pub fn replace(&self) -> bool {
        self.replace
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Pending `--table` override, if any.
    pub fn pending_table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
