//! Loading a whole CSV source into a table.
//!
//! The first record names the columns, every later record becomes a row of
//! text values. Files are memory-mapped, standard input is read into one
//! owned buffer; either way the full source is parsed before anything is
//! inserted.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use super::names::{quote_identifier, sql_name_from_string};
use crate::error::{Error, Result};

/// Raw CSV bytes, kept alive for the duration of one ingestion.
pub enum CsvSource {
    Mapped(Mmap),
    Buffered(Bytes),
}

impl CsvSource {
    /// Map a CSV file into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let io_err = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        // Zero-length files cannot be mapped on every platform
        if file.metadata().map_err(io_err)?.len() == 0 {
            return Ok(CsvSource::Buffered(Bytes::new()));
        }

        // SAFETY: the map is read-only and dropped as soon as the rows are parsed
        let map = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        Ok(CsvSource::Mapped(map))
    }

    /// Drain a reader (usually stdin) into memory.
    pub fn read_all<R: Read>(mut reader: R, name: &str) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(|source| Error::Io {
            path: PathBuf::from(name),
            source,
        })?;
        Ok(CsvSource::Buffered(Bytes::from(buf)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CsvSource::Mapped(map) => &map[..],
            CsvSource::Buffered(bytes) => &bytes[..],
        }
    }
}

/// What one ingestion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Parse every record. Field counts may vary, whitespace before a field
/// (quoted or not) is skipped and stray quotes inside a quoted field are
/// kept as literal characters.
pub fn read_records(data: &[u8], source_name: &str) -> Result<Vec<Vec<String>>> {
    let relaxed = relax_quoting(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(relaxed.as_slice());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(String::from).collect::<Vec<_>>())
                .map_err(|source| Error::Csv {
                    source_name: source_name.to_string(),
                    source,
                })
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lex {
    FieldStart,
    Unquoted,
    Quoted,
    /// Saw `"` inside a quoted field, next byte decides what it was
    QuoteInQuoted,
}

/// Rewrite lenient CSV into input the strict `csv` parser reads the same way.
///
/// Spaces and tabs at the start of a field are dropped, so `1, "x,y"` is two
/// fields. Inside a quoted field a `"` that is neither doubled nor followed by
/// a delimiter or line end is escaped, so `"abc"def"` reads as `abc"def`.
fn relax_quoting(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut state = Lex::FieldStart;

    for &b in data {
        state = match (state, b) {
            (Lex::FieldStart, b' ' | b'\t' | 0x0b | 0x0c) => Lex::FieldStart,
            (Lex::FieldStart, b'"') => {
                out.push(b);
                Lex::Quoted
            }
            (Lex::FieldStart | Lex::Unquoted, b',' | b'\n') => {
                out.push(b);
                Lex::FieldStart
            }
            (Lex::FieldStart | Lex::Unquoted, _) => {
                out.push(b);
                Lex::Unquoted
            }
            (Lex::Quoted, b'"') => Lex::QuoteInQuoted,
            (Lex::Quoted, _) => {
                out.push(b);
                Lex::Quoted
            }
            (Lex::QuoteInQuoted, b',' | b'\n') => {
                out.extend_from_slice(&[b'"', b]);
                Lex::FieldStart
            }
            (Lex::QuoteInQuoted, b'\r') => {
                out.extend_from_slice(b"\"\r");
                Lex::Unquoted
            }
            (Lex::QuoteInQuoted, b'"') => {
                out.extend_from_slice(b"\"\"");
                Lex::Quoted
            }
            (Lex::QuoteInQuoted, _) => {
                out.extend_from_slice(&[b'"', b'"', b]);
                Lex::Quoted
            }
        };
    }

    // an unterminated quoted field runs to the end of the input
    if matches!(state, Lex::Quoted | Lex::QuoteInQuoted) {
        out.push(b'"');
    }
    out
}

/// Create `table` from the source's header and insert the remaining rows.
///
/// With `replace` set an existing table of that name is dropped first.
/// Otherwise an existing table is kept and the rows are appended to it.
pub fn ingest(
    conn: &Connection,
    table: &str,
    source: &CsvSource,
    source_name: &str,
    replace: bool,
) -> Result<IngestSummary> {
    let mut records = read_records(source.as_bytes(), source_name)?.into_iter();
    let header = records.next().ok_or_else(|| Error::EmptyCsv {
        source_name: source_name.to_string(),
    })?;

    let columns: Vec<String> = header.iter().map(|c| sql_name_from_string(c)).collect();
    let table_ident = quote_identifier(table);
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    if replace {
        conn.execute(&format!("drop table if exists {table_ident}"), [])?;
    }

    let create = format!("create table {table_ident} ({column_list})");
    debug!("{create}");
    match conn.execute(&create, []).map_err(Error::from) {
        Ok(_) => {}
        Err(err) if err.is_table_exists() => warn!("table {table} already exists"),
        Err(err) => return Err(err),
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut insert = conn.prepare(&format!(
        "insert into {table_ident} ({column_list}) values ({placeholders})"
    ))?;

    let mut rows = 0;
    for record in records {
        let mut values: Vec<Option<&str>> = record.iter().map(|v| Some(v.as_str())).collect();
        if values.len() < columns.len() {
            values.resize(columns.len(), None);
        }
        insert.execute(params_from_iter(values.iter()))?;
        rows += 1;
    }

    Ok(IngestSummary {
        table: table.to_string(),
        columns,
        rows,
    })
}
