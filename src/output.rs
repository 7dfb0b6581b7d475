//! Output formatting for query results.
//!
//! Rows arrive as plain strings and are written as soon as the query
//! produces them. Each writer buffers internally; call `flush` once the
//! result set is done.

use std::io::{self, BufWriter, Write};

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values (default)
    #[default]
    Csv,
    /// Tab-separated, unescaped
    PlainText,
}

/// A sink for rows of text fields.
pub trait RowWriter {
    fn write_row(&mut self, fields: &[String]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// Build the writer for `format` on top of `out`.
pub fn row_writer<'a, W: Write + 'a>(format: OutputFormat, out: W) -> Box<dyn RowWriter + 'a> {
    match format {
        OutputFormat::Csv => Box::new(CsvRowWriter::new(out)),
        OutputFormat::PlainText => Box::new(PlainTextWriter::new(out)),
    }
}

/// Standard CSV quoting and escaping.
pub struct CsvRowWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> CsvRowWriter<W> {
    pub fn new(out: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);
        Self { inner }
    }
}

impl<W: Write> RowWriter for CsvRowWriter<W> {
    fn write_row(&mut self, fields: &[String]) -> io::Result<()> {
        self.inner.write_record(fields).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Tab-joined fields, one line per row. Nothing is escaped.
pub struct PlainTextWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> PlainTextWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            inner: BufWriter::new(out),
        }
    }
}

impl<W: Write> RowWriter for PlainTextWriter<W> {
    fn write_row(&mut self, fields: &[String]) -> io::Result<()> {
        writeln!(self.inner, "{}", fields.join("\t"))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
