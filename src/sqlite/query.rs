//! Running SQL text and streaming the results into a [`RowWriter`].

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection};
use tracing::debug;

use crate::error::Result;
use crate::output::RowWriter;

/// Execute every statement in `sql`, in order.
///
/// Statements that produce columns have their rows written as they are
/// stepped, preceded by the column names when `headers` is set. Statements
/// without columns only run for their effect. Returns the number of data
/// rows written.
pub fn execute(
    conn: &Connection,
    sql: &str,
    headers: bool,
    out: &mut dyn RowWriter,
) -> Result<usize> {
    let mut batch = Batch::new(conn, sql);
    let mut written = 0;

    while let Some(mut stmt) = batch.next()? {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        debug!("executing statement with {} result columns", columns.len());

        if headers && !columns.is_empty() {
            out.write_row(&columns)?;
        }

        let mut rows = stmt.query([])?;
        let mut fields = Vec::with_capacity(columns.len());
        while let Some(row) = rows.next()? {
            fields.clear();
            for idx in 0..columns.len() {
                fields.push(value_to_text(row.get_ref(idx)?));
            }
            out.write_row(&fields)?;
            written += 1;
        }
    }

    Ok(written)
}

/// Render a column value as text. NULL is the empty string.
pub fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}
