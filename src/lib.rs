//! csv2sql: load CSV files into SQLite and query them from the command line.
//!
//! Arguments are processed in order by a [`Session`]: flags adjust state,
//! `*.csv` and `stdin` become tables, `*.sql` files and `select ...` strings
//! are executed and their results written as CSV or tab-separated text.

pub mod error;
pub mod output;
pub mod session;
pub mod sqlite;

pub use error::{Error, Result};
pub use output::{OutputFormat, RowWriter};
pub use session::{Session, Token};
pub use sqlite::Database;
