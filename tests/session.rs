//! End-to-end runs of a `Session` over in-memory stdin and output.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use csv2sql::{Error, Session};
use tempfile::TempDir;
use tracing::Level;

/// Run `args` with `stdin` as standard input, returning stdout as text.
fn run_with_stdin(args: &[&str], stdin: &str) -> Result<String, Error> {
    let mut session = Session::new(Vec::new())?;
    let mut input = stdin.as_bytes();
    session.run(args.iter().map(|a| a.to_string()), &mut input)?;
    Ok(String::from_utf8(session.into_output()).unwrap())
}

fn run(args: &[&str]) -> Result<String, Error> {
    run_with_stdin(args, "")
}

fn write_file(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_stdin_round_trip() {
    let out = run_with_stdin(&["stdin", "select * from stdin"], "a,b\n1,2\n3,4").unwrap();
    assert_eq!(out, "a,b\n1,2\n3,4\n");
}

#[test]
fn test_space_before_quoted_field() {
    let out = run_with_stdin(&["stdin", "select * from stdin"], "a,b\n1, \"x,y\"\n").unwrap();
    assert_eq!(out, "a,b\n1,\"x,y\"\n");
}

#[test]
fn test_no_headers() {
    let args = ["--no-headers", "stdin", "select * from stdin"];
    let out = run_with_stdin(&args, "a,b\n1,2\n").unwrap();
    assert_eq!(out, "1,2\n");

    let out = run_with_stdin(
        &["--no-header", "stdin", "select * from stdin", "--headers", "select b from stdin"],
        "a,b\n1,2\n",
    )
    .unwrap();
    assert_eq!(out, "1,2\nb\n2\n");
}

#[test]
fn test_output_formats() {
    let input = "name,quote\nann,\"hello, world\"\n";
    let csv = run_with_stdin(&["stdin", "select * from stdin"], input).unwrap();
    assert_eq!(csv, "name,quote\nann,\"hello, world\"\n");

    let plain = run_with_stdin(&["--plain-text", "stdin", "select * from stdin"], input).unwrap();
    assert_eq!(plain, "name\tquote\nann\thello, world\n");
}

#[test]
fn test_null_padding_is_empty_in_output() {
    let out = run_with_stdin(
        &["stdin", "select a, b, c, c is null from stdin"],
        "a,b,c\n1\n",
    )
    .unwrap();
    assert_eq!(out, "a,b,c,c is null\n1,,,1\n");
}

#[test]
fn test_csv_file_table_named_after_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "sales-2024.csv", "Region Name,Total\nnorth,10\nsouth,20\n");

    let out = run(&[&path, "select Region_Name from sales_2024 where Total = '20'"]).unwrap();
    assert_eq!(out, "Region_Name\nsouth\n");
}

#[test]
fn test_table_override_applies_once() {
    let dir = TempDir::new().unwrap();
    let first = write_file(dir.path(), "first.csv", "x\n1\n");
    let second = write_file(dir.path(), "second.csv", "y\n2\n");

    let out = run(&[
        "--table",
        "renamed",
        &first,
        &second,
        "select x from renamed",
        "select y from second",
    ])
    .unwrap();
    assert_eq!(out, "x\n1\ny\n2\n");
}

#[test]
fn test_sql_file() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(dir.path(), "nums.csv", "n\n1\n2\n3\n");
    let sql = write_file(
        dir.path(),
        "report.sql",
        "create table doubled as select n * 2 as d from nums;\n\
         select sum(d) as total from doubled;\n",
    );

    let out = run(&[&csv, &sql]).unwrap();
    assert_eq!(out, "total\n12\n");
}

#[test]
fn test_ingest_twice_accumulates() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "t.csv", "a\n1\n");

    let out = run(&[&path, &path, "select count(*) as n from t"]).unwrap();
    assert_eq!(out, "n\n2\n");
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_ingest_twice_warns() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "t.csv", "a\n1\n");

    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || run(&[&path, &path]));
    assert!(result.is_ok(), "{result:?}");

    let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("table t already exists"), "{logs}");
    assert_eq!(logs.matches("already exists").count(), 1);
}

#[test]
fn test_replace_keeps_latest() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "t.csv", "a\n1\n");

    let out = run(&["--replace", &path, &path, "select count(*) as n from t"]).unwrap();
    assert_eq!(out, "n\n1\n");
}

#[test]
fn test_unknown_argument_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "t.csv", "a\n1\n");
    let db = dir.path().join("never");

    let err = run(&["--bogus", "--db", db.to_str().unwrap(), &path]).unwrap_err();
    assert!(matches!(err, Error::UnknownArgument(ref arg) if arg == "--bogus"));
    assert!(!dir.path().join("never.db").exists());
}

#[test]
fn test_missing_csv_file() {
    let err = run(&["/definitely/not/here.csv"]).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
}

#[test]
fn test_query_error() {
    let err = run(&["select * from nowhere"]).unwrap_err();
    assert!(err.to_string().contains("no such table"), "{err}");
}

#[test]
fn test_persistent_database() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(dir.path(), "kv.csv", "k,v\none,1\n");
    let db = dir.path().join("store");
    let db = db.to_str().unwrap();

    run(&["--db", db, &csv]).unwrap();
    assert!(dir.path().join("store.db").exists());

    let out = run(&["--db", &format!("{db}.db"), "--plain", "select k, v from kv"]).unwrap();
    assert_eq!(out, "k\tv\none\t1\n");
}

#[test]
fn test_empty_stdin() {
    let err = run_with_stdin(&["stdin"], "").unwrap_err();
    assert!(matches!(err, Error::EmptyCsv { .. }));
}

#[test]
fn test_output_survives_later_error() {
    let mut session = Session::new(Vec::new()).unwrap();
    let result = session.run(
        ["select 1 as one", "--bogus", "select 2"].map(String::from),
        &mut io::empty(),
    );

    assert!(result.is_err());
    assert_eq!(session.into_output(), b"one\n1\n");
}
