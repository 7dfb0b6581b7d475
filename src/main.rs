use std::io;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use csv2sql::Session;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Csv2Sql {
    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Flags, CSV/SQL files, `stdin` and `select ...` queries, handled in order
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Csv2Sql::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    let mut session =
        Session::new(io::stdout().lock()).context("error opening in-memory database")?;
    session.run(cli.args, &mut io::stdin().lock())?;

    Ok(())
}
