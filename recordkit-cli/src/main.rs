//! recordkit command-line front end
//!
//! Loads a schema catalog and optional seed data into an in-memory store,
//! runs one operation and prints the result as JSON.
//!
//! Usage:
//!   recordkit --schemas demos/catalog.json --data demos/seed.json \
//!       query Appointment --search clinic --sort-field ScheduledAt --sort-order desc

use anyhow::Result;
use clap::Parser;
use recordkit_cli::{run, Args};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let args = Args::parse();
    // -v wins over RUST_LOG
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let output = run(&args)?;
    println!("{output}");
    Ok(())
}
