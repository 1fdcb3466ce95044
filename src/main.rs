//! # dataobj-streams
//!
//! A command-line tool for building streams sections of log data objects.
//!
//! ## Usage
//!
//! ```bash
//! # Encode newline-delimited JSON records into a data object
//! dataobj-streams encode records.jsonl streams.dobj
//!
//! # Show the sections and columns of a data object
//! dataobj-streams info streams.dobj
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
