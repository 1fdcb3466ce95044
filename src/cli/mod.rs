use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod encode;
mod info;

/// dataobj-streams - Stream registry and streams section encoder
#[derive(Parser)]
#[command(name = "dataobj-streams")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode newline-delimited JSON records into a data object
    Encode {
        /// Input file, one {"labels": {...}, "timestamp": "..."} record per line
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output data object path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Target page size in bytes (default: 2 MiB)
        #[arg(short = 'p', long)]
        page_size: Option<usize>,

        /// Compression level for ZSTD label columns (1-22, 0 = none, default: 3)
        #[arg(short = 'c', long)]
        compression_level: Option<i32>,
    },

    /// Display information about a data object
    Info {
        /// Input data object path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encode {
            input,
            output,
            config,
            page_size,
            compression_level,
        } => encode::run(input, output, config, page_size, compression_level),
        Commands::Info { file } => info::run(file),
    }
}
