use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gex_charts::persist::WritePolicy;

/// Chart generator for options-market CSV exports: GEX history, data flow
/// and volume-by-strike charts, refreshed as the feed writes new files.
#[derive(Parser)]
#[command(name = "gex-charts", version, about)]
pub struct Cli {
    /// Config file (default: ./gex-charts.json, then the user config dir)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Watch the input directory and regenerate charts as files change
    Watch {
        /// Override the configured input directory
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override the configured write policy
        #[arg(long, value_enum)]
        write_policy: Option<WritePolicy>,

        /// Skip processing files already present at start-up
        #[arg(long)]
        no_initial_scan: bool,
    },

    /// Regenerate every matching file on a fixed interval
    Poll {
        /// Seconds between cycles
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Override the configured input directory
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override the configured write policy
        #[arg(long, value_enum)]
        write_policy: Option<WritePolicy>,
    },

    /// Render a single CSV file
    Render {
        /// Path to the CSV file
        file: PathBuf,

        /// Override the configured output directory
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Override the configured write policy
        #[arg(long, value_enum)]
        write_policy: Option<WritePolicy>,
    },

    /// Render every dated folder under a root, then rebuild the index
    Backfill {
        /// Root holding `YYYY-MM-DD` folders (default: the input directory)
        root: Option<PathBuf>,
    },

    /// Rebuild the index page of dated folders
    Index {
        /// Root holding `YYYY-MM-DD` folders (default: the input directory)
        root: Option<PathBuf>,
    },

    /// Combine one day's timestamped volume images into a looping GIF
    Animate {
        /// Directory holding the images (default: the output directory)
        dir: Option<PathBuf>,

        /// Day to collect, `YYYYMMDD` (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Output the JSON schema for the config file
    Schema,

    /// Output an example config JSON to stdout
    Example,
}
