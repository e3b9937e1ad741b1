use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "fragspace CLI - Scaffold hopping over combinatorial synthon spaces with pharmacophore trees.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output and progress bars except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to search reactions in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a synthon library for products resembling a query pharmacophore tree.
    Search(SearchArgs),
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    // --- Inputs ---
    /// Path to the query pharmacophore tree (TOML).
    #[arg(short = 'i', long, required = true, value_name = "PATH")]
    pub query: PathBuf,

    /// Path to the synthon library (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub library: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Output ---
    /// Write hits as CSV to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Only write the best N hits.
    #[arg(short = 'n', long, value_name = "INT")]
    pub top: Option<usize>,

    // --- Search Overrides ---
    /// Minimum similarity of a reported hit, between 0 and 1.
    #[arg(short = 't', long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Restrict the search to a single reaction of the library.
    #[arg(short, long, value_name = "ID")]
    pub reaction: Option<String>,

    /// Override the length of every ranked match list.
    #[arg(long, value_name = "INT")]
    pub n_best_solutions: Option<usize>,

    /// Stop computing new edge-link cache cells after this many.
    #[arg(long, value_name = "INT")]
    pub max_cells: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.alpha=0.6
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
