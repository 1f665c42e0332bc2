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
    author = "Ahmed Awad",
    version,
    about = "MatSelect CLI - rank candidate materials against hard requirements and competing objectives, and explain the trade-offs.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel scoring.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter, score and rank a candidate pool, with explanations.
    Recommend(SelectionArgs),
    /// Explore the Pareto frontier and how the requested objectives compete.
    Tradeoffs(SelectionArgs),
    /// Compare alternatives against a baseline material, property by property.
    Compare(CompareArgs),
}

/// Arguments shared by `recommend` and `tradeoffs`.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    // --- Inputs ---
    /// Candidate pool file (.csv or .toml).
    #[arg(short = 'i', long, required = true, value_name = "PATH")]
    pub candidates: PathBuf,

    /// Configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Request ---
    /// Add a requirement, overriding the config file for the same key.
    /// Can be used multiple times. Example: -r max_density=3.0 -r corrosion_resistance=good
    #[arg(short = 'r', long = "require", value_name = "KEY=VALUE")]
    pub requirements: Vec<String>,

    /// Objective preset to optimize (weight, cost, strength, stiffness, stability, tco).
    /// Can be used multiple times; replaces the config file's list.
    #[arg(short = 'o', long = "optimize", value_name = "NAME")]
    pub objectives: Vec<String>,

    /// Number of ranked candidates to return.
    #[arg(short = 'n', long, value_name = "INT")]
    pub top_n: Option<usize>,

    // --- Engine Overrides ---
    /// Score assigned to missing objective data, between 0 and 1.
    #[arg(long, value_name = "FLOAT")]
    pub missing_penalty: Option<f64>,

    /// Predictions below this confidence are scored as missing.
    #[arg(long, value_name = "FLOAT")]
    pub min_confidence: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S explanation.max-tradeoffs=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    // --- Output ---
    /// Print the result as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Candidate pool file (.csv or .toml).
    #[arg(short = 'i', long, required = true, value_name = "PATH")]
    pub candidates: PathBuf,

    /// Material id of the baseline.
    #[arg(short, long, required = true, value_name = "ID")]
    pub baseline: String,

    /// Material ids of the alternatives.
    #[arg(required = true, value_name = "ID")]
    pub alternatives: Vec<String>,

    /// Property to compare. Can be used multiple times.
    /// Defaults to every numeric property of the baseline.
    #[arg(short, long = "property", value_name = "NAME")]
    pub properties: Vec<String>,

    /// Print the result as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}
