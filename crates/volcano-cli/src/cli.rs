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
    author = "Volcano Contributors",
    version,
    about = "Volcano CLI - fit adsorption-energy scaling relations and map limiting-potential volcanoes for electrocatalytic reactions.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit scaling relations of every adsorbate against the descriptor pair.
    Fit(FitArgs),
    /// Fit scaling relations, then map limiting potential, RDS and selectivity over a grid.
    Map(MapArgs),
}

/// Arguments for the `fit` subcommand.
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Path to the study configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Write the fitted relations as CSV to this path.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the mixing-ratio mode: 'auto' or a fixed pair such as '70:30'.
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S scaling.mode=50:50
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Path to the study configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory receiving the mesh, step-function and scaling-relation CSV files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Override the mixing-ratio mode: 'auto' or a fixed pair such as '70:30'.
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Override the applied electrode potential (V vs. RHE).
    #[arg(short = 'U', long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub potential: Option<f64>,

    /// Override the grid density, e.g. '200x150' or '100' for a square grid.
    #[arg(short, long, value_name = "NXxNY")]
    pub density: Option<String>,

    /// Map only this reaction. Can be used multiple times.
    #[arg(short, long = "reaction", value_name = "NAME")]
    pub reactions: Vec<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S evaluation.external-potential=-0.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
