//! CLI for modelavg: one consensus answer from many candidate MMM solutions.

mod commands;
mod table;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "modelavg")]
#[command(about = "modelavg: weighted model averaging for marketing-mix model ensembles")]
#[command(version = modelavg_core::VERSION)]
struct Cli {
    /// Log pipeline stages at debug level (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full report: weights, consensus effects, CPA, ROI, contribution shares,
    /// and fit quality when the input carries a fitted series.
    Report {
        /// Ensemble JSON document (solutions, decomposition, spend, sample_size, fit)
        input: String,

        /// Aggregation config JSON (ci_multiplier, duplicate_policy, decimal_places, include_base)
        #[arg(long)]
        config: Option<String>,

        /// Two-sided confidence level used to derive the interval multiplier (e.g. 0.9)
        #[arg(long, conflicts_with = "ci_multiplier")]
        confidence: Option<f64>,

        /// Interval multiplier applied to the standard error (default 1.96)
        #[arg(long)]
        ci_multiplier: Option<f64>,

        /// How to treat repeated solution ids
        #[arg(long, value_parser = ["keep-first", "reject"])]
        duplicates: Option<String>,

        /// Decimal places for table output
        #[arg(long)]
        ndp: Option<usize>,

        /// Drop intercept/trend/season/holiday from the contribution-share table
        #[arg(long)]
        exclude_base: bool,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json"])]
        format: String,

        /// Write the full report as JSON to this path
        #[arg(long)]
        output: Option<String>,
    },

    /// Inverse-NRMSE weight table only
    Weights {
        /// Ensemble JSON document
        input: String,

        /// How to treat repeated solution ids
        #[arg(long, default_value = "keep-first", value_parser = ["keep-first", "reject"])]
        duplicates: String,

        /// Decimal places for table output
        #[arg(long, default_value = "4")]
        ndp: usize,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json"])]
        format: String,
    },

    /// Pseudo-R² and adjusted pseudo-R² for the input's fitted series
    Fit {
        /// Ensemble JSON document with a `fit` section
        input: String,

        /// Decimal places for table output
        #[arg(long, default_value = "4")]
        ndp: usize,

        /// Output format
        #[arg(long, default_value = "table", value_parser = ["table", "json"])]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Report {
            input,
            config,
            confidence,
            ci_multiplier,
            duplicates,
            ndp,
            exclude_base,
            format,
            output,
        } => commands::report::run(commands::report::ReportCommandConfig {
            input_path: &input,
            config_path: config.as_deref(),
            confidence,
            ci_multiplier,
            duplicates: duplicates.as_deref(),
            decimal_places: ndp,
            exclude_base,
            format: &format,
            output_path: output.as_deref(),
        }),
        Commands::Weights {
            input,
            duplicates,
            ndp,
            format,
        } => commands::weights::run(&input, &duplicates, ndp, &format),
        Commands::Fit { input, ndp, format } => commands::fit::run(&input, ndp, &format),
    }
}
