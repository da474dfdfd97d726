//! Measure command-line interface

use clap::{Parser, Subcommand};
use octofhir_measure::cli::{evaluate, output, validate};
use std::path::PathBuf;

/// Quality measure command-line tool
#[derive(Parser)]
#[command(name = "measure")]
#[command(author, version, about = "Clinical quality measure scoring tools", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, table, pretty)
    #[arg(short = 'f', long, global = true)]
    format: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a measure from precomputed subject results
    Evaluate {
        /// FHIR Measure resource (JSON)
        measure: PathBuf,

        /// Subject results (JSON)
        results: PathBuf,

        /// Evaluation options file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip set-membership correction
        #[arg(long)]
        no_set_membership: bool,

        /// Report failing groups instead of aborting
        #[arg(long)]
        collect_errors: bool,

        /// Resource type for bare subject ids
        #[arg(short = 't', long)]
        subject_type: Option<String>,
    },

    /// Validate measure definitions
    Validate {
        /// Measure files to validate
        files: Vec<PathBuf>,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let result = match cli.command {
        Commands::Evaluate {
            measure,
            results,
            config,
            no_set_membership,
            collect_errors,
            subject_type,
        } => evaluate::evaluate(evaluate::EvaluateConfig {
            measure,
            results,
            options: config,
            no_set_membership,
            collect_errors,
            subject_type,
            output_format: cli.format.clone(),
            output_file: cli.output.clone(),
        }),

        Commands::Validate { files } => validate::validate(validate::ValidateConfig { files }),
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
