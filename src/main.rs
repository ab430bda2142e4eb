// File: src/main.rs
//
// Command-line entry point for ruff-bigo.
// Parses arguments with clap and dispatches to a subcommand:
// analyze (estimate a candidate's complexity), run (execute it once), or repl.

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use ruff_bigo::analysis::{estimate_complexity, Reporter};
use ruff_bigo::config::{Aggregation, ClassifierKind, Config, SamplerPolicy};
use ruff_bigo::errors::AnalysisError;
use ruff_bigo::repl::Repl;
use ruff_bigo::sandbox::{run_on_worker, Sandbox};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(
    name = "ruff-bigo",
    about = "Estimate the time complexity of a Ruff function by measuring it",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Estimate the complexity of the entry function in a candidate script
    Analyze {
        /// Path to the .ruff file, or '-' for stdin
        file: PathBuf,

        #[command(flatten)]
        options: AnalyzeOptions,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the entry function once and print its result
    Run {
        /// Path to the .ruff file, or '-' for stdin
        file: PathBuf,

        /// Input size passed to the entry function
        #[arg(short, long, default_value_t = 10)]
        n: u64,

        /// Entry function name
        #[arg(long)]
        entry: Option<String>,
    },

    /// Launch the interactive REPL
    Repl {
        #[command(flatten)]
        options: AnalyzeOptions,
    },
}

#[derive(clap::Args)]
struct AnalyzeOptions {
    /// TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input size selection policy
    #[arg(long, value_enum)]
    policy: Option<SamplerPolicy>,

    /// Classification strategy (defaults to the one paired with the policy)
    #[arg(long, value_enum)]
    classifier: Option<ClassifierKind>,

    /// How valid trials are combined per size
    #[arg(long, value_enum)]
    aggregate: Option<Aggregation>,

    /// Timed trials per size
    #[arg(long)]
    trials: Option<usize>,

    /// Per-trial ceiling in milliseconds
    #[arg(long)]
    trial_timeout_ms: Option<f64>,

    /// Global time budget in milliseconds
    #[arg(long)]
    budget_ms: Option<f64>,

    /// Resolution floor in milliseconds
    #[arg(long)]
    min_duration_ms: Option<f64>,

    /// Custom input sizes, comma separated
    #[arg(long, value_delimiter = ',')]
    sizes: Option<Vec<u64>>,

    /// Entry function name
    #[arg(long)]
    entry: Option<String>,
}

impl AnalyzeOptions {
    fn to_config(&self) -> Result<Config, AnalysisError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(policy) = self.policy {
            config.sampler_policy = policy;
        }
        if self.classifier.is_some() {
            config.classifier = self.classifier;
        }
        if let Some(aggregate) = self.aggregate {
            config.aggregation = aggregate;
        }
        if let Some(trials) = self.trials {
            config.trial_count = trials;
        }
        if let Some(ms) = self.trial_timeout_ms {
            config.per_trial_timeout_ms = ms;
        }
        if let Some(ms) = self.budget_ms {
            config.global_budget_ms = ms;
        }
        if let Some(ms) = self.min_duration_ms {
            config.min_valid_duration_ms = ms;
        }
        if self.sizes.is_some() {
            config.sizes = self.sizes.clone();
        }
        if let Some(entry) = &self.entry {
            config.entry_point = entry.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn read_source(path: &Path) -> Result<String, AnalysisError> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| AnalysisError::io(format!("Cannot read stdin: {}", e)))?;
        return Ok(source);
    }
    fs::read_to_string(path)
        .map_err(|e| AnalysisError::io(format!("Cannot read '{}': {}", path.display(), e)))
}

fn fail(err: &AnalysisError, json: bool) -> ! {
    if json {
        match Reporter::error_json(err) {
            Ok(text) => println!("{}", text),
            Err(_) => eprint!("{}", err),
        }
    } else {
        eprint!("{}", err);
    }
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze { file, options, json } => {
            let config = options.to_config().unwrap_or_else(|e| fail(&e, json));
            let source = read_source(&file).unwrap_or_else(|e| fail(&e, json));
            let report = estimate_complexity(&source, &config).unwrap_or_else(|e| fail(&e, json));
            if json {
                match Reporter::to_json(&report) {
                    Ok(text) => println!("{}", text),
                    Err(e) => fail(&e, false),
                }
            } else {
                Reporter::print(&report);
            }
        }

        Commands::Run { file, n, entry } => {
            let mut config = Config::default();
            if let Some(entry) = entry {
                config.entry_point = entry;
            }
            let source = read_source(&file).unwrap_or_else(|e| fail(&e, false));
            let result = run_on_worker(config.max_call_depth, || {
                let mut candidate = Sandbox::compile(&source, &config)?;
                candidate.run(n, None).map_err(|e| e.with_source_from(&source))
            });
            match result {
                Ok(value) => println!("{} {}", "=>".bright_blue(), value.to_string().bright_white()),
                Err(e) => fail(&e, false),
            }
        }

        Commands::Repl { options } => {
            let config = options.to_config().unwrap_or_else(|e| fail(&e, false));
            match Repl::new(config) {
                Ok(mut repl) => {
                    if let Err(e) = repl.run() {
                        eprintln!("{} {}", "Error:".bright_red(), e);
                        process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red(), e);
                    process::exit(1);
                }
            }
        }
    }
}
