use anyhow::Result;
use causal_cli::commands::{
    execute_features, execute_graph, execute_impact, execute_init, execute_sequence, execute_trace,
    CommandContext,
};
use causal_cli::config::{Config, DEFAULT_CONFIG_FILE};
use causal_cli::OutputFormat;
use causal_core::data_flow::FlowDirection;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "causal")]
#[command(about = "Static causality analysis for TypeScript/JavaScript projects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ./causal.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory (or single file) to analyse
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable the on-disk result cache in this directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show direct and indirect callers of a function and the resulting risk
    Impact {
        /// Function name
        name: String,
        /// Disambiguate by file path (suffix match)
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Trace where a value comes from and where it goes
    Trace {
        /// Identifier to trace
        identifier: String,
        /// File containing the identifier, relative to the root
        #[arg(long)]
        file: String,
        /// 1-based line of the identifier
        #[arg(long)]
        line: usize,
        #[arg(long, default_value = "both")]
        direction: FlowDirection,
    },
    /// Build the call sequence started by a handler
    Sequence {
        /// Handler or function name
        trigger: String,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print call graph statistics and entry points
    Graph,
    /// Map file paths to user-facing features
    Features {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Create a default config file
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = causal_core::init_from_args(cli.log_level.clone(), cli.log_file.clone(), cli.verbose) {
        eprintln!("{} {}", "warning:".yellow(), err);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Init { path } => return execute_init(path),
        Commands::Features { paths } => {
            let config = Config::discover(cli.config.as_deref())?;
            let format = cli.format.or(config.output.format).unwrap_or_default();
            let output = cli.output.clone().or(config.output.path);
            return execute_features(paths, format, output.as_deref());
        }
        _ => {}
    }

    let mut config = Config::discover(cli.config.as_deref())?;
    if let Some(dir) = cli.cache_dir {
        config.cache.enabled = true;
        config.cache.dir = dir;
    }
    let ctx = CommandContext::new(config, cli.root, cli.format, cli.output, cli.verbose);

    match cli.command {
        Commands::Impact {
            name,
            file,
            max_depth,
        } => execute_impact(&ctx, &name, file.as_deref(), max_depth),
        Commands::Trace {
            identifier,
            file,
            line,
            direction,
        } => execute_trace(&ctx, &identifier, &file, line, direction),
        Commands::Sequence { trigger, max_depth } => execute_sequence(&ctx, &trigger, max_depth),
        Commands::Graph => execute_graph(&ctx),
        Commands::Init { .. } | Commands::Features { .. } => Ok(()),
    }
}
