pub mod config;
pub mod file_writer;
pub mod formatter;

use anyhow::{anyhow, Result};
use config::LoggingConfig;
use formatter::LogFormat;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

/// Environment variable holding the log file path
pub const LOG_FILE_ENV: &str = "CAUSAL_LOG_FILE";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

fn console_layer<S>(format: LogFormat) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => layer.with_ansi(true).boxed(),
        LogFormat::Json => layer.with_ansi(false).json().boxed(),
    }
}

fn file_layer<S>(path: PathBuf, format: LogFormat) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_writer(file_writer::FileWriter::new(path))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(false)
        .with_timer(fmt::time::ChronoUtc::rfc_3339());

    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Initialize logging system with the given configuration.
///
/// Fails instead of panicking when a global subscriber is already installed,
/// so test binaries and embedding hosts can call it more than once.
pub fn init(config: LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = config.console.then(|| console_layer(config.format));
    let file = config
        .file
        .clone()
        .map(|path| file_layer(path, config.format));

    Registry::default()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|err| anyhow!("Failed to install tracing subscriber: {}", err))
}

/// Initialize logging with default configuration
pub fn init_default() -> Result<()> {
    init(LoggingConfig::default())
}

/// Initialize logging from environment variables and CLI arguments
pub fn init_from_args(
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let level = if verbose {
        "debug".to_string()
    } else {
        log_level
            .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
    };

    let file = log_file.or_else(|| std::env::var(LOG_FILE_ENV).ok().map(PathBuf::from));

    init(LoggingConfig {
        level,
        file,
        console: true,
        format: LogFormat::Text,
    })
}
