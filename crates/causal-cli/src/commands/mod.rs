pub mod features;
pub mod graph;
pub mod impact;
pub mod init;
pub mod sequence;
pub mod trace;

pub use features::execute_features;
pub use graph::execute_graph;
pub use impact::execute_impact;
pub use init::execute_init;
pub use sequence::execute_sequence;
pub use trace::execute_trace;

use crate::config::Config;
use crate::loader::load_sources;
use crate::reporters::{emit, Report};
use crate::OutputFormat;
use anyhow::{Context, Result};
use causal_core::cache::SledCache;
use causal_core::models::SourceFile;
use causal_core::service::ServiceResponse;
use causal_typescript::CausalEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Branch name used in cache keys for a working-tree checkout
pub const LOCAL_BRANCH: &str = "local";

/// Everything a command needs besides its own arguments
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub root: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub show_progress: bool,
}

impl CommandContext {
    /// Resolves root, format and output: command line first, then config, then defaults
    pub fn new(
        config: Config,
        root: Option<PathBuf>,
        format: Option<OutputFormat>,
        output: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        let root = root
            .or_else(|| config.source.root.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let format = format.or(config.output.format).unwrap_or_default();
        let output = output.or_else(|| config.output.path.clone());
        Self {
            config,
            root,
            format,
            output,
            verbose,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Repository label for requests and cache keys
    pub fn repo(&self) -> String {
        self.root.display().to_string()
    }

    /// Loads the batch under the root; an empty batch is left for the engine to reject
    pub fn load_files(&self) -> Result<Vec<SourceFile>> {
        let loaded = load_sources(
            &self.root,
            &self.config.source,
            self.config.analysis.max_files,
            self.show_progress,
        )?;
        if loaded.truncated > 0 {
            info!(
                skipped = loaded.truncated,
                max_files = self.config.analysis.max_files,
                "Batch capped; raise analysis.max_files or narrow --root"
            );
        }
        Ok(loaded.files)
    }

    /// Engine with the on-disk cache when enabled.
    ///
    /// A cache that cannot be opened is reported and skipped.
    pub fn engine(&self) -> CausalEngine {
        let engine = CausalEngine::new().with_verbose(self.verbose);
        if !self.config.cache.enabled {
            return engine;
        }
        match SledCache::open(&self.config.cache.dir, self.config.cache.ttl()) {
            Ok(cache) => engine.with_cache(Arc::new(cache)),
            Err(err) => {
                warn!(
                    dir = %self.config.cache.dir.display(),
                    error = %err,
                    "Failed to open cache, continuing without it"
                );
                engine
            }
        }
    }

    pub fn emit(&self, report: &Report) -> Result<()> {
        emit(report, self.format, self.output.as_deref())
    }
}

/// Unwraps a service response, turning failures into an error carrying the status
pub fn into_data<T>(response: ServiceResponse<T>) -> Result<T> {
    let status = response.status;
    if !response.success {
        anyhow::bail!(
            "{} (status {})",
            response.error.unwrap_or_else(|| "Request failed".to_string()),
            status
        );
    }
    response
        .data
        .with_context(|| format!("Response carried no data (status {})", status))
}
