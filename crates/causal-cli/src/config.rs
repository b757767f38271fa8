use crate::OutputFormat;
use anyhow::{Context, Result};
use causal_core::impact::DEFAULT_IMPACT_DEPTH;
use causal_core::sequence::DEFAULT_SEQUENCE_DEPTH;
use causal_core::service::{MAX_BATCH_FILES, MAX_DEPTH_LIMIT};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "causal.toml";

/// Project configuration (`causal.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

/// Depth bounds and batch size
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fallback bound for both impact and sequence analysis
    pub max_depth: Option<usize>,
    pub impact_max_depth: Option<usize>,
    pub sequence_max_depth: Option<usize>,
    pub max_files: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            impact_max_depth: None,
            sequence_max_depth: None,
            max_files: MAX_BATCH_FILES,
        }
    }
}

impl AnalysisConfig {
    pub fn impact_depth(&self) -> usize {
        self.impact_max_depth
            .or(self.max_depth)
            .unwrap_or(DEFAULT_IMPACT_DEPTH)
    }

    pub fn sequence_depth(&self) -> usize {
        self.sequence_max_depth
            .or(self.max_depth)
            .unwrap_or(DEFAULT_SEQUENCE_DEPTH)
    }
}

/// Which files under the root are loaded
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub root: Option<PathBuf>,
    /// Extensions without the leading dot
    pub include_extensions: Vec<String>,
    /// Substrings of the relative path that exclude a file or directory
    pub exclude_patterns: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: None,
            include_extensions: ["ts", "tsx", "js", "jsx"].map(String::from).to_vec(),
            exclude_patterns: ["node_modules", ".d.ts", ".test.", ".spec."]
                .map(String::from)
                .to_vec(),
        }
    }
}

/// On-disk result cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from(".causal-cache"),
            ttl_secs: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// Report format and destination; both can be overridden on the command line
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the config file (can be absolute or relative)
    /// * `base_path` - Optional base path for resolving relative paths in config.
    ///   If None, uses the directory of the config file as base.
    pub fn load(path: &Path, base_path: Option<&Path>) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = base_path.unwrap_or_else(|| path.parent().unwrap_or_else(|| Path::new(".")));
        config.resolve_relative_paths(base);

        config.validate()?;
        Ok(config)
    }

    /// Explicit `--config` wins; otherwise `causal.toml` in the working
    /// directory if present; otherwise defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path, None),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path, None)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn resolve_relative_paths(&mut self, base: &Path) {
        if base.as_os_str().is_empty() {
            return;
        }
        if let Some(root) = &self.source.root {
            if root.is_relative() {
                self.source.root = Some(base.join(root));
            }
        }
        if self.cache.dir.is_relative() {
            self.cache.dir = base.join(&self.cache.dir);
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        let depths = [
            ("analysis.max_depth", self.analysis.max_depth),
            ("analysis.impact_max_depth", self.analysis.impact_max_depth),
            ("analysis.sequence_max_depth", self.analysis.sequence_max_depth),
        ];
        for (key, depth) in depths {
            match depth {
                Some(0) => anyhow::bail!("{} must be at least 1", key),
                Some(d) if d > MAX_DEPTH_LIMIT => {
                    anyhow::bail!("{} must not exceed {} (got {})", key, MAX_DEPTH_LIMIT, d)
                }
                _ => {}
            }
        }

        if self.analysis.max_files == 0 {
            anyhow::bail!("analysis.max_files must be at least 1");
        }
        if self.analysis.max_files > MAX_BATCH_FILES {
            anyhow::bail!(
                "analysis.max_files must not exceed {} (got {})",
                MAX_BATCH_FILES,
                self.analysis.max_files
            );
        }

        if self.source.include_extensions.is_empty() {
            anyhow::bail!("source.include_extensions cannot be empty");
        }
        if let Some(ext) = self
            .source
            .include_extensions
            .iter()
            .find(|ext| ext.trim_start_matches('.').is_empty())
        {
            anyhow::bail!("source.include_extensions contains an empty extension: {:?}", ext);
        }

        Ok(())
    }
}
