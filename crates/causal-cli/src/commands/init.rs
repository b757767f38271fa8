use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Commented default `causal.toml`
pub const DEFAULT_CONFIG: &str = r#"# Causality engine configuration

[analysis]
# Fallback hop bound for impact and sequence analysis (optional)
# max_depth = 10

# Caller search depth for `causal impact` (default 5)
impact_max_depth = 5

# Call depth for `causal sequence` (default 10)
sequence_max_depth = 10

# Files per analysed batch, at most 50
max_files = 50

[source]
# Directory to analyse; relative paths resolve against this file
root = "src"
include_extensions = ["ts", "tsx", "js", "jsx"]
exclude_patterns = ["node_modules", ".d.ts", ".test.", ".spec."]

[cache]
enabled = false
dir = ".causal-cache"
# Entry lifetime in seconds (optional, None = never expires)
# ttl_secs = 3600

[output]
# text, json or markdown
format = "text"
# Write reports to a file instead of stdout
# path = "causal-report.md"
"#;

/// Creates the configuration file
pub fn execute_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }

    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    println!("Created config file: {}", path.display());

    Ok(())
}
