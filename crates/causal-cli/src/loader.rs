//! Directory source provider: walks a root, applies the extension and
//! exclusion filters and reads the surviving files into a batch.

use crate::config::SourceConfig;
use anyhow::{Context, Result};
use causal_core::models::SourceFile;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files read from disk plus what was left out
#[derive(Debug, Default)]
pub struct LoadedSources {
    pub files: Vec<SourceFile>,
    /// Matching files dropped by the batch cap
    pub truncated: usize,
    /// Matching files that could not be read as UTF-8
    pub unreadable: Vec<String>,
}

/// Loads up to `max_files` matching files under `root`, in path order.
///
/// Paths in the batch are relative to `root` and use `/` separators. A
/// single file may be passed as `root`.
pub fn load_sources(
    root: &Path,
    source: &SourceConfig,
    max_files: usize,
    show_progress: bool,
) -> Result<LoadedSources> {
    if !root.exists() {
        anyhow::bail!("Source root does not exist: {}", root.display());
    }

    let mut candidates = Vec::new();
    if root.is_file() {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if matches_filters(&name, source) {
            candidates.push((root.to_path_buf(), name));
        }
    } else {
        find_source_files(root, source, &mut candidates)?;
    }
    candidates.sort_by(|a, b| a.1.cmp(&b.1));

    let mut loaded = LoadedSources::default();
    if candidates.len() > max_files {
        loaded.truncated = candidates.len() - max_files;
        warn!(
            found = candidates.len(),
            max_files,
            "Too many source files, analysing the first {}",
            max_files
        );
        candidates.truncate(max_files);
    }

    let pb = if show_progress {
        ProgressBar::new(candidates.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(progress_style());
    pb.set_message("Loading sources...");

    for (path, relative) in candidates {
        pb.set_message(relative.clone());
        match fs::read_to_string(&path) {
            Ok(content) => loaded.files.push(SourceFile::new(relative, content)),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "Failed to read source file, skipping");
                loaded.unreadable.push(relative);
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("Loaded {} files", loaded.files.len()));

    debug!(
        root = %root.display(),
        files = loaded.files.len(),
        truncated = loaded.truncated,
        "Sources loaded"
    );
    Ok(loaded)
}

/// Whether a root-relative path passes the extension and exclusion filters
pub fn matches_filters(relative: &str, source: &SourceConfig) -> bool {
    if is_excluded(relative, source) {
        return false;
    }
    let Some((_, ext)) = relative.rsplit_once('.') else {
        return false;
    };
    source
        .include_extensions
        .iter()
        .any(|include| include.trim_start_matches('.') == ext)
}

fn is_excluded(relative: &str, source: &SourceConfig) -> bool {
    source
        .exclude_patterns
        .iter()
        .any(|pattern| !pattern.is_empty() && relative.contains(pattern.as_str()))
}

/// Iterative walk; excluded directories are not descended into
fn find_source_files(
    root: &Path,
    source: &SourceConfig,
    found: &mut Vec<(PathBuf, String)>,
) -> Result<()> {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let relative = relative_path(root, &path);
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if !hidden && !is_excluded(&format!("{}/", relative), source) {
                    stack.push(path);
                }
            } else if file_type.is_file() && matches_filters(&relative, source) {
                found.push((path, relative));
            }
        }
    }
    Ok(())
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}
