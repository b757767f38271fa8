use crate::reporters::{emit, Report};
use crate::OutputFormat;
use anyhow::Result;
use causal_core::features::{
    generate_feature_summary, map_file_to_features, map_to_user_features, sort_features_by_priority,
};
use serde::Serialize;
use std::path::Path;

/// User-facing features touched by a set of paths
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub files: Vec<FileFeatures>,
    /// Deduplicated, in priority order
    pub features: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFeatures {
    pub path: String,
    pub features: Vec<String>,
}

impl FeatureReport {
    pub fn from_paths(paths: &[String]) -> Self {
        let files = paths
            .iter()
            .map(|path| FileFeatures {
                path: path.clone(),
                features: map_file_to_features(path),
            })
            .collect();
        let features = sort_features_by_priority(&map_to_user_features(paths.iter().map(String::as_str)));
        let summary = generate_feature_summary(&features);
        Self {
            files,
            features,
            summary,
        }
    }
}

/// Maps paths to features; needs no source loading
pub fn execute_features(paths: &[String], format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let report = FeatureReport::from_paths(paths);
    emit(&Report::Features(&report), format, output)
}
