pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use text::TextReporter;

use crate::commands::features::FeatureReport;
use crate::commands::graph::GraphSummary;
use crate::OutputFormat;
use anyhow::{Context, Result};
use causal_core::data_flow::DataFlowResult;
use causal_core::impact::ImpactAnalysis;
use causal_core::service::SequenceData;
use std::fs;
use std::path::Path;

/// Anything a command can print
#[derive(Debug, Clone, Copy)]
pub enum Report<'a> {
    Impact(&'a ImpactAnalysis),
    DataFlow(&'a DataFlowResult),
    Sequence(&'a SequenceData),
    Graph(&'a GraphSummary),
    Features(&'a FeatureReport),
}

impl Report<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Report::Impact(_) => "impact",
            Report::DataFlow(_) => "data-flow",
            Report::Sequence(_) => "sequence",
            Report::Graph(_) => "graph",
            Report::Features(_) => "features",
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        let value = match self {
            Report::Impact(analysis) => serde_json::to_value(analysis)?,
            Report::DataFlow(result) => serde_json::to_value(result)?,
            Report::Sequence(data) => serde_json::to_value(data)?,
            Report::Graph(summary) => serde_json::to_value(summary)?,
            Report::Features(features) => serde_json::to_value(features)?,
        };
        Ok(value)
    }
}

/// Renders `report` in `format`
pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => JsonReporter.render(report),
        OutputFormat::Markdown => Ok(MarkdownReporter.render(report)),
        OutputFormat::Text => Ok(TextReporter.render(report)),
    }
}

/// Writes the rendered report to `output_path`, or stdout when absent.
///
/// Colours are switched off when text goes to a file.
pub fn emit(report: &Report, format: OutputFormat, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            colored::control::set_override(false);
            let content = render(report, format)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            println!("Report saved to {}", path.display());
        }
        None => println!("{}", render(report, format)?),
    }
    Ok(())
}
