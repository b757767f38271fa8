use super::Report;
use crate::commands::features::FeatureReport;
use crate::commands::graph::GraphSummary;
use crate::render::{data_flow_mermaid, impact_mermaid, sequence_mermaid};
use anyhow::Result;
use causal_core::data_flow::DataFlowResult;
use causal_core::impact::{ImpactAnalysis, ImpactNode};
use causal_core::service::SequenceData;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Markdown report generator
pub struct MarkdownReporter;

impl MarkdownReporter {
    pub fn render(&self, report: &Report) -> String {
        match report {
            Report::Impact(analysis) => impact_report(analysis),
            Report::DataFlow(result) => data_flow_report(result),
            Report::Sequence(data) => sequence_report(data),
            Report::Graph(summary) => graph_report(summary),
            Report::Features(features) => features_report(features),
        }
    }

    /// Generates a Markdown report file
    pub fn generate(&self, report: &Report, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.render(report))?;
        Ok(())
    }
}

fn header(report: &mut String, title: &str) {
    report.push_str(&format!("# {}\n\n", title));
    report.push_str(&format!(
        "## Analysis Date\n{}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
}

fn mermaid_block(report: &mut String, diagram: &str) {
    report.push_str("```mermaid\n");
    report.push_str(diagram);
    report.push_str("```\n\n");
}

/// Pipes would break the table row
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn impact_report(analysis: &ImpactAnalysis) -> String {
    let mut report = String::new();
    let target = &analysis.target;
    header(&mut report, &format!("Impact Analysis: {}", target.display_name));

    report.push_str("## Target\n\n");
    report.push_str(&format!("- **Name**: `{}`\n", target.name));
    report.push_str(&format!("- **Location**: `{}:{}`\n\n", target.file, target.line));

    report.push_str("## Impact Statistics\n\n");
    report.push_str(&format!(
        "- **Risk Level**: {}\n",
        analysis.risk_level.as_str().to_uppercase()
    ));
    report.push_str(&format!("- **Direct Callers**: {}\n", analysis.direct_callers.len()));
    report.push_str(&format!("- **Indirect Callers**: {}\n", analysis.indirect_callers.len()));
    report.push_str(&format!(
        "- **Affected Files**: {}\n",
        analysis.summary.affected_files_count
    ));
    report.push_str(&format!(
        "- **Affected Features**: {}\n\n",
        analysis.summary.affected_features_count
    ));
    report.push_str(&format!("{}\n\n", analysis.summary.human_readable_message));

    if !analysis.user_features.is_empty() {
        report.push_str("## Affected Features\n\n");
        for feature in &analysis.user_features {
            report.push_str(&format!("- {}\n", feature));
        }
        report.push('\n');
    }

    caller_table(&mut report, "Direct Callers", &analysis.direct_callers, false);
    caller_table(&mut report, "Indirect Callers", &analysis.indirect_callers, true);

    if !analysis.affected_entry_points.is_empty() {
        report.push_str("## Entry Points\n\n");
        for entry in &analysis.affected_entry_points {
            report.push_str(&format!(
                "- **{}** (`{}`): {}\n",
                entry.display_name, entry.file, entry.description
            ));
        }
        report.push('\n');
    }

    if !analysis.summary.recommendations.is_empty() {
        report.push_str("## Recommendations\n\n");
        for recommendation in &analysis.summary.recommendations {
            report.push_str(&format!("- {}\n", recommendation));
        }
        report.push('\n');
    }

    if let Some(diagram) = &analysis.diagram {
        report.push_str("## Diagram\n\n");
        mermaid_block(&mut report, &impact_mermaid(diagram));
    }
    report
}

fn caller_table(report: &mut String, title: &str, callers: &[ImpactNode], with_path: bool) {
    report.push_str(&format!("## {}\n\n", title));
    if callers.is_empty() {
        report.push_str("None\n\n");
        return;
    }
    if with_path {
        report.push_str("| Function | Location | Depth | Call Path |\n|---|---|---|---|\n");
    } else {
        report.push_str("| Function | Location | Depth |\n|---|---|---|\n");
    }
    for caller in callers {
        let mut row = format!(
            "| {} | `{}:{}` | {} |",
            cell(&caller.name),
            cell(&caller.file),
            caller.line,
            caller.depth
        );
        if with_path {
            row.push_str(&format!(" {} |", cell(&caller.call_path.join(" ← "))));
        }
        report.push_str(&row);
        report.push('\n');
    }
    report.push('\n');
}

fn data_flow_report(result: &DataFlowResult) -> String {
    let mut report = String::new();
    let target = &result.target;
    header(&mut report, &format!("Data Flow: `{}`", target.name));

    report.push_str("## Target\n\n");
    report.push_str(&format!("- **Location**: `{}:{}`\n", target.file, target.line));
    report.push_str(&format!("- **Direction**: {}\n", target.direction));
    report.push_str(&format!("- **Found**: {}\n", if result.found { "yes" } else { "no" }));
    report.push_str(&format!("- **Analysis Time**: {:.2} ms\n\n", result.analysis_time_ms));

    report.push_str(&format!("## {}\n\n", result.story.title));
    for step in &result.story.steps {
        report.push_str(&format!(
            "{}. {} {} (`{}:{}`)\n",
            step.order + 1,
            step.icon,
            step.label,
            step.file,
            step.line
        ));
    }
    report.push_str(&format!("\n{}\n\n", result.story.summary));

    if !result.sources.is_empty() {
        report.push_str("## Sources\n\n| Kind | Name | Location | Code |\n|---|---|---|---|\n");
        for source in &result.sources {
            report.push_str(&format!(
                "| {} {} | {} | `{}:{}` | `{}` |\n",
                source.icon,
                source.kind.display_name(),
                cell(&source.name),
                cell(&source.file),
                source.line,
                cell(&source.code)
            ));
        }
        report.push('\n');
    }

    if !result.transformations.is_empty() {
        report.push_str("## Transformations\n\n| # | Function | Kind | Location |\n|---|---|---|---|\n");
        for transformation in &result.transformations {
            report.push_str(&format!(
                "| {} | `{}` | {} | `{}:{}` |\n",
                transformation.order + 1,
                cell(&transformation.function_name),
                transformation.display_label,
                cell(&transformation.file),
                transformation.line
            ));
        }
        report.push('\n');
    }

    if !result.destinations.is_empty() {
        report.push_str("## Destinations\n\n| Kind | Name | Location | Code |\n|---|---|---|---|\n");
        for destination in &result.destinations {
            report.push_str(&format!(
                "| {} {} | {} | `{}:{}` | `{}` |\n",
                destination.icon,
                destination.kind.display_name(),
                cell(&destination.name),
                cell(&destination.file),
                destination.line,
                cell(&destination.code)
            ));
        }
        report.push('\n');
    }

    if !result.visualization.nodes.is_empty() {
        report.push_str("## Diagram\n\n");
        mermaid_block(&mut report, &data_flow_mermaid(&result.visualization));
    }
    report
}

fn sequence_report(data: &SequenceData) -> String {
    let mut report = String::new();
    let flow = &data.flow;
    header(&mut report, &format!("Sequence Flow: {}", flow.display_name));
    report.push_str(&format!("{}\n\n", flow.description));

    report.push_str("## Trigger\n\n");
    report.push_str(&format!(
        "- **{}**: `{}` at `{}:{}`\n\n",
        flow.trigger.display_label, flow.trigger.handler, flow.trigger.file, flow.trigger.line
    ));

    let names: HashMap<&str, &str> = flow
        .participants
        .iter()
        .map(|p| (p.id.as_str(), p.display_name.as_str()))
        .collect();
    let name_of = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    report.push_str("## Layers\n\n");
    for group in &data.diagram {
        let members: Vec<String> = group.participants.iter().map(|id| name_of(id)).collect();
        report.push_str(&format!("- {} **{}**: {}\n", group.icon, group.label, members.join(", ")));
    }
    report.push('\n');

    report.push_str("## Messages\n\n");
    for message in &flow.messages {
        report.push_str(&format!(
            "{}. {} → {}: {}\n",
            message.order + 1,
            name_of(&message.from),
            name_of(&message.to),
            message.display_label
        ));
    }
    if flow.truncated {
        report.push_str("\n> The trace was truncated at the message limit.\n");
    }
    report.push('\n');

    if !flow.outcomes.is_empty() {
        report.push_str("## Outcomes\n\n");
        for outcome in &flow.outcomes {
            report.push_str(&format!("- {}\n", outcome.display_label));
        }
        report.push('\n');
    }

    report.push_str("## Diagram\n\n");
    mermaid_block(&mut report, &sequence_mermaid(flow));
    report
}

fn graph_report(summary: &GraphSummary) -> String {
    let mut report = String::new();
    header(&mut report, "Call Graph Summary");

    let stats = &summary.stats;
    report.push_str("## Build Statistics\n\n");
    report.push_str(&format!("- **Files Parsed**: {}\n", stats.files_parsed));
    report.push_str(&format!("- **Nodes**: {}\n", summary.node_count));
    report.push_str(&format!("- **Edges**: {}\n", summary.edge_count));
    report.push_str(&format!("  - API Calls: {}\n", stats.api_calls));
    report.push_str(&format!("  - DB Calls: {}\n", stats.db_calls));
    report.push_str(&format!("- **Dynamic Calls**: {}\n", stats.dynamic_calls));
    report.push_str(&format!("- **Unresolved Calls**: {}\n\n", stats.unresolved_calls));

    if !stats.skipped_files.is_empty() {
        report.push_str("## Skipped Files\n\n");
        for file in &stats.skipped_files {
            report.push_str(&format!("- `{}`\n", file));
        }
        report.push('\n');
    }

    report.push_str("## API Endpoints\n\n");
    list_or_none(&mut report, &summary.api_endpoints);
    report.push_str("## Database Resources\n\n");
    list_or_none(&mut report, &summary.db_resources);

    report.push_str("## Entry Points\n\n");
    if summary.entry_points.is_empty() {
        report.push_str("None\n\n");
    } else {
        report.push_str("| Function | Kind | Location |\n|---|---|---|\n");
        for entry in &summary.entry_points {
            report.push_str(&format!(
                "| {} | {} | `{}:{}` |\n",
                cell(&entry.name),
                entry.kind,
                cell(&entry.file),
                entry.line
            ));
        }
        report.push('\n');
    }
    report
}

fn list_or_none(report: &mut String, items: &[String]) {
    if items.is_empty() {
        report.push_str("None\n\n");
        return;
    }
    for item in items {
        report.push_str(&format!("- `{}`\n", item));
    }
    report.push('\n');
}

fn features_report(features: &FeatureReport) -> String {
    let mut report = String::new();
    header(&mut report, "Feature Map");
    report.push_str(&format!("{}\n\n", features.summary));

    report.push_str("## Features\n\n");
    if features.features.is_empty() {
        report.push_str("None\n\n");
    } else {
        for feature in &features.features {
            report.push_str(&format!("- {}\n", feature));
        }
        report.push('\n');
    }

    report.push_str("## Files\n\n| File | Features |\n|---|---|\n");
    for file in &features.files {
        let mapped = if file.features.is_empty() {
            "-".to_string()
        } else {
            file.features.join(", ")
        };
        report.push_str(&format!("| `{}` | {} |\n", cell(&file.path), mapped));
    }
    report.push('\n');
    report
}
