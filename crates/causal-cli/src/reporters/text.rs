use super::Report;
use crate::commands::features::FeatureReport;
use crate::commands::graph::GraphSummary;
use causal_core::data_flow::DataFlowResult;
use causal_core::impact::{ImpactAnalysis, ImpactNode, RiskLevel};
use causal_core::sequence::MessageType;
use causal_core::service::SequenceData;
use colored::{ColoredString, Colorize};
use std::collections::HashMap;
use std::fmt::Write;

/// Terminal report, colourised unless colours are switched off globally
pub struct TextReporter;

impl TextReporter {
    pub fn render(&self, report: &Report) -> String {
        match report {
            Report::Impact(analysis) => impact_text(analysis),
            Report::DataFlow(result) => data_flow_text(result),
            Report::Sequence(data) => sequence_text(data),
            Report::Graph(summary) => graph_text(summary),
            Report::Features(features) => features_text(features),
        }
    }
}

fn risk_badge(risk: RiskLevel) -> ColoredString {
    let label = risk.as_str().to_uppercase();
    match risk {
        RiskLevel::High => label.red().bold(),
        RiskLevel::Medium => label.yellow().bold(),
        RiskLevel::Low => label.green().bold(),
    }
}

fn impact_text(analysis: &ImpactAnalysis) -> String {
    let mut out = String::new();
    let target = &analysis.target;
    let _ = writeln!(
        out,
        "{} {} ({}:{})",
        "Impact of".bold(),
        target.name.cyan().bold(),
        target.file,
        target.line
    );
    let _ = writeln!(out, "Risk: {}", risk_badge(analysis.risk_level));
    let _ = writeln!(out, "{}\n", analysis.summary.human_readable_message);

    write_callers(&mut out, "Direct callers", &analysis.direct_callers);
    write_callers(&mut out, "Indirect callers", &analysis.indirect_callers);

    if !analysis.user_features.is_empty() {
        let _ = writeln!(
            out,
            "{} {}",
            "Affected features:".bold(),
            analysis.user_features.join(", ")
        );
    }
    if !analysis.summary.recommendations.is_empty() {
        let _ = writeln!(out, "{}", "Recommendations:".bold());
        for recommendation in &analysis.summary.recommendations {
            let _ = writeln!(out, "  - {}", recommendation);
        }
    }
    out
}

fn write_callers(out: &mut String, title: &str, callers: &[ImpactNode]) {
    let _ = writeln!(out, "{} ({})", title.bold(), callers.len());
    for caller in callers {
        let depth = if caller.depth > 1 {
            format!(" depth {}", caller.depth).dimmed().to_string()
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "  • {}  {}{}",
            caller.name.cyan(),
            format!("{}:{}", caller.file, caller.line).dimmed(),
            depth
        );
    }
    out.push('\n');
}

fn data_flow_text(result: &DataFlowResult) -> String {
    let mut out = String::new();
    let target = &result.target;
    let _ = writeln!(
        out,
        "{} {} ({}:{}, {})",
        "Data flow of".bold(),
        target.name.cyan().bold(),
        target.file,
        target.line,
        target.direction
    );
    if !result.found {
        let _ = writeln!(out, "{}", result.story.summary.yellow());
        return out;
    }

    for source in &result.sources {
        let _ = writeln!(
            out,
            "  {} {} {}  {}",
            "source".green(),
            source.icon,
            source.kind.display_name(),
            format!("{}:{} {}", source.file, source.line, source.code).dimmed()
        );
    }
    for transformation in &result.transformations {
        let _ = writeln!(
            out,
            "  {} {} {}  {}",
            "transform".blue(),
            transformation.function_name,
            transformation.display_label,
            format!("{}:{}", transformation.file, transformation.line).dimmed()
        );
    }
    for destination in &result.destinations {
        let _ = writeln!(
            out,
            "  {} {} {}  {}",
            "sink".magenta(),
            destination.icon,
            destination.kind.display_name(),
            format!("{}:{} {}", destination.file, destination.line, destination.code).dimmed()
        );
    }
    let _ = writeln!(out, "\n{}", result.story.summary);
    let _ = writeln!(out, "{}", format!("{:.2} ms", result.analysis_time_ms).dimmed());
    out
}

fn sequence_text(data: &SequenceData) -> String {
    let mut out = String::new();
    let flow = &data.flow;
    let _ = writeln!(out, "{} {}", "Sequence:".bold(), flow.display_name.cyan().bold());
    let _ = writeln!(out, "{}\n", flow.description);

    let names: HashMap<&str, &str> = flow
        .participants
        .iter()
        .map(|p| (p.id.as_str(), p.display_name.as_str()))
        .collect();
    let name_of = |id: &str| names.get(id).copied().unwrap_or(id).to_string();

    for message in &flow.messages {
        let arrow = match message.message_type {
            MessageType::Return => "<--".dimmed(),
            MessageType::Async => "~~>".yellow(),
            MessageType::Sync => "-->".normal(),
        };
        let _ = writeln!(
            out,
            "{:>3}. {} {} {}: {}",
            message.order + 1,
            name_of(&message.from),
            arrow,
            name_of(&message.to),
            message.display_label
        );
    }
    if flow.truncated {
        let _ = writeln!(out, "{}", "(trace truncated at the message limit)".yellow());
    }

    out.push('\n');
    for group in &data.diagram {
        let members: Vec<String> = group.participants.iter().map(|id| name_of(id)).collect();
        let _ = writeln!(out, "{} {}: {}", group.icon, group.label.bold(), members.join(", "));
    }
    out
}

fn graph_text(summary: &GraphSummary) -> String {
    let mut out = String::new();
    let stats = &summary.stats;
    let _ = writeln!(out, "{}", "Call graph".bold());
    let _ = writeln!(
        out,
        "  files {}  nodes {}  edges {}",
        stats.files_parsed, summary.node_count, summary.edge_count
    );
    let _ = writeln!(
        out,
        "  api calls {}  db calls {}  dynamic {}  unresolved {}",
        stats.api_calls, stats.db_calls, stats.dynamic_calls, stats.unresolved_calls
    );
    for file in &stats.skipped_files {
        let _ = writeln!(out, "  {} {}", "skipped".yellow(), file);
    }

    if !summary.api_endpoints.is_empty() {
        let _ = writeln!(out, "\n{}", "API endpoints".bold());
        for endpoint in &summary.api_endpoints {
            let _ = writeln!(out, "  {}", endpoint);
        }
    }
    if !summary.db_resources.is_empty() {
        let _ = writeln!(out, "\n{}", "Database resources".bold());
        for resource in &summary.db_resources {
            let _ = writeln!(out, "  {}", resource);
        }
    }

    let _ = writeln!(out, "\n{} ({})", "Entry points".bold(), summary.entry_points.len());
    for entry in &summary.entry_points {
        let _ = writeln!(
            out,
            "  {} {}  {}",
            entry.name.cyan(),
            entry.kind.dimmed(),
            format!("{}:{}", entry.file, entry.line).dimmed()
        );
    }
    out
}

fn features_text(features: &FeatureReport) -> String {
    let mut out = String::new();
    for file in &features.files {
        let mapped = if file.features.is_empty() {
            "-".dimmed().to_string()
        } else {
            file.features.join(", ")
        };
        let _ = writeln!(out, "{}  {}", file.path.cyan(), mapped);
    }
    let _ = writeln!(out, "\n{}", features.summary.bold());
    out
}
