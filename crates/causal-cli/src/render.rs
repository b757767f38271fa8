//! Mermaid rendering of impact diagrams, sequence flows and data flows.
//!
//! Core ids (`src/a.ts#login@3`, `api:POST:/x`) are not valid Mermaid ids,
//! so every node gets a positional alias (`n0`, `p1`, ...).

use causal_core::data_flow::{DataFlowVisualization, FlowNodeType};
use causal_core::impact::{DiagramRole, ImpactDiagram};
use causal_core::labels::escape_label;
use causal_core::sequence::{MessageType, SequenceFlow};
use indexmap::IndexMap;

/// `graph TD` with callers pointing at the target
pub fn impact_mermaid(diagram: &ImpactDiagram) -> String {
    let mut out = String::from("graph TD\n");
    let aliases = alias_map(diagram.nodes.iter().map(|n| n.id.as_str()), "n");

    for node in &diagram.nodes {
        let alias = &aliases[node.id.as_str()];
        let label = escape_label(&node.display_label);
        let shape = match node.role {
            DiagramRole::Target => format!("{}((\"{}\"))", alias, label),
            DiagramRole::Entry => format!("{}[/\"{}\"/]", alias, label),
            DiagramRole::Direct => format!("{}[\"{}\"]", alias, label),
        };
        out.push_str(&format!("    {}\n", shape));
    }
    for edge in &diagram.edges {
        if let (Some(from), Some(to)) = (aliases.get(edge.from.as_str()), aliases.get(edge.to.as_str())) {
            out.push_str(&format!("    {} --> {}\n", from, to));
        }
    }
    for node in diagram.nodes.iter().filter(|n| n.role == DiagramRole::Target) {
        out.push_str(&format!("    style {} stroke-width:3px\n", aliases[node.id.as_str()]));
    }
    out
}

/// `sequenceDiagram`; participants in first-appearance order
pub fn sequence_mermaid(flow: &SequenceFlow) -> String {
    let mut out = String::from("sequenceDiagram\n");
    let aliases = alias_map(flow.participants.iter().map(|p| p.id.as_str()), "p");

    for participant in &flow.participants {
        let keyword = if participant.id == "user" { "actor" } else { "participant" };
        out.push_str(&format!(
            "    {} {} as {}\n",
            keyword,
            aliases[participant.id.as_str()],
            mermaid_text(&format!("{} {}", participant.icon, participant.display_name))
        ));
    }
    for message in &flow.messages {
        let (Some(from), Some(to)) = (aliases.get(message.from.as_str()), aliases.get(message.to.as_str())) else {
            continue;
        };
        let arrow = match message.message_type {
            MessageType::Return => "-->>",
            MessageType::Async => "-)",
            MessageType::Sync => "->>",
        };
        out.push_str(&format!(
            "    {}{}{}: {}\n",
            from,
            arrow,
            to,
            mermaid_text(&message.display_label)
        ));
    }
    if flow.truncated {
        out.push_str("    Note over ");
        out.push_str(aliases.values().next().map(String::as_str).unwrap_or("p0"));
        out.push_str(": trace truncated\n");
    }
    out
}

/// `graph LR` from sources through transformations to destinations
pub fn data_flow_mermaid(visualization: &DataFlowVisualization) -> String {
    let mut out = String::from("graph LR\n");
    let aliases = alias_map(visualization.nodes.iter().map(|n| n.id.as_str()), "d");

    for node in &visualization.nodes {
        let alias = &aliases[node.id.as_str()];
        let label = escape_label(&node.display_label);
        let shape = match node.node_type {
            FlowNodeType::Target => format!("{}((\"{}\"))", alias, label),
            FlowNodeType::Source => format!("{}[(\"{}\")]", alias, label),
            FlowNodeType::Transform => format!("{}{{\"{}\"}}", alias, label),
            FlowNodeType::Destination => format!("{}[\"{}\"]", alias, label),
        };
        out.push_str(&format!("    {}\n", shape));
    }
    for edge in &visualization.edges {
        if let (Some(from), Some(to)) = (aliases.get(edge.from.as_str()), aliases.get(edge.to.as_str())) {
            if edge.label.is_empty() {
                out.push_str(&format!("    {} --> {}\n", from, to));
            } else {
                out.push_str(&format!("    {} -->|\"{}\"| {}\n", from, escape_label(&edge.label), to));
            }
        }
    }
    out
}

fn alias_map<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> IndexMap<&'a str, String> {
    let mut aliases = IndexMap::new();
    for id in ids {
        let next = aliases.len();
        aliases.entry(id).or_insert_with(|| format!("{}{}", prefix, next));
    }
    aliases
}

/// Sequence text is unquoted in Mermaid: `;` and `#` end or escape a statement
fn mermaid_text(text: &str) -> String {
    escape_label(text).replace(';', ",").replace('#', "＃")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_repeat_ids_once() {
        let aliases = alias_map(["a", "b", "a", "c"].into_iter(), "n");
        assert_eq!(aliases.len(), 3);
        assert_eq!(aliases["c"], "n2");
    }

    #[test]
    fn statement_breakers_are_replaced() {
        assert_eq!(mermaid_text("save; \"now\" #1"), "save, 'now' ＃1");
    }
}
