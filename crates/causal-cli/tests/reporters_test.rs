use std::fs;

use anyhow::Result;
use causal_cli::commands::graph::GraphSummary;
use causal_cli::render::{data_flow_mermaid, impact_mermaid, sequence_mermaid};
use causal_cli::reporters::{render, JsonReporter, MarkdownReporter, Report, TextReporter};
use causal_cli::OutputFormat;
use causal_core::data_flow::DataFlowQuery;
use causal_core::impact::{analyze_impact_by_name, DiagramEdge, DiagramNode, DiagramRole, ImpactDiagram};
use causal_core::models::SourceFile;
use causal_core::sequence::generate_sequence_from_handler;
use causal_core::service::SequenceData;
use causal_typescript::{analyze_data_flow, TypeScriptCallGraphBuilder};

fn files() -> Vec<SourceFile> {
    vec![
        SourceFile::new(
            "src/hooks/useAuth.ts",
            "export function useAuth() {\n  return signIn();\n}\nexport function signIn() {\n  return supabase.auth.signInWithPassword({});\n}\n",
        ),
        SourceFile::new(
            "src/app/login/page.tsx",
            "export default function LoginPage() {\n  const auth = useAuth();\n  const handleLogin = () => auth.signIn();\n  return <form onSubmit={handleLogin} />;\n}\n",
        ),
    ]
}

#[test]
fn impact_reports_in_every_format() -> Result<()> {
    colored::control::set_override(false);
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files());
    let analysis = analyze_impact_by_name(&graph, "useAuth", None, 5).expect("useAuth is in the graph");
    let report = Report::Impact(&analysis);

    let json: serde_json::Value = serde_json::from_str(&JsonReporter.render(&report)?)?;
    assert_eq!(json["kind"], "impact");
    assert_eq!(json["data"]["target"]["name"], "useAuth");

    let markdown = MarkdownReporter.render(&report);
    assert!(markdown.starts_with("# Impact Analysis: "));
    assert!(markdown.contains("## Impact Statistics"));
    assert!(markdown.contains("## Direct Callers"));
    assert!(markdown.contains("| LoginPage |"));
    assert!(markdown.contains("```mermaid\ngraph TD\n"));

    let text = TextReporter.render(&report);
    assert!(text.contains("Impact of useAuth"));
    assert!(text.contains("Risk: LOW"));
    assert!(text.contains("• LoginPage"));
    Ok(())
}

#[test]
fn markdown_report_file_is_written() -> Result<()> {
    let tmp_dir = tempfile::tempdir()?;
    let output_path = tmp_dir.path().join("graph.md");
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files());
    let summary = GraphSummary::from_graph(&graph);

    MarkdownReporter.generate(&Report::Graph(&summary), &output_path)?;
    let content = fs::read_to_string(&output_path)?;
    assert!(content.contains("## Build Statistics"));
    assert!(content.contains("- **Files Parsed**: 2"));
    assert!(content.contains("## Entry Points"));
    assert!(content.contains("LoginPage"));
    Ok(())
}

#[test]
fn impact_diagram_uses_positional_ids() {
    let diagram = ImpactDiagram {
        nodes: vec![
            DiagramNode {
                id: "src/a.ts#save@1".into(),
                label: "save".into(),
                display_label: "\"Save\" data".into(),
                role: DiagramRole::Target,
            },
            DiagramNode {
                id: "src/b.tsx#Form@3".into(),
                label: "Form".into(),
                display_label: "Form".into(),
                role: DiagramRole::Direct,
            },
        ],
        edges: vec![
            DiagramEdge {
                from: "src/b.tsx#Form@3".into(),
                to: "src/a.ts#save@1".into(),
            },
            DiagramEdge {
                from: "unknown".into(),
                to: "src/a.ts#save@1".into(),
            },
        ],
    };
    let mermaid = impact_mermaid(&diagram);
    assert_eq!(
        mermaid,
        "graph TD\n    n0((\"'Save' data\"))\n    n1[\"Form\"]\n    n1 --> n0\n    style n0 stroke-width:3px\n"
    );
}

#[test]
fn sequence_diagram_has_actor_and_messages() {
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files());
    let flow = generate_sequence_from_handler(&graph, "useAuth", 10).expect("trigger resolves");
    let mermaid = sequence_mermaid(&flow);

    assert!(mermaid.starts_with("sequenceDiagram\n    actor p0 as "));
    assert_eq!(
        mermaid
            .lines()
            .filter(|l| !l.contains("-->>") && (l.contains("->>") || l.contains("-)")))
            .count(),
        flow.messages
            .iter()
            .filter(|m| m.message_type != causal_core::sequence::MessageType::Return)
            .count()
    );
    assert!(!mermaid.contains('#'), "participant ids never leak into the diagram");
}

#[test]
fn data_flow_report_renders_story_and_diagram() -> Result<()> {
    colored::control::set_override(false);
    let source = "export function Profile() {\n  const name = localStorage.getItem('name');\n  console.log(name);\n  return <p>{name}</p>;\n}\n";
    let result = analyze_data_flow(source, "src/Profile.tsx", &DataFlowQuery::new("name", "src/Profile.tsx", 2));
    assert!(result.found);

    let mermaid = data_flow_mermaid(&result.visualization);
    assert!(mermaid.starts_with("graph LR\n"));
    assert!(mermaid.contains("-->"));

    let markdown = render(&Report::DataFlow(&result), OutputFormat::Markdown)?;
    assert!(markdown.contains("## Sources"));
    assert!(markdown.contains("## Destinations"));
    assert!(markdown.contains(&result.story.summary));

    let text = render(&Report::DataFlow(&result), OutputFormat::Text)?;
    assert!(text.contains("source"));
    assert!(text.contains("sink"));
    Ok(())
}

#[test]
fn sequence_markdown_lists_layers() -> Result<()> {
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files());
    let flow = generate_sequence_from_handler(&graph, "useAuth", 10).expect("trigger resolves");
    let data = SequenceData {
        diagram: causal_core::sequence::layer_groups(&flow),
        flow,
    };
    let markdown = render(&Report::Sequence(&data), OutputFormat::Markdown)?;
    assert!(markdown.contains("## Layers"));
    assert!(markdown.contains("## Messages\n\n1. "));
    Ok(())
}
