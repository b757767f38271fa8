use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use causal_cli::commands::{
    execute_features, execute_graph, execute_impact, execute_sequence, execute_trace, CommandContext,
};
use causal_cli::config::Config;
use causal_cli::OutputFormat;
use causal_core::data_flow::FlowDirection;

const APP: &[(&str, &str)] = &[
    (
        "src/lib/auth.ts",
        "export async function login(email: string) {\n  const res = await fetch('/api/login', { method: 'POST', body: JSON.stringify({ email }) });\n  return res.json();\n}\n",
    ),
    (
        "src/app/login/page.tsx",
        "import { login } from '@/lib/auth';\nexport default function LoginPage() {\n  const handleLogin = async () => { await login('a@b.c'); };\n  return <button onClick={handleLogin}>Login</button>;\n}\n",
    ),
    (
        "src/app/api/login/route.ts",
        "export async function POST(request: Request) {\n  const body = await request.json();\n  await supabase.from('sessions').insert(body);\n  return Response.json({ ok: true });\n}\n",
    ),
    ("node_modules/lib/index.js", "export function login() {}\n"),
];

fn write_app() -> Result<tempfile::TempDir> {
    let tmp_dir = tempfile::tempdir()?;
    for (relative, content) in APP {
        let path = tmp_dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(path, content)?;
    }
    Ok(tmp_dir)
}

fn context(root: &Path, format: OutputFormat, output: PathBuf) -> CommandContext {
    CommandContext::new(Config::default(), Some(root.to_path_buf()), Some(format), Some(output), false)
        .with_progress(false)
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[test]
fn impact_report_as_json() -> Result<()> {
    let app = write_app()?;
    let out = app.path().join("out/impact.json");
    execute_impact(&context(app.path(), OutputFormat::Json, out.clone()), "login", None, None)?;

    let json = read_json(&out)?;
    assert_eq!(json["kind"], "impact");
    assert!(json.get("timestamp").is_some());
    let data = &json["data"];
    assert_eq!(data["target"]["file"], "src/lib/auth.ts", "node_modules copy is never loaded");
    assert_eq!(data["directCallers"][0]["name"], "handleLogin");
    assert_eq!(data["riskLevel"], "low");
    Ok(())
}

#[test]
fn unknown_function_fails_with_not_found() -> Result<()> {
    let app = write_app()?;
    let out = app.path().join("impact.json");
    let err = execute_impact(&context(app.path(), OutputFormat::Json, out.clone()), "logout", None, None)
        .unwrap_err();
    assert!(err.to_string().contains("404"), "{}", err);
    assert!(!out.exists());
    Ok(())
}

#[test]
fn sequence_report_as_markdown() -> Result<()> {
    let app = write_app()?;
    let out = app.path().join("sequence.md");
    execute_sequence(&context(app.path(), OutputFormat::Markdown, out.clone()), "handleLogin", None)?;

    let content = fs::read_to_string(&out)?;
    assert!(content.contains("# Sequence Flow"));
    assert!(content.contains("## Analysis Date"));
    assert!(content.contains("```mermaid\nsequenceDiagram\n"));
    assert!(content.contains("## Layers"));
    Ok(())
}

#[test]
fn trace_report_as_json() -> Result<()> {
    let app = write_app()?;
    let out = app.path().join("trace.json");
    let ctx = context(app.path(), OutputFormat::Json, out.clone());
    execute_trace(&ctx, "body", "src/app/api/login/route.ts", 2, FlowDirection::Both)?;

    let json = read_json(&out)?;
    let data = &json["data"];
    assert_eq!(data["found"], true);
    assert_eq!(data["sources"][0]["type"], "api-response");
    assert!(data["destinations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d["type"] == "database"));

    execute_trace(&ctx, "missing", "src/app/api/login/route.ts", 2, FlowDirection::Both)?;
    let json = read_json(&out)?;
    assert_eq!(json["data"]["found"], false);
    Ok(())
}

#[test]
fn graph_summary_as_json() -> Result<()> {
    let app = write_app()?;
    let out = app.path().join("graph.json");
    execute_graph(&context(app.path(), OutputFormat::Json, out.clone()))?;

    let data = read_json(&out)?["data"].clone();
    assert_eq!(data["stats"]["filesParsed"], 3);
    assert_eq!(data["apiEndpoints"][0], "POST /api/login");
    assert_eq!(data["dbResources"][0], "sessions");
    let entries: Vec<&str> = data["entryPoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["name"].as_str())
        .collect();
    assert!(entries.contains(&"LoginPage"));
    Ok(())
}

#[test]
fn cached_runs_give_the_same_report() -> Result<()> {
    let app = write_app()?;
    let mut config = Config::default();
    config.cache.enabled = true;
    config.cache.dir = app.path().join(".cache");

    let first = app.path().join("first.json");
    let second = app.path().join("second.json");
    for out in [&first, &second] {
        let ctx = CommandContext::new(
            config.clone(),
            Some(app.path().join("src")),
            Some(OutputFormat::Json),
            Some(out.clone()),
            false,
        )
        .with_progress(false);
        execute_impact(&ctx, "login", None, Some(3))?;
    }

    assert_eq!(read_json(&first)?["data"], read_json(&second)?["data"]);
    assert!(app.path().join(".cache").exists());
    Ok(())
}

#[test]
fn features_report_as_markdown() -> Result<()> {
    let tmp_dir = tempfile::tempdir()?;
    let out = tmp_dir.path().join("features.md");
    let paths = vec!["src/hooks/useAuth.ts".to_string(), "src/lib/utils.ts".to_string()];
    execute_features(&paths, OutputFormat::Markdown, Some(&out))?;

    let content = fs::read_to_string(&out)?;
    assert!(content.contains("# Feature Map"));
    assert!(content.contains("로그인"));
    assert!(content.contains("| `src/lib/utils.ts` | - |"));
    Ok(())
}
