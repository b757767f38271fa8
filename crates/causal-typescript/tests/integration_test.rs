use causal_core::call_graph::{CallKind, CallNode};
use causal_core::data_flow::{DataFlowQuery, DestinationKind, SourceKind};
use causal_core::impact::{analyze_impact_by_name, DEFAULT_IMPACT_DEPTH};
use causal_core::models::SourceFile;
use causal_core::sequence::{generate_sequence_from_handler, DEFAULT_SEQUENCE_DEPTH};
use causal_typescript::{analyze_data_flow_from_files, TypeScriptCallGraphBuilder};
use std::fs;
use tempfile::TempDir;

const CHECKOUT_APP: &[(&str, &str)] = &[
    (
        "src/app/api/orders/route.ts",
        r#"import { supabase } from '@/lib/supabase';

export async function POST(request: Request) {
  const body = await request.json();
  const { data, error } = await supabase.from('orders').insert(body).select();
  if (error) {
    return Response.json({ error: error.message }, { status: 500 });
  }
  return Response.json(data);
}
"#,
    ),
    (
        "src/lib/api.ts",
        r#"export async function createOrder(order: Order) {
  const res = await fetch('/api/orders', { method: 'POST', body: JSON.stringify(order) });
  return res.json();
}
"#,
    ),
    (
        "src/components/CheckoutButton.tsx",
        r#"import { createOrder } from '@/lib/api';

export function CheckoutButton({ cart }: Props) {
  const handleCheckout = async () => {
    const order = { items: cart.items };
    await createOrder(order);
  };
  return <button onClick={handleCheckout}>Checkout</button>;
}
"#,
    ),
    (
        "src/app/checkout/page.tsx",
        r#"import { CheckoutButton } from '@/components/CheckoutButton';

export default function CheckoutPage() {
  return <CheckoutButton cart={useCart()} />;
}
"#,
    ),
    ("src/components/CheckoutButton.test.tsx", "it('renders', () => {});\n"),
];

/// Writes the app into a temp dir and loads it back as a batch
fn load_app() -> (TempDir, Vec<SourceFile>) {
    let temp_dir = TempDir::new().unwrap();
    let mut files = Vec::new();
    for (path, content) in CHECKOUT_APP {
        let full = temp_dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, content).unwrap();
        files.push(SourceFile::new(*path, fs::read_to_string(&full).unwrap()));
    }
    (temp_dir, files)
}

#[test]
fn test_build_graph_for_checkout_app() {
    let (_dir, files) = load_app();
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files);

    let names: Vec<&str> = graph.function_nodes().map(|f| f.name.as_str()).collect();
    for expected in ["POST", "createOrder", "CheckoutButton", "handleCheckout", "CheckoutPage"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    assert_eq!(graph.stats().files_parsed, 4);
    assert_eq!(graph.count_edges(CallKind::ApiCall), 1);
    assert_eq!(graph.count_edges(CallKind::DbCall), 1);

    let db = graph.get_node("db:orders").expect("db resource node");
    assert!(matches!(db, CallNode::Db(_)));
    let post = graph.functions_named("POST")[0];
    assert!(post.is_api_route);
    assert!(post.has_supabase);
}

#[test]
fn test_impact_crosses_the_api_boundary() {
    let (_dir, files) = load_app();
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files);

    let analysis = analyze_impact_by_name(&graph, "createOrder", None, DEFAULT_IMPACT_DEPTH).unwrap();
    assert_eq!(analysis.direct_callers.len(), 1);
    assert_eq!(analysis.direct_callers[0].name, "handleCheckout");

    let analysis = analyze_impact_by_name(&graph, "POST", Some("api/orders/route.ts"), DEFAULT_IMPACT_DEPTH).unwrap();
    let indirect: Vec<&str> = analysis.indirect_callers.iter().map(|c| c.name.as_str()).collect();
    assert!(indirect.contains(&"createOrder"));
    assert!(indirect.contains(&"handleCheckout"));
}

#[test]
fn test_sequence_runs_from_click_to_database() {
    let (_dir, files) = load_app();
    let graph = TypeScriptCallGraphBuilder::new().build_graph(&files);

    let flow = generate_sequence_from_handler(&graph, "handleCheckout", DEFAULT_SEQUENCE_DEPTH).unwrap();
    assert!(flow.messages.iter().any(|m| m.to == "api:POST:/api/orders"));
    assert!(flow.messages.iter().any(|m| m.to == "db:orders"));
    assert!(flow.participants.iter().any(|p| p.id == "db:orders"));
    assert!(!flow.truncated);
}

#[test]
fn test_data_trace_across_batch() {
    let (_dir, files) = load_app();

    let query = DataFlowQuery::new("body", "src/app/api/orders/route.ts", 4);
    let result = analyze_data_flow_from_files(&files, &query);
    assert!(result.found);
    assert_eq!(result.sources[0].kind, SourceKind::ApiResponse);
    assert!(result
        .destinations
        .iter()
        .any(|d| d.kind == DestinationKind::Database && d.line == 5));

    let query = DataFlowQuery::new("order", "components/CheckoutButton.tsx", 5);
    let result = analyze_data_flow_from_files(&files, &query);
    assert!(result.found);
    assert!(result
        .transformations
        .iter()
        .any(|t| t.function_name == "createOrder" && t.line == 6));

    let query = DataFlowQuery::new("order", "src/lib/api.ts", 1);
    let result = analyze_data_flow_from_files(&files, &query);
    assert!(result
        .destinations
        .iter()
        .any(|d| d.kind == DestinationKind::ApiRequest && d.line == 2));
}
