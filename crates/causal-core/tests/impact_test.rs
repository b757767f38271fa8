use causal_core::cache::{cache_key, ResultCache, SledCache};
use causal_core::call_graph::{CallEdge, CallGraph, CallNode, FunctionKind, FunctionNode};
use causal_core::impact::{analyze_impact_by_name, ImpactAnalysis, RiskLevel, DEFAULT_IMPACT_DEPTH};
use causal_core::models::SourceFile;
use causal_core::sequence::{generate_sequence_from_handler, DEFAULT_SEQUENCE_DEPTH};

/// useAuth ← LoginPage, SignupPage, ProfilePage; LoginPage ← App; ProfilePage ← App, SettingsPage
fn auth_app_graph() -> CallGraph {
    let mut graph = CallGraph::new();
    let mut add = |name: &str, file: &str, kind: FunctionKind| {
        let node = FunctionNode::new(name, file, 1, kind);
        let id = node.id.clone();
        graph.add_node(CallNode::Function(node));
        id
    };
    let use_auth = add("useAuth", "src/hooks/useAuth.ts", FunctionKind::Hook);
    let login = add("LoginPage", "src/app/login/page.tsx", FunctionKind::Component);
    let signup = add("SignupPage", "src/app/signup/page.tsx", FunctionKind::Component);
    let profile = add("ProfilePage", "src/app/profile/page.tsx", FunctionKind::Component);
    let app = add("App", "src/App.tsx", FunctionKind::Component);
    let settings = add("SettingsPage", "src/app/settings/page.tsx", FunctionKind::Component);

    for (from, to) in [
        (&login, &use_auth),
        (&signup, &use_auth),
        (&profile, &use_auth),
        (&app, &login),
        (&app, &profile),
        (&settings, &profile),
    ] {
        graph.add_edge(CallEdge::function_call(from.as_str(), to.as_str(), 3));
    }
    graph
}

#[test]
fn impact_of_auth_hook_reaches_whole_app() {
    let graph = auth_app_graph();
    let analysis = analyze_impact_by_name(&graph, "useAuth", None, DEFAULT_IMPACT_DEPTH)
        .expect("useAuth should resolve");

    let direct: Vec<&str> = analysis.direct_callers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(direct, vec!["LoginPage", "SignupPage", "ProfilePage"]);
    let indirect: Vec<&str> = analysis.indirect_callers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(indirect, vec!["App", "SettingsPage"]);

    // 3 direct, 5 total
    assert_eq!(analysis.risk_level, RiskLevel::Medium);
    assert_eq!(analysis.summary.severity, analysis.risk_level);
    for feature in ["로그인", "회원가입", "프로필", "설정"] {
        assert!(analysis.user_features.iter().any(|f| f == feature), "missing {feature}");
    }
    assert!(analysis
        .summary
        .human_readable_message
        .lines()
        .any(|line| line.starts_with('✗')));
}

#[test]
fn impact_with_depth_one_only_sees_direct_callers() {
    let graph = auth_app_graph();
    let analysis = analyze_impact_by_name(&graph, "useAuth", Some("hooks/useAuth.ts"), 1).unwrap();
    assert_eq!(analysis.direct_callers.len(), 3);
    assert!(analysis.indirect_callers.is_empty());
}

#[test]
fn unknown_targets_are_reported_as_absent() {
    let graph = auth_app_graph();
    assert!(analyze_impact_by_name(&graph, "useMissing", None, DEFAULT_IMPACT_DEPTH).is_none());
    assert!(analyze_impact_by_name(&graph, "useAuth", Some("src/other.ts"), DEFAULT_IMPACT_DEPTH).is_none());
    assert!(generate_sequence_from_handler(&graph, "handleNothing", DEFAULT_SEQUENCE_DEPTH).is_none());
}

#[test]
fn cached_impact_round_trips_as_json() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let cache = SledCache::open(dir.path().join("cache"), None).expect("failed to open cache");
    let files = vec![SourceFile::new("src/hooks/useAuth.ts", "export function useAuth() {}")];
    let key = cache_key("impact", "acme/web", "main", "useAuth", &files);

    let graph = auth_app_graph();
    let analysis = analyze_impact_by_name(&graph, "useAuth", None, DEFAULT_IMPACT_DEPTH).unwrap();
    cache
        .put(&key, serde_json::to_vec(&analysis).unwrap())
        .expect("put should succeed");

    let bytes = cache.get(&key).unwrap().expect("entry should be present");
    let restored: ImpactAnalysis = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(restored, analysis);

    cache.save_graph(&key, &graph).unwrap();
    let graph = cache.load_graph(&key).unwrap().unwrap();
    assert_eq!(graph.edge_count(), 6);
}

#[test]
fn sequence_from_page_walks_down_to_the_hook() {
    let graph = auth_app_graph();
    let flow = generate_sequence_from_handler(&graph, "App", DEFAULT_SEQUENCE_DEPTH).unwrap();
    let targets: Vec<String> = flow
        .messages
        .iter()
        .map(|m| m.to.rsplit('#').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        targets,
        vec!["App@1", "LoginPage@1", "useAuth@1", "ProfilePage@1", "useAuth@1"]
    );
}
