use crate::extract::{extract, CallTarget, FileExtraction, RawCall};
use crate::parser::TypeScriptParser;
use causal_core::call_graph::{
    ApiEndpoint, BuildStats, CallEdge, CallGraph, CallKind, CallNode, DbResource, FunctionKind, FunctionNode,
};
use causal_core::models::{is_analyzable_path, HttpMethod, SourceFile};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

/// Builds a [`CallGraph`] from an in-memory batch of TypeScript/JavaScript files.
///
/// Files that fail to parse are skipped and listed in the graph's
/// [`BuildStats::skipped_files`]; one bad file never aborts the batch.
pub struct TypeScriptCallGraphBuilder {
    parser: TypeScriptParser,
    /// Enable verbose debug output
    verbose: bool,
}

impl Default for TypeScriptCallGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-file extraction, with the offset of its first function in the batch
struct ParsedFile {
    path: String,
    first: usize,
    calls: Vec<RawCall>,
}

impl TypeScriptCallGraphBuilder {
    pub fn new() -> Self {
        Self {
            parser: TypeScriptParser::new(),
            verbose: false,
        }
    }

    /// Sets the verbose flag for debug output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build_graph(&self, files: &[SourceFile]) -> CallGraph {
        let mut stats = BuildStats::default();
        let mut functions: Vec<FunctionNode> = Vec::new();
        let mut parsed_files: Vec<ParsedFile> = Vec::new();

        for file in files {
            if !is_analyzable_path(&file.path) {
                debug!(file = %file.path, "Skipping non-source file");
                continue;
            }
            let parsed = match self.parser.parse_source(&file.content, &file.path) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(file = %file.path, error = %err, "Failed to parse file, skipping");
                    stats.skipped_files.push(file.path.clone());
                    continue;
                }
            };
            stats.files_parsed += 1;

            let FileExtraction { entities, calls } = extract(&parsed);
            if self.verbose {
                debug!(
                    file = %file.path,
                    functions = entities.len(),
                    calls = calls.len(),
                    "Extracted file"
                );
            }

            let file_has_supabase = calls.iter().any(|c| matches!(c.target, CallTarget::Db { .. }));
            let first = functions.len();
            for entity in entities {
                let kind = FunctionKind::infer(&entity.name, entity.has_jsx, entity.is_method, entity.is_arrow);
                let mut node = FunctionNode::new(entity.name, file.path.as_str(), entity.line, kind);
                node.end_line = entity.end_line;
                node.is_exported = entity.is_exported;
                node.is_async = entity.is_async;
                node.is_api_route =
                    node.is_exported && HttpMethod::is_handler_name(&node.name) && is_route_file(&file.path);
                node.has_supabase = file_has_supabase;
                functions.push(node);
            }
            parsed_files.push(ParsedFile {
                path: file.path.clone(),
                first,
                calls,
            });
        }

        let mut graph = CallGraph::new();
        for function in &functions {
            graph.add_node(CallNode::Function(function.clone()));
        }
        // Same name on the same line collapses into one node
        stats.functions = graph.function_nodes().count();

        let resolver = NameResolver::new(&functions);
        for file in &parsed_files {
            for call in &file.calls {
                let caller = &functions[file.first + call.caller].id;
                match &call.target {
                    CallTarget::Named { name, member } => {
                        let targets = resolver.resolve(name, *member, &file.path);
                        if targets.is_empty() {
                            stats.unresolved_calls += 1;
                            if self.verbose {
                                debug!(file = %file.path, line = call.line, callee = %name, "Unresolved call");
                            }
                        }
                        for target in targets {
                            graph.add_edge(
                                CallEdge::function_call(caller.as_str(), functions[target].id.as_str(), call.line)
                                    .with_flags(call.is_async, call.is_conditional),
                            );
                        }
                    }
                    CallTarget::Api { method, path } => {
                        let endpoint = ApiEndpoint::new(*method, path.as_str());
                        let endpoint_id = endpoint.id.clone();
                        graph.add_node(CallNode::Api(endpoint));
                        graph.add_edge(
                            CallEdge::function_call(caller.as_str(), endpoint_id, call.line)
                                .with_kind(CallKind::ApiCall, Some(method.to_string()))
                                .with_flags(call.is_async, call.is_conditional),
                        );
                        stats.api_calls += 1;
                    }
                    CallTarget::Db { resource, operation } => {
                        let db = DbResource::new(resource.as_str());
                        let db_id = db.id.clone();
                        graph.add_node(CallNode::Db(db));
                        graph.add_edge(
                            CallEdge::function_call(caller.as_str(), db_id, call.line)
                                .with_kind(CallKind::DbCall, Some(operation.clone()))
                                .with_flags(call.is_async, call.is_conditional),
                        );
                        stats.db_calls += 1;
                    }
                    CallTarget::Dynamic => stats.dynamic_calls += 1,
                }
            }
        }

        link_route_handlers(&mut graph, &functions);

        stats.edges = graph.edge_count();
        info!(
            files = stats.files_parsed,
            skipped = stats.skipped_files.len(),
            functions = stats.functions,
            edges = stats.edges,
            api_calls = stats.api_calls,
            db_calls = stats.db_calls,
            unresolved = stats.unresolved_calls,
            "Call graph built"
        );
        *graph.stats_mut() = stats;
        graph
    }
}

/// Builds a graph with default settings
pub fn build_call_graph(files: &[SourceFile]) -> CallGraph {
    TypeScriptCallGraphBuilder::new().build_graph(files)
}

/// `route.ts`-style file under an `api/` directory
pub fn is_route_file(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    let file_name = normalized.rsplit('/').next().unwrap_or(&normalized);
    (normalized.starts_with("api/") || normalized.contains("/api/")) && file_name.starts_with("route.")
}

/// Matches `file` against the route file `route` (as produced by
/// [`ApiEndpoint::route_file`]), ignoring the `src/` prefix and the extension.
///
/// Dynamic directories (`[id]`, `[...slug]`, `[[...slug]]`) accept any
/// segment. Returns how many of them the match needed.
fn route_match(file: &str, route: &str) -> Option<usize> {
    let key = route.trim_start_matches("src/").trim_end_matches(".ts");
    let wanted: Vec<&str> = key.split('/').collect();
    let normalized = file.replace('\\', "/");
    let stem = normalized.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&normalized);
    let segments: Vec<&str> = stem.split('/').collect();

    (0..segments.len())
        .filter(|&i| segments[i] == wanted[0])
        .find_map(|i| match_segments(&segments[i..], &wanted))
}

fn match_segments(dirs: &[&str], wanted: &[&str]) -> Option<usize> {
    let (dir, dirs_rest) = match dirs.split_first() {
        Some(split) => split,
        None => return wanted.is_empty().then_some(0),
    };
    if dir.starts_with("[[...") && dirs_rest == ["route"] {
        // Optional catch-all, may take no segment at all
        return (!wanted.is_empty() && wanted.last() == Some(&"route")).then_some(1);
    }
    let (want, wanted_rest) = wanted.split_first()?;
    if dir.starts_with("[...") && dirs_rest == ["route"] {
        return (wanted.len() >= 2 && wanted.last() == Some(&"route")).then_some(1);
    }
    if dir == want {
        return match_segments(dirs_rest, wanted_rest);
    }
    if dir.starts_with('[') && dir.ends_with(']') && *want != "route" {
        return match_segments(dirs_rest, wanted_rest).map(|dynamic| dynamic + 1);
    }
    None
}

/// Connects each API endpoint node to the handler exported by its route file.
///
/// A static directory wins over a dynamic one, the way the app router picks.
fn link_route_handlers(graph: &mut CallGraph, functions: &[FunctionNode]) {
    let endpoints: Vec<ApiEndpoint> = graph
        .nodes()
        .filter_map(|node| match node {
            CallNode::Api(endpoint) => Some(endpoint.clone()),
            _ => None,
        })
        .collect();
    for endpoint in endpoints {
        let Some(route) = endpoint.route_file() else {
            continue;
        };
        let matches: Vec<(&FunctionNode, usize)> = functions
            .iter()
            .filter(|f| f.is_api_route && f.name == endpoint.method.as_str())
            .filter_map(|f| route_match(&f.file, &route).map(|dynamic| (f, dynamic)))
            .collect();
        let Some(best) = matches.iter().map(|(_, dynamic)| *dynamic).min() else {
            continue;
        };
        for (handler, _) in matches.into_iter().filter(|(_, dynamic)| *dynamic == best) {
            debug!(endpoint = %endpoint.id, handler = %handler.id, "Linked endpoint to route handler");
            graph.add_edge(CallEdge::function_call(endpoint.id.as_str(), handler.id.as_str(), handler.line));
        }
    }
}

/// Name lookup over the batch: a match in the calling file wins, otherwise
/// every match elsewhere
struct NameResolver<'a> {
    functions: &'a [FunctionNode],
    by_name: IndexMap<&'a str, Vec<usize>>,
    by_method: IndexMap<&'a str, Vec<usize>>,
}

impl<'a> NameResolver<'a> {
    fn new(functions: &'a [FunctionNode]) -> Self {
        let mut by_name: IndexMap<&str, Vec<usize>> = IndexMap::new();
        let mut by_method: IndexMap<&str, Vec<usize>> = IndexMap::new();
        for (idx, function) in functions.iter().enumerate() {
            by_name.entry(function.name.as_str()).or_default().push(idx);
            if function.name.contains('.') {
                by_method.entry(function.local_name()).or_default().push(idx);
            }
        }
        Self {
            functions,
            by_name,
            by_method,
        }
    }

    fn resolve(&self, name: &str, member: bool, file: &str) -> Vec<usize> {
        let mut candidates: Vec<usize> = self.by_name.get(name).cloned().unwrap_or_default();
        if member {
            if let Some(methods) = self.by_method.get(name) {
                for idx in methods.iter().copied() {
                    if !candidates.contains(&idx) {
                        candidates.push(idx);
                    }
                }
            }
        }

        if let Some(local) = candidates.iter().find(|idx| self.functions[**idx].file == file) {
            return vec![*local];
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges_of(graph: &CallGraph, id: &str) -> Vec<String> {
        graph.outgoing_edges(id).iter().map(|e| e.to.clone()).collect()
    }

    #[test]
    fn resolves_same_file_before_exports() {
        let files = vec![
            SourceFile::new("src/a.ts", "function format() {}\nexport function run() { format(); }"),
            SourceFile::new("src/b.ts", "export function format() {}"),
        ];
        let graph = build_call_graph(&files);
        assert_eq!(edges_of(&graph, "src/a.ts#run@2"), vec!["src/a.ts#format@1"]);
    }

    #[test]
    fn cross_file_calls_fan_out_to_every_candidate() {
        let files = vec![
            SourceFile::new("src/a.ts", "export function format() {}"),
            SourceFile::new("src/b.ts", "function format() {}"),
            SourceFile::new("src/main.ts", "export function main() { format(); missing(); other.missing(); }"),
        ];
        let graph = build_call_graph(&files);
        assert_eq!(
            edges_of(&graph, "src/main.ts#main@1"),
            vec!["src/a.ts#format@1", "src/b.ts#format@1"]
        );
        assert_eq!(graph.stats().unresolved_calls, 2);
    }

    #[test]
    fn function_count_matches_graph_nodes() {
        let files = vec![SourceFile::new(
            "src/flags.ts",
            "if (ready) { function start() {} } else { function start() {} }\nexport function stop() {}\n",
        )];
        let graph = build_call_graph(&files);
        assert!(graph.contains("src/flags.ts#start@1"));
        assert_eq!(graph.function_nodes().count(), 2);
        assert_eq!(graph.stats().functions, 2);
    }

    #[test]
    fn records_parse_failures_and_continues() {
        let files = vec![
            SourceFile::new("src/broken.ts", "export function (("),
            SourceFile::new("src/ok.ts", "export function ok() {}"),
            SourceFile::new("README.md", "# docs"),
        ];
        let graph = build_call_graph(&files);
        assert_eq!(graph.stats().skipped_files, vec!["src/broken.ts".to_string()]);
        assert_eq!(graph.stats().files_parsed, 1);
        assert!(graph.contains("src/ok.ts#ok@1"));
    }

    #[test]
    fn api_calls_reach_route_handlers() {
        let files = vec![
            SourceFile::new(
                "src/components/LoginForm.tsx",
                "export function LoginForm() {\n  const handleSubmit = async () => {\n    await fetch('/api/login', { method: 'POST' });\n  };\n  return <form onSubmit={handleSubmit} />;\n}\n",
            ),
            SourceFile::new(
                "src/app/api/login/route.ts",
                "export async function POST(req) {\n  await supabase.from('users').select('*');\n}\n",
            ),
        ];
        let graph = build_call_graph(&files);
        let handler = graph.get_function("src/app/api/login/route.ts#POST@1").unwrap();
        assert!(handler.is_api_route);
        assert!(handler.has_supabase);
        assert_eq!(handler.kind, FunctionKind::Handler);

        assert_eq!(
            edges_of(&graph, "src/components/LoginForm.tsx#handleSubmit@2"),
            vec!["api:POST:/api/login"]
        );
        assert_eq!(
            edges_of(&graph, "api:POST:/api/login"),
            vec!["src/app/api/login/route.ts#POST@1"]
        );
        assert_eq!(edges_of(&graph, handler.id.as_str()), vec!["db:users"]);

        let stats = graph.stats();
        assert_eq!((stats.api_calls, stats.db_calls), (1, 1));
        assert_eq!(graph.count_edges(CallKind::ApiCall), 1);
    }

    #[test]
    fn method_calls_resolve_through_class_names() {
        let files = vec![
            SourceFile::new(
                "src/services/auth.ts",
                "export class AuthService {\n  login() { this.persist(); }\n  persist() {}\n}\n",
            ),
            SourceFile::new("src/app.ts", "export function boot(service) { service.login(); }"),
        ];
        let graph = build_call_graph(&files);
        assert_eq!(
            edges_of(&graph, "src/services/auth.ts#AuthService.login@2"),
            vec!["src/services/auth.ts#AuthService.persist@3"]
        );
        assert_eq!(
            edges_of(&graph, "src/app.ts#boot@1"),
            vec!["src/services/auth.ts#AuthService.login@2"]
        );
    }

    #[test]
    fn route_file_detection() {
        assert!(is_route_file("src/app/api/users/route.ts"));
        assert!(is_route_file("app/api/users/[id]/route.js"));
        assert!(!is_route_file("src/app/users/route.ts"));
        assert_eq!(route_match("app/api/users/route.js", "src/app/api/users/route.ts"), Some(0));
        assert_eq!(route_match("src/app/api/users/admin/route.ts", "src/app/api/admin/route.ts"), None);
    }

    #[test]
    fn dynamic_route_directories_match_any_segment() {
        let route = "src/app/api/users/:param/route.ts";
        assert_eq!(route_match("src/app/api/users/[id]/route.ts", route), Some(1));
        assert_eq!(route_match("src/app/api/users/[...slug]/route.ts", route), Some(1));
        assert_eq!(route_match("src/app/api/users/route.ts", route), None);
        assert_eq!(route_match("src/app/api/users/[id]/route.ts", "src/app/api/users/route.ts"), None);
        assert_eq!(
            route_match("src/app/api/users/[[...slug]]/route.ts", "src/app/api/users/route.ts"),
            Some(1)
        );
        assert_eq!(
            route_match("src/app/api/files/[...path]/route.ts", "src/app/api/files/a/b/route.ts"),
            Some(1)
        );
    }

    #[test]
    fn template_fetch_links_to_dynamic_route_handler() {
        let files = vec![
            SourceFile::new(
                "src/lib/users.ts",
                "export async function loadUser(id: string) {\n  return fetch(`/api/users/${id}`);\n}\nexport async function loadMe() {\n  return fetch('/api/users/me');\n}\n",
            ),
            SourceFile::new("src/app/api/users/[id]/route.ts", "export async function GET(req) {}\n"),
            SourceFile::new("src/app/api/users/me/route.ts", "export async function GET(req) {}\n"),
        ];
        let graph = build_call_graph(&files);
        assert_eq!(
            edges_of(&graph, "api:GET:/api/users/:param"),
            vec!["src/app/api/users/[id]/route.ts#GET@1"]
        );
        assert_eq!(
            edges_of(&graph, "api:GET:/api/users/me"),
            vec!["src/app/api/users/me/route.ts#GET@1"]
        );
    }
}
