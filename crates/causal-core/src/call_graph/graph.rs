use crate::call_graph::{ApiEndpoint, CallEdge, CallKind, CallNode, DbResource, FunctionKind, FunctionNode};
use crate::error::{CausalError, CausalResult};
use crate::impact::reverse_dependency::{build_reverse_dependency_graph, ReverseDependencyGraph};
use indexmap::IndexMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction, Graph};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Counters collected while building a graph from a file batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
    pub files_parsed: usize,
    pub skipped_files: Vec<String>,
    pub functions: usize,
    pub edges: usize,
    pub api_calls: usize,
    pub db_calls: usize,
    /// Computed callees (`obj[key]()`) resolved to the `<dynamic>` sentinel
    pub dynamic_calls: usize,
    /// Callee names matching no entity in the batch
    pub unresolved_calls: usize,
}

/// Call graph over one analysed batch.
///
/// Node ids are indexed for O(1) lookup, edges keep insertion order so every
/// traversal is deterministic. The reverse dependency index is built on first
/// use and dropped whenever an edge is added.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    graph: Graph<CallNode, CallEdge, Directed, u32>,
    index: IndexMap<String, NodeIndex<u32>>,
    names: IndexMap<String, Vec<NodeIndex<u32>>>,
    reverse: OnceLock<ReverseDependencyGraph>,
    stats: BuildStats,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, returning the existing index when the id is already present
    pub fn add_node(&mut self, node: CallNode) -> NodeIndex<u32> {
        if let Some(idx) = self.index.get(node.id()) {
            return *idx;
        }
        let id = node.id().to_string();
        let name = match &node {
            CallNode::Function(f) => Some(f.name.clone()),
            _ => None,
        };
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        if let Some(name) = name {
            self.names.entry(name).or_default().push(idx);
        }
        idx
    }

    /// Adds an edge between two known nodes. Returns `false` if either end is missing.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(&edge.from), self.index.get(&edge.to)) else {
            return false;
        };
        self.graph.add_edge(from, to, edge);
        self.reverse = OnceLock::new();
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_node(&self, id: &str) -> Option<&CallNode> {
        self.index
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn get_function(&self, id: &str) -> Option<&FunctionNode> {
        self.get_node(id).and_then(CallNode::as_function)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &CallNode> {
        self.graph.node_indices().filter_map(|idx| self.graph.node_weight(idx))
    }

    pub fn function_nodes(&self) -> impl Iterator<Item = &FunctionNode> {
        self.nodes().filter_map(CallNode::as_function)
    }

    pub fn api_nodes(&self) -> impl Iterator<Item = &ApiEndpoint> {
        self.nodes().filter_map(|node| match node {
            CallNode::Api(api) => Some(api),
            _ => None,
        })
    }

    pub fn db_nodes(&self) -> impl Iterator<Item = &DbResource> {
        self.nodes().filter_map(|node| match node {
            CallNode::Db(db) => Some(db),
            _ => None,
        })
    }

    /// Functions declared under `name`, in insertion order
    pub fn functions_named(&self, name: &str) -> Vec<&FunctionNode> {
        self.names
            .get(name)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|idx| self.graph.node_weight(*idx))
                    .filter_map(CallNode::as_function)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &CallEdge> {
        self.graph.edge_weights()
    }

    fn sorted_edges(&self, id: &str, direction: Direction) -> Vec<&CallEdge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(EdgeIndex<u32>, &CallEdge)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| (e.id(), e.weight()))
            .collect();
        edges.sort_by_key(|(edge_idx, _)| *edge_idx);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    /// Edges leaving `id`, in the order the call sites were recorded
    pub fn outgoing_edges(&self, id: &str) -> Vec<&CallEdge> {
        self.sorted_edges(id, Direction::Outgoing)
    }

    /// Edges entering `id`, in the order they were recorded
    pub fn incoming_edges(&self, id: &str) -> Vec<&CallEdge> {
        self.sorted_edges(id, Direction::Incoming)
    }

    /// Function ids with no inbound edge, plus route handlers.
    ///
    /// Computed from the current edge set on every call.
    pub fn entry_points(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .filter_map(|idx| {
                let function = self.graph.node_weight(idx)?.as_function()?;
                let no_callers = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none();
                let is_handler = function.is_api_route || function.kind == FunctionKind::Handler;
                (no_callers || is_handler).then(|| function.id.clone())
            })
            .collect()
    }

    pub fn is_entry_point(&self, id: &str) -> bool {
        let Some(&idx) = self.index.get(id) else {
            return false;
        };
        match self.graph.node_weight(idx) {
            Some(CallNode::Function(f)) => {
                f.is_api_route
                    || f.kind == FunctionKind::Handler
                    || self
                        .graph
                        .neighbors_directed(idx, Direction::Incoming)
                        .next()
                        .is_none()
            }
            _ => false,
        }
    }

    /// Inverted adjacency, built on first use
    pub fn reverse_index(&self) -> &ReverseDependencyGraph {
        self.reverse.get_or_init(|| {
            build_reverse_dependency_graph(self.edges().map(|e| (e.from.as_str(), e.to.as_str())))
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn count_edges(&self, kind: CallKind) -> usize {
        self.edges().filter(|e| e.kind == kind).count()
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut BuildStats {
        &mut self.stats
    }

    /// Flattens the graph into a serializable snapshot
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
            stats: self.stats.clone(),
        }
    }

    /// Restores a graph, failing if an edge references a node the snapshot lacks
    pub fn from_snapshot(snapshot: GraphSnapshot) -> CausalResult<Self> {
        let mut graph = CallGraph::new();
        for node in snapshot.nodes {
            graph.add_node(node);
        }
        for edge in snapshot.edges {
            let (from, to) = (edge.from.clone(), edge.to.clone());
            if !graph.add_edge(edge) {
                return Err(CausalError::Cache(format!(
                    "Corrupted cache: missing node while restoring edge ({} -> {})",
                    from, to
                )));
            }
        }
        graph.stats = snapshot.stats;
        Ok(graph)
    }
}

/// Serializable form of a [`CallGraph`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<CallNode>,
    pub edges: Vec<CallEdge>,
    pub stats: BuildStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn function(name: &str, line: usize) -> CallNode {
        CallNode::Function(FunctionNode::new(name, "src/app.ts", line, FunctionKind::Function))
    }

    fn id(name: &str, line: usize) -> String {
        FunctionNode::make_id("src/app.ts", name, line)
    }

    fn sample() -> CallGraph {
        let mut graph = CallGraph::new();
        graph.add_node(function("main", 1));
        graph.add_node(function("load", 5));
        graph.add_node(function("render", 9));
        graph.add_node(CallNode::Api(ApiEndpoint::new(HttpMethod::Get, "/api/items")));
        graph.add_edge(CallEdge::function_call(id("main", 1), id("load", 5), 2));
        graph.add_edge(CallEdge::function_call(id("main", 1), id("render", 9), 3));
        graph.add_edge(
            CallEdge::function_call(id("load", 5), "api:GET:/api/items", 6)
                .with_kind(CallKind::ApiCall, Some("GET".into())),
        );
        graph
    }

    #[test]
    fn outgoing_edges_keep_call_site_order() {
        let graph = sample();
        let targets: Vec<&str> = graph
            .outgoing_edges(&id("main", 1))
            .iter()
            .map(|e| e.to.as_str())
            .collect();
        assert_eq!(targets, vec![id("load", 5), id("render", 9)]);
        assert!(graph.outgoing_edges("missing").is_empty());
    }

    #[test]
    fn entry_points_are_functions_without_callers() {
        let mut graph = sample();
        assert_eq!(graph.entry_points(), vec![id("main", 1)]);

        let mut handler = FunctionNode::new("GET", "src/app/api/items/route.ts", 1, FunctionKind::Handler);
        handler.is_api_route = true;
        let handler_id = handler.id.clone();
        graph.add_node(CallNode::Function(handler));
        graph.add_edge(CallEdge::function_call(id("render", 9), handler_id.clone(), 10));
        assert!(graph.entry_points().contains(&handler_id));
        assert!(graph.is_entry_point(&handler_id));
    }

    #[test]
    fn edge_to_unknown_node_is_rejected() {
        let mut graph = sample();
        assert!(!graph.add_edge(CallEdge::function_call(id("main", 1), "nowhere", 4)));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn reverse_index_is_rebuilt_after_new_edges() {
        let mut graph = sample();
        assert_eq!(graph.reverse_index().callers_of(&id("render", 9)), vec![id("main", 1)]);

        graph.add_edge(CallEdge::function_call(id("load", 5), id("render", 9), 7));
        assert_eq!(
            graph.reverse_index().callers_of(&id("render", 9)),
            vec![id("main", 1), id("load", 5)]
        );
    }

    #[test]
    fn resource_nodes_are_listed_by_kind() {
        let mut graph = sample();
        graph.add_node(CallNode::Db(DbResource::new("items")));
        let apis: Vec<&str> = graph.api_nodes().map(|a| a.id.as_str()).collect();
        assert_eq!(apis, vec!["api:GET:/api/items"]);
        assert_eq!(graph.db_nodes().count(), 1);
        assert_eq!(graph.function_nodes().count(), 3);
    }

    #[test]
    fn duplicate_node_ids_collapse() {
        let mut graph = CallGraph::new();
        let a = graph.add_node(CallNode::Db(DbResource::new("users")));
        let b = graph.add_node(CallNode::Db(DbResource::new("users")));
        assert_eq!(a, b);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn snapshot_round_trip_preserves_structure() {
        let graph = sample();
        let restored = CallGraph::from_snapshot(graph.to_snapshot()).unwrap();
        assert_eq!(restored.node_count(), 4);
        assert_eq!(restored.count_edges(CallKind::ApiCall), 1);
        assert_eq!(restored.functions_named("load").len(), 1);
    }
}
