use super::CommandContext;
use crate::reporters::Report;
use anyhow::Result;
use causal_core::call_graph::{BuildStats, CallGraph};
use serde::Serialize;

/// Build statistics plus the graph's endpoints, resources and entry points
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub stats: BuildStats,
    /// `METHOD path`
    pub api_endpoints: Vec<String>,
    pub db_resources: Vec<String>,
    pub entry_points: Vec<EntryPointSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryPointSummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub file: String,
    pub line: usize,
}

impl GraphSummary {
    pub fn from_graph(graph: &CallGraph) -> Self {
        let entry_points = graph
            .entry_points()
            .iter()
            .filter_map(|id| graph.get_function(id))
            .map(|function| EntryPointSummary {
                id: function.id.clone(),
                name: function.name.clone(),
                kind: function.kind.as_str().to_string(),
                file: function.file.clone(),
                line: function.line,
            })
            .collect();
        Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            stats: graph.stats().clone(),
            api_endpoints: graph
                .api_nodes()
                .map(|api| format!("{} {}", api.method, api.path))
                .collect(),
            db_resources: graph.db_nodes().map(|db| db.resource.clone()).collect(),
            entry_points,
        }
    }
}

/// Prints build statistics and entry points of the batch's call graph
pub fn execute_graph(ctx: &CommandContext) -> Result<()> {
    let files = ctx.load_files()?;
    let graph = ctx.engine().build_graph(&files);
    let summary = GraphSummary::from_graph(&graph);
    ctx.emit(&Report::Graph(&summary))
}
