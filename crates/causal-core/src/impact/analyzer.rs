use crate::call_graph::{CallGraph, FunctionKind, FunctionNode};
use crate::features::map_to_user_features;
use crate::impact::reverse_dependency::FindCallersOptions;
use crate::impact::risk::{calculate_risk, RiskInput, RiskLevel};
use crate::labels::{escape_label, friendly_label, function_icon};
use crate::models::HttpMethod;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default hop bound for impact analysis
pub const DEFAULT_IMPACT_DEPTH: usize = 5;

const MAX_MESSAGE_ITEMS: usize = 5;
const MAX_DIAGRAM_CALLERS: usize = 10;
const MAX_AFFECTED_FUNCTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Function,
    Component,
    Hook,
    Module,
    Api,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTarget {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Direct,
    Indirect,
}

/// A caller affected by a change to the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactNode {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub file: String,
    pub line: usize,
    pub depth: usize,
    pub impact_level: ImpactLevel,
    /// Ids from the target to this caller
    pub call_path: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPointType {
    Page,
    Api,
    Event,
    Effect,
}

/// An entry point (page, route, event handler, effect) reached by the impact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPointImpact {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryPointType,
    pub file: String,
    pub severity: RiskLevel,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    pub severity: RiskLevel,
    pub affected_features_count: usize,
    pub affected_files_count: usize,
    pub affected_functions: Vec<String>,
    pub human_readable_message: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramRole {
    Target,
    Direct,
    Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub display_label: String,
    #[serde(rename = "type")]
    pub role: DiagramRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub from: String,
    pub to: String,
}

/// Target plus direct callers; indirect callers are left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactDiagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

/// Full impact report for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactAnalysis {
    pub target: ImpactTarget,
    pub direct_callers: Vec<ImpactNode>,
    pub indirect_callers: Vec<ImpactNode>,
    pub user_features: Vec<String>,
    pub risk_level: RiskLevel,
    pub summary: ImpactSummary,
    pub affected_entry_points: Vec<EntryPointImpact>,
    pub diagram: Option<ImpactDiagram>,
}

impl ImpactAnalysis {
    pub fn all_callers(&self) -> impl Iterator<Item = &ImpactNode> {
        self.direct_callers.iter().chain(self.indirect_callers.iter())
    }
}

/// Finds the function a human-given name refers to.
///
/// `file` narrows candidates to nodes whose path equals or ends with it.
/// Among several matches the first in graph order wins.
pub fn resolve_target<'g>(graph: &'g CallGraph, name: &str, file: Option<&str>) -> Option<&'g FunctionNode> {
    let file = file.filter(|f| !f.is_empty());
    let matches_file = |node: &FunctionNode| match file {
        Some(file) => node.file == file || node.file.ends_with(file) || file.ends_with(&node.file),
        None => true,
    };

    let exact = graph
        .functions_named(name)
        .into_iter()
        .find(|node| matches_file(*node));
    exact.or_else(|| {
        // `Class.method` may be asked for by its method name
        graph
            .function_nodes()
            .find(|node| node.local_name() == name && matches_file(*node))
    })
}

/// Impact analysis of the function named `name`; `None` when it is not in the graph
pub fn analyze_impact_by_name(
    graph: &CallGraph,
    name: &str,
    file: Option<&str>,
    max_depth: usize,
) -> Option<ImpactAnalysis> {
    let target = resolve_target(graph, name, file)?;
    analyze_impact(graph, &target.id, max_depth)
}

/// Impact analysis of the function with id `target_id`
pub fn analyze_impact(graph: &CallGraph, target_id: &str, max_depth: usize) -> Option<ImpactAnalysis> {
    let node = graph.get_function(target_id)?;
    let target = ImpactTarget {
        id: node.id.clone(),
        name: node.name.clone(),
        display_name: friendly_label(&node.name),
        target_type: classify_target(node),
        file: node.file.clone(),
        line: node.line,
    };

    let hits = graph
        .reverse_index()
        .find_callers(target_id, FindCallersOptions::with_max_depth(max_depth));

    let (direct_callers, indirect_callers): (Vec<ImpactNode>, Vec<ImpactNode>) = hits
        .into_iter()
        .filter_map(|hit| {
            let caller = graph.get_function(&hit.id)?;
            Some(ImpactNode {
                id: caller.id.clone(),
                name: caller.name.clone(),
                display_name: friendly_label(&caller.name),
                file: caller.file.clone(),
                line: caller.line,
                depth: hit.depth,
                impact_level: if hit.depth == 1 {
                    ImpactLevel::Direct
                } else {
                    ImpactLevel::Indirect
                },
                call_path: hit.path,
            })
        })
        .partition(|caller| caller.impact_level == ImpactLevel::Direct);

    if direct_callers.iter().chain(&indirect_callers).any(|c| c.depth == max_depth) {
        debug!(function = %target_id, max_depth, "Caller search reached depth bound");
    }

    let risk_level = calculate_risk(RiskInput {
        direct_count: direct_callers.len(),
        indirect_count: indirect_callers.len(),
    });

    let all_callers: Vec<&ImpactNode> = direct_callers.iter().chain(&indirect_callers).collect();
    let user_features = map_to_user_features(
        std::iter::once(target.file.as_str()).chain(all_callers.iter().map(|c| c.file.as_str())),
    );
    let affected_entry_points = find_affected_entry_points(graph, &all_callers);
    let affected_files: IndexSet<&str> = all_callers.iter().map(|c| c.file.as_str()).collect();

    let summary = ImpactSummary {
        severity: risk_level,
        affected_features_count: user_features.len(),
        affected_files_count: affected_files.len(),
        affected_functions: all_callers
            .iter()
            .take(MAX_AFFECTED_FUNCTIONS)
            .map(|c| c.display_name.clone())
            .collect(),
        human_readable_message: build_message(
            &target,
            !all_callers.is_empty(),
            &user_features,
            affected_files.len(),
        ),
        recommendations: recommendations(risk_level),
    };

    let diagram = Some(build_diagram(&target, &direct_callers, &affected_entry_points));

    Some(ImpactAnalysis {
        target,
        direct_callers,
        indirect_callers,
        user_features,
        risk_level,
        summary,
        affected_entry_points,
        diagram,
    })
}

fn classify_target(node: &FunctionNode) -> TargetType {
    match node.kind {
        FunctionKind::Component => TargetType::Component,
        FunctionKind::Hook => TargetType::Hook,
        _ if node.is_api_route
            || HttpMethod::is_handler_name(&node.name)
            || node.name.contains("route") =>
        {
            TargetType::Api
        }
        _ => TargetType::Function,
    }
}

/// Names shaped like entry points: event handlers, hooks, pages, route verbs
fn is_entry_point_like(name: &str) -> bool {
    let starts_with_upper_after = |prefix: &str| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_uppercase())
    };
    starts_with_upper_after("handle")
        || starts_with_upper_after("on")
        || starts_with_upper_after("use")
        || name.ends_with("Page")
        || name.ends_with("Handler")
        || HttpMethod::is_handler_name(name)
}

fn classify_entry_point(node: &FunctionNode) -> EntryPointType {
    let name = node.local_name();
    if name.ends_with("Page") || node.file.ends_with("/page.tsx") || node.file.ends_with("/page.jsx") {
        EntryPointType::Page
    } else if node.is_api_route || HttpMethod::is_handler_name(name) {
        EntryPointType::Api
    } else if node.kind == FunctionKind::Hook {
        EntryPointType::Effect
    } else {
        EntryPointType::Event
    }
}

fn find_affected_entry_points(graph: &CallGraph, callers: &[&ImpactNode]) -> Vec<EntryPointImpact> {
    let mut entry_points: Vec<EntryPointImpact> = callers
        .iter()
        .filter_map(|caller| {
            let node = graph.get_function(&caller.id)?;
            if !graph.is_entry_point(&caller.id) && !is_entry_point_like(node.local_name()) {
                return None;
            }
            let entry_type = classify_entry_point(node);
            let display_name = caller.display_name.clone();
            let description = match entry_type {
                EntryPointType::Page => format!("{} 페이지가 영향받음", display_name),
                EntryPointType::Api => format!("{} API가 영향받음", display_name),
                EntryPointType::Event => format!("{} 기능이 동작하지 않음", display_name),
                EntryPointType::Effect => format!("{} 기능에 영향", display_name),
            };
            Some(EntryPointImpact {
                id: caller.id.clone(),
                name: caller.name.clone(),
                display_name,
                entry_type,
                file: caller.file.clone(),
                severity: if caller.depth <= 2 {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                },
                description,
            })
        })
        .collect();

    // Stable sort keeps BFS order within one severity
    entry_points.sort_by(|a, b| b.severity.cmp(&a.severity));
    entry_points
}

fn build_message(target: &ImpactTarget, has_callers: bool, features: &[String], file_count: usize) -> String {
    let mut lines = vec![format!("{} {} 삭제 시:", function_icon(&target.name), target.display_name)];

    if !has_callers {
        lines.push("✓ 다른 기능에 영향 없음".to_string());
    } else {
        for feature in features.iter().take(MAX_MESSAGE_ITEMS) {
            lines.push(format!("✗ {} 기능에 영향", feature));
        }
        if features.len() > MAX_MESSAGE_ITEMS {
            lines.push(format!("... 그 외 {}개 기능", features.len() - MAX_MESSAGE_ITEMS));
        }
    }

    lines.push(format!("영향받는 기능: {}개, 파일: {}개", features.len(), file_count));
    lines.join("\n")
}

fn recommendations(severity: RiskLevel) -> Vec<String> {
    let items: &[&str] = match severity {
        RiskLevel::Low => &["이 함수는 안전하게 삭제할 수 있습니다."],
        RiskLevel::Medium => &[
            "삭제 전 영향받는 기능을 대체 구현하세요.",
            "관련 테스트를 먼저 업데이트하세요.",
        ],
        RiskLevel::High => &[
            "⚠️ 많은 기능에 영향을 미칩니다. 신중히 검토하세요.",
            "단계적으로 리팩토링하는 것을 권장합니다.",
            "영향받는 파일들의 테스트를 먼저 확인하세요.",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

fn build_diagram(target: &ImpactTarget, direct: &[ImpactNode], entry_points: &[EntryPointImpact]) -> ImpactDiagram {
    let mut nodes = vec![DiagramNode {
        id: target.id.clone(),
        label: escape_label(&target.name),
        display_label: escape_label(&target.display_name),
        role: DiagramRole::Target,
    }];
    let mut edges = Vec::new();

    for caller in direct.iter().take(MAX_DIAGRAM_CALLERS) {
        let is_entry = entry_points.iter().any(|e| e.id == caller.id);
        nodes.push(DiagramNode {
            id: caller.id.clone(),
            label: escape_label(&caller.name),
            display_label: escape_label(&caller.display_name),
            role: if is_entry {
                DiagramRole::Entry
            } else {
                DiagramRole::Direct
            },
        });
        edges.push(DiagramEdge {
            from: caller.id.clone(),
            to: target.id.clone(),
        });
    }

    ImpactDiagram { nodes, edges }
}
