//! Ordered call traces ("what happens when X fires").
//!
//! The walk is a depth-first execution trace, not a deduplicated DAG: a node
//! reached along two different paths shows up twice, while a node already on
//! the current path is never re-entered.

use crate::call_graph::{CallEdge, CallGraph, CallKind, CallNode, FunctionNode};
use crate::labels::{friendly_label, function_icon};
use crate::layers::{classify_node, Layer};
use crate::models::HttpMethod;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default hop bound for sequence flows
pub const DEFAULT_SEQUENCE_DEPTH: usize = 10;

/// Hard cap on recorded messages, independent of depth
pub const MAX_MESSAGES: usize = 500;

const USER_PARTICIPANT_ID: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceParticipant {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub layer: Layer,
    pub icon: String,
    pub file: Option<String>,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sync,
    Async,
    Return,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceMessage {
    pub id: String,
    pub order: usize,
    pub from: String,
    pub to: String,
    pub label: String,
    pub display_label: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub is_async: bool,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Click,
    Submit,
    Load,
    Api,
    Effect,
    Timer,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTrigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    pub element: Option<String>,
    pub handler: String,
    pub display_label: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeType {
    Success,
    Error,
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOutcome {
    #[serde(rename = "type")]
    pub outcome_type: OutcomeType,
    pub label: String,
    pub display_label: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceFlow {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub trigger: FlowTrigger,
    pub participants: Vec<SequenceParticipant>,
    pub messages: Vec<SequenceMessage>,
    pub outcomes: Vec<FlowOutcome>,
    /// The message cap cut the trace short
    pub truncated: bool,
}

enum Frame<'g> {
    Visit { id: &'g str, depth: usize },
    Call { edge: &'g CallEdge, depth: usize },
    Return { from: &'g str, to: &'g str },
    Leave { id: &'g str },
}

struct Trace<'g> {
    graph: &'g CallGraph,
    participants: IndexMap<String, SequenceParticipant>,
    messages: Vec<SequenceMessage>,
}

impl<'g> Trace<'g> {
    fn next_order(&self) -> usize {
        self.messages.len()
    }

    fn ensure_participant(&mut self, node: &CallNode) {
        if !self.participants.contains_key(node.id()) {
            self.participants
                .insert(node.id().to_string(), participant_for(node));
        }
    }

    fn record_call(&mut self, edge: &CallEdge, callee: &CallNode) {
        self.ensure_participant(callee);
        let order = self.next_order();
        let (label, display_label, description) = match callee {
            CallNode::Function(f) => (
                f.name.clone(),
                friendly_label(&f.name),
                Some(format!("{} {} 호출", function_icon(&f.name), friendly_label(&f.name))),
            ),
            CallNode::Api(api) => (
                format!("{} {}", api.method, api.path),
                format!("{} 요청", api.method),
                None,
            ),
            CallNode::Db(db) => {
                let operation = edge.operation.as_deref().unwrap_or("query");
                (
                    format!("{}({})", operation, db.resource),
                    db_operation_label(operation).to_string(),
                    None,
                )
            }
        };
        let is_async = edge.is_async || edge.kind != CallKind::FunctionCall;
        let caller_file = self.graph.get_function(&edge.from).map(|f| f.file.clone());
        self.messages.push(SequenceMessage {
            id: format!("msg:{}", order),
            order,
            from: edge.from.clone(),
            to: edge.to.clone(),
            label,
            display_label,
            message_type: if is_async {
                MessageType::Async
            } else {
                MessageType::Sync
            },
            is_async,
            file: caller_file,
            line: Some(edge.line),
            description,
        });
    }

    fn record_return(&mut self, from: &str, to: &str) {
        let order = self.next_order();
        self.messages.push(SequenceMessage {
            id: format!("msg:{}", order),
            order,
            from: from.to_string(),
            to: to.to_string(),
            label: "response".to_string(),
            display_label: "응답".to_string(),
            message_type: MessageType::Return,
            is_async: false,
            file: None,
            line: None,
            description: None,
        });
    }
}

/// Builds the flow starting at function `start_id`; `None` if it is not a function in the graph
pub fn generate_sequence_flow(graph: &CallGraph, start_id: &str, max_depth: usize) -> Option<SequenceFlow> {
    let start_node = graph.get_node(start_id)?;
    let start = start_node.as_function()?;
    let trigger = create_trigger(start);

    let mut trace = Trace {
        graph,
        participants: IndexMap::new(),
        messages: Vec::new(),
    };
    trace
        .participants
        .insert(USER_PARTICIPANT_ID.to_string(), user_participant());
    trace.ensure_participant(start_node);
    trace.messages.push(SequenceMessage {
        id: "msg:0".to_string(),
        order: 0,
        from: USER_PARTICIPANT_ID.to_string(),
        to: start.id.clone(),
        label: start.name.clone(),
        display_label: trigger.display_label.clone(),
        message_type: MessageType::Sync,
        is_async: false,
        file: Some(start.file.clone()),
        line: Some(start.line),
        description: None,
    });

    let mut on_path: IndexSet<&str> = IndexSet::new();
    let mut stack = vec![Frame::Visit {
        id: start.id.as_str(),
        depth: 0,
    }];
    let mut truncated = false;

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Visit { id, depth } => {
                on_path.insert(id);
                stack.push(Frame::Leave { id });
                if depth >= max_depth {
                    continue;
                }
                for edge in graph.outgoing_edges(id).into_iter().rev() {
                    stack.push(Frame::Call { edge, depth });
                }
            }
            Frame::Call { edge, depth } => {
                if on_path.contains(edge.to.as_str()) {
                    continue;
                }
                let Some(callee) = graph.get_node(&edge.to) else {
                    continue;
                };
                if trace.messages.len() >= MAX_MESSAGES {
                    truncated = true;
                    debug!(start = %start_id, limit = MAX_MESSAGES, "Sequence flow hit message cap");
                    break;
                }
                trace.record_call(edge, callee);
                if edge.kind != CallKind::FunctionCall {
                    stack.push(Frame::Return {
                        from: edge.to.as_str(),
                        to: edge.from.as_str(),
                    });
                }
                stack.push(Frame::Visit {
                    id: edge.to.as_str(),
                    depth: depth + 1,
                });
            }
            Frame::Return { from, to } => {
                if trace.messages.len() >= MAX_MESSAGES {
                    truncated = true;
                    break;
                }
                trace.record_return(from, to);
            }
            Frame::Leave { id } => {
                on_path.shift_remove(id);
            }
        }
    }

    let outcomes = infer_outcomes(graph, &trace.messages);
    let description = format!("사용자가 {}하면 시스템이 처리를 수행합니다.", trigger.display_label);

    Some(SequenceFlow {
        id: format!("flow:{}", start.id),
        name: start.name.clone(),
        display_name: friendly_label(&start.name),
        description,
        trigger,
        participants: trace.participants.into_values().collect(),
        messages: trace.messages,
        outcomes,
        truncated,
    })
}

/// Resolves `trigger_name` (exact name, then method name, then substring of id)
/// and builds its flow
pub fn generate_sequence_from_handler(
    graph: &CallGraph,
    trigger_name: &str,
    max_depth: usize,
) -> Option<SequenceFlow> {
    let start = find_trigger(graph, trigger_name)?;
    generate_sequence_flow(graph, &start.id, max_depth)
}

/// Trigger lookup used by [`generate_sequence_from_handler`]
pub fn find_trigger<'g>(graph: &'g CallGraph, trigger_name: &str) -> Option<&'g FunctionNode> {
    let trigger_name = trigger_name.trim();
    if trigger_name.is_empty() {
        return None;
    }
    graph
        .functions_named(trigger_name)
        .into_iter()
        .next()
        .or_else(|| graph.function_nodes().find(|f| f.local_name() == trigger_name))
        .or_else(|| graph.function_nodes().find(|f| f.id.contains(trigger_name)))
}

fn user_participant() -> SequenceParticipant {
    SequenceParticipant {
        id: USER_PARTICIPANT_ID.to_string(),
        name: "User".to_string(),
        display_name: "사용자".to_string(),
        layer: Layer::User,
        icon: Layer::User.icon().to_string(),
        file: None,
        line: None,
    }
}

fn participant_for(node: &CallNode) -> SequenceParticipant {
    let layer = classify_node(node);
    let display_name = match node {
        CallNode::Function(f) => friendly_label(&f.name),
        CallNode::Api(api) => format!("{} {}", api.method, api.path),
        CallNode::Db(db) => format!("데이터베이스 ({})", db.resource),
    };
    SequenceParticipant {
        id: node.id().to_string(),
        name: node.name(),
        display_name,
        layer,
        icon: layer.icon().to_string(),
        file: node.file().map(str::to_string),
        line: node.line(),
    }
}

/// Participants of one layer, for swimlane-style display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerGroup {
    pub layer: Layer,
    pub label: String,
    pub icon: String,
    pub participants: Vec<String>,
}

const LAYER_ORDER: [Layer; 6] = [
    Layer::User,
    Layer::Ui,
    Layer::Logic,
    Layer::Api,
    Layer::Data,
    Layer::External,
];

/// Groups participant ids by layer, user first and data last; empty layers are omitted
pub fn layer_groups(flow: &SequenceFlow) -> Vec<LayerGroup> {
    LAYER_ORDER
        .iter()
        .filter_map(|layer| {
            let participants: Vec<String> = flow
                .participants
                .iter()
                .filter(|p| p.layer == *layer)
                .map(|p| p.id.clone())
                .collect();
            (!participants.is_empty()).then(|| LayerGroup {
                layer: *layer,
                label: layer.default_label().to_string(),
                icon: layer.icon().to_string(),
                participants,
            })
        })
        .collect()
}

/// Korean label of a database verb
pub fn db_operation_label(operation: &str) -> &'static str {
    match operation {
        "select" => "데이터 조회",
        "insert" => "데이터 저장",
        "update" => "데이터 수정",
        "delete" => "데이터 삭제",
        "upsert" => "데이터 저장/수정",
        "rpc" => "함수 호출",
        "auth" => "인증",
        _ => "데이터 작업",
    }
}

fn infer_trigger_type(name: &str) -> TriggerType {
    let has = |needle: &str| name.contains(needle);
    if has("Click") || has("click") {
        TriggerType::Click
    } else if has("Submit") || has("submit") {
        TriggerType::Submit
    } else if has("Load") || has("load") || has("Mount") {
        TriggerType::Load
    } else if HttpMethod::is_handler_name(name) {
        TriggerType::Api
    } else if has("Effect") || name.starts_with("use") {
        TriggerType::Effect
    } else if has("Timer") || has("Interval") {
        TriggerType::Timer
    } else {
        TriggerType::External
    }
}

/// UI element named after a `handle`/`on` prefix: `handleLoginClick` → `Login`
fn extract_element_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    for start in 0..bytes.len() {
        for prefix in ["handle", "on"] {
            let rest = &bytes[start..];
            if !rest.starts_with(prefix.as_bytes()) {
                continue;
            }
            let after = &rest[prefix.len()..];
            let Some(first) = after.first().filter(|b| b.is_ascii_uppercase()) else {
                continue;
            };
            let lower_len = after[1..].iter().take_while(|b| b.is_ascii_lowercase()).count();
            if lower_len == 0 {
                continue;
            }
            let mut element = String::with_capacity(lower_len + 1);
            element.push(*first as char);
            element.extend(after[1..=lower_len].iter().map(|b| *b as char));
            return Some(element);
        }
    }
    None
}

fn create_trigger(node: &FunctionNode) -> FlowTrigger {
    let name = node.local_name();
    let trigger_type = infer_trigger_type(name);
    let element = extract_element_name(name);
    let display_label = match (&element, trigger_type) {
        (Some(element), TriggerType::Click) => format!("{} 버튼 클릭", element),
        (Some(element), TriggerType::Submit) => format!("{} 폼 제출", element),
        (Some(element), TriggerType::Load) => format!("{} 페이지 로드", element),
        (Some(element), _) => format!("{} 이벤트", element),
        (None, _) => friendly_label(&node.name),
    };
    FlowTrigger {
        trigger_type,
        element,
        handler: node.name.clone(),
        display_label,
        file: node.file.clone(),
        line: node.line,
    }
}

fn infer_outcomes(graph: &CallGraph, messages: &[SequenceMessage]) -> Vec<FlowOutcome> {
    let mut outcomes = vec![FlowOutcome {
        outcome_type: OutcomeType::Success,
        label: "success".to_string(),
        display_label: "성공".to_string(),
        condition: Some("정상 처리 시".to_string()),
    }];

    let calls_api = messages
        .iter()
        .any(|m| matches!(graph.get_node(&m.to), Some(CallNode::Api(_))));
    if calls_api {
        outcomes.push(FlowOutcome {
            outcome_type: OutcomeType::Error,
            label: "api_error".to_string(),
            display_label: "에러 발생".to_string(),
            condition: Some("API 오류 시".to_string()),
        });
    }

    let touches_auth = messages.iter().any(|m| {
        let label = m.label.to_lowercase();
        label.contains("auth") || label.contains("login") || label.contains("session")
    });
    if touches_auth {
        outcomes.push(FlowOutcome {
            outcome_type: OutcomeType::Redirect,
            label: "redirect".to_string(),
            display_label: "페이지 이동".to_string(),
            condition: Some("인증 성공 시".to_string()),
        });
    }

    outcomes
}
