//! Result model for "where does this value come from / go to" traces.
//!
//! The AST walk lives with the parser; this module owns the shapes it fills
//! in and the story/summary rendering shared by every frontend.

use crate::error::CausalError;
use crate::labels::friendly_label;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Backward,
    Forward,
    #[default]
    Both,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::Backward => "backward",
            FlowDirection::Forward => "forward",
            FlowDirection::Both => "both",
        }
    }

    pub fn includes_backward(&self) -> bool {
        !matches!(self, FlowDirection::Forward)
    }

    pub fn includes_forward(&self) -> bool {
        !matches!(self, FlowDirection::Backward)
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowDirection {
    type Err = CausalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backward" => Ok(FlowDirection::Backward),
            "forward" => Ok(FlowDirection::Forward),
            "both" => Ok(FlowDirection::Both),
            other => Err(CausalError::invalid_input(format!(
                "Invalid direction '{}': expected backward, forward or both",
                other
            ))),
        }
    }
}

/// What to trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowQuery {
    pub identifier: String,
    pub file: String,
    pub line: usize,
    #[serde(default)]
    pub direction: FlowDirection,
}

impl DataFlowQuery {
    pub fn new(identifier: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            identifier: identifier.into(),
            file: file.into(),
            line,
            direction: FlowDirection::Both,
        }
    }

    pub fn with_direction(mut self, direction: FlowDirection) -> Self {
        self.direction = direction;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Variable,
    Parameter,
    Property,
    State,
    Props,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTarget {
    /// `file:line:identifier`
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub file: String,
    pub line: usize,
    pub direction: FlowDirection,
}

impl DataTarget {
    pub fn new(query: &DataFlowQuery, file: &str, target_type: TargetType) -> Self {
        Self {
            id: format!("{}:{}:{}", file, query.line, query.identifier),
            name: query.identifier.clone(),
            display_name: friendly_label(&query.identifier),
            target_type,
            file: file.to_string(),
            line: query.line,
            direction: query.direction,
        }
    }
}

/// Where a value originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    UserInput,
    ApiResponse,
    Database,
    LocalStorage,
    UrlParam,
    Constant,
    Computed,
    State,
    Import,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::UserInput => "user-input",
            SourceKind::ApiResponse => "api-response",
            SourceKind::Database => "database",
            SourceKind::LocalStorage => "local-storage",
            SourceKind::UrlParam => "url-param",
            SourceKind::Constant => "constant",
            SourceKind::Computed => "computed",
            SourceKind::State => "state",
            SourceKind::Import => "import",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::UserInput => "사용자 입력",
            SourceKind::ApiResponse => "API 응답",
            SourceKind::Database => "데이터베이스",
            SourceKind::LocalStorage => "저장된 데이터",
            SourceKind::UrlParam => "URL 파라미터",
            SourceKind::Constant => "고정값",
            SourceKind::Computed => "계산된 값",
            SourceKind::State => "화면 상태",
            SourceKind::Import => "외부 모듈",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SourceKind::UserInput => "폼에서 입력받은 값",
            SourceKind::ApiResponse => "서버에서 받아온 데이터",
            SourceKind::Database => "데이터베이스에서 조회한 데이터",
            SourceKind::LocalStorage => "브라우저에 저장된 데이터",
            SourceKind::UrlParam => "URL에서 추출한 값",
            SourceKind::Constant => "코드에 정의된 고정값",
            SourceKind::Computed => "다른 값들로부터 계산된 값",
            SourceKind::State => "컴포넌트 상태 값",
            SourceKind::Import => "다른 파일에서 가져온 값",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SourceKind::UserInput => "⌨️",
            SourceKind::ApiResponse => "🌐",
            SourceKind::Database => "💾",
            SourceKind::LocalStorage => "📦",
            SourceKind::UrlParam => "🔗",
            SourceKind::Constant => "📌",
            SourceKind::Computed => "🧮",
            SourceKind::State => "🔄",
            SourceKind::Import => "📥",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// Identifier or expression the value was read from
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub file: String,
    pub line: usize,
    /// Source text of the originating expression, shortened
    pub code: String,
}

impl DataSource {
    pub fn new(kind: SourceKind, name: impl Into<String>, file: &str, line: usize, code: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("source:{}:{}:{}", file, line, name),
            kind,
            display_name: kind.display_name().to_string(),
            description: kind.description().to_string(),
            icon: kind.icon().to_string(),
            name,
            file: file.to_string(),
            line,
            code: shorten(&code.into()),
        }
    }

    /// A function parameter, labelled after the parameter itself
    pub fn parameter(name: &str, file: &str, line: usize) -> Self {
        let mut source = Self::new(SourceKind::UserInput, name, file, line, name);
        source.display_name = format!("{} 매개변수", friendly_label(name));
        source.description = "함수 호출 시 전달받은 값".to_string();
        source
    }
}

/// Where a value ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DestinationKind {
    UiDisplay,
    ApiRequest,
    Database,
    LocalStorage,
    State,
    Log,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::UiDisplay => "ui-display",
            DestinationKind::ApiRequest => "api-request",
            DestinationKind::Database => "database",
            DestinationKind::LocalStorage => "local-storage",
            DestinationKind::State => "state",
            DestinationKind::Log => "log",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DestinationKind::UiDisplay => "화면 표시",
            DestinationKind::ApiRequest => "API 전송",
            DestinationKind::Database => "데이터베이스 저장",
            DestinationKind::LocalStorage => "브라우저 저장",
            DestinationKind::State => "상태 업데이트",
            DestinationKind::Log => "로그 출력",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DestinationKind::UiDisplay => "사용자에게 표시되는 값",
            DestinationKind::ApiRequest => "서버로 전송되는 데이터",
            DestinationKind::Database => "데이터베이스에 저장",
            DestinationKind::LocalStorage => "브라우저에 저장",
            DestinationKind::State => "앱 상태 업데이트",
            DestinationKind::Log => "디버깅용 로그",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            DestinationKind::UiDisplay => "🖥️",
            DestinationKind::ApiRequest => "📤",
            DestinationKind::Database => "💾",
            DestinationKind::LocalStorage => "📦",
            DestinationKind::State => "🔄",
            DestinationKind::Log => "📝",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDestination {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DestinationKind,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub icon: String,
    pub file: String,
    pub line: usize,
    pub code: String,
}

impl DataDestination {
    pub fn new(
        kind: DestinationKind,
        name: impl Into<String>,
        file: &str,
        line: usize,
        code: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: format!("dest:{}:{}:{}", file, line, kind.as_str()),
            kind,
            display_name: kind.display_name().to_string(),
            description: kind.description().to_string(),
            icon: kind.icon().to_string(),
            name,
            file: file.to_string(),
            line,
            code: shorten(&code.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Validate,
    Filter,
    Map,
    Format,
    Merge,
    Split,
    Transform,
}

impl TransformKind {
    /// Classifies a transforming call by the callee's name
    pub fn from_function_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));
        if has(&["valid", "check", "verify", "parse"]) {
            TransformKind::Validate
        } else if has(&["filter", "find", "where"]) {
            TransformKind::Filter
        } else if has(&["map", "convert", "reduce"]) {
            TransformKind::Map
        } else if has(&["format", "stringify", "tostring", "trim", "fixed"]) {
            TransformKind::Format
        } else if has(&["merge", "concat", "assign", "combine", "join"]) {
            TransformKind::Merge
        } else if has(&["split", "slice", "substr"]) {
            TransformKind::Split
        } else {
            TransformKind::Transform
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            TransformKind::Validate => "데이터 검증",
            TransformKind::Filter => "데이터 필터링",
            TransformKind::Map => "데이터 가공",
            TransformKind::Format => "형식 변환",
            TransformKind::Merge => "데이터 병합",
            TransformKind::Split => "데이터 분리",
            TransformKind::Transform => "데이터 변환",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransformation {
    pub id: String,
    pub order: usize,
    #[serde(rename = "type")]
    pub kind: TransformKind,
    pub function_name: String,
    pub display_label: String,
    pub file: String,
    pub line: usize,
}

impl DataTransformation {
    pub fn new(order: usize, function_name: &str, file: &str, line: usize) -> Self {
        let kind = TransformKind::from_function_name(function_name);
        Self {
            id: format!("transform:{}:{}:{}", file, line, function_name),
            order,
            kind,
            function_name: function_name.to_string(),
            display_label: kind.display_label().to_string(),
            file: file.to_string(),
            line,
        }
    }

    /// Transformation implied by a computed source
    pub fn computed(order: usize, source: &DataSource) -> Self {
        Self {
            id: format!("transform:{}", source.id),
            order,
            kind: TransformKind::Transform,
            function_name: "compute".to_string(),
            display_label: TransformKind::Transform.display_label().to_string(),
            file: source.file.clone(),
            line: source.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Source,
    Transform,
    Destination,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowStep {
    pub order: usize,
    pub icon: String,
    pub label: String,
    pub technical_detail: String,
    pub file: String,
    pub line: usize,
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowStory {
    pub title: String,
    pub steps: Vec<DataFlowStep>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowNodeType {
    Target,
    Source,
    Transform,
    Destination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub display_label: String,
    #[serde(rename = "type")]
    pub node_type: FlowNodeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLink {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Plain node/edge view for diagram renderers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowVisualization {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowResult {
    pub target: DataTarget,
    pub sources: Vec<DataSource>,
    pub transformations: Vec<DataTransformation>,
    pub destinations: Vec<DataDestination>,
    pub story: DataFlowStory,
    pub visualization: DataFlowVisualization,
    /// The identifier was located at the requested line
    pub found: bool,
    pub analysis_time_ms: f64,
}

impl DataFlowResult {
    /// Assembles a result, deriving the story and visualization
    pub fn new(
        target: DataTarget,
        sources: Vec<DataSource>,
        mut transformations: Vec<DataTransformation>,
        destinations: Vec<DataDestination>,
        analysis_time_ms: f64,
    ) -> Self {
        let mut computed: Vec<DataTransformation> = sources
            .iter()
            .filter(|s| s.kind == SourceKind::Computed)
            .enumerate()
            .map(|(i, s)| DataTransformation::computed(i, s))
            .collect();
        let offset = computed.len();
        for t in transformations.iter_mut() {
            t.order += offset;
        }
        computed.append(&mut transformations);
        let transformations = computed;

        let story = generate_story(&target.name, &sources, &transformations, &destinations);
        let visualization = generate_visualization(&target, &sources, &transformations, &destinations);
        Self {
            target,
            sources,
            transformations,
            destinations,
            story,
            visualization,
            found: true,
            analysis_time_ms,
        }
    }

    /// Result carrying a single not-found step
    pub fn not_found(query: &DataFlowQuery, reason: impl Into<String>, analysis_time_ms: f64) -> Self {
        let target = DataTarget::new(query, &query.file, TargetType::Variable);
        let reason = reason.into();
        let step = DataFlowStep {
            order: 0,
            icon: "❓".to_string(),
            label: format!("찾을 수 없음: {}", query.identifier),
            technical_detail: reason.clone(),
            file: query.file.clone(),
            line: query.line,
            kind: StepKind::NotFound,
        };
        let visualization = generate_visualization(&target, &[], &[], &[]);
        Self {
            story: DataFlowStory {
                title: story_title(&query.identifier),
                steps: vec![step],
                summary: reason,
            },
            target,
            sources: Vec::new(),
            transformations: Vec::new(),
            destinations: Vec::new(),
            visualization,
            found: false,
            analysis_time_ms,
        }
    }
}

const NUMBER_ICONS: [&str; 10] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟"];

fn step_icon(order: usize) -> String {
    NUMBER_ICONS
        .get(order)
        .map(|icon| icon.to_string())
        .unwrap_or_else(|| format!("{}.", order + 1))
}

fn story_title(identifier: &str) -> String {
    format!("📊 {} 데이터 추적", friendly_label(identifier))
}

fn shorten(code: &str) -> String {
    const MAX: usize = 80;
    let single_line = code.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= MAX {
        single_line
    } else {
        let cut: String = single_line.chars().take(MAX - 3).collect();
        format!("{}...", cut)
    }
}

/// Ordered non-developer story: sources, then transformations, then destinations
pub fn generate_story(
    identifier: &str,
    sources: &[DataSource],
    transformations: &[DataTransformation],
    destinations: &[DataDestination],
) -> DataFlowStory {
    let mut steps = Vec::with_capacity(sources.len() + transformations.len() + destinations.len());

    for source in sources {
        let order = steps.len();
        steps.push(DataFlowStep {
            order,
            icon: step_icon(order),
            label: format!("시작: {}", source.display_name),
            technical_detail: format!("{} from {}:{}", source.kind.as_str(), source.file, source.line),
            file: source.file.clone(),
            line: source.line,
            kind: StepKind::Source,
        });
    }
    for transform in transformations {
        let order = steps.len();
        steps.push(DataFlowStep {
            order,
            icon: step_icon(order),
            label: transform.display_label.clone(),
            technical_detail: format!("{}() at {}:{}", transform.function_name, transform.file, transform.line),
            file: transform.file.clone(),
            line: transform.line,
            kind: StepKind::Transform,
        });
    }
    for dest in destinations {
        let order = steps.len();
        steps.push(DataFlowStep {
            order,
            icon: step_icon(order),
            label: format!("결과: {}", dest.display_name),
            technical_detail: format!("{} at {}:{}", dest.kind.as_str(), dest.file, dest.line),
            file: dest.file.clone(),
            line: dest.line,
            kind: StepKind::Destination,
        });
    }

    DataFlowStory {
        title: story_title(identifier),
        summary: generate_story_summary(identifier, sources, destinations),
        steps,
    }
}

/// One-sentence summary; display names are listed once each
pub fn generate_story_summary(identifier: &str, sources: &[DataSource], destinations: &[DataDestination]) -> String {
    let join = |names: Vec<&str>| {
        let mut seen: Vec<&str> = Vec::new();
        for name in names {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen.join(", ")
    };
    let source_names = join(sources.iter().map(|s| s.display_name.as_str()).collect());
    let dest_names = join(destinations.iter().map(|d| d.display_name.as_str()).collect());

    match (sources.is_empty(), destinations.is_empty()) {
        (true, true) => format!("{}는 이 파일 내에서만 사용됩니다.", identifier),
        (false, false) => format!(
            "{}는 {}에서 시작하여 {}(으)로 전달됩니다.",
            identifier, source_names, dest_names
        ),
        (false, true) => format!("{}는 {}에서 가져옵니다.", identifier, source_names),
        (true, false) => format!("{}는 {}에 사용됩니다.", identifier, dest_names),
    }
}

/// Target-centred node/edge view: sources feed the target, the target feeds destinations
pub fn generate_visualization(
    target: &DataTarget,
    sources: &[DataSource],
    transformations: &[DataTransformation],
    destinations: &[DataDestination],
) -> DataFlowVisualization {
    let mut view = DataFlowVisualization::default();
    view.nodes.push(FlowNode {
        id: target.id.clone(),
        label: target.name.clone(),
        display_label: target.display_name.clone(),
        node_type: FlowNodeType::Target,
    });
    for source in sources {
        view.nodes.push(FlowNode {
            id: source.id.clone(),
            label: source.name.clone(),
            display_label: source.display_name.clone(),
            node_type: FlowNodeType::Source,
        });
        view.edges.push(FlowLink {
            from: source.id.clone(),
            to: target.id.clone(),
            label: "입력".to_string(),
        });
    }
    for transform in transformations {
        view.nodes.push(FlowNode {
            id: transform.id.clone(),
            label: transform.function_name.clone(),
            display_label: transform.display_label.clone(),
            node_type: FlowNodeType::Transform,
        });
    }
    for dest in destinations {
        view.nodes.push(FlowNode {
            id: dest.id.clone(),
            label: dest.name.clone(),
            display_label: dest.display_name.clone(),
            node_type: FlowNodeType::Destination,
        });
        view.edges.push(FlowLink {
            from: target.id.clone(),
            to: dest.id.clone(),
            label: "출력".to_string(),
        });
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> DataFlowQuery {
        DataFlowQuery::new("email", "src/components/LoginForm.tsx", 12)
    }

    #[test]
    fn parses_direction() {
        assert_eq!("Forward".parse::<FlowDirection>().unwrap(), FlowDirection::Forward);
        assert!("sideways".parse::<FlowDirection>().is_err());
        assert!(FlowDirection::Both.includes_backward() && FlowDirection::Both.includes_forward());
        assert!(!FlowDirection::Backward.includes_forward());
    }

    #[test]
    fn summary_templates() {
        let file = "src/a.ts";
        let src = vec![DataSource::new(SourceKind::ApiResponse, "fetch", file, 3, "await fetch(url)")];
        let dst = vec![DataDestination::new(DestinationKind::UiDisplay, "email", file, 9, "<p>{email}</p>")];

        assert_eq!(
            generate_story_summary("email", &src, &dst),
            "email는 API 응답에서 시작하여 화면 표시(으)로 전달됩니다."
        );
        assert_eq!(generate_story_summary("email", &src, &[]), "email는 API 응답에서 가져옵니다.");
        assert_eq!(generate_story_summary("email", &[], &dst), "email는 화면 표시에 사용됩니다.");
        assert_eq!(generate_story_summary("email", &[], &[]), "email는 이 파일 내에서만 사용됩니다.");
    }

    #[test]
    fn story_orders_sources_transforms_destinations() {
        let file = "src/a.ts";
        let target = DataTarget::new(&query(), file, TargetType::Variable);
        let sources = vec![DataSource::new(SourceKind::Computed, "a + b", file, 2, "a + b")];
        let destinations = vec![DataDestination::new(DestinationKind::Log, "console.log", file, 5, "console.log(x)")];
        let result = DataFlowResult::new(target, sources, Vec::new(), destinations, 1.5);

        let kinds: Vec<StepKind> = result.story.steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StepKind::Source, StepKind::Transform, StepKind::Destination]);
        assert_eq!(result.story.steps[0].icon, "1️⃣");
        assert_eq!(result.story.steps[0].label, "시작: 계산된 값");
        assert_eq!(result.story.steps[1].label, "데이터 변환");
        assert_eq!(result.story.steps[2].label, "결과: 로그 출력");
        assert_eq!(result.visualization.edges.len(), 2);
    }

    #[test]
    fn not_found_has_single_explicit_step() {
        let result = DataFlowResult::not_found(&query(), "Identifier not found at line 12", 0.2);
        assert!(!result.found);
        assert_eq!(result.story.steps.len(), 1);
        assert_eq!(result.story.steps[0].kind, StepKind::NotFound);
        assert!(result.analysis_time_ms >= 0.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["story"]["steps"][0]["kind"], "not-found");
        assert!(json["analysisTimeMs"].is_number());
    }

    #[test]
    fn parameter_source_uses_parameter_wording() {
        let source = DataSource::parameter("userId", "src/a.ts", 1);
        assert_eq!(source.kind, SourceKind::UserInput);
        assert!(source.display_name.ends_with("매개변수"));
        assert_eq!(source.description, "함수 호출 시 전달받은 값");
    }

    #[test]
    fn transform_kind_by_callee_name() {
        assert_eq!(TransformKind::from_function_name("validateEmail"), TransformKind::Validate);
        assert_eq!(TransformKind::from_function_name("formatDate"), TransformKind::Format);
        assert_eq!(TransformKind::from_function_name("items.filter"), TransformKind::Filter);
        assert_eq!(TransformKind::from_function_name("normalize"), TransformKind::Transform);
    }

    #[test]
    fn long_code_is_shortened() {
        let long = "x".repeat(200);
        let source = DataSource::new(SourceKind::Constant, "x", "a.ts", 1, long);
        assert!(source.code.ends_with("..."));
        assert_eq!(source.code.chars().count(), 80);
    }
}
