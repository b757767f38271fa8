//! Architectural layer inference for graph nodes.
//!
//! Layers group sequence participants for display. They are guessed from the
//! file path first, then from the node kind and name.

use crate::call_graph::{CallNode, FunctionKind, FunctionNode};
use serde::{Deserialize, Serialize};

/// Display layer of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    User,
    Ui,
    Logic,
    Api,
    Data,
    External,
}

impl Layer {
    pub fn icon(&self) -> &'static str {
        match self {
            Layer::User => "👤",
            Layer::Ui => "🖥️",
            Layer::Logic => "⚙️",
            Layer::Api => "🌐",
            Layer::Data => "💾",
            Layer::External => "☁️",
        }
    }

    /// Default Korean label used when a name matches no keyword
    pub fn default_label(&self) -> &'static str {
        match self {
            Layer::User => "사용자",
            Layer::Ui => "화면",
            Layer::Logic => "처리",
            Layer::Api => "서버",
            Layer::Data => "데이터",
            Layer::External => "외부",
        }
    }

    /// Adjective phrase describing what code in this layer does
    pub fn description(&self) -> &'static str {
        match self {
            Layer::User => "사용자가 수행하는",
            Layer::Ui => "사용자에게 보여지는",
            Layer::Logic => "데이터를 처리하는",
            Layer::Api => "서버와 통신하는",
            Layer::Data => "데이터를 저장/관리하는",
            Layer::External => "외부 시스템과 연결되는",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::User => "user",
            Layer::Ui => "ui",
            Layer::Logic => "logic",
            Layer::Api => "api",
            Layer::Data => "data",
            Layer::External => "external",
        }
    }
}

/// Classifies a function by file path, then kind, then name
pub fn classify_function(node: &FunctionNode) -> Layer {
    let file = node.file.as_str();
    if file.contains("/components/") || file.ends_with(".tsx") {
        return Layer::Ui;
    }
    if file.contains("/api/") || file.contains("route.ts") {
        return Layer::Api;
    }

    match node.kind {
        FunctionKind::Component => return Layer::Ui,
        FunctionKind::Hook => return Layer::Logic,
        FunctionKind::Handler => return Layer::Api,
        _ => {}
    }

    let lower = node.name.to_lowercase();
    if lower.contains("supabase") || lower.contains("db") {
        return Layer::Data;
    }

    Layer::Logic
}

/// Classifies any graph node; synthetic API and DB markers map to their own layers
pub fn classify_node(node: &CallNode) -> Layer {
    match node {
        CallNode::Function(function) => classify_function(function),
        CallNode::Api(_) => Layer::Api,
        CallNode::Db(_) => Layer::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, file: &str, kind: FunctionKind) -> FunctionNode {
        FunctionNode::new(name, file, 1, kind)
    }

    #[test]
    fn path_rules_take_precedence() {
        let hook = function("useAuth", "src/components/auth/useAuth.ts", FunctionKind::Hook);
        assert_eq!(classify_function(&hook), Layer::Ui);

        let helper = function("formatDate", "src/app/api/users/route.ts", FunctionKind::Function);
        assert_eq!(classify_function(&helper), Layer::Api);
    }

    #[test]
    fn falls_back_to_kind_and_name() {
        assert_eq!(
            classify_function(&function("useAuth", "src/hooks/useAuth.ts", FunctionKind::Hook)),
            Layer::Logic
        );
        assert_eq!(
            classify_function(&function("fetchFromDb", "src/lib/data.ts", FunctionKind::Function)),
            Layer::Data
        );
        assert_eq!(
            classify_function(&function("format", "src/lib/utils.ts", FunctionKind::Function)),
            Layer::Logic
        );
    }
}
