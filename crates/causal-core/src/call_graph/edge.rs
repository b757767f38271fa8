use serde::{Deserialize, Serialize};

/// Kind of call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallKind {
    FunctionCall,
    ApiCall,
    DbCall,
}

/// Directed "from calls to" relation observed at one call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEdge {
    /// Caller function id
    pub from: String,
    /// Callee function id or synthetic `api:`/`db:` id
    pub to: String,
    /// Call-site line (1-based)
    pub line: usize,
    pub kind: CallKind,
    /// Call site is awaited
    pub is_async: bool,
    /// Call site sits inside a branch
    pub is_conditional: bool,
    /// HTTP method or DB verb for api/db calls
    pub operation: Option<String>,
}

impl CallEdge {
    pub fn function_call(from: impl Into<String>, to: impl Into<String>, line: usize) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            line,
            kind: CallKind::FunctionCall,
            is_async: false,
            is_conditional: false,
            operation: None,
        }
    }

    pub fn with_kind(mut self, kind: CallKind, operation: Option<String>) -> Self {
        self.kind = kind;
        self.operation = operation;
        self
    }

    pub fn with_flags(mut self, is_async: bool, is_conditional: bool) -> Self {
        self.is_async = is_async;
        self.is_conditional = is_conditional;
        self
    }
}
