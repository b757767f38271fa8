use crate::models::HttpMethod;
use serde::{Deserialize, Serialize};

/// Shape-based classification of a callable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Function,
    Method,
    Arrow,
    Component,
    Hook,
    Handler,
}

impl FunctionKind {
    /// Infers the kind from naming and shape.
    ///
    /// Precedence: HTTP-verb handler, `use[A-Z]` hook, PascalCase component
    /// rendering JSX, then method / arrow / plain function.
    pub fn infer(name: &str, has_jsx: bool, is_method: bool, is_arrow: bool) -> Self {
        let local = name.rsplit('.').next().unwrap_or(name);
        if HttpMethod::is_handler_name(local) {
            FunctionKind::Handler
        } else if is_hook_name(local) {
            FunctionKind::Hook
        } else if has_jsx && local.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            FunctionKind::Component
        } else if is_method {
            FunctionKind::Method
        } else if is_arrow {
            FunctionKind::Arrow
        } else {
            FunctionKind::Function
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Function => "function",
            FunctionKind::Method => "method",
            FunctionKind::Arrow => "arrow",
            FunctionKind::Component => "component",
            FunctionKind::Hook => "hook",
            FunctionKind::Handler => "handler",
        }
    }
}

/// `use` followed by an uppercase letter
pub fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Callable entity extracted from a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionNode {
    /// `file#name@line`, unique across the batch
    pub id: String,
    pub name: String,
    pub file: String,
    /// First line of the declaration (1-based)
    pub line: usize,
    /// Last line of the declaration (1-based)
    pub end_line: usize,
    pub kind: FunctionKind,
    pub is_exported: bool,
    pub is_async: bool,
    pub is_api_route: bool,
    pub has_supabase: bool,
}

impl FunctionNode {
    pub fn new(name: impl Into<String>, file: impl Into<String>, line: usize, kind: FunctionKind) -> Self {
        let name = name.into();
        let file = file.into();
        Self {
            id: Self::make_id(&file, &name, line),
            name,
            file,
            line,
            end_line: line,
            kind,
            is_exported: false,
            is_async: false,
            is_api_route: false,
            has_supabase: false,
        }
    }

    pub fn make_id(file: &str, name: &str, line: usize) -> String {
        format!("{}#{}@{}", file, name, line)
    }

    /// Name without the `Class.` qualifier of methods
    pub fn local_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Synthetic node for a network endpoint reached by `fetch`/`axios`/client calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub id: String,
    pub method: HttpMethod,
    pub path: String,
}

impl ApiEndpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: Self::make_id(method, &path),
            method,
            path,
        }
    }

    pub fn make_id(method: HttpMethod, path: &str) -> String {
        format!("api:{}:{}", method, path)
    }

    /// Route file that serves this path under the app router convention,
    /// e.g. `/api/users/1` → `src/app/api/users/1/route.ts`
    pub fn route_file(&self) -> Option<String> {
        let path = self.path.split(['?', '#']).next().unwrap_or(&self.path);
        let rest = path.strip_prefix("/api/")?;
        Some(format!("src/app/api/{}/route.ts", rest.trim_end_matches('/')))
    }
}

/// Synthetic node for a database resource (table, RPC function or auth)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbResource {
    pub id: String,
    pub resource: String,
}

impl DbResource {
    pub fn new(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self {
            id: Self::make_id(&resource),
            resource,
        }
    }

    pub fn make_id(resource: &str) -> String {
        format!("db:{}", resource)
    }
}

/// Node in call graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallNode {
    Function(FunctionNode),
    Api(ApiEndpoint),
    Db(DbResource),
}

impl CallNode {
    pub fn id(&self) -> &str {
        match self {
            CallNode::Function(f) => &f.id,
            CallNode::Api(a) => &a.id,
            CallNode::Db(d) => &d.id,
        }
    }

    /// Technical name: function name, `METHOD path`, or resource
    pub fn name(&self) -> String {
        match self {
            CallNode::Function(f) => f.name.clone(),
            CallNode::Api(a) => format!("{} {}", a.method, a.path),
            CallNode::Db(d) => d.resource.clone(),
        }
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            CallNode::Function(f) => Some(&f.file),
            CallNode::Api(_) | CallNode::Db(_) => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            CallNode::Function(f) => Some(f.line),
            CallNode::Api(_) | CallNode::Db(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionNode> {
        match self {
            CallNode::Function(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_kind_by_precedence() {
        assert_eq!(FunctionKind::infer("GET", false, false, false), FunctionKind::Handler);
        assert_eq!(FunctionKind::infer("useAuth", true, false, true), FunctionKind::Hook);
        assert_eq!(FunctionKind::infer("user", false, false, false), FunctionKind::Function);
        assert_eq!(FunctionKind::infer("LoginPage", true, false, true), FunctionKind::Component);
        assert_eq!(FunctionKind::infer("LoginPage", false, false, true), FunctionKind::Arrow);
        assert_eq!(FunctionKind::infer("Auth.login", false, true, false), FunctionKind::Method);
    }

    #[test]
    fn ids_are_file_qualified() {
        let node = FunctionNode::new("useAuth", "src/hooks/useAuth.ts", 3, FunctionKind::Hook);
        assert_eq!(node.id, "src/hooks/useAuth.ts#useAuth@3");
        assert_eq!(ApiEndpoint::new(HttpMethod::Post, "/api/login").id, "api:POST:/api/login");
        assert_eq!(DbResource::new("users").id, "db:users");
    }

    #[test]
    fn maps_api_path_to_route_file() {
        let endpoint = ApiEndpoint::new(HttpMethod::Get, "/api/users/?page=1");
        assert_eq!(endpoint.route_file().as_deref(), Some("src/app/api/users/route.ts"));
        assert_eq!(ApiEndpoint::new(HttpMethod::Get, "https://x.dev/a").route_file(), None);
    }
}
