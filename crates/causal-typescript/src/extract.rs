//! Callable entities and raw call sites of one parsed module.

use crate::location::LocationConverter;
use crate::parser::ParsedModule;
use crate::walker::{walk_module, Callable, CallableShape, Node, Role};
use causal_core::models::HttpMethod;
use swc_common::Spanned;
use swc_ecma_ast::*;

/// Callable found in a file, before it becomes a graph node
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntityDraft {
    pub name: String,
    pub line: usize,
    pub end_line: usize,
    pub is_arrow: bool,
    pub is_method: bool,
    pub is_async: bool,
    pub is_exported: bool,
    pub has_jsx: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallTarget {
    /// Call by name; `member` when reached through a property access
    Named { name: String, member: bool },
    Api { method: HttpMethod, path: String },
    Db { resource: String, operation: String },
    /// Computed callee such as `handlers[key]()`
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawCall {
    /// Index into [`FileExtraction::entities`]
    pub caller: usize,
    pub target: CallTarget,
    pub line: usize,
    pub is_async: bool,
    pub is_conditional: bool,
}

#[derive(Debug, Default)]
pub(crate) struct FileExtraction {
    pub entities: Vec<EntityDraft>,
    pub calls: Vec<RawCall>,
}

pub(crate) const UNKNOWN_PATH: &str = "/unknown";

#[derive(Debug, Clone)]
struct Pending {
    name: String,
    line: usize,
    /// `field = () => {}` inside a class body
    class_field: bool,
}

impl Pending {
    fn binding(name: String, line: usize) -> Self {
        Self {
            name,
            line,
            class_field: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Scope {
    entity: Option<usize>,
    class_name: Option<String>,
    /// Name a function-valued initializer would take
    pending: Option<Pending>,
    exported: bool,
    conditional: bool,
    /// Inside an API/DB call chain that was already recorded
    in_chain: bool,
}

struct Extractor<'c> {
    converter: &'c LocationConverter,
    out: FileExtraction,
}

pub(crate) fn extract(parsed: &ParsedModule) -> FileExtraction {
    let mut extractor = Extractor {
        converter: &parsed.converter,
        out: FileExtraction::default(),
    };
    walk_module(&parsed.module, Scope::default(), |node, role, scope| {
        extractor.visit(node, role, scope)
    });
    let mut out = extractor.out;
    mark_exports(&parsed.module, &mut out.entities);
    out
}

impl<'c> Extractor<'c> {
    fn line(&self, pos: swc_common::BytePos) -> usize {
        self.converter.line(pos)
    }

    fn visit(&mut self, node: &Node<'_>, role: Role, scope: &Scope) -> Option<Scope> {
        let mut next = scope.clone();
        if role == Role::Branch {
            next.conditional = true;
        }
        match node {
            Node::Decl(_) => {
                next.exported = role == Role::Exported;
                next.pending = None;
            }
            Node::Declarator(d) => {
                next.pending = match &d.name {
                    Pat::Ident(binding) => Some(Pending::binding(
                        binding.id.sym.as_ref().to_string(),
                        self.line(d.span.lo),
                    )),
                    _ => None,
                };
            }
            Node::Callable(callable) => return Some(self.enter_callable(callable, role, next)),
            Node::Class(_, ident) => {
                next.class_name = ident
                    .map(|i| i.sym.as_ref().to_string())
                    .or_else(|| next.pending.take().map(|pending| pending.name));
                next.pending = None;
                next.exported = false;
            }
            Node::Field { key, span, .. } => {
                next.pending = next
                    .class_name
                    .as_ref()
                    .map(|class| Pending {
                        name: format!("{}.{}", class, key),
                        line: self.line(span.lo),
                        class_field: true,
                    });
            }
            Node::Expr(expr) => self.visit_expr(expr, role, &mut next),
            Node::Jsx(element) => {
                self.visit_jsx(element, &next);
                next.pending = None;
                next.exported = false;
            }
            _ => next.pending = None,
        }
        Some(next)
    }

    fn enter_callable(&mut self, callable: &Callable<'_>, role: Role, scope: Scope) -> Scope {
        let line = self.line(callable.span().lo);
        let member = callable.shape.is_member();
        let named = if member {
            match (&scope.class_name, &callable.name) {
                (Some(class), Some(name)) => Some(Pending::binding(format!("{}.{}", class, name), line)),
                _ => None,
            }
        } else if role == Role::ExportDefault {
            callable
                .name
                .clone()
                .map(|name| Pending::binding(name, line))
                .or_else(|| scope.pending.clone())
        } else if matches!(role, Role::Init | Role::FirstFnArg) && scope.pending.is_some() {
            scope.pending.clone()
        } else {
            callable.name.clone().map(|name| Pending::binding(name, line))
        };

        let mut next = Scope {
            entity: scope.entity,
            class_name: None,
            pending: None,
            exported: false,
            conditional: scope.conditional,
            in_chain: false,
        };
        let Some(Pending { name, line, class_field }) = named else {
            return next;
        };
        let is_method = member || class_field;

        self.out.entities.push(EntityDraft {
            name,
            line,
            end_line: self.line(callable.span().hi).max(line),
            is_arrow: callable.shape == CallableShape::Arrow,
            is_method,
            is_async: callable.is_async(),
            is_exported: (scope.exported || role == Role::ExportDefault) && !is_method,
            has_jsx: false,
        });
        next.entity = Some(self.out.entities.len() - 1);
        next.conditional = false;
        next
    }

    fn visit_expr(&mut self, expr: &Expr, role: Role, next: &mut Scope) {
        if role == Role::ExportDefault {
            next.pending = Some(Pending::binding("default".to_string(), self.line(expr.span().lo)));
            next.exported = true;
        }
        let keeps_binding = match expr {
            Expr::Call(call) => wraps_callback(call),
            _ => matches!(
                expr,
                Expr::Paren(_)
                    | Expr::Await(_)
                    | Expr::Arrow(_)
                    | Expr::Fn(_)
                    | Expr::Class(_)
                    | Expr::TsAs(_)
                    | Expr::TsSatisfies(_)
                    | Expr::TsNonNull(_)
                    | Expr::TsConstAssertion(_)
                    | Expr::TsTypeAssertion(_)
            ),
        };
        if !keeps_binding {
            next.pending = None;
            next.exported = false;
        }

        let Some(caller) = next.entity else {
            return;
        };
        let target = match expr {
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => classify_call(callee, &call.args),
                _ => None,
            },
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Call(call) => classify_call(&call.callee, &call.args),
                OptChainBase::Member(_) => None,
            },
            Expr::New(new) => match unwrap(&new.callee) {
                Expr::Ident(ident) => Some(CallTarget::Named {
                    name: format!("{}.constructor", ident.sym),
                    member: false,
                }),
                _ => None,
            },
            _ => None,
        };
        let Some(target) = target else {
            return;
        };

        let external = matches!(target, CallTarget::Api { .. } | CallTarget::Db { .. });
        if external {
            if next.in_chain {
                return;
            }
            next.in_chain = true;
        }
        self.out.calls.push(RawCall {
            caller,
            target,
            line: self.line(expr.span().lo),
            is_async: role == Role::Awaited || external,
            is_conditional: next.conditional,
        });
    }

    fn visit_jsx(&mut self, element: &JSXElement, scope: &Scope) {
        let Some(entity) = scope.entity else {
            return;
        };
        self.out.entities[entity].has_jsx = true;

        let name = match &element.opening.name {
            JSXElementName::Ident(ident) => ident.sym.as_ref().to_string(),
            JSXElementName::JSXMemberExpr(member) => member.prop.sym.as_ref().to_string(),
            _ => return,
        };
        if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            self.out.calls.push(RawCall {
                caller: entity,
                target: CallTarget::Named { name, member: false },
                line: self.line(element.span.lo),
                is_async: false,
                is_conditional: scope.conditional,
            });
        }
    }
}

/// Applies `export { a, b as c }` and `export default ident` to already extracted entities
fn mark_exports(module: &Module, entities: &mut [EntityDraft]) {
    let mut names: Vec<String> = Vec::new();
    for item in &module.body {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)) if export.src.is_none() => {
                for specifier in &export.specifiers {
                    if let ExportSpecifier::Named(named) = specifier {
                        if let ModuleExportName::Ident(ident) = &named.orig {
                            names.push(ident.sym.as_ref().to_string());
                        }
                    }
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => match unwrap(&export.expr) {
                Expr::Ident(ident) => names.push(ident.sym.as_ref().to_string()),
                // export default memo(Page)
                Expr::Call(call) => names.extend(call.args.iter().filter_map(|arg| match unwrap(&arg.expr) {
                    Expr::Ident(ident) => Some(ident.sym.as_ref().to_string()),
                    _ => None,
                })),
                _ => {}
            },
            _ => {}
        }
    }
    for entity in entities.iter_mut().filter(|e| !e.is_method) {
        if names.iter().any(|n| *n == entity.name) {
            entity.is_exported = true;
        }
    }
}

/// `useCallback(fn)`, `memo(fn)`, `React.forwardRef(fn)`: the callback takes the binding's name
fn wraps_callback(call: &CallExpr) -> bool {
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    match unwrap(callee) {
        Expr::Ident(_) => true,
        Expr::Member(member) => matches!(unwrap(&member.obj), Expr::Ident(ident) if &*ident.sym == "React"),
        _ => false,
    }
}

fn unwrap(expr: &Expr) -> &Expr {
    let mut current = expr;
    loop {
        current = match current {
            Expr::Paren(e) => &e.expr,
            Expr::TsAs(e) => &e.expr,
            Expr::TsNonNull(e) => &e.expr,
            Expr::TsSatisfies(e) => &e.expr,
            Expr::TsConstAssertion(e) => &e.expr,
            Expr::TsTypeAssertion(e) => &e.expr,
            Expr::TsInstantiation(e) => &e.expr,
            _ => return current,
        };
    }
}

fn classify_call(callee: &Expr, args: &[ExprOrSpread]) -> Option<CallTarget> {
    match unwrap(callee) {
        Expr::Ident(ident) => Some(match ident.sym.as_ref() {
            "fetch" => fetch_target(args),
            "axios" => axios_config_target(args),
            name => CallTarget::Named {
                name: name.to_string(),
                member: false,
            },
        }),
        Expr::Member(member) => classify_member_call(member, args),
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => classify_member_call(member, args),
            OptChainBase::Call(_) => None,
        },
        _ => None,
    }
}

fn member_prop_name(prop: &MemberProp) -> Option<String> {
    match prop {
        MemberProp::Ident(ident) => Some(ident.sym.as_ref().to_string()),
        MemberProp::PrivateName(private) => Some(format!("#{}", private.name)),
        MemberProp::Computed(computed) => match unwrap(&computed.expr) {
            Expr::Lit(Lit::Str(s)) => Some(s.value.as_str().unwrap_or("").to_string()),
            _ => None,
        },
    }
}

fn classify_member_call(member: &MemberExpr, args: &[ExprOrSpread]) -> Option<CallTarget> {
    let Some(method) = member_prop_name(&member.prop) else {
        return Some(CallTarget::Dynamic);
    };
    if method == "fetch" {
        return Some(fetch_target(args));
    }
    if matches!(unwrap(&member.obj), Expr::Ident(ident) if &*ident.sym == "axios") {
        return axios_method_target(&method, args);
    }
    if chain_mentions_supabase(&member.obj) {
        return Some(supabase_target(&method, args, &member.obj));
    }
    if let Some(target) = client_request_target(&method, args) {
        return Some(target);
    }
    Some(CallTarget::Named {
        name: method,
        member: true,
    })
}

/// Object of a member access or callee of a call, one link down the chain
fn chain_parent(expr: &Expr) -> Option<&Expr> {
    match unwrap(expr) {
        Expr::Member(member) => Some(&member.obj),
        Expr::Call(call) => match &call.callee {
            Callee::Expr(callee) => Some(callee),
            _ => None,
        },
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => Some(&member.obj),
            OptChainBase::Call(call) => Some(&call.callee),
        },
        _ => None,
    }
}

/// Whether the chain is rooted at a supabase client or `createClient(...)`
fn chain_mentions_supabase(expr: &Expr) -> bool {
    let mut current = Some(expr);
    while let Some(expr) = current {
        let expr = unwrap(expr);
        let mentions = match expr {
            Expr::Ident(ident) => {
                let name = ident.sym.as_ref();
                name.to_ascii_lowercase().contains("supabase") || name == "createClient"
            }
            Expr::Member(member) => member_prop_name(&member.prop)
                .is_some_and(|name| name.to_ascii_lowercase().contains("supabase")),
            _ => false,
        };
        if mentions {
            return true;
        }
        current = chain_parent(expr);
    }
    false
}

fn first_string_arg(args: &[ExprOrSpread]) -> Option<String> {
    args.first().and_then(|arg| literal_path(&arg.expr))
}

/// Collects `(method, first string argument)` along a call chain, outermost first
fn chain_steps(method: &str, args: &[ExprOrSpread], obj: &Expr) -> Vec<(String, Option<String>)> {
    let mut steps = vec![(method.to_string(), first_string_arg(args))];
    let mut current = obj;
    loop {
        match unwrap(current) {
            Expr::Call(call) => {
                let Callee::Expr(callee) = &call.callee else {
                    break;
                };
                let Expr::Member(member) = unwrap(callee) else {
                    break;
                };
                if let Some(name) = member_prop_name(&member.prop) {
                    steps.push((name, first_string_arg(&call.args)));
                }
                current = &member.obj;
            }
            Expr::Member(member) => {
                if let Some(name) = member_prop_name(&member.prop) {
                    steps.push((name, None));
                }
                current = &member.obj;
            }
            _ => break,
        }
    }
    steps
}

fn supabase_target(method: &str, args: &[ExprOrSpread], obj: &Expr) -> CallTarget {
    let steps = chain_steps(method, args, obj);
    let has = |name: &str| steps.iter().any(|(step, _)| step == name);
    let arg_of = |name: &str| {
        steps
            .iter()
            .find(|(step, _)| step == name)
            .and_then(|(_, arg)| arg.clone())
    };

    if has("rpc") {
        return CallTarget::Db {
            resource: format!("rpc:{}", arg_of("rpc").unwrap_or_else(|| "unknown".to_string())),
            operation: "rpc".to_string(),
        };
    }
    if has("auth") {
        return CallTarget::Db {
            resource: "auth".to_string(),
            operation: "auth".to_string(),
        };
    }
    // A write followed by `.select()` is still a write
    let operation = ["insert", "update", "upsert", "delete", "select"]
        .into_iter()
        .find(|op| has(op))
        .unwrap_or("unknown");
    CallTarget::Db {
        resource: arg_of("from").unwrap_or_else(|| "unknown".to_string()),
        operation: operation.to_string(),
    }
}

/// String or template literal text; template holes become `:param`
fn literal_path(expr: &Expr) -> Option<String> {
    match unwrap(expr) {
        Expr::Lit(Lit::Str(s)) => Some(s.value.as_str().unwrap_or("").to_string()),
        Expr::Tpl(tpl) => Some(
            tpl.quasis
                .iter()
                .map(|q| q.raw.as_ref())
                .collect::<Vec<&str>>()
                .join(":param"),
        ),
        _ => None,
    }
}

/// String value of `key` in an object literal
fn object_string_prop(expr: &Expr, key: &str) -> Option<String> {
    let Expr::Object(object) = unwrap(expr) else {
        return None;
    };
    object.props.iter().find_map(|prop| match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(kv) if crate::walker::prop_name(&kv.key).as_deref() == Some(key) => {
                literal_path(&kv.value)
            }
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    })
}

fn fetch_target(args: &[ExprOrSpread]) -> CallTarget {
    let path = first_string_arg(args).unwrap_or_else(|| UNKNOWN_PATH.to_string());
    let method = args
        .get(1)
        .and_then(|arg| object_string_prop(&arg.expr, "method"))
        .and_then(|m| HttpMethod::from_str_opt(&m))
        .unwrap_or(HttpMethod::Get);
    CallTarget::Api { method, path }
}

/// `axios(url, config)` or `axios(config)`
fn axios_config_target(args: &[ExprOrSpread]) -> CallTarget {
    let config = match args.first() {
        Some(arg) if matches!(unwrap(&arg.expr), Expr::Object(_)) => Some(&*arg.expr),
        _ => args.get(1).map(|arg| &*arg.expr),
    };
    let path = first_string_arg(args)
        .or_else(|| config.and_then(|c| object_string_prop(c, "url")))
        .unwrap_or_else(|| UNKNOWN_PATH.to_string());
    let method = config
        .and_then(|c| object_string_prop(c, "method"))
        .and_then(|m| HttpMethod::from_str_opt(&m))
        .unwrap_or(HttpMethod::Get);
    CallTarget::Api { method, path }
}

/// `axios.get(url)`, `axios.request(config)`; other members (`create`, ...) are not requests
fn axios_method_target(method: &str, args: &[ExprOrSpread]) -> Option<CallTarget> {
    if method == "request" {
        return Some(axios_config_target(args));
    }
    let method = HttpMethod::from_str_opt(method)?;
    Some(CallTarget::Api {
        method,
        path: first_string_arg(args).unwrap_or_else(|| UNKNOWN_PATH.to_string()),
    })
}

/// `client.get('/x')`, `api.post('https://..')`: only URL-shaped first arguments count
fn client_request_target(method: &str, args: &[ExprOrSpread]) -> Option<CallTarget> {
    let method = match method {
        "get" | "post" | "put" | "delete" | "patch" => HttpMethod::from_str_opt(method)?,
        _ => return None,
    };
    let path = first_string_arg(args)?;
    if !(path.starts_with('/') || path.starts_with("http")) {
        return None;
    }
    Some(CallTarget::Api { method, path })
}
