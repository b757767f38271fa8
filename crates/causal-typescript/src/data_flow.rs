//! Intra-file data flow tracing.
//!
//! A single pass over the module records every binding (declarations,
//! parameters, imports, assignments) and every identifier read together with
//! the context it is read in. Tracing then walks bindings backwards to find
//! where a value came from and references forwards to find where it goes.

use crate::location::LocationConverter;
use crate::parser::{ParsedModule, TypeScriptParser};
use crate::walker::{prop_name, walk_module, Node, Role};
use causal_core::data_flow::{
    DataDestination, DataFlowQuery, DataFlowResult, DataSource, DataTarget, DataTransformation,
    DestinationKind, SourceKind, TargetType,
};
use causal_core::models::SourceFile;
use std::time::Instant;
use swc_common::{BytePos, Spanned};
use swc_ecma_ast::*;
use tracing::{debug, warn};

/// Upper bound on `a = b`, `b = c` hops while tracing backwards
const MAX_ALIAS_HOPS: usize = 16;
/// How many derived variables (`const b = f(a)`) are followed forwards
const MAX_FOLLOW_DEPTH: usize = 3;

/// Traces `query` through the matching file of `files`
pub fn analyze_data_flow_from_files(files: &[SourceFile], query: &DataFlowQuery) -> DataFlowResult {
    let started = Instant::now();
    match files.iter().find(|f| same_file(&f.path, &query.file)) {
        Some(file) => trace_in_source(&file.content, &file.path, query, started),
        None => DataFlowResult::not_found(
            query,
            format!("File not found: {}", query.file),
            elapsed_ms(started),
        ),
    }
}

/// Traces `query` through a single in-memory source
pub fn analyze_data_flow(content: &str, path: &str, query: &DataFlowQuery) -> DataFlowResult {
    trace_in_source(content, path, query, Instant::now())
}

fn trace_in_source(content: &str, path: &str, query: &DataFlowQuery, started: Instant) -> DataFlowResult {
    let parsed = match TypeScriptParser::new().parse_source(content, path) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(file = %path, error = %err, "Failed to parse file for data flow");
            return DataFlowResult::not_found(
                query,
                format!("Failed to parse {}: {}", path, err),
                elapsed_ms(started),
            );
        }
    };
    let facts = FileFacts::collect(&parsed);
    let Some(occurrence) = facts.locate(&query.identifier, query.line) else {
        return DataFlowResult::not_found(
            query,
            format!("Identifier '{}' not found at line {}", query.identifier, query.line),
            elapsed_ms(started),
        );
    };

    let target = DataTarget::new(query, path, facts.target_type(&occurrence));
    let sources = if query.direction.includes_backward() {
        facts.trace_backward(&occurrence, path)
    } else {
        Vec::new()
    };
    let mut forward = ForwardTrace::default();
    if query.direction.includes_forward() {
        facts.trace_forward(&occurrence, path, &mut forward);
    }
    debug!(
        identifier = %query.identifier,
        sources = sources.len(),
        transformations = forward.transformations.len(),
        destinations = forward.destinations.len(),
        "Data flow traced"
    );
    DataFlowResult::new(
        target,
        sources,
        forward.transformations,
        forward.destinations,
        elapsed_ms(started),
    )
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Exact match, or one path is a `/`-bounded suffix of the other
fn same_file(candidate: &str, requested: &str) -> bool {
    let candidate = candidate.trim_start_matches("./");
    let requested = requested.trim_start_matches("./");
    candidate == requested
        || candidate.ends_with(&format!("/{}", requested))
        || requested.ends_with(&format!("/{}", candidate))
}

struct ScopeInfo {
    parent: Option<usize>,
    name: Option<String>,
}

#[derive(Clone)]
enum BindingKind<'a> {
    Param,
    Catch,
    Import { module: String },
    Declare { init: Option<&'a Expr>, destructured: bool },
    Assign { rhs: &'a Expr },
    ForOf { rhs: &'a Expr },
}

struct Binding<'a> {
    name: String,
    offset: usize,
    /// First offset at which reads see this binding
    visible_from: usize,
    line: usize,
    scope: usize,
    kind: BindingKind<'a>,
}

#[derive(Debug, Clone)]
struct CallSite {
    callee: String,
}

impl CallSite {
    /// Last segment of the callee, `setItem` for `localStorage.setItem`
    fn local_name(&self) -> &str {
        self.callee.rsplit('.').next().unwrap_or(&self.callee)
    }
}

#[derive(Debug, Clone, Default)]
struct UseSite {
    /// Call the value is passed to
    call: Option<CallSite>,
    /// Method called on the value
    receiver_of: Option<CallSite>,
    in_jsx: bool,
    in_return: bool,
    /// Inside a `body:` property
    in_body: bool,
    /// Variable initialized from the expression holding the value
    declared_into: Option<(String, usize)>,
}

struct Reference {
    name: String,
    offset: usize,
    line: usize,
    scope: usize,
    reassign: bool,
    site: UseSite,
}

struct PropertyHit {
    name: String,
    offset: usize,
    line: usize,
}

#[derive(Clone, Default)]
struct FlowCtx<'a> {
    scope: usize,
    pending_call: Option<CallSite>,
    site: UseSite,
    binding_name: Option<String>,
    decl_init: Option<&'a Expr>,
    decl_destructured: bool,
    assign_rhs: Option<(&'a Expr, usize)>,
    for_rhs: Option<&'a Expr>,
}

#[derive(Debug, Clone, Copy)]
enum Occurrence {
    Binding(usize),
    Reference(usize),
    Property(usize),
}

enum Origin {
    Source(SourceKind),
    Alias(String),
}

#[derive(Default)]
struct ForwardTrace {
    transformations: Vec<DataTransformation>,
    destinations: Vec<DataDestination>,
    followed: Vec<usize>,
}

impl ForwardTrace {
    fn add_transformation(&mut self, function_name: &str, path: &str, line: usize) {
        if self
            .transformations
            .iter()
            .any(|t| t.function_name == function_name && t.line == line)
        {
            return;
        }
        let order = self.transformations.len();
        self.transformations
            .push(DataTransformation::new(order, function_name, path, line));
    }

    fn add_destination(&mut self, destination: DataDestination) {
        if self
            .destinations
            .iter()
            .any(|d| d.kind == destination.kind && d.line == destination.line)
        {
            return;
        }
        self.destinations.push(destination);
    }
}

struct FileFacts<'a> {
    converter: &'a LocationConverter,
    scopes: Vec<ScopeInfo>,
    bindings: Vec<Binding<'a>>,
    references: Vec<Reference>,
    properties: Vec<PropertyHit>,
}

impl<'a> FileFacts<'a> {
    fn collect(parsed: &'a ParsedModule) -> Self {
        let mut facts = FileFacts {
            converter: &parsed.converter,
            scopes: vec![ScopeInfo {
                parent: None,
                name: None,
            }],
            bindings: Vec::new(),
            references: Vec::new(),
            properties: Vec::new(),
        };
        walk_module(&parsed.module, FlowCtx::default(), |node, role, ctx| {
            facts.visit(node, role, ctx)
        });
        facts.references.sort_by_key(|r| r.offset);
        facts
    }

    fn offset(&self, pos: BytePos) -> usize {
        self.converter.offset(pos)
    }

    fn line(&self, pos: BytePos) -> usize {
        self.converter.line(pos)
    }

    fn visit(&mut self, node: &Node<'a>, role: Role, ctx: &FlowCtx<'a>) -> Option<FlowCtx<'a>> {
        let mut here = ctx.clone();
        match role {
            Role::Argument | Role::FirstFnArg => {
                here.site.call = here.pending_call.take();
                here.site.receiver_of = None;
            }
            Role::Callee => here.site.receiver_of = here.pending_call.take(),
            Role::Returned => {
                here.site.in_return = true;
                here.pending_call = None;
            }
            Role::Rendered => {
                here.site.in_jsx = true;
                here.pending_call = None;
            }
            _ => here.pending_call = None,
        }
        if role != Role::Init {
            here.binding_name = None;
        }

        match node {
            Node::Callable(callable) => {
                let name = callable.name.clone().or_else(|| here.binding_name.clone());
                self.scopes.push(ScopeInfo {
                    parent: Some(here.scope),
                    name,
                });
                return Some(FlowCtx {
                    scope: self.scopes.len() - 1,
                    ..FlowCtx::default()
                });
            }
            Node::Declarator(d) => {
                let d: &'a VarDeclarator = *d;
                let ident = match &d.name {
                    Pat::Ident(binding) => Some(&binding.id),
                    _ => None,
                };
                here.binding_name = ident.map(|i| i.sym.as_ref().to_string());
                here.decl_init = d.init.as_deref();
                here.decl_destructured = ident.is_none();
                here.site.declared_into =
                    ident.map(|i| (i.sym.as_ref().to_string(), self.offset(i.span.lo)));
            }
            Node::Stmt(stmt) => {
                let stmt: &'a Stmt = *stmt;
                match stmt {
                    Stmt::ForOf(s) => here.for_rhs = Some(&*s.right),
                    Stmt::ForIn(s) => here.for_rhs = Some(&*s.right),
                    _ => {}
                }
            }
            Node::Import(import) => {
                let import: &'a ImportDecl = *import;
                self.record_import(import, here.scope);
            }
            Node::Prop(Prop::KeyValue(kv)) if prop_name(&kv.key).as_deref() == Some("body") => {
                here.site.in_body = true;
            }
            Node::Expr(expr) => {
                let expr: &'a Expr = *expr;
                self.visit_expr(expr, role, &mut here);
            }
            Node::Binding(ident) => self.record_binding(ident, role, &here),
            Node::Ref(ident) => self.record_reference(ident, false, &here),
            _ => {}
        }
        Some(here)
    }

    fn visit_expr(&mut self, expr: &'a Expr, role: Role, here: &mut FlowCtx<'a>) {
        match expr {
            Expr::Call(call) => {
                if let Callee::Expr(callee) = &call.callee {
                    here.pending_call = Some(self.call_site(callee));
                }
            }
            Expr::New(new) => here.pending_call = Some(self.call_site(&new.callee)),
            Expr::OptChain(chain) => {
                if let OptChainBase::Call(call) = &*chain.base {
                    here.pending_call = Some(self.call_site(&call.callee));
                }
            }
            Expr::Assign(assign) => {
                here.assign_rhs = match assign.op {
                    AssignOp::Assign => Some((&*assign.right, self.offset(assign.span.hi))),
                    _ => None,
                };
            }
            Expr::Ident(ident) => self.record_reference(ident, role == Role::Target, here),
            Expr::Member(member) => {
                if let MemberProp::Ident(prop) = &member.prop {
                    self.properties.push(PropertyHit {
                        name: prop.sym.as_ref().to_string(),
                        offset: self.offset(prop.span.lo),
                        line: self.line(prop.span.lo),
                    });
                }
            }
            _ => {}
        }
    }

    fn call_site(&self, callee: &Expr) -> CallSite {
        let text: String = self
            .converter
            .text(callee.span())
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '?')
            .collect();
        CallSite { callee: text }
    }

    fn record_import(&mut self, import: &ImportDecl, scope: usize) {
        let module = import.src.value.as_str().unwrap_or("").to_string();
        for specifier in &import.specifiers {
            let local = match specifier {
                ImportSpecifier::Named(named) => &named.local,
                ImportSpecifier::Default(default) => &default.local,
                ImportSpecifier::Namespace(namespace) => &namespace.local,
            };
            let offset = self.offset(local.span.lo);
            self.bindings.push(Binding {
                name: local.sym.as_ref().to_string(),
                offset,
                visible_from: 0,
                line: self.line(local.span.lo),
                scope,
                kind: BindingKind::Import {
                    module: module.clone(),
                },
            });
        }
    }

    fn record_binding(&mut self, ident: &Ident, role: Role, here: &FlowCtx<'a>) {
        let offset = self.offset(ident.span.lo);
        let mut visible_from = offset;
        let kind = match role {
            Role::Param => BindingKind::Param,
            Role::CatchParam => BindingKind::Catch,
            Role::Declare => BindingKind::Declare {
                init: here.decl_init,
                destructured: here.decl_destructured,
            },
            Role::ForBinding => match here.for_rhs {
                Some(rhs) => BindingKind::ForOf { rhs },
                None => BindingKind::Declare {
                    init: None,
                    destructured: false,
                },
            },
            Role::Target => {
                self.record_reference(ident, true, here);
                match (here.assign_rhs, here.for_rhs) {
                    (Some((rhs, end)), _) => {
                        visible_from = end;
                        BindingKind::Assign { rhs }
                    }
                    (None, Some(rhs)) => BindingKind::ForOf { rhs },
                    (None, None) => return,
                }
            }
            _ => return,
        };
        self.bindings.push(Binding {
            name: ident.sym.as_ref().to_string(),
            offset,
            visible_from,
            line: self.line(ident.span.lo),
            scope: here.scope,
            kind,
        });
    }

    fn record_reference(&mut self, ident: &Ident, reassign: bool, here: &FlowCtx<'a>) {
        self.references.push(Reference {
            name: ident.sym.as_ref().to_string(),
            offset: self.offset(ident.span.lo),
            line: self.line(ident.span.lo),
            scope: here.scope,
            reassign,
            site: here.site.clone(),
        });
    }

    /// Earliest occurrence of `name` on `line`, properties last
    fn locate(&self, name: &str, line: usize) -> Option<Occurrence> {
        let binding = self
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.name == name && b.line == line)
            .map(|(i, b)| (b.offset, Occurrence::Binding(i)));
        let reference = self
            .references
            .iter()
            .enumerate()
            .filter(|(_, r)| r.name == name && r.line == line && !r.reassign)
            .map(|(i, r)| (r.offset, Occurrence::Reference(i)));
        binding
            .chain(reference)
            .min_by_key(|(offset, _)| *offset)
            .map(|(_, occurrence)| occurrence)
            .or_else(|| {
                self.properties
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.name == name && p.line == line)
                    .min_by_key(|(_, p)| p.offset)
                    .map(|(i, _)| Occurrence::Property(i))
            })
    }

    /// Binding a read of `name` at `offset` inside `scope` sees
    fn resolve(&self, name: &str, scope: usize, offset: usize) -> Option<usize> {
        let mut current = Some(scope);
        let mut innermost = true;
        while let Some(s) = current {
            let candidates = || {
                self.bindings
                    .iter()
                    .enumerate()
                    .filter(move |(_, b)| b.name == name && b.scope == s)
            };
            let visible = candidates()
                .filter(|(_, b)| b.visible_from <= offset || matches!(b.kind, BindingKind::Import { .. }))
                .max_by_key(|(_, b)| b.visible_from)
                .map(|(i, _)| i);
            // closures may read outer variables declared after them
            let hoisted = || {
                candidates()
                    .filter(|(_, b)| !matches!(b.kind, BindingKind::Assign { .. }))
                    .min_by_key(|(_, b)| b.offset)
                    .map(|(i, _)| i)
            };
            let found = if innermost { visible } else { visible.or_else(hoisted) };
            if found.is_some() {
                return found;
            }
            innermost = false;
            current = self.scopes[s].parent;
        }
        None
    }

    fn binding_of(&self, occurrence: &Occurrence) -> Option<usize> {
        match *occurrence {
            Occurrence::Binding(i) => Some(i),
            Occurrence::Reference(i) => {
                let r = &self.references[i];
                self.resolve(&r.name, r.scope, r.offset)
            }
            Occurrence::Property(_) => None,
        }
    }

    fn scope_is_component(&self, scope: usize) -> bool {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(name) = &self.scopes[s].name {
                let local = name.rsplit('.').next().unwrap_or(name);
                return local.chars().next().is_some_and(|c| c.is_ascii_uppercase());
            }
            current = self.scopes[s].parent;
        }
        false
    }

    fn is_within(&self, scope: usize, ancestor: usize) -> bool {
        let mut current = Some(scope);
        while let Some(s) = current {
            if s == ancestor {
                return true;
            }
            current = self.scopes[s].parent;
        }
        false
    }

    fn target_type(&self, occurrence: &Occurrence) -> TargetType {
        if let Occurrence::Property(_) = occurrence {
            return TargetType::Property;
        }
        let Some(binding) = self.binding_of(occurrence).map(|i| &self.bindings[i]) else {
            return TargetType::Variable;
        };
        match &binding.kind {
            BindingKind::Param if self.scope_is_component(binding.scope) => TargetType::Props,
            BindingKind::Param => TargetType::Parameter,
            BindingKind::Declare { init: Some(init), .. } if is_state_hook(init) => TargetType::State,
            BindingKind::Declare {
                init: Some(init),
                destructured,
            } => {
                let text = self.converter.text(init.span());
                if text == "props" || (*destructured && text.starts_with("props")) || text.starts_with("props.") {
                    TargetType::Props
                } else {
                    TargetType::Variable
                }
            }
            _ => TargetType::Variable,
        }
    }

    fn trace_backward(&self, occurrence: &Occurrence, path: &str) -> Vec<DataSource> {
        let mut sources = Vec::new();
        let Some(mut current) = self.binding_of(occurrence) else {
            return sources;
        };
        let mut visited = Vec::new();

        for _ in 0..=MAX_ALIAS_HOPS {
            if visited.contains(&current) {
                break;
            }
            visited.push(current);
            let binding = &self.bindings[current];
            let origin = match &binding.kind {
                BindingKind::Param => {
                    sources.push(DataSource::parameter(&binding.name, path, binding.line));
                    break;
                }
                BindingKind::Import { module } => {
                    sources.push(DataSource::new(
                        SourceKind::Import,
                        module.as_str(),
                        path,
                        binding.line,
                        format!("import {} from '{}'", binding.name, module),
                    ));
                    break;
                }
                BindingKind::Catch => {
                    sources.push(DataSource::new(
                        SourceKind::Computed,
                        binding.name.as_str(),
                        path,
                        binding.line,
                        format!("catch ({})", binding.name),
                    ));
                    break;
                }
                BindingKind::Declare { init: None, .. } => break,
                BindingKind::Declare { init: Some(expr), .. }
                | BindingKind::Assign { rhs: expr }
                | BindingKind::ForOf { rhs: expr } => (expr, self.classify_origin(expr)),
            };
            match origin {
                (expr, Origin::Source(kind)) => {
                    sources.push(DataSource::new(
                        kind,
                        binding.name.as_str(),
                        path,
                        binding.line,
                        self.converter.text(expr.span()),
                    ));
                    break;
                }
                (_, Origin::Alias(next)) => match self.resolve(&next, binding.scope, binding.offset) {
                    Some(next) => current = next,
                    None => break,
                },
            }
        }
        sources
    }

    fn classify_origin(&self, expr: &Expr) -> Origin {
        if is_state_hook(expr) {
            return Origin::Source(SourceKind::State);
        }
        let text = self.converter.text(expr.span());
        if text.contains("e.target.value") || text.contains("event.target") {
            return Origin::Source(SourceKind::UserInput);
        }
        if text.contains("fetch") || text.contains("axios") || text.contains(".json()") {
            return Origin::Source(SourceKind::ApiResponse);
        }
        if text.contains("supabase") || text.contains(".from(") || text.contains(".select(") {
            return Origin::Source(SourceKind::Database);
        }
        if text.contains("localStorage") || text.contains("sessionStorage") {
            return Origin::Source(SourceKind::LocalStorage);
        }
        if text.contains("useParams") || text.contains("searchParams") || text.contains("query") {
            return Origin::Source(SourceKind::UrlParam);
        }

        match unwrap_value(expr) {
            Expr::Ident(ident) if ident.sym.as_ref() == "undefined" => Origin::Source(SourceKind::Constant),
            Expr::Ident(ident) => Origin::Alias(ident.sym.as_ref().to_string()),
            Expr::Member(member) => match member_root(member) {
                Some(root) => Origin::Alias(root),
                None => Origin::Source(SourceKind::Computed),
            },
            Expr::Lit(_) | Expr::Array(_) | Expr::Object(_) => Origin::Source(SourceKind::Constant),
            Expr::Tpl(tpl) if tpl.exprs.is_empty() => Origin::Source(SourceKind::Constant),
            _ => Origin::Source(SourceKind::Computed),
        }
    }

    fn trace_forward(&self, occurrence: &Occurrence, path: &str, out: &mut ForwardTrace) {
        match *occurrence {
            Occurrence::Binding(i) => self.forward_from(Some(i), i, path, 0, out),
            Occurrence::Reference(i) => {
                let r = &self.references[i];
                let binding = self.resolve(&r.name, r.scope, r.offset);
                self.forward_from_reference(binding, i, path, 0, out);
            }
            Occurrence::Property(_) => {}
        }
    }

    fn forward_from(&self, binding: Option<usize>, index: usize, path: &str, depth: usize, out: &mut ForwardTrace) {
        let b = &self.bindings[index];
        if out.followed.contains(&index) {
            return;
        }
        out.followed.push(index);
        self.forward_uses(binding, &b.name, b.scope, b.offset, None, path, depth, out);
    }

    fn forward_from_reference(
        &self,
        binding: Option<usize>,
        index: usize,
        path: &str,
        depth: usize,
        out: &mut ForwardTrace,
    ) {
        let r = &self.references[index];
        self.forward_uses(binding, &r.name, r.scope, r.offset, Some(index), path, depth, out);
    }

    #[allow(clippy::too_many_arguments)]
    fn forward_uses(
        &self,
        binding: Option<usize>,
        name: &str,
        scope: usize,
        from: usize,
        start: Option<usize>,
        path: &str,
        depth: usize,
        out: &mut ForwardTrace,
    ) {
        for (index, r) in self.references.iter().enumerate() {
            let at_start = start == Some(index);
            if r.name != name || (r.offset <= from && !at_start) {
                continue;
            }
            let resolved = self.resolve(&r.name, r.scope, r.offset);
            if resolved != binding || (binding.is_none() && !self.is_within(r.scope, scope)) {
                continue;
            }
            if r.reassign {
                if at_start {
                    continue;
                }
                break;
            }
            self.classify_use(r, path, out);

            if let Some((next, next_offset)) = &r.site.declared_into {
                if next != name && depth < MAX_FOLLOW_DEPTH {
                    if let Some(next_index) = self
                        .bindings
                        .iter()
                        .position(|b| &b.name == next && b.offset == *next_offset)
                    {
                        self.forward_from(Some(next_index), next_index, path, depth + 1, out);
                    }
                }
            }
        }
    }

    fn classify_use(&self, r: &Reference, path: &str, out: &mut ForwardTrace) {
        let call = r.site.call.as_ref();
        let callee = call.map(|c| c.callee.as_str()).unwrap_or("");
        let local = call.map(CallSite::local_name).unwrap_or("");

        let from_call = if call.is_none() {
            None
        } else if local == "fetch" || callee.starts_with("axios") {
            Some(DestinationKind::ApiRequest)
        } else if callee.contains("supabase") || matches!(local, "insert" | "update" | "upsert") {
            Some(DestinationKind::Database)
        } else if callee.ends_with("localStorage.setItem") || callee.ends_with("sessionStorage.setItem") {
            Some(DestinationKind::LocalStorage)
        } else if is_state_setter(local) {
            Some(DestinationKind::State)
        } else if callee.starts_with("console.") {
            Some(DestinationKind::Log)
        } else {
            None
        };
        let from_context = if r.site.in_body {
            Some(DestinationKind::ApiRequest)
        } else if r.site.in_jsx || (r.site.in_return && self.scope_is_component(r.scope)) {
            Some(DestinationKind::UiDisplay)
        } else {
            None
        };

        match (from_call, from_context) {
            (Some(kind), _) => out.add_destination(DataDestination::new(kind, callee, path, r.line, callee)),
            (None, Some(kind)) => {
                if call.is_some() {
                    out.add_transformation(local, path, r.line);
                }
                let label = match kind {
                    DestinationKind::ApiRequest => "body",
                    _ => "JSX",
                };
                out.add_destination(DataDestination::new(kind, label, path, r.line, r.name.as_str()));
            }
            (None, None) => {
                if call.is_some() && !local.is_empty() {
                    out.add_transformation(local, path, r.line);
                }
            }
        }

        if let Some(method) = &r.site.receiver_of {
            if method.callee != r.name {
                out.add_transformation(method.local_name(), path, r.line);
            }
        }
    }
}

fn unwrap_value(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(e) => unwrap_value(&e.expr),
        Expr::Await(e) => unwrap_value(&e.arg),
        Expr::TsAs(e) => unwrap_value(&e.expr),
        Expr::TsNonNull(e) => unwrap_value(&e.expr),
        Expr::TsSatisfies(e) => unwrap_value(&e.expr),
        Expr::TsConstAssertion(e) => unwrap_value(&e.expr),
        Expr::TsTypeAssertion(e) => unwrap_value(&e.expr),
        _ => expr,
    }
}

/// Root identifier of `a.b.c`, `None` for `this.x` and call results
fn member_root(member: &MemberExpr) -> Option<String> {
    let mut obj = &*member.obj;
    loop {
        match unwrap_value(obj) {
            Expr::Member(inner) => obj = &*inner.obj,
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(inner) => obj = &*inner.obj,
                OptChainBase::Call(_) => return None,
            },
            Expr::Ident(ident) => return Some(ident.sym.as_ref().to_string()),
            _ => return None,
        }
    }
}

/// `useState(..)`, `useReducer(..)` or their `React.` forms
fn is_state_hook(expr: &Expr) -> bool {
    let Expr::Call(call) = unwrap_value(expr) else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let name = match &**callee {
        Expr::Ident(ident) => ident.sym.as_ref(),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => prop.sym.as_ref(),
            _ => return false,
        },
        _ => return false,
    };
    matches!(name, "useState" | "useReducer")
}

/// `setName`, `setIsOpen`
fn is_state_setter(name: &str) -> bool {
    name.strip_prefix("set")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use causal_core::data_flow::FlowDirection;

    const PROFILE_FORM: &str = r#"import { formatName } from './utils';

export function ProfileForm({ initialName }: { initialName: string }) {
  const [name, setName] = useState(initialName);
  const handleChange = (e) => {
    const value = e.target.value;
    const trimmed = value.trim();
    setName(trimmed);
  };
  const save = async () => {
    await fetch('/api/profile', { method: 'POST', body: JSON.stringify({ name }) });
    localStorage.setItem('name', name);
    console.log(name);
  };
  return <input value={formatName(name)} onChange={handleChange} />;
}
"#;

    fn trace(content: &str, identifier: &str, line: usize) -> DataFlowResult {
        let query = DataFlowQuery::new(identifier, "src/components/ProfileForm.tsx", line);
        analyze_data_flow(content, "src/components/ProfileForm.tsx", &query)
    }

    #[test]
    fn test_user_input_flows_into_state_setter() {
        let result = trace(PROFILE_FORM, "value", 6);
        assert!(result.found);
        assert_eq!(result.target.target_type, TargetType::Variable);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].kind, SourceKind::UserInput);

        let functions: Vec<&str> = result
            .transformations
            .iter()
            .map(|t| t.function_name.as_str())
            .collect();
        assert_eq!(functions, vec!["trim"]);
        assert_eq!(result.destinations.len(), 1);
        assert_eq!(result.destinations[0].kind, DestinationKind::State);
        assert_eq!(result.destinations[0].line, 8);
    }

    #[test]
    fn test_state_value_reaches_every_sink() {
        let result = trace(PROFILE_FORM, "name", 4);
        assert_eq!(result.target.target_type, TargetType::State);
        assert_eq!(result.sources[0].kind, SourceKind::State);

        let sinks: Vec<(DestinationKind, usize)> =
            result.destinations.iter().map(|d| (d.kind, d.line)).collect();
        assert_eq!(
            sinks,
            vec![
                (DestinationKind::ApiRequest, 11),
                (DestinationKind::LocalStorage, 12),
                (DestinationKind::Log, 13),
                (DestinationKind::UiDisplay, 15),
            ]
        );
        assert!(result
            .transformations
            .iter()
            .any(|t| t.function_name == "formatName" && t.line == 15));
    }

    #[test]
    fn test_component_parameters_are_props() {
        let result = trace(PROFILE_FORM, "initialName", 3);
        assert_eq!(result.target.target_type, TargetType::Props);
        assert_eq!(result.sources[0].line, 3);
    }

    #[test]
    fn test_backward_follows_aliases_to_api_response() {
        let source = "export async function loadUser(id: string) {\n  const response = await fetch(`/api/users/${id}`);\n  const data = await response.json();\n  const user = data;\n  return user;\n}\n";
        let result = trace(source, "user", 4);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].kind, SourceKind::ApiResponse);
        assert_eq!(result.sources[0].line, 3);

        let id = trace(source, "id", 1);
        assert_eq!(id.target.target_type, TargetType::Parameter);
        assert_eq!(id.destinations.len(), 1);
        assert_eq!(id.destinations[0].kind, DestinationKind::ApiRequest);
        assert_eq!(id.destinations[0].line, 2);
    }

    #[test]
    fn test_reassignment_ends_forward_trace() {
        let source = "function run() {\n  let total = 0;\n  console.log(total);\n  total = compute();\n  console.log(total);\n}\n";
        let result = trace(source, "total", 2);
        assert_eq!(result.sources[0].kind, SourceKind::Constant);
        let lines: Vec<usize> = result.destinations.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![3]);

        let later = trace(source, "total", 5);
        assert_eq!(later.sources[0].kind, SourceKind::Computed);
        assert_eq!(later.sources[0].line, 4);
    }

    #[test]
    fn test_shadowed_names_are_not_followed() {
        let source = "function outer(token) {\n  console.log(token);\n  const inner = (token) => localStorage.setItem('t', token);\n  return inner;\n}\n";
        let result = trace(source, "token", 1);
        let kinds: Vec<DestinationKind> = result.destinations.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DestinationKind::Log]);
    }

    #[test]
    fn test_imports_and_directions() {
        let source = "import { config } from './config';\nexport function read() {\n  const url = config.apiUrl;\n  console.log(url);\n}\n";
        let query = DataFlowQuery::new("url", "src/read.ts", 3).with_direction(FlowDirection::Backward);
        let result = analyze_data_flow(source, "src/read.ts", &query);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].kind, SourceKind::Import);
        assert_eq!(result.sources[0].name, "./config");
        assert!(result.destinations.is_empty());

        let query = DataFlowQuery::new("url", "src/read.ts", 3).with_direction(FlowDirection::Forward);
        let result = analyze_data_flow(source, "src/read.ts", &query);
        assert!(result.sources.is_empty());
        assert_eq!(result.destinations.len(), 1);
    }

    #[test]
    fn test_property_targets() {
        let source = "function show(user) {\n  console.log(user.email);\n}\n";
        let result = trace(source, "email", 2);
        assert!(result.found);
        assert_eq!(result.target.target_type, TargetType::Property);
    }

    #[test]
    fn test_missing_identifier_or_file() {
        let result = trace(PROFILE_FORM, "nothing", 4);
        assert!(!result.found);
        assert!(result.story.summary.contains("not found at line 4"));

        let files = vec![SourceFile::new("src/components/ProfileForm.tsx", PROFILE_FORM)];
        let query = DataFlowQuery::new("name", "src/other.tsx", 4);
        let result = analyze_data_flow_from_files(&files, &query);
        assert!(!result.found);
        assert!(result.story.summary.starts_with("File not found"));

        let query = DataFlowQuery::new("name", "components/ProfileForm.tsx", 4);
        assert!(analyze_data_flow_from_files(&files, &query).found);
    }

    #[test]
    fn test_unparsable_file_is_not_found() {
        let result = trace("const = ;", "x", 1);
        assert!(!result.found);
        assert!(result.story.summary.starts_with("Failed to parse"));
    }

    #[test]
    fn test_path_matching() {
        assert!(same_file("src/a.ts", "./src/a.ts"));
        assert!(same_file("web/src/a.ts", "src/a.ts"));
        assert!(!same_file("src/data.ts", "a.ts"));
    }
}
