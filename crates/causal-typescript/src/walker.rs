//! Iterative pre-order traversal over swc modules.
//!
//! Deeply nested JSX and long promise chains make recursive visitors blow the
//! stack, so the walk keeps its own work list. Each node is handed to the
//! visitor together with the [`Role`] it plays in its parent; the visitor
//! returns the context its children see, or `None` to skip the subtree.

use swc_common::{Span, Spanned};
use swc_ecma_ast::*;

/// Position of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Other,
    /// Declaration under `export`
    Exported,
    /// `export default <expr>` or an anonymous default declaration
    ExportDefault,
    /// Condition of an `if`/loop/ternary
    Test,
    /// Code that only runs on one side of a condition
    Branch,
    Callee,
    Argument,
    /// First function-valued argument of a call
    FirstFnArg,
    Awaited,
    /// Initializer of a declarator or class field
    Init,
    Returned,
    /// Expression rendered inside JSX
    Rendered,
    Param,
    Declare,
    CatchParam,
    ForBinding,
    /// Left side of an assignment or update
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableShape {
    Declaration,
    Expression,
    Arrow,
    Method,
    Getter,
    Setter,
    Constructor,
}

impl CallableShape {
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            CallableShape::Method | CallableShape::Getter | CallableShape::Setter | CallableShape::Constructor
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CallableBody<'a> {
    Function(&'a Function),
    Arrow(&'a ArrowExpr),
    Constructor(&'a Constructor),
    Getter(&'a GetterProp),
    Setter(&'a SetterProp),
}

/// Any function-like construct, normalised
#[derive(Debug, Clone)]
pub struct Callable<'a> {
    pub name: Option<String>,
    pub shape: CallableShape,
    pub body: CallableBody<'a>,
}

impl<'a> Callable<'a> {
    pub fn is_async(&self) -> bool {
        match self.body {
            CallableBody::Function(f) => f.is_async,
            CallableBody::Arrow(a) => a.is_async,
            _ => false,
        }
    }

    pub fn span(&self) -> Span {
        match self.body {
            CallableBody::Function(f) => f.span,
            CallableBody::Arrow(a) => a.span,
            CallableBody::Constructor(c) => c.span,
            CallableBody::Getter(g) => g.span,
            CallableBody::Setter(s) => s.span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node<'a> {
    Stmt(&'a Stmt),
    Decl(&'a Decl),
    Import(&'a ImportDecl),
    Declarator(&'a VarDeclarator),
    Callable(Callable<'a>),
    Class(&'a Class, Option<&'a Ident>),
    /// Class property with an initializer
    Field { key: String, span: Span, value: &'a Expr },
    Expr(&'a Expr),
    Prop(&'a Prop),
    Pat(&'a Pat),
    /// Identifier introduced by a pattern or assignment target
    Binding(&'a Ident),
    /// Identifier read through a shorthand property
    Ref(&'a Ident),
    Jsx(&'a JSXElement),
}

/// Walks every item of `module` in source order
pub fn walk_module<'a, C, F>(module: &'a Module, ctx: C, visit: F)
where
    C: Clone,
    F: FnMut(&Node<'a>, Role, &C) -> Option<C>,
{
    let mut roots = Vec::new();
    for item in &module.body {
        push_item(item, &mut roots);
    }
    walk(roots, ctx, visit);
}

pub fn walk<'a, C, F>(roots: Vec<(Node<'a>, Role)>, ctx: C, mut visit: F)
where
    C: Clone,
    F: FnMut(&Node<'a>, Role, &C) -> Option<C>,
{
    let mut stack: Vec<(Node<'a>, Role, C)> = roots
        .into_iter()
        .rev()
        .map(|(node, role)| (node, role, ctx.clone()))
        .collect();
    let mut children = Vec::new();

    while let Some((node, role, ctx)) = stack.pop() {
        let Some(child_ctx) = visit(&node, role, &ctx) else {
            continue;
        };
        push_children(&node, role, &mut children);
        for (child, child_role) in children.drain(..).rev() {
            stack.push((child, child_role, child_ctx.clone()));
        }
    }
}

/// Name of a property key, `None` for computed keys
pub fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(i) => Some(i.sym.as_ref().to_string()),
        PropName::Str(s) => Some(s.value.as_str().unwrap_or("").to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        PropName::Computed(_) | PropName::BigInt(_) => None,
    }
}

fn push_item<'a>(item: &'a ModuleItem, out: &mut Vec<(Node<'a>, Role)>) {
    match item {
        ModuleItem::Stmt(stmt) => out.push((Node::Stmt(stmt), Role::Other)),
        ModuleItem::ModuleDecl(decl) => match decl {
            ModuleDecl::Import(import) => out.push((Node::Import(import), Role::Other)),
            ModuleDecl::ExportDecl(export) => out.push((Node::Decl(&export.decl), Role::Exported)),
            ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                DefaultDecl::Fn(f) => out.push((
                    Node::Callable(Callable {
                        name: f.ident.as_ref().map(|i| i.sym.as_ref().to_string()),
                        shape: CallableShape::Expression,
                        body: CallableBody::Function(&f.function),
                    }),
                    Role::ExportDefault,
                )),
                DefaultDecl::Class(c) => {
                    out.push((Node::Class(&c.class, c.ident.as_ref()), Role::ExportDefault))
                }
                DefaultDecl::TsInterfaceDecl(_) => {}
            },
            ModuleDecl::ExportDefaultExpr(export) => {
                out.push((Node::Expr(&export.expr), Role::ExportDefault))
            }
            _ => {}
        },
    }
}

fn push_children<'a>(node: &Node<'a>, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    match node {
        Node::Stmt(stmt) => push_stmt(*stmt, out),
        Node::Decl(decl) => push_decl(*decl, role, out),
        Node::Import(_) | Node::Binding(_) | Node::Ref(_) => {}
        Node::Declarator(d) => {
            let d: &'a VarDeclarator = *d;
            out.push((Node::Pat(&d.name), Role::Declare));
            if let Some(init) = &d.init {
                out.push((Node::Expr(init), Role::Init));
            }
        }
        Node::Callable(callable) => push_callable(callable, out),
        Node::Class(class, _) => push_class(*class, out),
        Node::Field { value, .. } => out.push((Node::Expr(*value), Role::Init)),
        Node::Expr(expr) => push_expr(*expr, role, out),
        Node::Prop(prop) => push_prop(*prop, out),
        Node::Pat(pat) => push_pat(*pat, role, out),
        Node::Jsx(element) => push_jsx(*element, out),
    }
}

fn push_block<'a>(stmts: &'a [Stmt], role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    out.extend(stmts.iter().map(|s| (Node::Stmt(s), role)));
}

fn push_var_decl<'a>(decl: &'a VarDecl, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    out.extend(decl.decls.iter().map(|d| (Node::Declarator(d), role)));
}

fn push_stmt<'a>(stmt: &'a Stmt, out: &mut Vec<(Node<'a>, Role)>) {
    match stmt {
        Stmt::Block(block) => push_block(&block.stmts, Role::Other, out),
        Stmt::With(s) => {
            out.push((Node::Expr(&s.obj), Role::Other));
            out.push((Node::Stmt(&s.body), Role::Other));
        }
        Stmt::Return(s) => {
            if let Some(arg) = &s.arg {
                out.push((Node::Expr(arg), Role::Returned));
            }
        }
        Stmt::Labeled(s) => out.push((Node::Stmt(&s.body), Role::Other)),
        Stmt::If(s) => {
            out.push((Node::Expr(&s.test), Role::Test));
            out.push((Node::Stmt(&s.cons), Role::Branch));
            if let Some(alt) = &s.alt {
                out.push((Node::Stmt(alt), Role::Branch));
            }
        }
        Stmt::Switch(s) => {
            out.push((Node::Expr(&s.discriminant), Role::Test));
            for case in &s.cases {
                if let Some(test) = &case.test {
                    out.push((Node::Expr(test), Role::Branch));
                }
                push_block(&case.cons, Role::Branch, out);
            }
        }
        Stmt::Throw(s) => out.push((Node::Expr(&s.arg), Role::Other)),
        Stmt::Try(s) => {
            push_block(&s.block.stmts, Role::Other, out);
            if let Some(handler) = &s.handler {
                if let Some(param) = &handler.param {
                    out.push((Node::Pat(param), Role::CatchParam));
                }
                push_block(&handler.body.stmts, Role::Other, out);
            }
            if let Some(finalizer) = &s.finalizer {
                push_block(&finalizer.stmts, Role::Other, out);
            }
        }
        Stmt::While(s) => {
            out.push((Node::Expr(&s.test), Role::Test));
            out.push((Node::Stmt(&s.body), Role::Other));
        }
        Stmt::DoWhile(s) => {
            out.push((Node::Stmt(&s.body), Role::Other));
            out.push((Node::Expr(&s.test), Role::Test));
        }
        Stmt::For(s) => {
            match &s.init {
                Some(VarDeclOrExpr::VarDecl(decl)) => push_var_decl(decl, Role::Other, out),
                Some(VarDeclOrExpr::Expr(expr)) => out.push((Node::Expr(expr), Role::Other)),
                None => {}
            }
            if let Some(test) = &s.test {
                out.push((Node::Expr(test), Role::Test));
            }
            if let Some(update) = &s.update {
                out.push((Node::Expr(update), Role::Other));
            }
            out.push((Node::Stmt(&s.body), Role::Other));
        }
        Stmt::ForIn(s) => push_for_each(&s.left, &s.right, &s.body, out),
        Stmt::ForOf(s) => push_for_each(&s.left, &s.right, &s.body, out),
        Stmt::Decl(decl) => out.push((Node::Decl(decl), Role::Other)),
        Stmt::Expr(s) => out.push((Node::Expr(&s.expr), Role::Other)),
        _ => {}
    }
}

fn push_for_each<'a>(left: &'a ForHead, right: &'a Expr, body: &'a Stmt, out: &mut Vec<(Node<'a>, Role)>) {
    out.push((Node::Expr(right), Role::Other));
    match left {
        ForHead::VarDecl(decl) => {
            out.extend(decl.decls.iter().map(|d| (Node::Pat(&d.name), Role::ForBinding)))
        }
        ForHead::UsingDecl(decl) => {
            out.extend(decl.decls.iter().map(|d| (Node::Pat(&d.name), Role::ForBinding)))
        }
        ForHead::Pat(pat) => out.push((Node::Pat(pat), Role::Target)),
    }
    out.push((Node::Stmt(body), Role::Other));
}

fn push_decl<'a>(decl: &'a Decl, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    match decl {
        Decl::Fn(f) => out.push((
            Node::Callable(Callable {
                name: Some(f.ident.sym.as_ref().to_string()),
                shape: CallableShape::Declaration,
                body: CallableBody::Function(&f.function),
            }),
            role,
        )),
        Decl::Class(c) => out.push((Node::Class(&c.class, Some(&c.ident)), role)),
        Decl::Var(v) => push_var_decl(v, role, out),
        Decl::Using(u) => out.extend(u.decls.iter().map(|d| (Node::Declarator(d), role))),
        _ => {}
    }
}

fn push_params<'a>(params: &'a [Param], out: &mut Vec<(Node<'a>, Role)>) {
    out.extend(params.iter().map(|p| (Node::Pat(&p.pat), Role::Param)));
}

fn push_callable<'a>(callable: &Callable<'a>, out: &mut Vec<(Node<'a>, Role)>) {
    match callable.body {
        CallableBody::Function(f) => {
            push_params(&f.params, out);
            if let Some(body) = &f.body {
                push_block(&body.stmts, Role::Other, out);
            }
        }
        CallableBody::Arrow(a) => {
            out.extend(a.params.iter().map(|p| (Node::Pat(p), Role::Param)));
            match &*a.body {
                BlockStmtOrExpr::BlockStmt(block) => push_block(&block.stmts, Role::Other, out),
                BlockStmtOrExpr::Expr(expr) => out.push((Node::Expr(expr), Role::Returned)),
            }
        }
        CallableBody::Constructor(c) => {
            for param in &c.params {
                match param {
                    ParamOrTsParamProp::Param(p) => out.push((Node::Pat(&p.pat), Role::Param)),
                    ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                        TsParamPropParam::Ident(binding) => {
                            out.push((Node::Binding(&binding.id), Role::Param))
                        }
                        TsParamPropParam::Assign(assign) => {
                            out.push((Node::Pat(&assign.left), Role::Param));
                            out.push((Node::Expr(&assign.right), Role::Other));
                        }
                    },
                }
            }
            if let Some(body) = &c.body {
                push_block(&body.stmts, Role::Other, out);
            }
        }
        CallableBody::Getter(g) => {
            if let Some(body) = &g.body {
                push_block(&body.stmts, Role::Other, out);
            }
        }
        CallableBody::Setter(s) => {
            out.push((Node::Pat(&s.param), Role::Param));
            if let Some(body) = &s.body {
                push_block(&body.stmts, Role::Other, out);
            }
        }
    }
}

fn push_class<'a>(class: &'a Class, out: &mut Vec<(Node<'a>, Role)>) {
    if let Some(super_class) = &class.super_class {
        out.push((Node::Expr(super_class), Role::Other));
    }
    for member in &class.body {
        match member {
            ClassMember::Constructor(c) => out.push((
                Node::Callable(Callable {
                    name: Some("constructor".to_string()),
                    shape: CallableShape::Constructor,
                    body: CallableBody::Constructor(c),
                }),
                Role::Other,
            )),
            ClassMember::Method(m) => out.push((
                Node::Callable(Callable {
                    name: prop_name(&m.key),
                    shape: method_shape(m.kind),
                    body: CallableBody::Function(&m.function),
                }),
                Role::Other,
            )),
            ClassMember::PrivateMethod(m) => out.push((
                Node::Callable(Callable {
                    name: Some(format!("#{}", m.key.name)),
                    shape: method_shape(m.kind),
                    body: CallableBody::Function(&m.function),
                }),
                Role::Other,
            )),
            ClassMember::ClassProp(p) => {
                if let (Some(key), Some(value)) = (prop_name(&p.key), &p.value) {
                    out.push((Node::Field { key, span: p.span, value }, Role::Other));
                }
            }
            ClassMember::PrivateProp(p) => {
                if let Some(value) = &p.value {
                    out.push((
                        Node::Field {
                            key: format!("#{}", p.key.name),
                            span: p.span,
                            value,
                        },
                        Role::Other,
                    ));
                }
            }
            ClassMember::StaticBlock(block) => push_block(&block.body.stmts, Role::Other, out),
            _ => {}
        }
    }
}

fn method_shape(kind: MethodKind) -> CallableShape {
    match kind {
        MethodKind::Method => CallableShape::Method,
        MethodKind::Getter => CallableShape::Getter,
        MethodKind::Setter => CallableShape::Setter,
    }
}

fn push_args<'a>(args: &'a [ExprOrSpread], out: &mut Vec<(Node<'a>, Role)>) {
    let first_fn = args
        .iter()
        .position(|arg| matches!(&*arg.expr, Expr::Arrow(_) | Expr::Fn(_)));
    for (idx, arg) in args.iter().enumerate() {
        let role = if Some(idx) == first_fn {
            Role::FirstFnArg
        } else {
            Role::Argument
        };
        out.push((Node::Expr(&arg.expr), role));
    }
}

fn push_member<'a>(member: &'a MemberExpr, out: &mut Vec<(Node<'a>, Role)>) {
    out.push((Node::Expr(&member.obj), Role::Other));
    if let MemberProp::Computed(computed) = &member.prop {
        out.push((Node::Expr(&computed.expr), Role::Other));
    }
}

fn push_expr<'a>(expr: &'a Expr, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    match expr {
        Expr::Call(call) => {
            if let Callee::Expr(callee) = &call.callee {
                out.push((Node::Expr(callee), Role::Callee));
            }
            push_args(&call.args, out);
        }
        Expr::New(new) => {
            out.push((Node::Expr(&new.callee), Role::Callee));
            if let Some(args) = &new.args {
                push_args(args, out);
            }
        }
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => push_member(member, out),
            OptChainBase::Call(call) => {
                out.push((Node::Expr(&call.callee), Role::Callee));
                push_args(&call.args, out);
            }
        },
        Expr::Member(member) => push_member(member, out),
        Expr::SuperProp(s) => {
            if let SuperProp::Computed(computed) = &s.prop {
                out.push((Node::Expr(&computed.expr), Role::Other));
            }
        }
        Expr::Bin(bin) => {
            out.push((Node::Expr(&bin.left), Role::Other));
            let right_role = match bin.op {
                BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing => Role::Branch,
                _ => Role::Other,
            };
            out.push((Node::Expr(&bin.right), right_role));
        }
        Expr::Cond(cond) => {
            out.push((Node::Expr(&cond.test), Role::Test));
            out.push((Node::Expr(&cond.cons), Role::Branch));
            out.push((Node::Expr(&cond.alt), Role::Branch));
        }
        Expr::Assign(assign) => {
            match &assign.left {
                AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
                    out.push((Node::Binding(&binding.id), Role::Target))
                }
                AssignTarget::Simple(SimpleAssignTarget::Member(member)) => push_member(member, out),
                AssignTarget::Pat(AssignTargetPat::Array(array)) => push_array_pat(array, Role::Target, out),
                AssignTarget::Pat(AssignTargetPat::Object(object)) => {
                    push_object_pat(object, Role::Target, out)
                }
                _ => {}
            }
            out.push((Node::Expr(&assign.right), Role::Other));
        }
        Expr::Update(update) => out.push((Node::Expr(&update.arg), Role::Target)),
        Expr::Unary(unary) => out.push((Node::Expr(&unary.arg), Role::Other)),
        Expr::Seq(seq) => out.extend(seq.exprs.iter().map(|e| (Node::Expr(e), Role::Other))),
        Expr::Paren(paren) => out.push((Node::Expr(&paren.expr), role)),
        Expr::TsAs(e) => out.push((Node::Expr(&e.expr), role)),
        Expr::TsSatisfies(e) => out.push((Node::Expr(&e.expr), role)),
        Expr::TsNonNull(e) => out.push((Node::Expr(&e.expr), role)),
        Expr::TsConstAssertion(e) => out.push((Node::Expr(&e.expr), role)),
        Expr::TsTypeAssertion(e) => out.push((Node::Expr(&e.expr), role)),
        Expr::TsInstantiation(e) => out.push((Node::Expr(&e.expr), role)),
        Expr::Await(await_expr) => out.push((Node::Expr(&await_expr.arg), Role::Awaited)),
        Expr::Yield(yield_expr) => {
            if let Some(arg) = &yield_expr.arg {
                out.push((Node::Expr(arg), Role::Other));
            }
        }
        Expr::Array(array) => out.extend(
            array
                .elems
                .iter()
                .flatten()
                .map(|e| (Node::Expr(&e.expr), Role::Other)),
        ),
        Expr::Object(object) => {
            for prop in &object.props {
                match prop {
                    PropOrSpread::Spread(spread) => out.push((Node::Expr(&spread.expr), Role::Other)),
                    PropOrSpread::Prop(prop) => out.push((Node::Prop(prop), Role::Other)),
                }
            }
        }
        Expr::Fn(f) => out.push((
            Node::Callable(Callable {
                name: f.ident.as_ref().map(|i| i.sym.as_ref().to_string()),
                shape: CallableShape::Expression,
                body: CallableBody::Function(&f.function),
            }),
            role,
        )),
        Expr::Arrow(arrow) => out.push((
            Node::Callable(Callable {
                name: None,
                shape: CallableShape::Arrow,
                body: CallableBody::Arrow(arrow),
            }),
            role,
        )),
        Expr::Class(c) => out.push((Node::Class(&c.class, c.ident.as_ref()), role)),
        Expr::Tpl(tpl) => out.extend(tpl.exprs.iter().map(|e| (Node::Expr(e), Role::Other))),
        Expr::TaggedTpl(tagged) => {
            out.push((Node::Expr(&tagged.tag), Role::Other));
            out.extend(tagged.tpl.exprs.iter().map(|e| (Node::Expr(e), Role::Other)));
        }
        Expr::JSXElement(element) => out.push((Node::Jsx(element), role)),
        Expr::JSXFragment(fragment) => push_jsx_children(&fragment.children, out),
        _ => {}
    }
}

fn push_prop<'a>(prop: &'a Prop, out: &mut Vec<(Node<'a>, Role)>) {
    match prop {
        Prop::Shorthand(ident) => out.push((Node::Ref(ident), Role::Other)),
        Prop::KeyValue(kv) => {
            if let PropName::Computed(computed) = &kv.key {
                out.push((Node::Expr(&computed.expr), Role::Other));
            }
            out.push((Node::Expr(&kv.value), Role::Other));
        }
        Prop::Assign(assign) => out.push((Node::Expr(&assign.value), Role::Other)),
        Prop::Getter(getter) => out.push((
            Node::Callable(Callable {
                name: prop_name(&getter.key),
                shape: CallableShape::Getter,
                body: CallableBody::Getter(getter),
            }),
            Role::Other,
        )),
        Prop::Setter(setter) => out.push((
            Node::Callable(Callable {
                name: prop_name(&setter.key),
                shape: CallableShape::Setter,
                body: CallableBody::Setter(setter),
            }),
            Role::Other,
        )),
        Prop::Method(method) => out.push((
            Node::Callable(Callable {
                name: prop_name(&method.key),
                shape: CallableShape::Method,
                body: CallableBody::Function(&method.function),
            }),
            Role::Other,
        )),
    }
}

fn push_array_pat<'a>(array: &'a ArrayPat, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    out.extend(array.elems.iter().flatten().map(|p| (Node::Pat(p), role)));
}

fn push_object_pat<'a>(object: &'a ObjectPat, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    for prop in &object.props {
        match prop {
            ObjectPatProp::KeyValue(kv) => {
                if let PropName::Computed(computed) = &kv.key {
                    out.push((Node::Expr(&computed.expr), Role::Other));
                }
                out.push((Node::Pat(&kv.value), role));
            }
            ObjectPatProp::Assign(assign) => {
                out.push((Node::Binding(&assign.key.id), role));
                if let Some(value) = &assign.value {
                    out.push((Node::Expr(value), Role::Other));
                }
            }
            ObjectPatProp::Rest(rest) => out.push((Node::Pat(&rest.arg), role)),
        }
    }
}

fn push_pat<'a>(pat: &'a Pat, role: Role, out: &mut Vec<(Node<'a>, Role)>) {
    match pat {
        Pat::Ident(binding) => out.push((Node::Binding(&binding.id), role)),
        Pat::Array(array) => push_array_pat(array, role, out),
        Pat::Object(object) => push_object_pat(object, role, out),
        Pat::Rest(rest) => out.push((Node::Pat(&rest.arg), role)),
        Pat::Assign(assign) => {
            out.push((Node::Pat(&assign.left), role));
            out.push((Node::Expr(&assign.right), Role::Other));
        }
        Pat::Expr(expr) => out.push((Node::Expr(expr), Role::Target)),
        Pat::Invalid(_) => {}
    }
}

fn push_jsx<'a>(element: &'a JSXElement, out: &mut Vec<(Node<'a>, Role)>) {
    for attr in &element.opening.attrs {
        match attr {
            JSXAttrOrSpread::JSXAttr(attr) => match &attr.value {
                Some(JSXAttrValue::JSXExprContainer(container)) => {
                    if let JSXExpr::Expr(expr) = &container.expr {
                        out.push((Node::Expr(expr), Role::Rendered));
                    }
                }
                Some(JSXAttrValue::JSXElement(child)) => out.push((Node::Jsx(child), Role::Rendered)),
                Some(JSXAttrValue::JSXFragment(fragment)) => push_jsx_children(&fragment.children, out),
                _ => {}
            },
            JSXAttrOrSpread::SpreadElement(spread) => out.push((Node::Expr(&spread.expr), Role::Rendered)),
        }
    }
    push_jsx_children(&element.children, out);
}

fn push_jsx_children<'a>(children: &'a [JSXElementChild], out: &mut Vec<(Node<'a>, Role)>) {
    for child in children {
        match child {
            JSXElementChild::JSXExprContainer(container) => {
                if let JSXExpr::Expr(expr) = &container.expr {
                    out.push((Node::Expr(expr), Role::Rendered));
                }
            }
            JSXElementChild::JSXSpreadChild(spread) => out.push((Node::Expr(&spread.expr), Role::Rendered)),
            JSXElementChild::JSXElement(element) => out.push((Node::Jsx(element), Role::Rendered)),
            JSXElementChild::JSXFragment(fragment) => push_jsx_children(&fragment.children, out),
            JSXElementChild::JSXText(_) => {}
        }
    }
}

/// Span of any walker node
pub fn node_span(node: &Node<'_>) -> Span {
    match node {
        Node::Stmt(s) => s.span(),
        Node::Decl(d) => d.span(),
        Node::Import(i) => i.span,
        Node::Declarator(d) => d.span,
        Node::Callable(c) => c.span(),
        Node::Class(c, _) => c.span,
        Node::Field { span, .. } => *span,
        Node::Expr(e) => e.span(),
        Node::Prop(p) => p.span(),
        Node::Pat(p) => p.span(),
        Node::Binding(i) | Node::Ref(i) => i.span,
        Node::Jsx(j) => j.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TypeScriptParser;

    fn collect_callables(source: &str) -> Vec<(Option<String>, CallableShape, Role)> {
        let parsed = TypeScriptParser::new().parse_source(source, "src/a.tsx").unwrap();
        let mut found = Vec::new();
        walk_module(&parsed.module, (), |node, role, _| {
            if let Node::Callable(c) = node {
                found.push((c.name.clone(), c.shape, role));
            }
            Some(())
        });
        found
    }

    #[test]
    fn visits_callables_in_source_order() {
        let found = collect_callables(
            "export function a() { const b = () => 1; }\nclass C { m() {} }\nexport default () => null;",
        );
        assert_eq!(
            found,
            vec![
                (Some("a".to_string()), CallableShape::Declaration, Role::Exported),
                (None, CallableShape::Arrow, Role::Init),
                (Some("m".to_string()), CallableShape::Method, Role::Other),
                (None, CallableShape::Arrow, Role::ExportDefault),
            ]
        );
    }

    #[test]
    fn marks_first_function_argument() {
        let found = collect_callables("useEffect(() => {}, [a]); setTimeout(run, () => {}, function () {});");
        let roles: Vec<Role> = found.iter().map(|(_, _, role)| *role).collect();
        assert_eq!(roles, vec![Role::FirstFnArg, Role::FirstFnArg, Role::Argument]);
    }

    #[test]
    fn skipping_a_subtree_hides_its_children() {
        let parsed = TypeScriptParser::new()
            .parse_source("function outer() { function inner() {} }", "src/a.ts")
            .unwrap();
        let mut names = Vec::new();
        walk_module(&parsed.module, (), |node, _, _| match node {
            Node::Callable(c) => {
                names.push(c.name.clone().unwrap_or_default());
                None
            }
            _ => Some(()),
        });
        assert_eq!(names, vec!["outer"]);
    }

    #[test]
    fn walks_nested_jsx_without_recursion() {
        let source = format!(
            "export const Tree = () => {}<Leaf />{};",
            "<div>".repeat(200),
            "</div>".repeat(200)
        );
        let parsed = TypeScriptParser::new().parse_source(&source, "src/tree.tsx").unwrap();
        let mut elements = 0usize;
        walk_module(&parsed.module, (), |node, _, _| {
            if matches!(node, Node::Jsx(_)) {
                elements += 1;
            }
            Some(())
        });
        assert_eq!(elements, 201);
    }
}
