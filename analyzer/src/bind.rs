// bind.rs — Binder for sketch programs
//
// Walks the parsed AST and builds the semantic model: type and function
// namespaces, member tables, delegate invocation signatures, extension
// methods with positional visibility, and anonymous function registrations.
// Reports diagnostics for duplicate or unknown names. Binding continues
// past errors; unresolved slots stay `None`.
//
// Preconditions: `program` is a well-formed AST from the parser.
// Postconditions: returns the populated model plus all accumulated
//                 diagnostics.
// Failure modes: duplicate names, unknown type or function references,
//                type argument count mismatches produce `Diagnostic`
//                entries.
// Side effects: none.

use std::collections::HashMap;

use chumsky::span::Span as _;

use crate::ast::*;
use crate::diag::{codes, DiagCode, DiagLevel, Diagnostic};
use crate::id::{IdAllocator, MethodId, TypeId};
use crate::model::{
    Builtins, ExtensionMethod, MethodDef, ParamInfo, PropDef, SemanticModel, Signature, TypeDef,
    TypeKind,
};

// ── Public types ────────────────────────────────────────────────────────────

/// Result of binding.
#[derive(Debug)]
pub struct BindResult {
    pub model: SemanticModel,
    pub diagnostics: Vec<Diagnostic>,
}

// ── Public entry point ──────────────────────────────────────────────────────

/// Bind a parsed sketch program into a semantic model.
pub fn bind(program: &Program) -> BindResult {
    let mut ctx = BindCtx::new();

    // Pass 1: collect global declarations
    ctx.collect_globals(&program.items);
    ctx.check_collisions();

    // Pass 2: resolve signatures (member tables, invoke signatures,
    // extensions) now that every global name is known
    ctx.resolve_signatures(&program.items, None);

    // Pass 3: resolve function bodies (callees, lambda registration)
    ctx.resolve_bodies(&program.items);

    BindResult {
        model: ctx.model,
        diagnostics: ctx.diagnostics,
    }
}

// ── Internal context ────────────────────────────────────────────────────────

struct BindCtx {
    model: SemanticModel,
    diagnostics: Vec<Diagnostic>,
    id_alloc: IdAllocator,
    /// Name span of the winning declaration per type id, for duplicate
    /// messages and for skipping duplicate losers in later passes.
    type_spans: HashMap<TypeId, Span>,
    /// Constructed-type interning: (definition, args) → entry.
    constructed: HashMap<(TypeId, Vec<TypeId>), TypeId>,
}

impl BindCtx {
    fn new() -> Self {
        let mut ctx = BindCtx {
            model: SemanticModel {
                types: Vec::new(),
                methods: Vec::new(),
                props: Vec::new(),
                extensions: Vec::new(),
                functions: HashMap::new(),
                type_names: HashMap::new(),
                lambdas: HashMap::new(),
                builtins: Builtins {
                    void: TypeId(0),
                    boolean: TypeId(0),
                    int: TypeId(0),
                    float: TypeId(0),
                    string: TypeId(0),
                },
            },
            diagnostics: Vec::new(),
            id_alloc: IdAllocator::new(),
            type_spans: HashMap::new(),
            constructed: HashMap::new(),
        };
        ctx.model.builtins = Builtins {
            void: ctx.add_builtin("void"),
            boolean: ctx.add_builtin("bool"),
            int: ctx.add_builtin("int"),
            float: ctx.add_builtin("float"),
            string: ctx.add_builtin("string"),
        };
        ctx
    }

    fn add_builtin(&mut self, name: &str) -> TypeId {
        let id = self.add_type(|id| TypeDef {
            name: name.to_string(),
            kind: TypeKind::Builtin,
            original: id,
            arity: 0,
            type_args: Vec::new(),
            methods: Vec::new(),
            props: Vec::new(),
            invoke: None,
        });
        self.model.type_names.insert(name.to_string(), id);
        self.type_spans.insert(id, zero_span());
        id
    }

    fn add_type(&mut self, make: impl FnOnce(TypeId) -> TypeDef) -> TypeId {
        let id = self.id_alloc.alloc_type();
        let def = make(id);
        self.model.types.push(def);
        id
    }

    fn error(&mut self, code: DiagCode, span: Span, message: String) {
        self.diagnostics
            .push(Diagnostic::new(DiagLevel::Error, span, message).with_code(code));
    }

    // ── Pass 1: collect globals ─────────────────────────────────────────

    fn collect_globals(&mut self, items: &[Item]) {
        for item in items {
            match &item.kind {
                ItemKind::Type(t) => {
                    self.declare_type(&t.name, TypeKind::Named, t.type_params.len());
                }
                ItemKind::Delegate(d) => {
                    self.declare_type(&d.name, TypeKind::Delegate, d.type_params.len());
                }
                ItemKind::Fn(f) => self.declare_fn(f),
                ItemKind::Extend(_) => {}
                ItemKind::Scope(s) => self.collect_globals(&s.items),
            }
        }
    }

    fn declare_type(&mut self, name: &Ident, kind: TypeKind, arity: usize) {
        if let Some(&existing) = self.model.type_names.get(&name.name) {
            let first = self.type_spans[&existing];
            self.diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Error,
                    name.span,
                    format!(
                        "duplicate type '{}' (first defined at offset {})",
                        name.name, first.start
                    ),
                )
                .with_code(codes::E0001)
                .with_related(first, "first declared here"),
            );
            return;
        }
        let id = self.add_type(|id| TypeDef {
            name: name.name.clone(),
            kind,
            original: id,
            arity,
            type_args: Vec::new(),
            methods: Vec::new(),
            props: Vec::new(),
            invoke: None,
        });
        self.model.type_names.insert(name.name.clone(), id);
        self.type_spans.insert(id, name.span);
    }

    fn declare_fn(&mut self, f: &FnDecl) {
        if let Some(&existing) = self.model.functions.get(&f.name.name) {
            let first = self.model.method(existing).span;
            self.diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Error,
                    f.name.span,
                    format!(
                        "duplicate function '{}' (first defined at offset {})",
                        f.name.name, first.start
                    ),
                )
                .with_code(codes::E0001)
                .with_related(first, "first declared here"),
            );
            return;
        }
        let id = self.id_alloc.alloc_method();
        self.model.methods.push(MethodDef {
            name: f.name.name.clone(),
            sig: Signature::default(),
            is_async: f.is_async,
            span: f.name.span,
        });
        self.model.functions.insert(f.name.name.clone(), id);
    }

    /// Cross-namespace collision check: a name declared as both a type and
    /// a function is ambiguous for argument resolution.
    fn check_collisions(&mut self) {
        let mut collision_errors: Vec<(Span, String)> = Vec::new();
        for (name, &fn_id) in &self.model.functions {
            if self.model.type_names.contains_key(name) {
                collision_errors.push((
                    self.model.method(fn_id).span,
                    format!("'{}' is declared as both a type and a function", name),
                ));
            }
        }
        // Source order for deterministic output
        collision_errors.sort_by_key(|(span, _)| span.start);
        for (span, message) in collision_errors {
            self.error(codes::E0001, span, message);
        }
    }

    // ── Pass 2: resolve signatures ──────────────────────────────────────

    fn resolve_signatures(&mut self, items: &[Item], scope: Option<Span>) {
        for item in items {
            match &item.kind {
                ItemKind::Type(t) => self.resolve_type_members(t),
                ItemKind::Delegate(d) => self.resolve_delegate(d),
                ItemKind::Fn(f) => self.resolve_fn_signature(f),
                ItemKind::Extend(e) => self.resolve_extend(e, scope),
                ItemKind::Scope(s) => self.resolve_signatures(&s.items, Some(item.span)),
            }
        }
    }

    /// Whether this declaration is the winner for its name (duplicate
    /// declarations past the first are skipped in later passes).
    fn owns_type(&self, name: &Ident) -> Option<TypeId> {
        let id = self.model.lookup_type(&name.name)?;
        (self.type_spans.get(&id) == Some(&name.span)).then_some(id)
    }

    fn type_param_scope(&mut self, type_params: &[Ident]) -> HashMap<String, TypeId> {
        let mut locals = HashMap::new();
        for tp in type_params {
            let id = self.add_type(|id| TypeDef {
                name: tp.name.clone(),
                kind: TypeKind::TypeParam,
                original: id,
                arity: 0,
                type_args: Vec::new(),
                methods: Vec::new(),
                props: Vec::new(),
                invoke: None,
            });
            locals.insert(tp.name.clone(), id);
        }
        locals
    }

    fn resolve_type_members(&mut self, t: &TypeDecl) {
        let Some(owner) = self.owns_type(&t.name) else {
            return;
        };
        let locals = self.type_param_scope(&t.type_params);
        for member in &t.members {
            match member {
                Member::Method(sig) => {
                    let m = self.make_method(sig, &locals);
                    self.model.types[owner.0 as usize].methods.push(m);
                }
                Member::Prop(p) => {
                    let ty = self.resolve_type_ref(&p.ty, &locals);
                    let id = self.id_alloc.alloc_prop();
                    self.model.props.push(PropDef {
                        name: p.name.name.clone(),
                        ty,
                        has_getter: p.has_getter,
                    });
                    self.model.types[owner.0 as usize].props.push(id);
                }
            }
        }
    }

    fn resolve_delegate(&mut self, d: &DelegateDecl) {
        let Some(owner) = self.owns_type(&d.name) else {
            return;
        };
        let locals = self.type_param_scope(&d.type_params);
        let sig = self.resolve_signature(&d.params, d.ret.as_ref(), &locals);
        self.model.types[owner.0 as usize].invoke = Some(sig);
    }

    fn resolve_fn_signature(&mut self, f: &FnDecl) {
        let Some(id) = self.model.lookup_function(&f.name.name) else {
            return;
        };
        if self.model.method(id).span != f.name.span {
            return; // duplicate loser
        }
        let locals = HashMap::new();
        let sig = self.resolve_signature(&f.params, f.ret.as_ref(), &locals);
        self.model.methods[id.0 as usize].sig = sig;
    }

    fn resolve_extend(&mut self, e: &ExtendDecl, scope: Option<Span>) {
        let Some(target) = self.resolve_type_ref(&e.target, &HashMap::new()) else {
            return;
        };
        let target = self.model.original_definition(target);
        for sig in &e.methods {
            let method = self.make_method(sig, &HashMap::new());
            self.model.extensions.push(ExtensionMethod {
                target,
                method,
                visible_in: scope,
            });
        }
    }

    fn make_method(&mut self, sig: &MethodSig, locals: &HashMap<String, TypeId>) -> MethodId {
        let signature = self.resolve_signature(&sig.params, sig.ret.as_ref(), locals);
        let id = self.id_alloc.alloc_method();
        self.model.methods.push(MethodDef {
            name: sig.name.name.clone(),
            sig: signature,
            is_async: false,
            span: sig.name.span,
        });
        id
    }

    fn resolve_signature(
        &mut self,
        params: &[Param],
        ret: Option<&TypeRef>,
        locals: &HashMap<String, TypeId>,
    ) -> Signature {
        let params = params
            .iter()
            .map(|p| ParamInfo {
                name: p.name.name.clone(),
                ty: self.resolve_type_ref(&p.ty, locals),
            })
            .collect();
        // `-> void` and an omitted return clause share one representation.
        let ret = ret
            .and_then(|r| self.resolve_type_ref(r, locals))
            .filter(|&id| id != self.model.builtins.void);
        Signature { params, ret }
    }

    fn resolve_type_ref(
        &mut self,
        r: &TypeRef,
        locals: &HashMap<String, TypeId>,
    ) -> Option<TypeId> {
        if let Some(&id) = locals.get(&r.name.name) {
            if !r.args.is_empty() {
                self.error(
                    codes::E0004,
                    r.span,
                    format!(
                        "type parameter '{}' does not take type arguments",
                        r.name.name
                    ),
                );
                return None;
            }
            return Some(id);
        }

        let Some(def) = self.model.lookup_type(&r.name.name) else {
            self.error(
                codes::E0002,
                r.name.span,
                format!("unknown type '{}'", r.name.name),
            );
            return None;
        };
        let arity = self.model.type_def(def).arity;
        if r.args.len() != arity {
            self.error(
                codes::E0004,
                r.span,
                format!(
                    "type '{}' expects {} type argument(s), found {}",
                    r.name.name,
                    arity,
                    r.args.len()
                ),
            );
            return None;
        }
        if arity == 0 {
            return Some(def);
        }

        let mut args = Vec::with_capacity(r.args.len());
        for a in &r.args {
            args.push(self.resolve_type_ref(a, locals)?);
        }
        Some(self.construct(def, args))
    }

    /// Intern a constructed generic instance. Members and the invoke
    /// signature stay on the original definition.
    fn construct(&mut self, def: TypeId, args: Vec<TypeId>) -> TypeId {
        if let Some(&id) = self.constructed.get(&(def, args.clone())) {
            return id;
        }
        let display = format!(
            "{}<{}>",
            self.model.type_def(def).name,
            args.iter()
                .map(|&a| self.model.type_def(a).name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let type_args = args.clone();
        let id = self.add_type(|_| TypeDef {
            name: display,
            kind: TypeKind::Constructed,
            original: def,
            arity: 0,
            type_args,
            methods: Vec::new(),
            props: Vec::new(),
            invoke: None,
        });
        self.constructed.insert((def, args), id);
        id
    }

    // ── Pass 3: resolve bodies ──────────────────────────────────────────

    fn resolve_bodies(&mut self, items: &[Item]) {
        for item in items {
            match &item.kind {
                ItemKind::Fn(f) => {
                    if let Some(body) = &f.body {
                        self.resolve_block(body);
                    }
                }
                ItemKind::Scope(s) => self.resolve_bodies(&s.items),
                _ => {}
            }
        }
    }

    fn resolve_block(&mut self, block: &Block) {
        for call in &block.calls {
            self.resolve_call(call);
        }
    }

    fn resolve_call(&mut self, call: &CallExpr) {
        if self.model.lookup_function(&call.callee.name).is_none() {
            let message = if self.model.lookup_type(&call.callee.name).is_some() {
                format!("'{}' is a type and cannot be called", call.callee.name)
            } else {
                format!("unknown function '{}'", call.callee.name)
            };
            self.error(codes::E0003, call.callee.span, message);
        }
        for arg in &call.args {
            self.resolve_arg(arg);
        }
    }

    fn resolve_arg(&mut self, arg: &Expr) {
        match &arg.kind {
            ExprKind::Call(c) => self.resolve_call(c),
            ExprKind::Lambda(l) => {
                let locals = HashMap::new();
                let sig = self.resolve_signature(&l.params, l.ret.as_ref(), &locals);
                let id = self.id_alloc.alloc_method();
                self.model.methods.push(MethodDef {
                    name: "<lambda>".to_string(),
                    sig,
                    is_async: l.is_async,
                    span: arg.span,
                });
                self.model.lambdas.insert(arg.span, id);
                self.resolve_block(&l.body);
            }
            ExprKind::Name(name) => {
                // Bare names in argument position may reference a function
                // or a type; anything else is an unresolved reference.
                if self.model.lookup_function(name).is_none()
                    && self.model.lookup_type(name).is_none()
                {
                    self.error(
                        codes::E0003,
                        arg.span,
                        format!("unknown name '{}'", name),
                    );
                }
            }
            ExprKind::Number(_) | ExprKind::StringLit(_) => {}
        }
    }
}

fn zero_span() -> Span {
    Span::new((), 0..0)
}

// ── Tests ───────────────────────────────────────────────────────────────────
