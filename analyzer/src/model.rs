// model.rs — Semantic model for bound sketch programs
//
// Read-only view over the declarations of one sketch: type definitions,
// member tables, delegate invocation signatures, extension methods with
// positional visibility, and the global function namespace. Built by the
// binder; queried by the scanner and the shape matcher.
//
// Preconditions: populated by `bind::bind()`; ids index into the tables in
//                allocation order.
// Postconditions: all queries are read-only; the model is safe to share
//                 across threads once binding has finished.
// Failure modes: none (lookups return `Option`/empty, never panic on
//                missing names).
// Side effects: none.

use std::collections::HashMap;

use crate::ast::{CallExpr, Expr, ExprKind, Span};
use crate::id::{MethodId, PropId, TypeId};

// ── Type definitions ────────────────────────────────────────────────────────

/// Classification of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Builtin scalar (`void`, `bool`, `int`, `float`, `string`); no members.
    Builtin,
    /// Declared named type with members.
    Named,
    /// Declared delegate type; `invoke` holds its invocation signature.
    Delegate,
    /// Type parameter of a generic declaration; no members.
    TypeParam,
    /// Constructed generic instance; members and signatures live on the
    /// original definition.
    Constructed,
}

/// One entry in the type table.
#[derive(Debug)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    /// For `Constructed`: the generic definition this instantiates.
    /// For every other kind: the type's own id.
    pub original: TypeId,
    /// Number of declared generic parameters (definitions only).
    pub arity: usize,
    /// Type arguments (`Constructed` only).
    pub type_args: Vec<TypeId>,
    /// Instance methods declared in the type body.
    pub methods: Vec<MethodId>,
    /// Properties declared in the type body.
    pub props: Vec<PropId>,
    /// Invocation signature (`Delegate` definitions only).
    pub invoke: Option<Signature>,
}

// ── Signatures and members ──────────────────────────────────────────────────

/// A callable signature: parameter list plus return type.
///
/// `ret` is `None` when the callable returns nothing; the binder normalizes
/// an explicit `-> void` to `None` so there is a single representation.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: Vec<ParamInfo>,
    pub ret: Option<TypeId>,
}

/// A formal parameter. `ty` is `None` when its type reference failed to
/// resolve; consumers treat that as insufficient information.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub ty: Option<TypeId>,
}

/// A method definition: free function, instance member, extension method,
/// or anonymous function.
#[derive(Debug)]
pub struct MethodDef {
    pub name: String,
    pub sig: Signature,
    /// Declared asynchronous, independent of the return type.
    pub is_async: bool,
    pub span: Span,
}

/// A property definition.
#[derive(Debug)]
pub struct PropDef {
    pub name: String,
    pub ty: Option<TypeId>,
    pub has_getter: bool,
}

/// An extension method record. `visible_in` bounds where the extension is
/// in scope: `None` for top-level declarations (visible everywhere), the
/// enclosing `scope` item's span otherwise.
#[derive(Debug)]
pub struct ExtensionMethod {
    pub target: TypeId,
    pub method: MethodId,
    pub visible_in: Option<Span>,
}

impl ExtensionMethod {
    /// Whether this extension is in scope at a source position.
    pub fn visible_at(&self, position: usize) -> bool {
        match self.visible_in {
            None => true,
            Some(span) => span.start <= position && position < span.end,
        }
    }
}

// ── Symbols ─────────────────────────────────────────────────────────────────

/// What an expression binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Method(MethodId),
    Type(TypeId),
}

// ── Builtins ────────────────────────────────────────────────────────────────

/// Ids of the builtin types, registered before any declaration.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub void: TypeId,
    pub boolean: TypeId,
    pub int: TypeId,
    pub float: TypeId,
    pub string: TypeId,
}

// ── Semantic model ──────────────────────────────────────────────────────────

/// The bound view of one sketch program.
#[derive(Debug)]
pub struct SemanticModel {
    pub types: Vec<TypeDef>,
    pub methods: Vec<MethodDef>,
    pub props: Vec<PropDef>,
    pub extensions: Vec<ExtensionMethod>,
    /// Global function namespace.
    pub functions: HashMap<String, MethodId>,
    /// Global type namespace (definitions only, no constructed entries).
    pub type_names: HashMap<String, TypeId>,
    /// Anonymous functions keyed by their expression span.
    pub lambdas: HashMap<Span, MethodId>,
    pub builtins: Builtins,
}

impl SemanticModel {
    pub fn type_def(&self, id: TypeId) -> &TypeDef {
        &self.types[id.0 as usize]
    }

    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.0 as usize]
    }

    pub fn prop(&self, id: PropId) -> &PropDef {
        &self.props[id.0 as usize]
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    pub fn lookup_function(&self, name: &str) -> Option<MethodId> {
        self.functions.get(name).copied()
    }

    /// The unconstructed definition behind a type: a constructed instance
    /// yields its generic definition, everything else yields itself.
    pub fn original_definition(&self, id: TypeId) -> TypeId {
        self.type_def(id).original
    }

    /// Whether the type (via its original definition) is a delegate type.
    pub fn is_delegate(&self, id: TypeId) -> bool {
        self.type_def(self.original_definition(id)).kind == TypeKind::Delegate
    }

    /// Invocation signature of a delegate type, consulting the original
    /// definition for constructed instances. `None` for non-delegates.
    pub fn invoke_signature(&self, id: TypeId) -> Option<&Signature> {
        self.type_def(self.original_definition(id)).invoke.as_ref()
    }

    /// Position-sensitive member lookup: instance methods of the type's
    /// definition plus extensions on it that are in scope at `position`.
    /// Several same-named candidates may be returned; consumers match
    /// existentially.
    pub fn lookup_methods(&self, position: usize, container: TypeId, name: &str) -> Vec<MethodId> {
        let def_id = self.original_definition(container);
        let mut found: Vec<MethodId> = self
            .type_def(def_id)
            .methods
            .iter()
            .copied()
            .filter(|&m| self.method(m).name == name)
            .collect();
        for ext in &self.extensions {
            if ext.target == def_id && ext.visible_at(position) && self.method(ext.method).name == name
            {
                found.push(ext.method);
            }
        }
        found
    }

    /// Instance methods of a type with a given name (no extensions, no
    /// position). Used for awaiter member shape checks.
    pub fn instance_methods(&self, container: TypeId, name: &str) -> Vec<MethodId> {
        let def_id = self.original_definition(container);
        self.type_def(def_id)
            .methods
            .iter()
            .copied()
            .filter(|&m| self.method(m).name == name)
            .collect()
    }

    /// Instance properties of a type with a given name.
    pub fn instance_props(&self, container: TypeId, name: &str) -> Vec<PropId> {
        let def_id = self.original_definition(container);
        self.type_def(def_id)
            .props
            .iter()
            .copied()
            .filter(|&p| self.prop(p).name == name)
            .collect()
    }

    /// Resolve the callee of a call expression to a method. Best-effort:
    /// an unknown name yields `None`, not an error.
    pub fn resolve_callee(&self, call: &CallExpr) -> Option<MethodId> {
        self.lookup_function(&call.callee.name)
    }

    /// Resolve an expression to the symbol it binds to. Best-effort: `None`
    /// is the normal answer for literals and unresolved names.
    pub fn resolve_expr(&self, expr: &Expr) -> Option<Symbol> {
        match &expr.kind {
            ExprKind::Name(name) => self
                .lookup_function(name)
                .map(Symbol::Method)
                .or_else(|| self.lookup_type(name).map(Symbol::Type)),
            // A call in argument position binds to the invoked method, the
            // same symbol the callee name binds to.
            ExprKind::Call(call) => self.resolve_callee(call).map(Symbol::Method),
            ExprKind::Lambda(_) => self.lambdas.get(&expr.span).copied().map(Symbol::Method),
            ExprKind::Number(_) | ExprKind::StringLit(_) => None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::span::Span as _;

    fn span(range: std::ops::Range<usize>) -> Span {
        Span::new((), range)
    }

    #[test]
    fn extension_visibility_unbounded() {
        let ext = ExtensionMethod {
            target: TypeId(0),
            method: MethodId(0),
            visible_in: None,
        };
        assert!(ext.visible_at(0));
        assert!(ext.visible_at(10_000));
    }

    #[test]
    fn extension_visibility_bounded() {
        let ext = ExtensionMethod {
            target: TypeId(0),
            method: MethodId(0),
            visible_in: Some(span(10..50)),
        };
        assert!(!ext.visible_at(9));
        assert!(ext.visible_at(10));
        assert!(ext.visible_at(49));
        assert!(!ext.visible_at(50));
    }
}
