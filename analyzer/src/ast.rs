// AST node types for adrift .sk sketch files.
//
// A sketch is a sequence of declarations: type shapes, delegate signatures,
// functions with optional call-statement bodies, extension blocks, and
// scopes. Every node carries a `SimpleSpan` for diagnostics and for
// position-sensitive member lookup in downstream phases.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

// ── Root ──

/// A complete sketch: a sequence of top-level items.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

// ── Items ──

/// A declaration with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Type(TypeDecl),
    Delegate(DelegateDecl),
    Fn(FnDecl),
    Extend(ExtendDecl),
    Scope(ScopeDecl),
}

// ── type_decl: 'type' IDENT generics? '{' member* '}' ──

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Method(MethodSig),
    Prop(PropDecl),
}

/// `fn name(params?) ('->' type)?` — a member or extension method signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    pub span: Span,
}

/// `prop name: type { get set? }`
#[derive(Debug, Clone, PartialEq)]
pub struct PropDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub has_getter: bool,
    pub has_setter: bool,
    pub span: Span,
}

// ── delegate_decl: 'delegate' IDENT generics? '(' params? ')' ret? ──

#[derive(Debug, Clone, PartialEq)]
pub struct DelegateDecl {
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
}

// ── fn_decl: 'async'? 'fn' IDENT '(' params? ')' ret? block? ──

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub is_async: bool,
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    /// Signature-only declarations (no body) are allowed.
    pub body: Option<Block>,
}

// ── extend_decl: 'extend' type_ref '{' method_sig* '}' ──

/// Extension methods on `target`. Visibility is positional: top-level
/// extensions are visible everywhere, extensions inside a `scope` only at
/// positions within that scope's span.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendDecl {
    pub target: TypeRef,
    pub methods: Vec<MethodSig>,
}

// ── scope_decl: 'scope' IDENT '{' item* '}' ──

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeDecl {
    pub name: Ident,
    pub items: Vec<Item>,
}

// ── block: '{' call_expr* '}' ──

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub calls: Vec<CallExpr>,
    pub span: Span,
}

// ── call_expr: IDENT '(' args? ')' ──

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Ident,
    pub args: Vec<Expr>,
    pub span: Span,
}

// ── expr ──

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Bare identifier — a reference to a declared function.
    Name(String),
    /// Nested call; its own call sites are scanned too.
    Call(CallExpr),
    /// Inline anonymous function.
    Lambda(Lambda),
    /// Numeric literal.
    Number(f64),
    /// String literal.
    StringLit(String),
}

/// `'async'? fn '(' params? ')' ret? block`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub is_async: bool,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    pub body: Block,
}

// ── param: IDENT ':' type_ref ──

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeRef,
    pub span: Span,
}

// ── type_ref: IDENT ('<' type_ref (',' type_ref)* '>')? ──

#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub name: Ident,
    pub args: Vec<TypeRef>,
    pub span: Span,
}

// ── Identifier ──

/// An identifier with its source text and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}
