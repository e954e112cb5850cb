// awaitable.rs — Structural awaitable shape matching
//
// Decides whether a type satisfies the awaitable duck-type contract at a
// given source position. Purely structural: no allow-list of known types,
// only the four conventional members matter. Lookup is position-sensitive
// because extension methods can put `get_awaiter` in scope at one call site
// and not another, so answers must never be cached per type.
//
// Preconditions: `model` is a bound semantic model.
// Postconditions: pure boolean answer; `false` for any type without
//                 resolvable members.
// Failure modes: none (never errors, never panics).
// Side effects: none.

use crate::cancel::CancelFlag;
use crate::id::TypeId;
use crate::model::SemanticModel;

/// Conventional member names of the awaitable contract.
pub mod well_known {
    pub const GET_AWAITER: &str = "get_awaiter";
    pub const IS_COMPLETED: &str = "is_completed";
    pub const ON_COMPLETED: &str = "on_completed";
    pub const GET_RESULT: &str = "get_result";
}

/// Whether `ty` is awaitable at `position`.
///
/// `ty` is awaitable iff some zero-parameter `get_awaiter` in scope at
/// `position` (instance member or visible extension) returns a type that
/// passes `verify_awaiter`. Several same-named candidates may exist; any
/// satisfying candidate suffices.
pub fn is_awaitable(
    model: &SemanticModel,
    ty: TypeId,
    position: usize,
    cancel: &CancelFlag,
) -> bool {
    for id in model.lookup_methods(position, ty, well_known::GET_AWAITER) {
        if cancel.is_cancelled() {
            return false;
        }
        let method = model.method(id);
        if !method.sig.params.is_empty() {
            continue;
        }
        let Some(awaiter) = method.sig.ret else {
            continue;
        };
        if verify_awaiter(model, awaiter) {
            return true;
        }
    }
    false
}

/// Whether `awaiter` has the three awaiter members:
/// a readable bool `is_completed`, a unary void `on_completed` taking a
/// delegate, and a zero-parameter `get_result`.
pub fn verify_awaiter(model: &SemanticModel, awaiter: TypeId) -> bool {
    has_is_completed(model, awaiter)
        && has_on_completed(model, awaiter)
        && has_get_result(model, awaiter)
}

// ── The three awaiter member checks ─────────────────────────────────────────

/// `prop is_completed: bool { get ... }`
fn has_is_completed(model: &SemanticModel, awaiter: TypeId) -> bool {
    model
        .instance_props(awaiter, well_known::IS_COMPLETED)
        .iter()
        .any(|&p| {
            let prop = model.prop(p);
            prop.ty == Some(model.builtins.boolean) && prop.has_getter
        })
}

/// `fn on_completed(continuation: <some delegate>)` returning nothing.
/// Any delegate type is accepted for the parameter; only its being a
/// delegate matters.
fn has_on_completed(model: &SemanticModel, awaiter: TypeId) -> bool {
    model
        .instance_methods(awaiter, well_known::ON_COMPLETED)
        .iter()
        .any(|&m| {
            let def = model.method(m);
            def.sig.ret.is_none()
                && def.sig.params.len() == 1
                && def.sig.params[0].ty.is_some_and(|t| model.is_delegate(t))
        })
}

/// `fn get_result()` with zero parameters; the return type is unconstrained.
fn has_get_result(model: &SemanticModel, awaiter: TypeId) -> bool {
    model
        .instance_methods(awaiter, well_known::GET_RESULT)
        .iter()
        .any(|&m| model.method(m).sig.params.is_empty())
}

// ── Tests ───────────────────────────────────────────────────────────────────
