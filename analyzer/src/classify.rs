// classify.rs — Delegate return classification
//
// Classifies one parameter type: not a delegate at all, a delegate whose
// invocation returns an awaitable (an intentional async-aware callback,
// out of scope for the rule), or a fire-and-forget delegate.
//
// Constructed generic delegates classify through their original
// definition's invocation signature, and the return type is matched
// through its own original definition. No type argument substitution is
// performed, so awaitability that depends on a concrete type argument is
// not distinguished (see DESIGN.md).
//
// Preconditions: `model` is a bound semantic model.
// Postconditions: pure tri-state answer.
// Failure modes: none.
// Side effects: none.

use crate::awaitable::is_awaitable;
use crate::cancel::CancelFlag;
use crate::id::TypeId;
use crate::model::SemanticModel;

/// Tri-state classification of a parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegateClass {
    /// The type has no delegate invocation signature.
    NotADelegate,
    /// A delegate whose invocation returns an awaitable type.
    Awaitable,
    /// A delegate whose invocation returns nothing, or a non-awaitable type.
    FireAndForget,
}

/// Classify a parameter type at a lookup position.
pub fn classify_parameter(
    model: &SemanticModel,
    ty: TypeId,
    position: usize,
    cancel: &CancelFlag,
) -> DelegateClass {
    let Some(invoke) = model.invoke_signature(ty) else {
        return DelegateClass::NotADelegate;
    };
    match invoke.ret {
        Some(ret) => {
            let ret = model.original_definition(ret);
            if is_awaitable(model, ret, position, cancel) {
                DelegateClass::Awaitable
            } else {
                DelegateClass::FireAndForget
            }
        }
        // Void-returning delegates are the canonical fire-and-forget shape.
        None => DelegateClass::FireAndForget,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
