// scan.rs — Call-site scanning for async fire-and-forget arguments
//
// For every call expression: pair arguments with the callee's formal
// parameters positionally, keep the pairs whose parameter type is a
// fire-and-forget delegate, resolve each kept argument to a symbol, and
// produce one finding per argument that binds to a method declared
// asynchronous.
//
// Preconditions: `model` is the semantic model bound from the same program.
// Postconditions: findings within one call are in left-to-right argument
//                 order; the program walk visits calls in source order, so
//                 repeated scans of an unchanged tree produce an identical
//                 finding sequence.
// Failure modes: none — unresolved callees or arguments are skipped
//                silently (insufficient information, not an error).
// Side effects: none.

use crate::ast::{Block, CallExpr, Expr, ExprKind, Item, ItemKind, Program, Span};
use crate::cancel::CancelFlag;
use crate::classify::{classify_parameter, DelegateClass};
use crate::diag::{codes, DiagLevel, Diagnostic};
use crate::model::{SemanticModel, Symbol};

// ── Findings ────────────────────────────────────────────────────────────────

/// One reported rule violation, anchored at the offending argument.
///
/// Carries the semantic identity of the violation (callee, argument display
/// name, argument position) so baselines can fingerprint it independently
/// of source spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Span of the offending argument expression.
    pub span: Span,
    /// Name of the called function.
    pub callee: String,
    /// Display name of the async symbol bound to the argument.
    pub argument: String,
    /// Zero-based argument position.
    pub ordinal: usize,
}

impl Finding {
    /// Render as a diagnostic with the rule's stable code and hint.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            DiagLevel::Warning,
            self.span,
            format!(
                "async function '{}' passed as fire-and-forget callback to '{}'",
                self.argument, self.callee
            ),
        )
        .with_code(codes::W0100)
        .with_hint(
            "accept a delegate returning an awaitable, or keep the async work \
             explicit inside the callback body",
        )
    }
}

// ── Per-call scan ───────────────────────────────────────────────────────────

/// Scan one call expression. Pure: no shared state, safe to invoke
/// concurrently across call sites.
pub fn scan_call(call: &CallExpr, model: &SemanticModel, cancel: &CancelFlag) -> Vec<Finding> {
    if call.args.is_empty() {
        return Vec::new();
    }
    // Callee must resolve to a method; anything else is not analyzable.
    let Some(callee_id) = model.resolve_callee(call) else {
        return Vec::new();
    };
    let callee = model.method(callee_id);

    // Member visibility is scope-sensitive; look up from the call site.
    let position = call.span.start;

    let mut findings = Vec::new();
    // Positional pairing over min(params, args): tail arguments beyond the
    // declared parameter list are excluded, not mis-paired.
    for (ordinal, (param, arg)) in callee.sig.params.iter().zip(&call.args).enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        let Some(param_ty) = param.ty else {
            continue; // unresolved parameter type: insufficient information
        };
        if classify_parameter(model, param_ty, position, cancel) != DelegateClass::FireAndForget {
            continue;
        }
        let Some(symbol) = model.resolve_expr(arg) else {
            continue; // unbound argument: skip silently
        };
        if let Symbol::Method(m) = symbol {
            let method = model.method(m);
            if method.is_async {
                findings.push(Finding {
                    span: arg.span,
                    callee: callee.name.clone(),
                    argument: method.name.clone(),
                    ordinal,
                });
            }
        }
    }
    findings
}

// ── Whole-program scan ──────────────────────────────────────────────────────

/// Scan every call expression of a program in source order, recursing into
/// lambda bodies and nested call arguments.
pub fn scan_program(
    program: &Program,
    model: &SemanticModel,
    cancel: &CancelFlag,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for_each_call(program, &mut |call| {
        findings.extend(scan_call(call, model, cancel));
    });
    findings
}

/// Visit every call expression in source order: function bodies first to
/// last, outer calls before the calls nested in their arguments.
pub fn for_each_call(program: &Program, f: &mut impl FnMut(&CallExpr)) {
    walk_items(&program.items, f);
}

fn walk_items(items: &[Item], f: &mut impl FnMut(&CallExpr)) {
    for item in items {
        match &item.kind {
            ItemKind::Fn(decl) => {
                if let Some(body) = &decl.body {
                    walk_block(body, f);
                }
            }
            ItemKind::Scope(s) => walk_items(&s.items, f),
            _ => {}
        }
    }
}

fn walk_block(block: &Block, f: &mut impl FnMut(&CallExpr)) {
    for call in &block.calls {
        walk_call(call, f);
    }
}

fn walk_call(call: &CallExpr, f: &mut impl FnMut(&CallExpr)) {
    f(call);
    for arg in &call.args {
        walk_arg(arg, f);
    }
}

fn walk_arg(arg: &Expr, f: &mut impl FnMut(&CallExpr)) {
    match &arg.kind {
        ExprKind::Call(call) => walk_call(call, f),
        ExprKind::Lambda(lambda) => walk_block(&lambda.body, f),
        _ => {}
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse, bind, scan. Bind errors are tolerated: the scanner runs on
    /// erroneous programs the way the host runs rules on erroneous code.
    fn scan_source(source: &str) -> Vec<Finding> {
        let parsed = crate::parser::parse(source);
        assert!(
            parsed.errors.is_empty(),
            "parse errors: {:?}",
            parsed.errors
        );
        let program = parsed.program.unwrap();
        let bound = crate::bind::bind(&program);
        scan_program(&program, &bound.model, &CancelFlag::new())
    }

    const FIXTURE: &str = concat!(
        "delegate Continuation()\n",
        "type TaskAwaiter {\n",
        "    prop is_completed: bool { get }\n",
        "    fn on_completed(c: Continuation)\n",
        "    fn get_result()\n",
        "}\n",
        "type Task {\n",
        "    fn get_awaiter() -> TaskAwaiter\n",
        "}\n",
        "delegate Action()\n",
        "delegate AsyncAction() -> Task\n",
        "async fn save() -> Task\n",
        "fn log() { }\n",
        "fn defer(cb: Action) { }\n",
        "fn defer_async(cb: AsyncAction) { }\n",
    );

    fn with_fixture(body: &str) -> String {
        format!("{FIXTURE}{body}\n")
    }

    #[test]
    fn async_arg_in_fire_and_forget_slot_flagged() {
        let findings = scan_source(&with_fixture("fn main() { defer(save) }"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].callee, "defer");
        assert_eq!(findings[0].argument, "save");
        assert_eq!(findings[0].ordinal, 0);
    }

    #[test]
    fn finding_anchored_at_argument_span() {
        let source = with_fixture("fn main() { defer(save) }");
        let findings = scan_source(&source);
        let span = findings[0].span;
        assert_eq!(&source[span.start..span.end], "save");
    }

    #[test]
    fn sync_arg_not_flagged() {
        let findings = scan_source(&with_fixture("fn main() { defer(log) }"));
        assert!(findings.is_empty());
    }

    #[test]
    fn awaitable_delegate_slot_not_flagged() {
        let findings = scan_source(&with_fixture("fn main() { defer_async(save) }"));
        assert!(findings.is_empty());
    }

    #[test]
    fn non_delegate_slot_not_flagged() {
        let findings = scan_source(&with_fixture(concat!(
            "fn run(n: int) { }\n",
            "fn main() { run(3) }",
        )));
        assert!(findings.is_empty());
    }

    #[test]
    fn empty_argument_list_not_analyzed() {
        let findings = scan_source(&with_fixture("fn main() { log() }"));
        assert!(findings.is_empty());
    }

    #[test]
    fn unresolved_callee_skipped() {
        // `missing` does not resolve; bind reports an error but the scan
        // stays silent.
        let parsed = crate::parser::parse(&with_fixture("fn main() { missing(save) }"));
        let program = parsed.program.unwrap();
        let bound = crate::bind::bind(&program);
        let findings = scan_program(&program, &bound.model, &CancelFlag::new());
        assert!(findings.is_empty());
    }

    #[test]
    fn unresolved_argument_skipped() {
        let parsed = crate::parser::parse(&with_fixture("fn main() { defer(ghost) }"));
        let program = parsed.program.unwrap();
        let bound = crate::bind::bind(&program);
        let findings = scan_program(&program, &bound.model, &CancelFlag::new());
        assert!(findings.is_empty());
    }

    #[test]
    fn type_name_argument_skipped() {
        // `Task` binds to a type symbol, not a method: no finding.
        let findings = scan_source(&with_fixture("fn main() { defer(Task) }"));
        assert!(findings.is_empty());
    }

    #[test]
    fn literal_argument_skipped() {
        let findings = scan_source(&with_fixture("fn main() { defer(3) }"));
        assert!(findings.is_empty());
    }

    // ── Lambdas ──

    #[test]
    fn plain_lambda_not_flagged_despite_async_body_calls() {
        // The lambda is judged by its own async marker, not by what its
        // body calls.
        let findings = scan_source(&with_fixture(
            "fn kick(cb: AsyncAction) { }\nfn main() { defer(fn() { kick(save) }) }",
        ));
        assert!(findings.is_empty());
    }

    #[test]
    fn async_lambda_flagged() {
        let findings = scan_source(&with_fixture("fn main() { defer(async fn() { }) }"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].argument, "<lambda>");
    }

    #[test]
    fn calls_inside_lambda_bodies_scanned() {
        let findings = scan_source(&with_fixture(
            "fn main() { defer(fn() { defer(save) }) }",
        ));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].argument, "save");
    }

    // ── Pairing ──

    #[test]
    fn variadic_tail_arguments_excluded() {
        // More arguments than declared parameters: the tail pairs with
        // nothing and is excluded from analysis.
        let findings = scan_source(&with_fixture("fn main() { defer(log, save, save) }"));
        assert!(findings.is_empty());
    }

    #[test]
    fn pairing_is_positional() {
        let findings = scan_source(&with_fixture(concat!(
            "fn mixed(n: int, cb: Action) { }\n",
            "fn main() { mixed(1, save) }",
        )));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].ordinal, 1);
    }

    #[test]
    fn multiple_offending_arguments_reported_left_to_right() {
        let findings = scan_source(&with_fixture(concat!(
            "fn both(a: Action, b: Action) { }\n",
            "fn main() { both(save, save) }",
        )));
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].ordinal, 0);
        assert_eq!(findings[1].ordinal, 1);
        assert!(findings[0].span.start < findings[1].span.start);
    }

    #[test]
    fn one_finding_per_call_site() {
        let findings = scan_source(&with_fixture(
            "fn main() { defer(save) defer(save) }",
        ));
        assert_eq!(findings.len(), 2);
    }

    // ── Position sensitivity ──

    #[test]
    fn scoped_extension_suppresses_finding_inside_scope() {
        // Chore becomes awaitable only inside scope `ui`; the same call
        // shape is flagged outside and clean inside.
        let source = concat!(
            "delegate Continuation()\n",
            "type ChoreAwaiter {\n",
            "    prop is_completed: bool { get }\n",
            "    fn on_completed(c: Continuation)\n",
            "    fn get_result()\n",
            "}\n",
            "type Chore { }\n",
            "delegate ChoreAction() -> Chore\n",
            "async fn sweep() -> Chore\n",
            "fn kick(cb: ChoreAction) { }\n",
            "fn outside() { kick(sweep) }\n",
            "scope ui {\n",
            "    extend Chore { fn get_awaiter() -> ChoreAwaiter }\n",
            "    fn inside() { kick(sweep) }\n",
            "}\n",
        );
        let findings = scan_source(source);
        assert_eq!(findings.len(), 1);
        let span = findings[0].span;
        // The single finding is the one in `outside`.
        assert!(span.start < source.find("scope ui").unwrap());
    }

    // ── Nested calls ──

    #[test]
    fn nested_call_argument_resolves_to_invoked_method() {
        // `defer(pick())` binds the argument to the `pick` method symbol;
        // `pick` is async, so it is flagged even though the argument is an
        // invocation rather than a reference.
        let findings = scan_source(&with_fixture(concat!(
            "async fn pick() -> Task\n",
            "fn main() { defer(pick()) }",
        )));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].argument, "pick");
    }

    // ── Cancellation ──

    #[test]
    fn cancelled_scan_produces_nothing() {
        let parsed = crate::parser::parse(&with_fixture("fn main() { defer(save) }"));
        let program = parsed.program.unwrap();
        let bound = crate::bind::bind(&program);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let findings = scan_program(&program, &bound.model, &cancel);
        assert!(findings.is_empty());
    }

    // ── Determinism ──

    #[test]
    fn rescan_is_identical() {
        let parsed = crate::parser::parse(&with_fixture(concat!(
            "fn both(a: Action, b: Action) { }\n",
            "fn main() { both(save, save) defer(save) }",
        )));
        let program = parsed.program.unwrap();
        let bound = crate::bind::bind(&program);
        let flag = CancelFlag::new();
        let first = scan_program(&program, &bound.model, &flag);
        let second = scan_program(&program, &bound.model, &flag);
        assert_eq!(first, second);
    }

    // ── Diagnostic rendering ──

    #[test]
    fn finding_diagnostic_form() {
        let findings = scan_source(&with_fixture("fn main() { defer(save) }"));
        let diag = findings[0].to_diagnostic();
        assert_eq!(diag.code, Some(codes::W0100));
        assert_eq!(diag.level, DiagLevel::Warning);
        assert!(diag.message.contains("'save'"));
        assert!(diag.message.contains("'defer'"));
        assert!(diag.hint.is_some());
    }
}
