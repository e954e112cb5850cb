// Property-based tests for analyzer invariants.
//
// Three categories:
// 1. Awaitable shape: a type is awaitable exactly when all four members
//    are present
// 2. Pairing: findings never exceed min(parameter count, argument count)
// 3. Idempotence: rescans of an unchanged tree are identical, and
//    fingerprints survive whitespace-only edits
//
// Uses proptest with explicit configuration to prevent CI flakiness.

use proptest::prelude::*;

use adrift::cancel::CancelFlag;
use adrift::scan::Finding;

// ── Test helpers ────────────────────────────────────────────────────────────

fn bind_model(source: &str) -> adrift::model::SemanticModel {
    let parsed = adrift::parser::parse(source);
    assert!(
        parsed.errors.is_empty(),
        "parse errors: {:?}",
        parsed.errors
    );
    adrift::bind::bind(&parsed.program.unwrap()).model
}

fn scan(source: &str) -> Vec<Finding> {
    let parsed = adrift::parser::parse(source);
    assert!(
        parsed.errors.is_empty(),
        "parse errors: {:?}",
        parsed.errors
    );
    let program = parsed.program.unwrap();
    let bound = adrift::bind::bind(&program);
    adrift::scan::scan_program(&program, &bound.model, &CancelFlag::new())
}

// ── Shape generator ─────────────────────────────────────────────────────────

/// A sketch whose awaiter type carries exactly the selected members.
fn shape_source(
    has_awaiter: bool,
    has_completed: bool,
    has_on_completed: bool,
    has_result: bool,
) -> String {
    let mut src = String::from("delegate Cb()\ntype A {\n");
    if has_completed {
        src.push_str("    prop is_completed: bool { get }\n");
    }
    if has_on_completed {
        src.push_str("    fn on_completed(c: Cb)\n");
    }
    if has_result {
        src.push_str("    fn get_result()\n");
    }
    src.push_str("}\ntype T {\n");
    if has_awaiter {
        src.push_str("    fn get_awaiter() -> A\n");
    }
    src.push_str("}\n");
    src
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ── 1. Awaitable shape ──────────────────────────────────────────────

    #[test]
    fn awaitable_iff_all_four_members(
        has_awaiter in any::<bool>(),
        has_completed in any::<bool>(),
        has_on_completed in any::<bool>(),
        has_result in any::<bool>(),
    ) {
        let source = shape_source(has_awaiter, has_completed, has_on_completed, has_result);
        let model = bind_model(&source);
        let ty = model.lookup_type("T").unwrap();
        let awaitable =
            adrift::awaitable::is_awaitable(&model, ty, 0, &CancelFlag::new());
        prop_assert_eq!(
            awaitable,
            has_awaiter && has_completed && has_on_completed && has_result,
            "members: awaiter={} completed={} on_completed={} result={}",
            has_awaiter, has_completed, has_on_completed, has_result
        );
    }

    // ── 2. Pairing ──────────────────────────────────────────────────────

    #[test]
    fn findings_bounded_by_min_of_params_and_args(
        params in 0usize..=4,
        args in 0usize..=6,
    ) {
        let mut src = String::from(
            "delegate Action()\ntype Task { }\nasync fn save() -> Task\n",
        );
        let param_list: Vec<String> =
            (0..params).map(|i| format!("c{i}: Action")).collect();
        src.push_str(&format!("fn sink({}) {{ }}\n", param_list.join(", ")));
        let arg_list = vec!["save"; args].join(", ");
        src.push_str(&format!("fn main() {{ sink({arg_list}) }}\n"));

        let findings = scan(&src);
        // Every paired slot is a fire-and-forget delegate holding an async
        // argument; the unpaired tail contributes nothing.
        prop_assert_eq!(findings.len(), params.min(args));
        for (i, f) in findings.iter().enumerate() {
            prop_assert_eq!(f.ordinal, i);
        }
    }

    // ── 3. Idempotence and fingerprint stability ────────────────────────

    #[test]
    fn rescan_of_unchanged_tree_is_identical(lines in prop::collection::vec(0u8..4, 1..12)) {
        let mut src = String::from(concat!(
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
            "fn ping() { }\n",
            "fn defer(cb: Action) { }\n",
            "fn defer_async(cb: AsyncAction) { }\n",
            "fn main() {\n",
        ));
        let mut expected = 0usize;
        for line in &lines {
            match line {
                0 => {
                    src.push_str("    defer(save)\n");
                    expected += 1;
                }
                1 => src.push_str("    defer(ping)\n"),
                2 => src.push_str("    defer_async(save)\n"),
                _ => {
                    src.push_str("    defer(async fn() { })\n");
                    expected += 1;
                }
            }
        }
        src.push_str("}\n");

        let first = scan(&src);
        let second = scan(&src);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), expected);
    }

    #[test]
    fn fingerprints_survive_whitespace_edits(indent in 0usize..8) {
        let plain = concat!(
            "delegate Action()\n",
            "type Task { }\n",
            "async fn save() -> Task\n",
            "fn defer(cb: Action) { }\n",
            "fn main() {\n",
            "defer(save)\n",
            "}\n",
        );
        let indented = plain.replace("defer(save)", &format!(
            "{}defer(save)",
            " ".repeat(indent)
        ));

        let base: Vec<String> = scan(plain)
            .iter()
            .map(adrift::baseline::fingerprint)
            .collect();
        let moved: Vec<String> = scan(&indented)
            .iter()
            .map(adrift::baseline::fingerprint)
            .collect();
        prop_assert_eq!(base, moved);
    }
}
