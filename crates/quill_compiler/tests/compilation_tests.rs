//! End-to-end tests: source text in, values and printed output out.

use quill_bound::{BoundStatement, Value};
use quill_compiler::{CompileError, Compilation, SourceText};
use quill_diagnostics::messages;
use quill_evaluator::{BufferedHost, EvalError, Globals, MAX_CALL_DEPTH};
use quill_lowerer::ControlFlowGraph;
use quill_options::CompilerOptions;

fn script_options() -> CompilerOptions {
    CompilerOptions {
        script: Some(true),
        show_tree: Some(true),
        ..Default::default()
    }
}

fn compile_script(source: &str) -> Compilation {
    let compilation = Compilation::new(vec![SourceText::new("test.ql", source)], script_options());
    assert!(
        compilation.diagnostics().is_empty(),
        "unexpected diagnostics for {:?}: {:?}",
        source,
        compilation.diagnostics().diagnostics()
    );
    compilation
}

/// Run both the lowered and the unlowered form and check they agree.
fn run_both(source: &str) -> (Value, Vec<String>) {
    let compilation = compile_script(source);

    let mut host = BufferedHost::new();
    let lowered = compilation.evaluate(&mut Globals::default(), &mut host).unwrap();

    let mut unlowered_host = BufferedHost::new();
    let unlowered = compilation
        .evaluate_unlowered(&mut Globals::default(), &mut unlowered_host)
        .unwrap();

    assert_eq!(lowered, unlowered, "lowering changed the result of {:?}", source);
    assert_eq!(host.output, unlowered_host.output, "lowering changed the output of {:?}", source);
    (lowered, host.output)
}

// ============================================================================
// Scripts
// ============================================================================

#[test]
fn test_script_returns_last_value() {
    let compilation = compile_script("var i = 0\nfor var j = 0 j < 5 j++ { i += j }\ni");
    let value = compilation
        .evaluate(&mut Globals::default(), &mut BufferedHost::new())
        .unwrap();
    assert_eq!(value, Value::Int(10));

    let program = compilation.program();
    let global = program.global_function.as_ref().unwrap();
    let body = program.function_body(global).unwrap();
    let graph = ControlFlowGraph::build(&body.statements);
    let back_edges: Vec<_> = graph.back_edges().collect();
    assert_eq!(back_edges.len(), 1);

    // The loop jumps back from its condition check to the top of the body.
    let check = &graph.blocks[back_edges[0].from];
    assert!(matches!(check.statements.last(), Some(BoundStatement::ConditionalGoto(_))));
    assert!(back_edges[0].condition.is_some());
    assert!(matches!(graph.blocks[back_edges[0].to].statements.first(), Some(BoundStatement::Label(_))));
}

const COUNTDOWN: &str = "fn d(n: int): int { if n == 0 { return 0 } return 1 + d(n - 1) }\n";

#[test]
fn test_deep_recursion_within_limit() {
    let compilation = compile_script(&format!("{}d(400)", COUNTDOWN));
    let value = compilation
        .evaluate(&mut Globals::default(), &mut BufferedHost::new())
        .unwrap();
    assert_eq!(value, Value::Int(400));
}

#[test]
fn test_recursion_past_limit_overflows() {
    let compilation = compile_script(&format!("{}d({})", COUNTDOWN, MAX_CALL_DEPTH + 1));
    let result = compilation.evaluate(&mut Globals::default(), &mut BufferedHost::new());
    assert!(
        matches!(result, Err(CompileError::Eval(EvalError::StackOverflow(_)))),
        "got {:?}",
        result
    );
}

#[test]
fn test_script_without_trailing_expression_returns_unit() {
    let (value, output) = run_both("var x = 2\nprint(x * 3)");
    assert_eq!(value, Value::Unit);
    assert_eq!(output, vec!["6"]);
}

// ============================================================================
// Lowering preserves behavior
// ============================================================================

#[test]
fn test_nested_if_else() {
    let (_, output) = run_both(
        "fn classify(n: int): string {\n\
             if n < 0 { return \"neg\" } else if n == 0 { return \"zero\" } else { return \"pos\" }\n\
         }\n\
         print(classify(-4))\n\
         print(classify(0))\n\
         print(classify(7))",
    );
    assert_eq!(output, vec!["neg", "zero", "pos"]);
}

#[test]
fn test_while_with_break_and_continue() {
    let (value, _) = run_both(
        "var i = 0\n\
         var sum = 0\n\
         while true {\n\
             i += 1\n\
             if i % 2 == 0 { continue }\n\
             if i > 9 { break }\n\
             sum += i\n\
         }\n\
         sum",
    );
    assert_eq!(value, Value::Int(25));
}

#[test]
fn test_do_while_runs_body_first() {
    let (value, _) = run_both("var n = 10\ndo { n += 1 } while n < 5\nn");
    assert_eq!(value, Value::Int(11));
}

#[test]
fn test_do_while_continue_checks_condition() {
    let (value, _) = run_both(
        "var k = 0\n\
         var c = 0\n\
         do {\n\
             k += 1\n\
             if k == 2 { continue }\n\
             c += 1\n\
         } while k < 4\n\
         c",
    );
    assert_eq!(value, Value::Int(3));
}

#[test]
fn test_for_loop_builds_string() {
    let (value, _) = run_both("var s = \"\"\nfor var i = 0 i < 3 i++ { s = s + string(i) }\ns");
    assert_eq!(value, Value::Str("012".into()));
}

#[test]
fn test_short_circuit_order() {
    let (_, output) = run_both(
        "fn t(): bool {\n\
             print(\"t\")\n\
             return true\n\
         }\n\
         fn f(): bool {\n\
             print(\"f\")\n\
             return false\n\
         }\n\
         print(f() && t())\n\
         print(t() || f())",
    );
    assert_eq!(output, vec!["f", "false", "t", "true"]);
}

#[test]
fn test_ternary() {
    let (value, _) = run_both("var x = 5\nx > 3 ? \"big\" : \"small\"");
    assert_eq!(value, Value::Str("big".into()));
}

#[test]
fn test_recursion() {
    let (value, _) = run_both("fn fib(n: int): int { return n < 2 ? n : fib(n - 1) + fib(n - 2) }\nfib(15)");
    assert_eq!(value, Value::Int(610));
}

// ============================================================================
// Constant folding
// ============================================================================

fn main_initializer_constant(source: &str) -> Option<Value> {
    let compilation = Compilation::new(vec![SourceText::new("fold.ql", source)], CompilerOptions::default());
    assert!(!compilation.has_errors());
    let program = compilation.program();
    let main = program.main_function.as_ref()?;
    let body = program.function_body(main)?;
    body.statements.iter().find_map(|statement| match statement {
        BoundStatement::VariableDeclaration(declaration) => declaration.initializer.constant().cloned(),
        _ => None,
    })
}

#[test]
fn test_constant_folding() {
    assert_eq!(main_initializer_constant("let k = 2 + 3 * 4"), Some(Value::Int(14)));
    assert_eq!(main_initializer_constant("let s = \"a\" + 1"), Some(Value::Str("a1".into())));
}

#[test]
fn test_false_and_skips_call() {
    let (value, output) = run_both("fn f(): bool {\nprint(\"called\")\nreturn true\n}\nfalse && f()");
    assert_eq!(value, Value::Bool(false));
    assert!(output.is_empty());
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_program_mode_runs_main() {
    let compilation = Compilation::new(
        vec![SourceText::new(
            "hello.ql",
            "fn main() {\nprint(\"hello\")\n}",
        )],
        CompilerOptions::default(),
    );
    assert!(!compilation.has_errors());
    assert_eq!(compilation.program().module_name, "hello");

    let mut host = BufferedHost::new();
    let value = compilation.evaluate(&mut Globals::default(), &mut host).unwrap();
    assert_eq!(value, Value::Unit);
    assert_eq!(host.output, vec!["hello"]);
}

#[test]
fn test_functions_across_files() {
    let compilation = Compilation::new(
        vec![
            SourceText::new("lib.ql", "fn square(n: int): int { return n * n }"),
            SourceText::new("app.ql", "print(square(9))"),
        ],
        CompilerOptions::default(),
    );
    assert!(!compilation.has_errors(), "{:?}", compilation.diagnostics().diagnostics());

    let mut host = BufferedHost::new();
    compilation.evaluate(&mut Globals::default(), &mut host).unwrap();
    assert_eq!(host.output, vec!["81"]);
}

#[test]
fn test_input_builtin() {
    let compilation = compile_script("var name = input()\n\"hi \" + name");
    let mut host = BufferedHost::with_input(["ada"]);
    let value = compilation.evaluate(&mut Globals::default(), &mut host).unwrap();
    assert_eq!(value, Value::Str("hi ada".into()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_errors_block_evaluation() {
    let compilation = Compilation::new(vec![SourceText::new("bad.ql", "var x = \nprint(y)")], script_options());
    assert!(compilation.has_errors());
    let result = compilation.evaluate(&mut Globals::default(), &mut BufferedHost::new());
    assert!(matches!(result, Err(CompileError::Failed(n)) if n >= 1));
}

#[test]
fn test_diagnostics_carry_file_name() {
    let compilation = Compilation::new(vec![SourceText::new("named.ql", "print(missing)")], script_options());
    let diagnostic = &compilation.diagnostics().diagnostics()[0];
    assert!(diagnostic.is(&messages::UNRESOLVED_IDENTIFIER));
    assert_eq!(diagnostic.file.as_deref(), Some("named.ql"));
}

#[test]
fn test_warnings_as_errors() {
    let source = vec![SourceText::new("warn.ql", "var x = 1 / 0")];

    let lenient = Compilation::new(source.clone(), script_options());
    assert!(!lenient.has_errors());
    assert_eq!(lenient.diagnostics().count_of(&messages::DIVISION_BY_CONSTANT_ZERO), 1);
    let result = lenient.evaluate(&mut Globals::default(), &mut BufferedHost::new());
    assert!(matches!(result, Err(CompileError::Eval(EvalError::DivisionByZero))));

    let strict = Compilation::new(
        source,
        CompilerOptions {
            warnings_as_errors: Some(true),
            ..script_options()
        },
    );
    assert!(strict.has_errors());
    let result = strict.evaluate(&mut Globals::default(), &mut BufferedHost::new());
    assert!(matches!(result, Err(CompileError::Failed(1))));
}

#[test]
fn test_load_missing_file() {
    let result = SourceText::load("does/not/exist.ql");
    assert!(matches!(result, Err(CompileError::Io { .. })));
}

// ============================================================================
// Submissions
// ============================================================================

#[test]
fn test_submissions_share_globals_and_functions() {
    let mut globals = Globals::default();
    let mut host = BufferedHost::new();

    let first = compile_script("var x = 20\nfn twice(n: int): int { return n * 2 }");
    first.evaluate(&mut globals, &mut host).unwrap();

    let second = first.continue_with(vec![SourceText::new("2", "twice(x) + 2")]);
    assert!(!second.has_errors(), "{:?}", second.diagnostics().diagnostics());
    assert_eq!(second.evaluate(&mut globals, &mut host).unwrap(), Value::Int(42));

    let third = second.continue_with(vec![SourceText::new("3", "x = x + 1\nx")]);
    assert_eq!(third.evaluate(&mut globals, &mut host).unwrap(), Value::Int(21));
}

#[test]
fn test_submission_shadowing() {
    let mut globals = Globals::default();
    let mut host = BufferedHost::new();

    let first = compile_script("var x = 1");
    first.evaluate(&mut globals, &mut host).unwrap();

    let second = first.continue_with(vec![SourceText::new("2", "var x = \"text\"\nx")]);
    assert!(second.diagnostics().is_empty(), "{:?}", second.diagnostics().diagnostics());
    assert_eq!(second.evaluate(&mut globals, &mut host).unwrap(), Value::Str("text".into()));

    let third = second.continue_with(vec![SourceText::new("3", "x + \"!\"")]);
    assert_eq!(third.evaluate(&mut globals, &mut host).unwrap(), Value::Str("text!".into()));
}

// ============================================================================
// Printing
// ============================================================================

#[test]
fn test_print_outputs() {
    let compilation = compile_script("fn f(n: int): int {\nif n > 0 { return 1 }\nreturn 0\n}\nf(3)");
    assert!(compilation.print_tree().contains("if"));
    assert!(compilation.print_program().contains("goto"));

    let dot = compilation.control_flow_graph("f").unwrap();
    assert!(dot.starts_with("digraph"));
    assert!(compilation.control_flow_graph("missing").is_none());
    assert!(compilation.control_flow_graphs().contains("f(n: int): int"));
}

#[test]
fn test_print_tree_empty_without_option() {
    let compilation = Compilation::new(
        vec![SourceText::new("t.ql", "print(1)")],
        CompilerOptions {
            script: Some(true),
            ..Default::default()
        },
    );
    assert!(compilation.print_tree().is_empty());
    assert!(compilation.program().main_function.is_none());
}
