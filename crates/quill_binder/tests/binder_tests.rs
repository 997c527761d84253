//! Binder integration tests.
//!
//! Tests the parse -> bind pipeline and the diagnostics it produces.

use bumpalo::Bump;
use quill_binder::operators::resolve_binary;
use quill_binder::{bind_program, ProgramBinder, GLOBAL_FUNCTION_NAME};
use quill_bound::*;
use quill_diagnostics::{messages, DiagnosticMessage};
use quill_parser::parse_text;
use std::rc::Rc;

/// Helper: parse and bind source in program mode.
fn bind(source: &str) -> BoundProgram {
    bind_with(source, false, &[])
}

fn bind_script(source: &str) -> BoundProgram {
    bind_with(source, true, &[])
}

fn bind_with(source: &str, is_script: bool, references: &[Rc<FunctionSymbol>]) -> BoundProgram {
    let arena = Bump::new();
    let (unit, parse_diagnostics) = parse_text(&arena, "test.ql", source);
    assert!(
        parse_diagnostics.is_empty(),
        "unexpected parse errors: {:?}",
        parse_diagnostics.diagnostics()
    );
    let (program, is_valid) = bind_program("test", references, is_script, std::slice::from_ref(&unit));
    assert_eq!(is_valid, program.is_valid);
    program
}

fn count(program: &BoundProgram, message: &DiagnosticMessage) -> usize {
    program.diagnostics.count_of(message)
}

fn assert_clean(source: &str) {
    let program = bind(source);
    assert!(
        program.diagnostics.is_empty(),
        "expected no diagnostics for {:?}, got {:?}",
        source,
        program.diagnostics.diagnostics()
    );
    assert!(program.is_valid);
}

fn assert_single(source: &str, message: &DiagnosticMessage) {
    let program = bind(source);
    assert_eq!(
        program.diagnostics.len(),
        1,
        "expected one diagnostic for {:?}, got {:?}",
        source,
        program.diagnostics.diagnostics()
    );
    assert_eq!(count(&program, message), 1, "wrong diagnostic for {:?}", source);
    assert!(!program.is_valid);
}

// ============================================================================
// Scoping
// ============================================================================

#[test]
fn test_duplicate_in_same_block() {
    assert_single("var x = 1\nvar x = 2", &messages::VARIABLE_ALREADY_DECLARED);
    assert_single("{ let a = 1\nvar a = true }", &messages::VARIABLE_ALREADY_DECLARED);
}

#[test]
fn test_nested_shadowing_is_silent() {
    assert_clean("var x = 1\n{ var x = \"s\"\nprint(x) }\nprint(x)");
    assert_clean("fn f(x: int): int { { var x = 2\nreturn x } }");
}

#[test]
fn test_for_header_variable_is_scoped_to_loop() {
    assert_clean("for var i = 0 i < 3 i++ { print(i) }\nfor var i = 0 i < 3 i++ { }");
    assert_single("for var i = 0 i < 3 i++ { }\nprint(i)", &messages::UNRESOLVED_IDENTIFIER);
}

#[test]
fn test_functions_see_globals_and_each_other() {
    assert_clean(
        "fn even(n: int): bool { return n == 0 ? true : odd(n - 1) }\n\
         fn odd(n: int): bool { return n == 0 ? false : even(n - 1) }\n\
         var limit = 4\n\
         fn check(): bool { return even(limit) }\n\
         print(check())",
    );
}

#[test]
fn test_globals_are_collected() {
    let program = bind("var a = 1\n{ var b = 2 }\nfn f() { var c = 3 }");
    let names: Vec<&str> = program.globals.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(program.globals.iter().all(|g| g.is_global()));
}

// ============================================================================
// Names and calls
// ============================================================================

#[test]
fn test_unresolved_names() {
    assert_single("print(y)", &messages::UNRESOLVED_IDENTIFIER);
    assert_single("y(1, 2)", &messages::UNRESOLVED_IDENTIFIER);
    assert_single("var f = 1\nf()", &messages::NOT_A_FUNCTION);
    assert_single("fn f() { }\nvar x = f + 1", &messages::NOT_A_VARIABLE);
}

#[test]
fn test_wrong_amount_of_arguments() {
    assert_single("fn f(a: int) { }\nf()", &messages::WRONG_AMOUNT_OF_ARGUMENTS);
    let program = bind("fn f(a: int) { }\nf(1, 2)");
    let diagnostic = &program.diagnostics.diagnostics()[0];
    assert!(diagnostic.message_text.contains("expects 1 argument(s) but was given 2"));
}

#[test]
fn test_duplicate_declarations() {
    assert_single("fn f() { }\nfn f() { }", &messages::FUNCTION_ALREADY_DECLARED);
    assert_single("fn f(a: int, a: int) { }", &messages::DUPLICATED_PARAMETERS);
    assert_single("fn print() { }", &messages::FUNCTION_ALREADY_DECLARED);
}

#[test]
fn test_reference_collision() {
    let reference = Rc::new(FunctionSymbol::external("input", &[], TypeSymbol::String));
    let program = bind_with("var x = 1", false, &[reference]);
    assert_eq!(count(&program, &messages::FUNCTION_ALREADY_DECLARED), 1);
}

#[test]
fn test_reference_is_callable() {
    let reference = Rc::new(FunctionSymbol::external("clock", &[], TypeSymbol::Int));
    let program = bind_with("var now = clock() + 1", false, &[reference]);
    assert!(program.diagnostics.is_empty());
    assert_eq!(program.references.len(), 1);
}

// ============================================================================
// Types and conversions
// ============================================================================

#[test]
fn test_operator_table_resolves_or_reports() {
    let operators = [
        ("+", BinaryOperator::Add),
        ("-", BinaryOperator::Subtract),
        ("*", BinaryOperator::Multiply),
        ("/", BinaryOperator::Divide),
        ("%", BinaryOperator::Modulo),
        ("**", BinaryOperator::Power),
        ("//", BinaryOperator::Root),
        ("&", BinaryOperator::BitwiseAnd),
        ("|", BinaryOperator::BitwiseOr),
        ("^", BinaryOperator::BitwiseXor),
        ("&&", BinaryOperator::LogicalAnd),
        ("||", BinaryOperator::LogicalOr),
        ("==", BinaryOperator::Equals),
        ("!=", BinaryOperator::NotEquals),
        ("<", BinaryOperator::Less),
        ("<=", BinaryOperator::LessOrEquals),
        (">", BinaryOperator::Greater),
        (">=", BinaryOperator::GreaterOrEquals),
    ];
    let operands = [
        ("2", TypeSymbol::Int),
        ("2.5", TypeSymbol::Float),
        ("true", TypeSymbol::Bool),
        ("\"s\"", TypeSymbol::String),
    ];

    for (text, op) in operators {
        for (left, left_type) in &operands {
            for (right, right_type) in &operands {
                let source = format!("print({} {} {})", left, text, right);
                let program = bind(&source);
                match resolve_binary(op, left_type, right_type) {
                    Some(_) => assert!(
                        program.diagnostics.is_empty(),
                        "{} should bind, got {:?}",
                        source,
                        program.diagnostics.diagnostics()
                    ),
                    None => assert_eq!(
                        count(&program, &messages::UNSUPPORTED_BINARY_OPERATOR),
                        1,
                        "{} should report",
                        source
                    ),
                }
            }
        }
    }
}

#[test]
fn test_unary_operators() {
    assert_clean("var a = -1\nvar b = !true\nvar c = ~5\nvar d = +2.5");
    assert_single("var a = -true", &messages::UNSUPPORTED_UNARY_OPERATOR);
    assert_single("var a = !1", &messages::UNSUPPORTED_UNARY_OPERATOR);
}

#[test]
fn test_declared_types() {
    assert_clean("var x: float = 1\nlet s: string = \"a\"\nvar o: any = 3");
    assert_single("var x: int = 1.5", &messages::MISSING_EXPLICIT_CONVERSION);
    assert_single("var s: string = 1", &messages::MISSING_EXPLICIT_CONVERSION);
    assert_single("var b: bool = \"x\"", &messages::INCOMPATIBLE_TYPES);
    assert_single("var q: number = 1", &messages::TYPE_NOT_FOUND);
}

#[test]
fn test_explicit_conversions() {
    assert_clean("var x = int(1.5)\nvar s = string(3)\nvar f = float(2)\nvar i = int(true)");
    assert_single("var x = int(\"1\")", &messages::CANNOT_CONVERT);
    assert_single("var x = bool(\"true\")", &messages::CANNOT_CONVERT);
}

#[test]
fn test_any_requires_explicit_conversion() {
    assert_clean("var o: any = 1\nvar i = int(o) + 1");
    assert_single("var o: any = 1\nvar i: int = o", &messages::MISSING_EXPLICIT_CONVERSION);
    assert_single("var o: any = 1\nif o == 1 { }", &messages::MISSING_EXPLICIT_CONVERSION);
}

#[test]
fn test_void_expression_in_value_position() {
    assert_single("var x = print(1)", &messages::CANNOT_BE_VOID);
    assert_clean("print(1)");
}

#[test]
fn test_ternary_unifies_numeric_branches() {
    let program = bind("var x = true ? 1 : 2.5");
    assert!(program.diagnostics.is_empty());
    assert_eq!(program.globals[0].ty, TypeSymbol::Float);
    assert_single("var x = true ? 1 : \"s\"", &messages::INCOMPATIBLE_TYPES);
}

#[test]
fn test_arrays() {
    let program = bind("var a = new int[3]\nvar g: int[,][] = new int[,][2]");
    assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics.diagnostics());
    assert_eq!(program.globals[0].ty, TypeSymbol::array(TypeSymbol::Int, 1));
    assert_single("var a = new int[]", &messages::ARRAY_CREATION_MUST_HAVE_SIZE);
    assert_single("var a = new void[1]", &messages::TYPE_NOT_FOUND);
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_read_only_assignment() {
    assert_single("let x = 1\nx = 2", &messages::CANNOT_ASSIGN_TO_READ_ONLY);
    assert_single("let x = 1\nx += 2", &messages::CANNOT_ASSIGN_TO_READ_ONLY);
    assert_single("let x = 1\nx++", &messages::CANNOT_ASSIGN_TO_READ_ONLY);
}

#[test]
fn test_compound_and_postfix_assignment() {
    assert_clean("var x = 1\nx += 2\nx *= 3\nx--\nvar s = \"a\"\ns += 1");
    assert_single("var x = 1\nx += 2.5", &messages::MISSING_EXPLICIT_CONVERSION);
    assert_single("var b = true\nb++", &messages::UNSUPPORTED_BINARY_OPERATOR);
}

#[test]
fn test_read_only_constant_is_recorded() {
    let program = bind("let x = 2 + 3 * 4\nvar y = 1");
    assert_eq!(program.globals[0].constant, Some(Value::Int(14)));
    assert_eq!(program.globals[1].constant, None);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_break_outside_loop() {
    assert_single("break", &messages::INVALID_BREAK_OR_CONTINUE);
    assert_single("fn f() { continue }", &messages::INVALID_BREAK_OR_CONTINUE);
    // The failed body also suppresses the missing-return error.
    assert_single("fn f(): int { break }", &messages::INVALID_BREAK_OR_CONTINUE);
    assert_clean("while true { break }\ndo { continue } while false");
}

#[test]
fn test_return_rules() {
    assert_single("return", &messages::RETURN_ONLY_IN_FUNCTION);
    assert_single("fn f() { return 1 }", &messages::INVALID_RETURN_EXPRESSION);
    assert_single("fn f(): int { return }", &messages::MISSING_RETURN_EXPRESSION);
    assert_single("fn f(): int { return \"s\" }", &messages::INCOMPATIBLE_TYPES);
}

#[test]
fn test_all_paths_return() {
    assert_clean("fn f(): int { return 1 }");
    assert_single(
        "fn f(c: bool): int { if c { return 1 } }",
        &messages::ALL_PATHS_MUST_RETURN,
    );
    assert_clean("fn f(c: bool): int { if c { return 1 } else { return 2 } }");
    assert_clean("fn f(): void { }");
    assert_clean("fn f(): int { while true { } }");
}

#[test]
fn test_all_paths_error_is_at_identifier() {
    let source = "fn answer(): int { }";
    let program = bind(source);
    let diagnostic = &program.diagnostics.diagnostics()[0];
    let span = diagnostic.span.expect("span");
    assert_eq!(&source[span.start as usize..span.end() as usize], "answer");
}

#[test]
fn test_division_by_constant_zero_warns() {
    let program = bind("var x = 1\nvar y = x / 0");
    assert_eq!(count(&program, &messages::DIVISION_BY_CONSTANT_ZERO), 1);
    assert!(program.is_valid);
    assert!(bind("var y = 1.5 / 0").diagnostics.is_empty());
}

// ============================================================================
// Diagnostic suppression
// ============================================================================

#[test]
fn test_first_error_per_statement() {
    let program = bind("var x = a + b\nvar y = c");
    assert_eq!(count(&program, &messages::UNRESOLVED_IDENTIFIER), 2);
}

#[test]
fn test_invalid_syntax_invalidates_without_report() {
    let arena = Bump::new();
    let (unit, parse_diagnostics) = parse_text(&arena, "test.ql", "var x = (1 + 2");
    assert!(!parse_diagnostics.is_empty());
    let (program, is_valid) = bind_program("test", &[], false, std::slice::from_ref(&unit));
    assert!(!is_valid);
    assert!(program.diagnostics.is_empty());
}

// ============================================================================
// Entry points
// ============================================================================

#[test]
fn test_program_mode_synthesizes_main() {
    let program = bind("var x = 1");
    let main = program.main_function.clone().expect("main");
    assert_eq!(main.name, "main");
    assert!(program.global_function.is_none());
    assert!(program.function_body(&main).is_some());
}

#[test]
fn test_explicit_main() {
    let program = bind("fn main() { print(1) }");
    assert!(program.diagnostics.is_empty());
    assert_eq!(program.main_function.as_ref().map(|f| f.declaration.is_some()), Some(true));

    assert_single("fn main(): int { return 0 }", &messages::MAIN_MUST_HAVE_CORRECT_SIGNATURE);
    assert_single(
        "fn main() { }\nprint(1)",
        &messages::CANNOT_MIX_MAIN_AND_GLOBAL_STATEMENTS,
    );
}

#[test]
fn test_script_returns_trailing_expression() {
    let program = bind_script("var x = 2\nx * 3");
    assert!(program.diagnostics.is_empty());
    let global = program.global_function.clone().expect("global function");
    assert_eq!(global.name, GLOBAL_FUNCTION_NAME);
    assert_eq!(global.return_type, TypeSymbol::Object);

    let body = program.function_body(&global).expect("body");
    assert!(matches!(
        body.statements.last(),
        Some(BoundStatement::Return(BoundReturnStatement { expression: Some(_) }))
    ));
}

#[test]
fn test_script_accepts_top_level_return() {
    let program = bind_script("var x = 1\nif x > 0 { return 5 }\nx");
    assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics.diagnostics());
}

#[test]
fn test_keep_unlowered() {
    let arena = Bump::new();
    let (unit, _) = parse_text(&arena, "test.ql", "fn f(n: int): int { while n > 0 { n = n - 1 }\nreturn n }");
    let (program, _) = ProgramBinder::new("test", false)
        .keep_unlowered(true)
        .bind(std::slice::from_ref(&unit));

    let f = program.lookup_function("f").cloned().expect("f");
    let unlowered = program.unlowered_body(&f).expect("unlowered");
    assert!(matches!(unlowered.statements[0], BoundStatement::While(_)));
    let lowered = program.function_body(&f).expect("lowered");
    assert!(lowered
        .statements
        .iter()
        .all(|s| !matches!(s, BoundStatement::While(_) | BoundStatement::Block(_))));
}
