use treelox::error::LoxError;
use treelox::interpreter::Interpreter;
use treelox::parser::Parser;
use treelox::resolver::Resolver;
use treelox::scanner::Scanner;
use treelox::token::Token;

/// Resolve a source string, returning `(errors, warnings)`.
fn resolve(source: &str) -> (Vec<LoxError>, Vec<LoxError>) {
    let tokens: Vec<Token> = Scanner::new(source.as_bytes())
        .filter_map(Result::ok)
        .collect();

    let mut parser = Parser::new(tokens, 0);
    let statements = parser.parse();

    assert!(!parser.had_error(), "parse errors: {:?}", parser.errors());

    let mut interpreter = Interpreter::new();
    let mut resolver = Resolver::new(&mut interpreter);
    resolver.resolve(&statements);

    resolver.into_diagnostics()
}

fn assert_error(source: &str, needle: &str) {
    let (errors, _) = resolve(source);

    assert!(
        errors.iter().any(|e| e.to_string().contains(needle)),
        "expected an error containing {:?}, got {:?}",
        needle,
        errors
    );
}

fn assert_clean(source: &str) {
    let (errors, warnings) = resolve(source);

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
}

#[test]
fn test_redeclaration_in_same_scope() {
    assert_error(
        "{ var a = 1; var a = 2; print a; }",
        "Variable with this name already declared in this scope.",
    );
}

#[test]
fn test_redeclaration_of_globals_is_allowed() {
    assert_clean("var a = 1; var a = 2; print a;");
}

#[test]
fn test_read_in_own_initializer() {
    assert_error(
        "{ var a = a; }",
        "Cannot read local variable in its own initializer.",
    );
}

#[test]
fn test_read_of_unassigned_local() {
    assert_error(
        "{ var x; print x; }",
        "Cannot read from unassigned local variable.",
    );
}

#[test]
fn test_unused_local_is_a_warning_not_an_error() {
    let (errors, warnings) = resolve("{ var unused = 1; }");

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0]
        .to_string()
        .contains("was assigned to but never accessed."));
}

#[test]
fn test_never_assigned_local_is_a_warning() {
    let (errors, warnings) = resolve("{ var x; }");

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0]
        .to_string()
        .contains("was defined but never assigned to."));
}

#[test]
fn test_unused_parameter_is_a_warning() {
    let (errors, warnings) = resolve("fun f(a) { return 1; } print f(2);");

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_return_at_top_level() {
    assert_error("return 1;", "Cannot return from top-level code.");
}

#[test]
fn test_return_with_value_in_initializer() {
    assert_error(
        "class C { init() { return 5; } }",
        "Cannot return a value from an initializer.",
    );
}

#[test]
fn test_bare_return_in_initializer_is_fine() {
    let (errors, _) = resolve("class C { init() { return; } }");

    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}

#[test]
fn test_class_named_constructor_counts_as_initializer() {
    assert_error(
        "class Circle { Circle(r) { this.r = r; return 5; } }",
        "Cannot return a value from an initializer.",
    );
}

#[test]
fn test_break_outside_loop() {
    assert_error("break;", "Cannot break outside of a loop.");
}

#[test]
fn test_break_does_not_cross_a_function_boundary() {
    assert_error(
        "while (true) { fun f() { break; } f(); break; }",
        "Cannot break outside of a loop.",
    );
}

#[test]
fn test_break_inside_while_is_fine() {
    assert_clean("while (true) { break; }");
}

#[test]
fn test_this_outside_class() {
    assert_error("print this;", "Cannot use 'this' outside of a class.");
}

#[test]
fn test_this_in_static_class_method() {
    assert_error(
        "class C { class m() { return this; } }",
        "Cannot use 'this' in a static class method.",
    );
}

#[test]
fn test_super_outside_class() {
    assert_error("print super.m;", "Cannot use 'super' outside of a class.");
}

#[test]
fn test_super_in_class_without_superclass() {
    assert_error(
        "class C { m() { return super.m(); } }",
        "Cannot use 'super' in a class with no superclass.",
    );
}

#[test]
fn test_super_in_subclass_is_fine() {
    assert_clean(
        "class A { m() { return 1; } } class B < A { m() { return super.m(); } } print B().m();",
    );
}

#[test]
fn test_self_inheritance_in_local_scope() {
    assert_error(
        "{ class Foo < Foo {} }",
        "Cannot read local variable in its own initializer.",
    );
}

#[test]
fn test_resolution_is_idempotent() {
    let tokens: Vec<Token> = Scanner::new(
        "fun make() { var i = 0; fun get() { return i; } return get; } print make()();".as_bytes(),
    )
    .filter_map(Result::ok)
    .collect();

    let mut parser = Parser::new(tokens, 0);
    let statements = parser.parse();
    assert!(!parser.had_error());

    let mut interpreter = Interpreter::new();

    // Resolving the same AST twice must leave the annotations (and so
    // the runtime behavior) unchanged.
    for _ in 0..2 {
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&statements);
        let (errors, _) = resolver.into_diagnostics();
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    assert!(interpreter.interpret(&statements).is_ok());
}
