mod common;

use std::rc::Rc;

use common::{run, Session};

use treelox::error::LoxError;
use treelox::function::NativeFn;
use treelox::interpreter::Interpreter;
use treelox::value::Value;

#[test]
fn test_print_arithmetic() {
    let session: Session = run("print 1 + 2 * 3;");

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "7\n");
}

#[test]
fn test_integral_numbers_print_without_fraction() {
    let session: Session = run("print 4 / 2; print 2.5; print 0.5 + 0.25;");

    assert_eq!(session.output(), "2\n2.5\n0.75\n");
}

#[test]
fn test_string_concatenation_stringifies_right_operand() {
    let session: Session = run("print \"a\" + 1; print \"b\" + true; print \"c\" + nil;");

    assert!(!session.lox.had_runtime_error());
    assert_eq!(session.output(), "a1\nbtrue\ncnil\n");
}

#[test]
fn test_number_plus_string_is_a_runtime_error() {
    let session: Session = run("print 1 + \"a\";");

    assert!(session.lox.had_runtime_error());
    assert_eq!(session.lox.exit_code(), 70);
    assert_eq!(session.output(), "");
}

#[test]
fn test_divide_by_zero_is_a_runtime_error() {
    let session: Session = run("print 1 / 0;");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_zero_and_empty_string_are_truthy() {
    let session: Session = run("print 0 ? \"t\" : \"f\"; print \"\" ? \"t\" : \"f\";");

    assert_eq!(session.output(), "t\nt\n");
}

#[test]
fn test_nil_and_false_are_falsey() {
    let session: Session = run("print nil ? \"t\" : \"f\"; print false ? \"t\" : \"f\";");

    assert_eq!(session.output(), "f\nf\n");
}

#[test]
fn test_logical_operators_return_the_deciding_value() {
    let session: Session = run("print nil or \"fallback\"; print 1 and 2; print false and 2;");

    assert_eq!(session.output(), "fallback\n2\nfalse\n");
}

#[test]
fn test_comparison_requires_numbers() {
    let session: Session = run("print \"a\" < \"b\";");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_unary_minus_requires_a_number() {
    let session: Session = run("print -\"x\";");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_block_scoping_and_shadowing() {
    let session: Session = run("var a = 1; { var a = 2; print a; } print a;");

    assert_eq!(session.output(), "2\n1\n");
}

#[test]
fn test_environment_is_restored_after_a_runtime_error() {
    let mut session: Session = Session::new();

    session.lox.run_source("var a = 1; { var a = 2; missing(); }");
    assert!(session.lox.had_runtime_error());

    // the failed block must not leak its scope into later runs
    session.lox.run_source("print a;");
    assert_eq!(session.output(), "1\n");
}

#[test]
fn test_closures_capture_their_environment() {
    let session: Session = run(concat!(
        "fun makeCounter() { var i = 0; fun count() { i = i + 1; print i; } return count; }\n",
        "var c = makeCounter();\n",
        "c(); c();",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "1\n2\n");
}

#[test]
fn test_binding_is_pinned_at_definition_site() {
    let session: Session = run(concat!(
        "var a = \"global\";\n",
        "{ fun show() { print a; } show(); var a = \"local\"; show(); }",
    ));

    // the unused local only warns; both calls see the global
    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "global\nglobal\n");
}

#[test]
fn test_functions_return_nil_on_fall_through() {
    let session: Session = run("fun f() {} print f();");

    assert_eq!(session.output(), "nil\n");
}

#[test]
fn test_lambda_values() {
    let session: Session = run("var twice = fun (x) { return x + x; }; print twice(4);");

    assert_eq!(session.output(), "8\n");
}

#[test]
fn test_arity_mismatch_is_a_runtime_error() {
    let session: Session = run("fun f(a, b) {} f(1);");

    assert!(session.lox.had_runtime_error());
    assert_eq!(session.lox.exit_code(), 70);
}

#[test]
fn test_eight_parameters_and_arguments_are_accepted() {
    let session: Session = run(concat!(
        "fun sum(a, b, c, d, e, g, h, i) { return a + b + c + d + e + g + h + i; }\n",
        "print sum(1, 1, 1, 1, 1, 1, 1, 1);",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "8\n");
}

#[test]
fn test_nine_parameters_are_a_static_error() {
    let session: Session = run("fun f(a, b, c, d, e, g, h, i, j) { return 1; }");

    assert!(session.lox.had_error());
    assert_eq!(session.lox.exit_code(), 65);
}

#[test]
fn test_calling_a_non_callable_is_a_runtime_error() {
    let session: Session = run("var x = 1; x();");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_for_loop_with_break() {
    let session: Session = run("for (var i = 0; i < 5; i = i + 1) { if (i == 3) break; print i; }");

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "0\n1\n2\n");
}

#[test]
fn test_break_unwinds_exactly_one_while() {
    let session: Session = run(concat!(
        "var i = 0;\n",
        "while (i < 2) {\n",
        "  var j = 0;\n",
        "  while (true) { if (j == 2) break; print j; j = j + 1; }\n",
        "  i = i + 1;\n",
        "}",
    ));

    assert_eq!(session.output(), "0\n1\n0\n1\n");
}

#[test]
fn test_while_condition_falsey_skips_body() {
    let session: Session = run("while (nil) print 1; print \"done\";");

    assert_eq!(session.output(), "done\n");
}

#[test]
fn test_class_instances_and_fields() {
    let session: Session = run(concat!(
        "class Bag {}\n",
        "var bag = Bag();\n",
        "bag.item = \"apple\";\n",
        "print bag.item;\n",
        "print bag;\n",
        "print Bag;",
    ));

    assert_eq!(session.output(), "apple\n<Bag instance>\n<class Bag>\n");
}

#[test]
fn test_methods_bind_this() {
    let session: Session = run(concat!(
        "class Greeter { init(name) { this.name = name; } greet() { return \"hi \" + this.name; } }\n",
        "print Greeter(\"lox\").greet();",
    ));

    assert_eq!(session.output(), "hi lox\n");
}

#[test]
fn test_detached_method_keeps_its_receiver() {
    let session: Session = run(concat!(
        "class C { init() { this.v = 42; } get() { return this.v; } }\n",
        "var m = C().get;\n",
        "print m();",
    ));

    assert_eq!(session.output(), "42\n");
}

#[test]
fn test_initializer_returns_this_on_bare_return() {
    let session: Session = run(concat!(
        "class F { init() { this.x = 1; return; } }\n",
        "print F().x;",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "1\n");
}

#[test]
fn test_class_named_method_acts_as_constructor() {
    let session: Session = run(concat!(
        "class Circle { Circle(r) { this.r = r; } area { return 3 * this.r * this.r; } }\n",
        "print Circle(2).area;",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "12\n");
}

#[test]
fn test_getter_properties_run_on_read() {
    let session: Session = run(concat!(
        "class Counter { init() { this.n = 0; } next { this.n = this.n + 1; return this.n; } }\n",
        "var c = Counter();\n",
        "print c.next;\n",
        "print c.next;",
    ));

    assert_eq!(session.output(), "1\n2\n");
}

#[test]
fn test_properties_are_inherited() {
    let session: Session = run(concat!(
        "class A { size { return 5; } }\n",
        "class B < A {}\n",
        "print B().size;",
    ));

    assert_eq!(session.output(), "5\n");
}

#[test]
fn test_fields_shadow_methods() {
    let session: Session = run(concat!(
        "class C { m() { return \"method\"; } }\n",
        "var c = C();\n",
        "c.m = fun () { return \"field\"; };\n",
        "print c.m();",
    ));

    assert_eq!(session.output(), "field\n");
}

#[test]
fn test_undefined_property_is_a_runtime_error() {
    let session: Session = run("class C {} print C().missing;");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_setting_a_field_on_a_non_instance_is_a_runtime_error() {
    let session: Session = run("var s = \"x\"; s.f = 1;");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_property_access_on_a_primitive_is_a_runtime_error() {
    let session: Session = run("print (1).foo;");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_static_class_methods() {
    let session: Session = run(concat!(
        "class Math { class square(n) { return n * n; } }\n",
        "print Math.square(3);",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "9\n");
}

#[test]
fn test_inheritance_dispatches_through_the_chain() {
    let session: Session = run(concat!(
        "class A { m() { return \"A\"; } }\n",
        "class B < A { m() { return \"B\"; } test() { return super.m(); } }\n",
        "class C < B {}\n",
        "print C().test();",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "A\n");
}

#[test]
fn test_subclass_inherits_methods() {
    let session: Session = run(concat!(
        "class A { m() { return \"from A\"; } }\n",
        "class B < A {}\n",
        "print B().m();",
    ));

    assert_eq!(session.output(), "from A\n");
}

#[test]
fn test_superclass_must_be_a_class() {
    let session: Session = run("var NotAClass = 1; class C < NotAClass {}");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_undefined_variable_read_is_a_runtime_error() {
    let session: Session = run("print missing;");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_assignment_never_defines() {
    let session: Session = run("missing = 1;");

    assert!(session.lox.had_runtime_error());
}

#[test]
fn test_assignment_is_an_expression() {
    let session: Session = run("var a = 1; print a = 2; print a;");

    assert_eq!(session.output(), "2\n2\n");
}

#[test]
fn test_clock_native_is_registered() {
    let session: Session = run("print clock() > 0;");

    assert!(!session.lox.had_runtime_error());
    assert_eq!(session.output(), "true\n");
}

#[test]
fn test_host_registered_natives_are_callable() {
    let mut session: Session = Session::new();

    let add: NativeFn = Rc::new(
        |_interpreter: &mut Interpreter, args: &[Value]| -> Result<Value, LoxError> {
            match (&args[0], &args[1]) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                _ => Err(LoxError::runtime(0, "add expects numbers")),
            }
        },
    );

    session.lox.define_native("add", 2, add);
    session.lox.run_source("print add(2, 3);");

    assert!(!session.lox.had_runtime_error());
    assert_eq!(session.output(), "5\n");
}

#[test]
fn test_host_globals_are_visible() {
    let mut session: Session = Session::new();

    session
        .lox
        .define_global("VERSION", Value::String("1.0".to_string()));
    session.lox.run_source("print VERSION;");

    assert_eq!(session.output(), "1.0\n");
}

#[test]
fn test_reset_discards_session_state() {
    let mut session: Session = Session::new();

    session.lox.run_source("print missing;");
    assert!(session.lox.had_runtime_error());

    session.lox.reset();
    assert!(!session.lox.had_runtime_error());
    assert_eq!(session.lox.exit_code(), 0);

    session.lox.run_source("var x = 1; print x;");
    assert_eq!(session.output(), "1\n");
}

#[test]
fn test_closures_over_loop_variable_share_one_binding() {
    let session: Session = run(concat!(
        "var get; var set;\n",
        "{ var shared = 1;\n",
        "  fun g() { return shared; }\n",
        "  fun s(v) { shared = v; }\n",
        "  get = g; set = s; }\n",
        "set(9); print get();",
    ));

    assert!(!session.lox.had_error());
    assert_eq!(session.output(), "9\n");
}

#[test]
fn test_recursion() {
    let session: Session = run(concat!(
        "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n",
        "print fib(10);",
    ));

    assert_eq!(session.output(), "55\n");
}

#[test]
fn test_equality_rules() {
    let session: Session = run(concat!(
        "print nil == nil;\n",
        "print 1 == 1;\n",
        "print \"a\" == \"a\";\n",
        "print 1 == \"1\";\n",
        "print true != false;",
    ));

    assert_eq!(session.output(), "true\ntrue\ntrue\nfalse\ntrue\n");
}
