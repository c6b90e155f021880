mod common;

use common::{run, run_ok, run_runtime_error, session};
use treelox::error::LoxError;
use treelox::value::Value;
use treelox::Lox;

#[test]
fn arithmetic_and_string_concatenation() {
    assert_eq!(
        run_ok("print 1 + 2; print \"a\" + \"b\"; print 7 / 2; print -(3 * 2);"),
        "3\nab\n3.5\n-6\n"
    );
}

#[test]
fn mixed_plus_operands_are_a_runtime_error() {
    let (_, message) = run_runtime_error("print 1 + \"a\";");
    assert_eq!(message, "Operands must be two numbers or two strings");
}

#[test]
fn numeric_operators_reject_strings() {
    let (_, message) = run_runtime_error("print \"a\" - 1;");
    assert_eq!(message, "Operands must be two numbers");

    let (_, message) = run_runtime_error("print \"a\" < \"b\";");
    assert_eq!(message, "Operands must be two numbers");
}

#[test]
fn negating_a_non_number() {
    let (_, message) = run_runtime_error("print -\"a\";");
    assert_eq!(message, "Operand must be a number");
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(
        run_ok("print 1 / 0; print -1 / 0; print 0 / 0 == 0 / 0;"),
        "Infinity\n-Infinity\nfalse\n"
    );
}

#[test]
fn truthiness() {
    assert_eq!(
        run_ok("print !nil; print !false; print !0; print !\"\"; print !true;"),
        "true\ntrue\nfalse\nfalse\nfalse\n"
    );
}

#[test]
fn equality_does_not_coerce() {
    assert_eq!(
        run_ok("print nil == false; print 1 == \"1\"; print \"x\" == \"x\"; print nil == nil;"),
        "false\nfalse\ntrue\ntrue\n"
    );
}

#[test]
fn logical_operators_return_an_operand() {
    assert_eq!(
        run_ok("print nil or \"yes\"; print 0 and \"second\"; print false and undefined;"),
        "yes\nsecond\nfalse\n"
    );
}

#[test]
fn block_scoping_and_shadowing() {
    let source = "
        var a = \"outer\";
        {
            var a = \"inner\";
            print a;
        }
        print a;
    ";

    assert_eq!(run_ok(source), "inner\nouter\n");
}

#[test]
fn counters_keep_independent_state() {
    let source = "
        fun makeCounter() {
            var i = 0;
            fun count() {
                i = i + 1;
                return i;
            }
            return count;
        }

        var c1 = makeCounter();
        var c2 = makeCounter();
        print c1();
        print c1();
        print c2();
    ";

    assert_eq!(run_ok(source), "1\n2\n1\n");
}

#[test]
fn closures_over_one_variable_share_it() {
    let source = "
        var get;
        var set;
        {
            var shared = 1;
            fun g() { return shared; }
            fun s(v) { shared = v; }
            get = g;
            set = s;
        }
        set(42);
        print get();
    ";

    assert_eq!(run_ok(source), "42\n");
}

#[test]
fn recursion() {
    let source = "
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(15);
    ";

    assert_eq!(run_ok(source), "610\n");
}

#[test]
fn for_loop_with_while_semantics() {
    assert_eq!(
        run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
}

#[test]
fn break_leaves_only_the_innermost_loop() {
    let source = "
        for (var i = 0; i < 3; i = i + 1) {
            for (var j = 0; j < 10; j = j + 1) {
                if (j == 2) break;
                print i * 10 + j;
            }
        }
    ";

    assert_eq!(run_ok(source), "0\n1\n10\n11\n20\n21\n");
}

#[test]
fn break_inside_nested_blocks_of_a_while() {
    let source = "
        var n = 0;
        while (true) {
            {
                n = n + 1;
                if (n == 3) { break; }
            }
        }
        print n;
    ";

    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn return_from_inside_a_loop() {
    let source = "
        fun first(limit) {
            var i = 0;
            while (true) {
                if (i == limit) return i;
                i = i + 1;
            }
        }
        print first(4);
    ";

    assert_eq!(run_ok(source), "4\n");
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
}

#[test]
fn callable_display_forms() {
    assert_eq!(
        run_ok("fun f() {} print f; print clock;"),
        "<fn f>\n<native fn>\n"
    );
}

#[test]
fn clock_returns_seconds() {
    assert_eq!(run_ok("print clock() > 0;"), "true\n");
}

#[test]
fn arity_mismatch() {
    let (_, message) = run_runtime_error("fun f(a) {}\nf(1, 2);");
    assert_eq!(message, "Expected 1 arguments but got 2.");
}

#[test]
fn calling_a_non_callable() {
    let (_, message) = run_runtime_error("\"x\"();");
    assert_eq!(message, "Can only call functions and classes.");
}

#[test]
fn undefined_variable_assignment() {
    let (_, message) = run_runtime_error("missing = 1;");
    assert_eq!(message, "Undefined variable 'missing'.");
}

#[test]
fn runtime_error_keeps_earlier_output_and_reports_line() {
    match run("print 1;\nprint 2;\nprint nope;\nprint 4;") {
        (output, Err(LoxError::Runtime { message, line })) => {
            assert_eq!(output, "1\n2\n");
            assert_eq!(message, "Undefined variable 'nope'.");
            assert_eq!(line, 3);
        }
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn runtime_errors_exit_with_70() {
    let (_, result) = run("-nil;");
    let err = result.unwrap_err();

    assert!(!err.is_static());
    assert_eq!(err.exit_code(), 70);
    assert_eq!(err.to_string(), "Operand must be a number\n[line 1]");
}

#[test]
fn session_keeps_globals_between_runs() {
    let (mut lox, output) = session();

    lox.run("var a = 1; fun twice(x) { return x * 2; }").unwrap();
    lox.run("print twice(a);").unwrap();

    assert_eq!(output.contents(), "2\n");
}

#[test]
fn closures_resolved_in_an_earlier_run_still_work() {
    let (mut lox, output) = session();

    lox.run("var h; { var x = 5; fun g() { return x; } h = g; }")
        .unwrap();
    lox.run("print h();").unwrap();

    assert_eq!(output.contents(), "5\n");
}

#[test]
fn session_recovers_after_runtime_error_in_a_block() {
    let (mut lox, output) = session();

    assert!(lox.run("{ var inner = 1; print undefined; }").is_err());
    lox.run("var b = 2; print b;").unwrap();

    // The block's scope must not leak into the globals.
    let err = lox.run("print inner;").unwrap_err();

    assert_eq!(output.contents(), "2\n");
    assert!(matches!(err, LoxError::Runtime { ref message, .. } if message == "Undefined variable 'inner'."));
}

#[test]
fn evaluate_returns_a_value() {
    let mut lox = Lox::with_output(Box::new(std::io::sink()));

    assert_eq!(lox.evaluate("(1 + 2) * 4").unwrap(), Value::Number(12.0));
    assert_eq!(
        lox.evaluate("\"ab\" + \"cd\"").unwrap(),
        Value::String("abcd".into())
    );
    assert!(lox.evaluate("1 +").unwrap_err().is_static());
}

#[test]
fn natives_can_be_added_to_globals() {
    let (mut lox, output) = session();

    lox.interpreter().globals().borrow_mut().define(
        "double",
        Value::native("double", 1, |args: &[Value]| match args {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => Err("double expects a number".to_string()),
        }),
    );

    lox.run("print double(21);").unwrap();
    assert_eq!(output.contents(), "42\n");

    let err = lox.run("double(\"x\");").unwrap_err();
    assert_eq!(err.to_string(), "double expects a number\n[line 1]");
}
