use pretty_assertions::assert_eq;
use crate::compiler::diagnostics::CaptureDiagnostics;
use super::*;

fn run(source: &str) -> CaptureDiagnostics {
    let mut diagnostics = CaptureDiagnostics::new();
    let mut interpreter = Interpreter::new(&mut diagnostics);
    crate::run_source(source, &mut interpreter);
    drop(interpreter);

    diagnostics
}

fn output(source: &str) -> Vec<String> {
    let diagnostics = run(source);
    assert_eq!(Vec::<String>::new(), diagnostics.errors);

    diagnostics.printed
}

fn single_error(source: &str) -> String {
    let diagnostics = run(source);
    assert_eq!(1, diagnostics.errors.len(), "{:?}", diagnostics.errors);

    diagnostics.errors[0].clone()
}

mod expressions {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn arithmetic() {
        assert_eq!(vec!["1", "2", "6", "3.5", "-4"], output("print 1; print 1 + 1; print 2 * 3; print 7 / 2; print -(2 + 2);"));
    }

    #[test]
    fn precedence() {
        assert_eq!(vec!["8", "10"], output("print 2 + 3 * 2; print (2 + 3) * 2;"));
    }

    #[test]
    fn comparison() {
        assert_eq!(vec!["false", "true", "true", "false"], output("print 15 < 12; print 12 < 15; print 3 >= 3; print !(2 < 3);"));
    }

    #[test]
    fn equality_never_fails() {
        assert_eq!(vec!["true", "false", "false", "true", "false", "true"],
                   output("print nil == nil; print 1 == \"1\"; print nil == false; print \"a\" == \"a\"; print 1 != 1; print clock == clock;"));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(vec!["ab"], output("print \"a\" + \"b\";"));
    }

    #[test]
    fn mixed_plus_fails() {
        assert_eq!("[line 1 column 9] Error at '+' (offset 8): Operands must be two numbers or two strings",
                   single_error("print 1 + \"a\";"));
    }

    #[test]
    fn comparison_needs_numbers() {
        assert!(single_error("print \"a\" < 1;").ends_with("Operands must be numbers"));
        assert!(single_error("print -nil;").ends_with("Operand must be a number"));
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(vec!["true", "false", "false", "false", "true", "true", "true", "false"],
                   output("print true and true; print true and false; print false and true; print false and false;\
                           print true or true; print true or false; print false or true; print false or false;"));
        assert_eq!(vec!["x", "2", "nil"], output("print nil or \"x\"; print 0 and 2; print nil and undefined;"));
    }

    #[test]
    fn truthiness() {
        assert_eq!(vec!["zero", "empty", "else"],
                   output("if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\"; else print \"else\";"));
    }

    #[test]
    fn string_index() {
        assert_eq!(vec!["l"], output("print \"hello\"[2];"));
        assert!(single_error("print \"abc\"[5];").ends_with("Invalid target for index expression"));
        assert!(single_error("print 12[0];").ends_with("Invalid target for index expression"));
    }
}

mod variables {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn globals() {
        assert_eq!(vec!["5"], output("var a = 2; var b = 3; print a + b;"));
        assert_eq!(vec!["5"], output("var a = 2; var b = 3; a = a + b; print a;"));
        assert_eq!(vec!["nil"], output("var a; print a;"));
    }

    #[test]
    fn block_does_not_leak() {
        assert_eq!(vec!["5"], output("var a = 2; { var b = 3; a = a + b; } print a;"));
        assert_eq!("[line 1 column 22] Error at 'b' (offset 21): Undefined variable 'b'",
                   single_error("{ var b = 3; } print b;"));
    }

    #[test]
    fn shadowing_keeps_outer_binding() {
        assert_eq!(vec!["inner", "outer"], output("var a = \"outer\"; { var a = \"inner\"; print a; } print a;"));
    }

    #[test]
    fn assigning_undefined_global_fails() {
        assert!(single_error("x = 1;").ends_with("Undefined variable 'x'"));
    }

    #[test]
    fn global_redefinition_fails_at_runtime() {
        assert!(single_error("var a = 1; var a = 2;").ends_with("Attempt to redefine variable 'a'"));
    }
}

mod statements {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn if_else() {
        assert_eq!(vec!["3"], output("var a; if (true) { a = 3; } else { a = 4; } print a;"));
        assert_eq!(vec!["4"], output("var a; if (false) { a = 3; } else { a = 4; } print a;"));
    }

    #[test]
    fn while_loop() {
        assert_eq!(vec!["8"], output("while (false) {} print 8;"));
        assert_eq!(vec!["0", "1", "2"], output("var i = 0; while (i < 3) { print i; i = i + 1; }"));
    }

    #[test]
    fn for_loop() {
        assert_eq!(vec!["12"], output("var a = 0; for (var b = 3; b < 6; b = b + 1) { a = a + b; } print a;"));
    }
}

mod functions {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn calls_with_and_without_arguments() {
        assert_eq!(vec!["Hello world", "Hello"],
                   output("fun say(word) { print \"Hello \" + word; } say(\"world\"); fun hi() { print \"Hello\"; } hi();"));
    }

    #[test]
    fn return_values() {
        assert_eq!(vec!["7", "nil", "3"],
                   output("fun seven() { return 7; } print seven();\
                           fun nothing() {} print nothing();\
                           fun early() { while (true) { return 3; } } print early();"));
    }

    #[test]
    fn recursion() {
        assert_eq!(vec!["55"], output("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"));
    }

    #[test]
    fn closures_capture_by_reference() {
        let source = "fun makeCounter(init) {
                          var i = init;
                          fun count() {
                              i = i + 1;
                              return i;
                          }
                          return count;
                      }
                      var counter = makeCounter(7);
                      print counter();
                      print counter();
                      var other = makeCounter(0);
                      print other();
                      print counter() + counter();";

        assert_eq!(vec!["8", "9", "1", "21"], output(source));
    }

    #[test]
    fn closure_sees_declaration_scope() {
        let source = "var a = \"global\";
                      {
                          fun show() { print a; }
                          show();
                          var a = \"block\";
                          show();
                      }";

        assert_eq!(vec!["global", "global"], output(source));
    }

    #[test]
    fn returned_function_called_in_place() {
        assert_eq!(vec!["3", "3"],
                   output("fun mk() { fun g(x) { return x; } return g; } print mk()(3);\
                           fun adder(a) { fun add(b) { return a + b; } return add; } print adder(1)(2);"));
    }

    #[test]
    fn deep_recursion_within_limit() {
        assert_eq!(vec!["1000"],
                   output("fun count(n) { if (n == 0) return 0; return 1 + count(n - 1); } print count(1000);"));
    }

    #[test]
    fn runaway_recursion_is_a_runtime_error() {
        let mut diagnostics = CaptureDiagnostics::new();
        let mut interpreter = Interpreter::new(&mut diagnostics);

        crate::run_source("fun f(n) { return f(n + 1); } f(0); print \"unreachable\";", &mut interpreter);
        assert_eq!(0, interpreter.call_depth);

        crate::run_source("print \"after\";", &mut interpreter);
        drop(interpreter);

        assert_eq!(vec!["after"], diagnostics.printed);
        assert_eq!(1, diagnostics.errors.len());
        assert!(diagnostics.errors[0].ends_with("Stack overflow"), "{}", diagnostics.errors[0]);
    }

    #[test]
    fn function_values_render_by_name() {
        assert_eq!(vec!["<fn f>", "<native fn clock>"], output("fun f() {} print f; print clock;"));
    }

    #[test]
    fn arity_is_checked() {
        assert_eq!("[line 1 column 15] Error at ')' (offset 14): Expected 1 argument(s) but got 0",
                   single_error("fun f(a) {} f();"));
    }

    #[test]
    fn only_functions_are_callable() {
        assert!(single_error("\"x\"();").ends_with("Can only call functions, not string"));
    }

    #[test]
    fn clock_returns_milliseconds() {
        assert_eq!(vec!["true"], output("print clock() > 1000000000000;"));
    }

    struct Add;

    impl Callable for Add {
        fn name(&self) -> &str {
            "add"
        }

        fn arity(&self) -> usize {
            2
        }

        fn call(&self, _interpreter: &mut Interpreter<'_>, arguments: Vec<Value>) -> RuntimeResult<Value> {
            match (&arguments[0], &arguments[1]) {
                (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
                _ => Ok(Value::Nil),
            }
        }

        fn is_native(&self) -> bool {
            true
        }
    }

    #[test]
    fn natives_can_be_registered() {
        let mut diagnostics = CaptureDiagnostics::new();
        let mut interpreter = Interpreter::new(&mut diagnostics);

        assert!(interpreter.define_native(Rc::new(Add)).is_ok());
        assert!(interpreter.define_native(Rc::new(Add)).is_err());
        assert!(interpreter.globals().borrow().contains("add"));

        crate::run_source("print add(2, 3);", &mut interpreter);
        drop(interpreter);

        assert_eq!(vec!["5"], diagnostics.printed);
    }
}

mod pipeline {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn runtime_error_stops_execution() {
        let diagnostics = run("print 1; print -\"x\"; print 2;");

        assert_eq!(vec!["1"], diagnostics.printed);
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn well_formed_statements_run_after_syntax_error() {
        let diagnostics = run("print 1; print ); print 2;");

        assert_eq!(vec!["1", "2"], diagnostics.printed);
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn resolution_error_skips_the_batch() {
        let diagnostics = run("print 1; { var a = a; }");

        assert!(diagnostics.printed.is_empty());
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn globals_persist_between_batches() {
        let mut diagnostics = CaptureDiagnostics::new();
        let mut interpreter = Interpreter::new(&mut diagnostics);

        crate::run_source("var a = 1; fun inc() { a = a + 1; }", &mut interpreter);
        crate::run_source("inc(); inc();", &mut interpreter);
        crate::run_source("print a;", &mut interpreter);
        drop(interpreter);

        assert_eq!(vec!["3"], diagnostics.printed);
    }

    #[test]
    fn too_many_parameters_still_runs_the_rest() {
        let params = (0..256).map(|i| format!("p{}", i)).collect::<Vec<String>>().join(", ");
        let diagnostics = run(&format!("fun f({}) {{}} print 1;", params));

        assert_eq!(vec!["1"], diagnostics.printed);
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn locals_of_finished_batches_are_dropped() {
        let mut diagnostics = CaptureDiagnostics::new();
        let mut interpreter = Interpreter::new(&mut diagnostics);

        crate::run_source("{ var a = 1; print a; }", &mut interpreter);
        assert!(interpreter.locals.is_empty());

        crate::run_source("fun outer() { var a = 2; fun inner() { return a; } return inner; } var get = outer();", &mut interpreter);
        let kept = interpreter.locals.len();
        assert!(kept > 0);

        crate::run_source("{ var b = 3; print b; } print get();", &mut interpreter);
        assert_eq!(kept, interpreter.locals.len());
        drop(interpreter);

        assert_eq!(vec!["1", "3", "2"], diagnostics.printed);
    }

    #[test]
    fn scope_is_restored_after_error_in_block() {
        let mut diagnostics = CaptureDiagnostics::new();
        let mut interpreter = Interpreter::new(&mut diagnostics);

        crate::run_source("{ var a = 1; print -\"x\"; }", &mut interpreter);
        crate::run_source("var a = 5; print a;", &mut interpreter);
        drop(interpreter);

        assert_eq!(vec!["5"], diagnostics.printed);
        assert_eq!(1, diagnostics.errors.len());
    }
}
