use pretty_assertions::assert_eq;
use crate::compiler::diagnostics::CaptureDiagnostics;
use crate::compiler::lexer::Lexer;
use super::*;

fn parse(source: &str) -> (Vec<Stmt>, CaptureDiagnostics) {
    let mut diagnostics = CaptureDiagnostics::new();
    let tokens = Lexer::new(source).scan_tokens(&mut diagnostics);
    let statements = Parser::new(tokens, &mut diagnostics).parse();

    (statements, diagnostics)
}

fn parse_ok(source: &str) -> Vec<String> {
    let (statements, diagnostics) = parse(source);
    assert_eq!(Vec::<String>::new(), diagnostics.errors);

    statements.iter().map(|stmt| format!("{:?}", stmt)).collect()
}

mod expressions {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn factor_binds_tighter_than_term() {
        assert_eq!(vec!["print (+ 2 (* 3 2));"], parse_ok("print 2 + 3 * 2;"));
        assert_eq!(vec!["print (* (group (+ 2 3)) 2);"], parse_ok("print (2 + 3) * 2;"));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(vec!["(- (- 1 2) 3);"], parse_ok("1 - 2 - 3;"));
        assert_eq!(vec!["(== (< 1 2) true);"], parse_ok("1 < 2 == true;"));
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(vec!["(= a (= b 3));"], parse_ok("a = b = 3;"));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(vec!["(or a (and b c));"], parse_ok("a or b and c;"));
    }

    #[test]
    fn unary_operators_nest() {
        assert_eq!(vec!["(- (! x));"], parse_ok("-!x;"));
    }

    #[test]
    fn calls_chain() {
        assert_eq!(vec!["(call (call f 1) 2 3);"], parse_ok("f(1)(2, 3);"));
        assert_eq!(vec!["(call f);"], parse_ok("f();"));
    }

    #[test]
    fn index_after_primary() {
        assert_eq!(vec!["print (index \"hey\" 1);"], parse_ok("print \"hey\"[1];"));
    }

    #[test]
    fn literals() {
        assert_eq!(vec!["print nil;", "print false;", "print 1.5;", "print \"s\";"],
                   parse_ok("print nil; print false; print 1.5; print \"s\";"));
    }
}

mod statements {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn var_with_and_without_initializer() {
        assert_eq!(vec!["var a;", "var b = (+ 1 2);"], parse_ok("var a; var b = 1 + 2;"));
    }

    #[test]
    fn if_else_and_while() {
        assert_eq!(vec!["if (x) print 1; else print 2;", "while ((< i 3)) { (= i (+ i 1)); }"],
                   parse_ok("if (x) print 1; else print 2; while (i < 3) { i = i + 1; }"));
    }

    #[test]
    fn function_declaration() {
        assert_eq!(vec!["fun add(a, b) { return (+ a b); }", "fun nothing() { return; }"],
                   parse_ok("fun add(a, b) { return a + b; } fun nothing() { return; }"));
    }

    #[test]
    fn for_becomes_while() {
        assert_eq!(vec!["{ var b = 3; while ((< b 6)) { print b; (= b (+ b 1)); } }"],
                   parse_ok("for (var b = 3; b < 6; b = b + 1) print b;"));
    }

    #[test]
    fn for_without_clauses_loops_on_true() {
        assert_eq!(vec!["while (true) print 1;"], parse_ok("for (;;) print 1;"));
    }
}

mod errors {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn invalid_assignment_target_keeps_statement() {
        let (statements, diagnostics) = parse("1 + 2 = 3;");

        assert_eq!(1, statements.len());
        assert_eq!(vec![String::from("[line 1 column 7] Error at '=' (offset 6): Invalid assignment target")],
                   diagnostics.errors);
    }

    #[test]
    fn recovers_at_next_statement() {
        let (statements, diagnostics) = parse("print 1 +; print 2; var = 3; print 3;");

        assert_eq!(vec!["print 2;", "print 3;"],
                   statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<_>>());
        assert_eq!(vec![
            String::from("[line 1 column 10] Error at ';' (offset 9): Expected expression"),
            String::from("[line 1 column 25] Error at '=' (offset 24): Expected variable name after 'var'"),
        ], diagnostics.errors);
    }

    #[test]
    fn one_error_per_mistake() {
        let (statements, diagnostics) = parse("var a = (1 + ;\nprint a;");

        assert_eq!(vec!["print a;"], statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<_>>());
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn bad_statement_inside_block_is_dropped() {
        let (statements, diagnostics) = parse("{ print ); print 1; }");

        assert_eq!(vec!["{ print 1; }"], statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<_>>());
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn unclosed_block_reports_at_end() {
        let (statements, diagnostics) = parse("{ print 1;");

        assert!(statements.is_empty());
        assert_eq!(vec![String::from("[line 1 column 11] Error at end (offset 10): Expected '}' after block")],
                   diagnostics.errors);
    }

    #[test]
    fn too_many_arguments_is_not_fatal() {
        let args = (0..256).map(|i| i.to_string()).collect::<Vec<String>>().join(", ");
        let (statements, diagnostics) = parse(&format!("f({});", args));

        assert_eq!(1, statements.len());
        assert_eq!(1, diagnostics.errors.len());
        assert!(diagnostics.errors[0].ends_with("Can't have more than 255 function call arguments"));
    }

    #[test]
    fn too_many_parameters_is_not_fatal() {
        let params = (0..256).map(|i| format!("p{}", i)).collect::<Vec<String>>().join(", ");
        let (statements, diagnostics) = parse(&format!("fun f({}) {{}} print 1;", params));

        assert_eq!(2, statements.len());
        assert_eq!(1, diagnostics.errors.len());
        assert!(diagnostics.errors[0].ends_with("Can't have more than 255 parameters"));
    }

    #[test]
    fn recovery_stops_at_closing_brace() {
        let (statements, diagnostics) = parse("{ print 1 } print 2;");

        assert_eq!(vec!["{  }", "print 2;"], statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<_>>());
        assert_eq!(vec![String::from("[line 1 column 11] Error at '}' (offset 10): Expected ';' after value")],
                   diagnostics.errors);
    }

    #[test]
    fn recovery_stops_at_end_of_function_body() {
        let (statements, diagnostics) = parse("fun f() { return 1 } print 2;");

        assert_eq!(vec!["fun f() {  }", "print 2;"], statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<_>>());
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn stray_closing_brace_at_top_level_is_skipped() {
        let (statements, diagnostics) = parse("print 1 } print 2;");

        assert_eq!(vec!["print 2;"], statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<_>>());
        assert_eq!(1, diagnostics.errors.len());
    }

    #[test]
    fn missing_expression_at_end() {
        let (statements, diagnostics) = parse("print");

        assert!(statements.is_empty());
        assert_eq!(vec![String::from("[line 1 column 6] Error at end (offset 5): Expected expression")],
                   diagnostics.errors);
    }
}
