#[cfg(test)]
mod parser_tests {
    use treelox::ast::{Expr, Stmt};
    use treelox::ast_printer::AstPrinter;
    use treelox::error::LoxError;
    use treelox::parser::Parser;
    use treelox::scanner::Scanner;

    fn parse(source: &str) -> Result<Vec<Stmt>, LoxError> {
        let (tokens, errors) = Scanner::new(source).scan_all();
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        Parser::new(tokens).parse()
    }

    fn parse_errors(source: &str) -> Vec<String> {
        match parse(source) {
            Err(LoxError::Compile(errors)) => errors.iter().map(ToString::to_string).collect(),
            other => panic!("expected parse errors, got {:?}", other),
        }
    }

    #[test]
    fn test_parses_declarations_in_order() {
        let statements = parse("var a = 1; fun f(x, y) { return x; } class C {}").unwrap();

        assert_eq!(statements.len(), 3);
        assert!(matches!(statements[0], Stmt::Var { .. }));
        assert!(matches!(statements[1], Stmt::Function(ref decl) if decl.params.len() == 2));
        assert!(matches!(statements[2], Stmt::Class { ref superclass, .. } if superclass.is_none()));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let statements = parse("a = b = c;").unwrap();

        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(= a (= b c))");
    }

    #[test]
    fn test_logical_operators_bind_looser_than_equality() {
        let statements = parse("a == b and c or d;").unwrap();

        assert_eq!(
            AstPrinter::print_stmt(&statements[0]),
            "(or (and (== a b) c) d)"
        );
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let statements = parse("for (;;) break;").unwrap();

        assert_eq!(AstPrinter::print_stmt(&statements[0]), "(while true (break))");
    }

    #[test]
    fn test_every_variable_occurrence_gets_its_own_id() {
        let statements = parse("a; a;").unwrap();

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_missing_semicolon_reports_at_end() {
        assert_eq!(
            parse_errors("print 1"),
            vec!["[line 1] Error at end: Expected ';' after value"]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            parse_errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target"]
        );
    }

    #[test]
    fn test_errors_accumulate_after_synchronizing() {
        assert_eq!(
            parse_errors("var = 1;\nprint ;"),
            vec![
                "[line 1] Error at '=': Expected variable name",
                "[line 2] Error at ';': Expected expression",
            ]
        );
    }

    #[test]
    fn test_argument_limit() {
        let arguments = vec!["1"; 256].join(", ");
        let errors = parse_errors(&format!("f({});", arguments));

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 arguments"));
    }

    #[test]
    fn test_parse_expression_rejects_trailing_tokens() {
        let (tokens, _) = Scanner::new("1 + 2 3").scan_all();

        let err = Parser::new(tokens).parse_expression().unwrap_err();

        assert_eq!(err.to_string(), "[line 1] Error at '3': Expected end of expression");
    }

    #[test]
    fn test_statement_serializes_to_json() {
        let statements = parse("print nil;").unwrap();

        let json = serde_json::to_string(&statements[0]).unwrap();

        assert!(json.contains("Print"), "got {}", json);
        assert!(json.contains("Nil"), "got {}", json);
    }
}
