#[cfg(test)]
mod morpher_tests {
    use tern::error::TernError;
    use tern::morpher::*;
    use tern::scanner::Scanner;
    use tern::token::*;

    fn morphed(source: &str) -> Vec<TokenType> {
        Morpher::new(Scanner::new(source, "<test>"))
            .filter_map(Result::ok)
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_line_breaks_and_semicolons_become_separators() {
        use TokenType::*;

        assert_eq!(morphed("a\nb"), vec![IDENTIFIER, SEPARATOR, IDENTIFIER, EOF]);
        assert_eq!(morphed("a;b"), vec![IDENTIFIER, SEPARATOR, IDENTIFIER, EOF]);
    }

    #[test]
    fn test_runs_of_separators_collapse() {
        use TokenType::*;

        assert_eq!(
            morphed("a;;\n\n  ;b"),
            vec![IDENTIFIER, SEPARATOR, IDENTIFIER, EOF]
        );
    }

    #[test]
    fn test_trivia_is_dropped() {
        use TokenType::*;

        assert_eq!(
            morphed("a  // trailing note\n/* block */ b"),
            vec![IDENTIFIER, SEPARATOR, IDENTIFIER, EOF]
        );
    }

    #[test]
    fn test_separator_after_operator_is_elided() {
        use TokenType::*;

        assert_eq!(morphed("a +\nb"), vec![IDENTIFIER, PLUS, IDENTIFIER, EOF]);
        assert_eq!(morphed("x =\n1"), vec![IDENTIFIER, EQUAL, NUMBER, EOF]);
        assert_eq!(morphed("p and\nq"), vec![IDENTIFIER, AND, IDENTIFIER, EOF]);
    }

    #[test]
    fn test_separator_after_infix_and_opener_tokens_is_elided() {
        use TokenType::*;

        assert_eq!(morphed("p.\nq"), vec![IDENTIFIER, DOT, IDENTIFIER, EOF]);
        assert_eq!(morphed("p?.\nq"), vec![IDENTIFIER, SAFE_DOT, IDENTIFIER, EOF]);
        assert_eq!(morphed("[\n1]"), vec![LEFT_BRACKET, NUMBER, RIGHT_BRACKET, EOF]);
        assert_eq!(morphed("k:\nv"), vec![IDENTIFIER, COLON, IDENTIFIER, EOF]);
        assert_eq!(morphed("x ->\nx"), vec![IDENTIFIER, ARROW, IDENTIFIER, EOF]);
        assert_eq!(
            morphed("v match\n{"),
            vec![IDENTIFIER, MATCH, LEFT_BRACE, EOF]
        );
        assert_eq!(morphed("a,\nb"), vec![IDENTIFIER, COMMA, IDENTIFIER, EOF]);
    }

    #[test]
    fn test_separator_after_operand_is_kept() {
        use TokenType::*;

        // `f(\n1,\n2\n)`: only the break after `2` survives.
        assert_eq!(
            morphed("f(\n1,\n2\n)"),
            vec![IDENTIFIER, LEFT_PAREN, NUMBER, COMMA, NUMBER, SEPARATOR, RIGHT_PAREN, EOF]
        );
    }

    #[test]
    fn test_continuation_joins_lines() {
        use TokenType::*;

        assert_eq!(morphed("a \\\nb"), vec![IDENTIFIER, IDENTIFIER, EOF]);
    }

    #[test]
    fn test_leading_break_is_forwarded() {
        use TokenType::*;

        assert_eq!(morphed("\na"), vec![SEPARATOR, IDENTIFIER, EOF]);
    }

    #[test]
    fn test_elision_table() {
        assert!(elides_separator(TokenType::ARROW));
        assert!(elides_separator(TokenType::LEFT_BRACKET));
        assert!(elides_separator(TokenType::MATCH));
        assert!(!elides_separator(TokenType::RIGHT_PAREN));
        assert!(!elides_separator(TokenType::IDENTIFIER));
        assert!(!elides_separator(TokenType::LEFT_BRACE));
    }

    #[test]
    fn test_errors_pass_through() {
        let results: Vec<Result<Token, TernError>> =
            Morpher::new(Scanner::new("a # b", "<test>")).collect();

        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TernError::Lex { .. }))));
        assert!(matches!(results.last(), Some(Ok(t)) if t.token_type == TokenType::EOF));
    }
}
