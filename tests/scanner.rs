#[cfg(test)]
mod scanner_tests {
    use tern::error::TernError;
    use tern::scanner::*;
    use tern::token::*;

    /// Significant tokens only: whitespace and comments are dropped.
    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source, "<test>");
        let tokens: Vec<_> = scanner
            .filter_map(Result::ok)
            .filter(|t| !t.token_type.is_trivia())
            .collect();

        let actual: Vec<(TokenType, &str)> = tokens
            .iter()
            .map(|t| (t.token_type, t.lexeme.as_str()))
            .collect();

        assert_eq!(actual, expected);
    }

    fn scan(source: &str) -> Vec<Result<Token, TernError>> {
        Scanner::new(source, "<test>").collect()
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({[,.:;]})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::COMMA, ","),
                (TokenType::DOT, "."),
                (TokenType::COLON, ":"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_maximal_munch_prefers_double_equal() {
        assert_token_sequence(
            "a==b",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_multi_character_operators() {
        assert_token_sequence(
            "... ?. -> += -= *= /= %= ^= ~= != <= >= - >",
            &[
                (TokenType::ELLIPSIS, "..."),
                (TokenType::SAFE_DOT, "?."),
                (TokenType::ARROW, "->"),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::PERCENT_EQUAL, "%="),
                (TokenType::CARET_EQUAL, "^="),
                (TokenType::TILDE_EQUAL, "~="),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::MINUS, "-"),
                (TokenType::GREATER, ">"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_two_dots_are_two_tokens() {
        assert_token_sequence(
            "a..b",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::DOT, "."),
                (TokenType::DOT, "."),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_token_sequence(
            "class classy match x$1 _tmp null",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::MATCH, "match"),
                (TokenType::IDENTIFIER, "x$1"),
                (TokenType::IDENTIFIER, "_tmp"),
                (TokenType::NULL, "null"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_number_literals() {
        let tokens: Vec<Token> = Scanner::new("12 3.25 4.", "<test>")
            .filter_map(Result::ok)
            .filter(|t| !t.token_type.is_trivia())
            .collect();

        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.25)));
        assert_eq!(tokens[2].literal, Some(Literal::Number(4.0)));
        assert_eq!(tokens[3].token_type, TokenType::DOT);

        assert_eq!(tokens[0].to_string(), "NUMBER 12 12.0");
        assert_eq!(tokens[1].to_string(), "NUMBER 3.25 3.25");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = scan(r#""a\tb\"c\\""#);
        let token = tokens[0].as_ref().expect("string should scan");

        assert_eq!(token.token_type, TokenType::STRING);
        assert_eq!(token.literal, Some(Literal::Str("a\tb\"c\\".to_string())));
    }

    #[test]
    fn test_invalid_escape_is_an_error() {
        let tokens = scan(r#""bad \q""#);
        match &tokens[0] {
            Err(TernError::Lex { message, .. }) => assert!(message.contains("escape")),
            other => panic!("expected a lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = scan("\"never closed");
        assert!(matches!(tokens[0], Err(TernError::Lex { .. })));
        assert_eq!(tokens.last().and_then(|t| t.as_ref().ok()).map(|t| t.token_type), Some(TokenType::EOF));
    }

    #[test]
    fn test_char_literal() {
        let tokens = scan("'x' '\\n'");
        let first = tokens[0].as_ref().expect("char should scan");
        assert_eq!(first.token_type, TokenType::CHAR);
        assert_eq!(first.literal, Some(Literal::Str("x".to_string())));

        let escaped = tokens[2].as_ref().expect("escaped char should scan");
        assert_eq!(escaped.literal, Some(Literal::Str("\n".to_string())));
    }

    #[test]
    fn test_char_literal_holds_exactly_one_character() {
        let tokens = scan("'xy'");
        assert!(matches!(tokens[0], Err(TernError::Lex { .. })));
    }

    #[test]
    fn test_annotation_is_one_token() {
        assert_token_sequence(
            "@var x",
            &[
                (TokenType::ANNOTATION, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_line_breaks_in_every_convention() {
        let tokens: Vec<Token> = Scanner::new("a\r\nb\rc\nd", "<test>")
            .filter_map(Result::ok)
            .collect();

        let summary: Vec<(TokenType, usize)> =
            tokens.iter().map(|t| (t.token_type, t.line)).collect();

        assert_eq!(
            summary,
            vec![
                (TokenType::IDENTIFIER, 1),
                (TokenType::NEWLINE, 1),
                (TokenType::IDENTIFIER, 2),
                (TokenType::NEWLINE, 2),
                (TokenType::IDENTIFIER, 3),
                (TokenType::NEWLINE, 3),
                (TokenType::IDENTIFIER, 4),
                (TokenType::EOF, 4),
            ]
        );

        assert!(tokens
            .iter()
            .filter(|t| t.token_type == TokenType::NEWLINE)
            .all(|t| t.lexeme == "\n"));
    }

    #[test]
    fn test_comments_are_trivia_and_count_lines() {
        let tokens: Vec<Token> = Scanner::new("a // note\n/* one\n two */ b", "<test>")
            .filter_map(Result::ok)
            .collect();

        let comments = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::COMMENT)
            .count();
        assert_eq!(comments, 2);

        let b = tokens
            .iter()
            .find(|t| t.lexeme == "b")
            .expect("b should be scanned");
        assert_eq!(b.line, 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let tokens = scan("/* open");
        assert!(matches!(tokens[0], Err(TernError::Lex { .. })));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results = scan(",#(");

        assert_eq!(results.len(), 4);
        assert!(matches!(&results[0], Ok(t) if t.token_type == TokenType::COMMA));
        match &results[1] {
            Err(TernError::Lex {
                message,
                line,
                source_name,
            }) => {
                assert!(message.contains('#'));
                assert_eq!(*line, 1);
                assert_eq!(source_name, "<test>");
            }
            other => panic!("expected a lex error, got {:?}", other),
        }
        assert!(matches!(&results[2], Ok(t) if t.token_type == TokenType::LEFT_PAREN));
        assert!(matches!(&results[3], Ok(t) if t.token_type == TokenType::EOF));
    }

    #[test]
    fn test_lone_question_mark_is_unexpected() {
        let results = scan("a ? b");
        assert!(results.iter().any(|r| matches!(r, Err(TernError::Lex { .. }))));
    }

    #[test]
    fn test_non_ascii_character_is_skipped_whole() {
        let results = scan("é1");
        assert!(matches!(results[0], Err(TernError::Lex { .. })));
        assert!(matches!(&results[1], Ok(t) if t.token_type == TokenType::NUMBER));
    }

    #[test]
    fn test_continuation_token() {
        assert_token_sequence(
            "a \\\nb",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::CONTINUATION, "\\"),
                (TokenType::NEWLINE, "\n"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }
}
