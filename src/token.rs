use log::debug;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// The different kinds of tokens recognized by the Tern scanner.
///
/// The scanner produces *raw* kinds (including `WHITESPACE`, `COMMENT`,
/// `NEWLINE` and `CONTINUATION`); the morpher reduces them to the
/// significant kinds the parser consumes, with `SEPARATOR` standing in for
/// every statement boundary.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '?.'
    SAFE_DOT,

    /// '...'
    ELLIPSIS,

    /// ':'
    COLON,

    /// ';'
    SEMICOLON,

    /// '->'
    ARROW,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '%'
    PERCENT,

    /// '^'
    CARET,

    /// '~'
    TILDE,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// '+='
    PLUS_EQUAL,

    /// '-='
    MINUS_EQUAL,

    /// '*='
    STAR_EQUAL,

    /// '/='
    SLASH_EQUAL,

    /// '%='
    PERCENT_EQUAL,

    /// '^='
    CARET_EQUAL,

    /// '~='
    TILDE_EQUAL,

    /// '@name', the lexeme holds `name`
    ANNOTATION,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes, escapes processed)
    STRING,

    /// A one‑character literal
    CHAR,

    /// A numeric literal
    NUMBER,

    /// 'and'
    AND,

    /// 'or'
    OR,

    /// 'class'
    CLASS,

    /// 'if'
    IF,

    /// 'else'
    ELSE,

    /// 'while'
    WHILE,

    /// 'for'
    FOR,

    /// 'in'
    IN,

    /// 'match'
    MATCH,

    /// 'try'
    TRY,

    /// 'catch'
    CATCH,

    /// 'throw'
    THROW,

    /// 'import'
    IMPORT,

    /// 'return'
    RETURN,

    /// 'true'
    TRUE,

    /// 'false'
    FALSE,

    /// 'null'
    NULL,

    /// '\' at the end of a line
    CONTINUATION,

    /// A real line break (raw stream only)
    NEWLINE,

    /// Spaces, tabs and form feeds (raw stream only)
    WHITESPACE,

    /// `// …` or `/* … */` (raw stream only)
    COMMENT,

    /// Statement boundary emitted by the morpher
    SEPARATOR,

    /// End‑of‑input marker
    EOF,
}

impl TokenType {
    /// Tokens the morpher never forwards to the parser.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenType::WHITESPACE | TokenType::COMMENT)
    }

    /// Upper‑case variant name used by the token dump.
    pub fn name(self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::SAFE_DOT => "SAFE_DOT",
            TokenType::ELLIPSIS => "ELLIPSIS",
            TokenType::COLON => "COLON",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::ARROW => "ARROW",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::PERCENT => "PERCENT",
            TokenType::CARET => "CARET",
            TokenType::TILDE => "TILDE",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::PLUS_EQUAL => "PLUS_EQUAL",
            TokenType::MINUS_EQUAL => "MINUS_EQUAL",
            TokenType::STAR_EQUAL => "STAR_EQUAL",
            TokenType::SLASH_EQUAL => "SLASH_EQUAL",
            TokenType::PERCENT_EQUAL => "PERCENT_EQUAL",
            TokenType::CARET_EQUAL => "CARET_EQUAL",
            TokenType::TILDE_EQUAL => "TILDE_EQUAL",
            TokenType::ANNOTATION => "ANNOTATION",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING => "STRING",
            TokenType::CHAR => "CHAR",
            TokenType::NUMBER => "NUMBER",
            TokenType::AND => "AND",
            TokenType::OR => "OR",
            TokenType::CLASS => "CLASS",
            TokenType::IF => "IF",
            TokenType::ELSE => "ELSE",
            TokenType::WHILE => "WHILE",
            TokenType::FOR => "FOR",
            TokenType::IN => "IN",
            TokenType::MATCH => "MATCH",
            TokenType::TRY => "TRY",
            TokenType::CATCH => "CATCH",
            TokenType::THROW => "THROW",
            TokenType::IMPORT => "IMPORT",
            TokenType::RETURN => "RETURN",
            TokenType::TRUE => "TRUE",
            TokenType::FALSE => "FALSE",
            TokenType::NULL => "NULL",
            TokenType::CONTINUATION => "CONTINUATION",
            TokenType::NEWLINE => "NEWLINE",
            TokenType::WHITESPACE => "WHITESPACE",
            TokenType::COMMENT => "COMMENT",
            TokenType::SEPARATOR => "SEPARATOR",
            TokenType::EOF => "EOF",
        }
    }
}

/// Literal payload carried by `NUMBER`, `STRING` and `CHAR` tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Number(f64),
    Str(String),
}

/// A scanned token: its kind, the source text that produced it, an optional
/// literal payload, and where it came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact source text (for `ANNOTATION`, the name after `@`).
    pub lexeme: String,

    /// Decoded value for literal tokens.
    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,

    /// Name of the unit the token was scanned from.
    pub source: Rc<str>,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and position.
    pub fn new(token_type: TokenType, lexeme: impl Into<String>, line: usize, source: Rc<str>) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={:?}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            literal: None,
            line,
            source,
        }
    }

    /// Attach a decoded literal value.
    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ── 1. literal column ──────────────────────────────────────────────
        let literal_str: String = match &self.literal {
            Some(Literal::Str(s)) => s.clone(),
            Some(Literal::Number(n)) => {
                // 3 → "3.0", 3.14 → "3.14"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    format!("{}.0", buf.format(*n as i64))
                } else {
                    n.to_string()
                }
            }
            None => "null".to_string(),
        };

        // ── 2. the lexeme column escapes line breaks so dumps stay one per line
        let lexeme: String = match self.token_type {
            TokenType::NEWLINE => "\\n".to_string(),
            _ => self.lexeme.clone(),
        };

        write!(f, "{} {} {}", self.token_type.name(), lexeme, literal_str)
    }
}
