//! Parser for referential constraint definitions.
//!
//! H2 reports each foreign key as the SQL text that would recreate it, e.g.
//!
//! ```text
//! ALTER TABLE PUBLIC.CHILD ADD CONSTRAINT PUBLIC.FK_1 FOREIGN KEY(PARENT_ID)
//!     INDEX PUBLIC.FK_1_INDEX_3 REFERENCES PUBLIC.PARENT(ID) NOCHECK
//! ```
//!
//! The grammar recognized here is
//!
//! ```text
//! definition := <any>* FOREIGN KEY column_list <any>* REFERENCES object column_list <any>*
//! object     := name ( "." name )*
//! column_list:= "(" name ( "," name )* ")"
//! name       := bare_word | quoted_identifier
//! ```
//!
//! Names are returned exactly as the catalog stores them (quotes removed);
//! normalization is left to the reflector.

use core::fmt;

use crate::identifier::QUOTE;

/// A position range in the definition text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A failure to parse a constraint definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {}..{}", .span.start, .span.end)]
pub struct ConstraintParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// What the parser was looking for.
    pub expected: Option<String>,
}

impl ConstraintParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
        }
    }

    /// Creates an "unexpected token" error.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: &TokenKind, span: Span) -> Self {
        let expected: String = expected.into();
        Self {
            message: format!("Unexpected token: expected {expected}, found {found}"),
            span,
            expected: Some(expected),
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        Self {
            message: format!("Unexpected end of input: expected {expected}"),
            span,
            expected: Some(expected),
        }
    }
}

/// Token kinds of a constraint definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// An unquoted word: keyword or bare identifier.
    Word(String),
    /// A double-quoted identifier, unescaped.
    Quoted(String),
    /// A single-quoted string literal.
    Literal(String),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// Any other character.
    Other(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(w) => write!(f, "'{w}'"),
            Self::Quoted(q) => write!(f, "\"{q}\""),
            Self::Literal(l) => write!(f, "string '{l}'"),
            Self::LeftParen => f.write_str("'('"),
            Self::RightParen => f.write_str("')'"),
            Self::Comma => f.write_str("','"),
            Self::Dot => f.write_str("'.'"),
            Self::Other(c) => write!(f, "'{c}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    span: Span,
}

impl Token {
    fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(word))
    }
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '$'
    }

    /// Reads a delimited run where the delimiter is escaped by doubling.
    fn scan_delimited(&mut self, delimiter: char) -> Result<String, ConstraintParseError> {
        let start = self.pos;
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == delimiter => {
                    if self.peek() == Some(delimiter) {
                        self.advance();
                        value.push(delimiter);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(ConstraintParseError::unexpected_eof(
                        format!("closing {delimiter}"),
                        Span::new(start, self.pos),
                    ))
                }
            }
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ConstraintParseError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            let start = self.pos;
            let kind = match c {
                c if c.is_whitespace() => {
                    self.advance();
                    continue;
                }
                '(' => {
                    self.advance();
                    TokenKind::LeftParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RightParen
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                '.' => {
                    self.advance();
                    TokenKind::Dot
                }
                QUOTE => TokenKind::Quoted(self.scan_delimited(QUOTE)?),
                '\'' => TokenKind::Literal(self.scan_delimited('\'')?),
                c if Self::is_word_char(c) => {
                    while self.peek().is_some_and(Self::is_word_char) {
                        self.advance();
                    }
                    TokenKind::Word(self.input[start..self.pos].to_string())
                }
                other => {
                    self.advance();
                    TokenKind::Other(other)
                }
            };
            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
            });
        }
        Ok(tokens)
    }
}

/// A foreign key recovered from its definition text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedForeignKey {
    /// Columns of the constrained table, in order.
    pub constrained_columns: Vec<String>,
    /// Schema of the referenced table, when the text names one.
    pub referred_schema: Option<String>,
    /// The referenced table.
    pub referred_table: String,
    /// Referenced columns, in order.
    pub referred_columns: Vec<String>,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn eof_span(&self) -> Span {
        Span::new(self.end, self.end)
    }

    /// Skips tokens up to and including the keyword sequence `words`.
    fn skip_past(&mut self, words: &[&str]) -> Result<(), ConstraintParseError> {
        while self.pos < self.tokens.len() {
            let matched = words.iter().enumerate().all(|(offset, word)| {
                self.tokens
                    .get(self.pos + offset)
                    .is_some_and(|t| t.is_word(word))
            });
            if matched {
                self.pos += words.len();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(ConstraintParseError::unexpected_eof(
            words.join(" "),
            self.eof_span(),
        ))
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), ConstraintParseError> {
        let eof = self.eof_span();
        match self.advance() {
            Some(token) if &token.kind == expected => Ok(()),
            Some(token) => Err(ConstraintParseError::unexpected(
                expected.to_string(),
                &token.kind,
                token.span,
            )),
            None => Err(ConstraintParseError::unexpected_eof(
                expected.to_string(),
                eof,
            )),
        }
    }

    fn parse_name(&mut self) -> Result<String, ConstraintParseError> {
        let eof = self.eof_span();
        match self.advance() {
            Some(Token {
                kind: TokenKind::Word(name) | TokenKind::Quoted(name),
                ..
            }) => Ok(name.clone()),
            Some(token) => Err(ConstraintParseError::unexpected(
                "identifier",
                &token.kind,
                token.span,
            )),
            None => Err(ConstraintParseError::unexpected_eof("identifier", eof)),
        }
    }

    fn parse_column_list(&mut self) -> Result<Vec<String>, ConstraintParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut columns = vec![self.parse_name()?];
        loop {
            let eof = self.eof_span();
            match self.advance() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => columns.push(self.parse_name()?),
                Some(Token {
                    kind: TokenKind::RightParen,
                    ..
                }) => return Ok(columns),
                Some(token) => {
                    return Err(ConstraintParseError::unexpected(
                        "',' or ')'",
                        &token.kind,
                        token.span,
                    ))
                }
                None => return Err(ConstraintParseError::unexpected_eof("')'", eof)),
            }
        }
    }

    /// Parses `name ( "." name )*`, returning `(schema, table)`.
    fn parse_object_name(&mut self) -> Result<(Option<String>, String), ConstraintParseError> {
        let mut parts = vec![self.parse_name()?];
        while matches!(self.peek(), Some(t) if t.kind == TokenKind::Dot) {
            self.advance();
            parts.push(self.parse_name()?);
        }
        let table = parts.pop().unwrap_or_default();
        Ok((parts.pop(), table))
    }

    fn parse_foreign_key(&mut self) -> Result<ParsedForeignKey, ConstraintParseError> {
        self.skip_past(&["FOREIGN", "KEY"])?;
        let constrained_columns = self.parse_column_list()?;
        self.skip_past(&["REFERENCES"])?;
        let (referred_schema, referred_table) = self.parse_object_name()?;
        let referred_columns = self.parse_column_list()?;
        Ok(ParsedForeignKey {
            constrained_columns,
            referred_schema,
            referred_table,
            referred_columns,
        })
    }
}

/// Parses a referential constraint definition.
pub fn parse_foreign_key(definition: &str) -> Result<ParsedForeignKey, ConstraintParseError> {
    let tokens = Lexer::new(definition).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: definition.len(),
    };
    parser.parse_foreign_key()
}
