// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for Ruff candidate scripts.
// Converts source code text into a stream of tokens for parsing.
//
// Supports:
// - Keywords: let, mut, func, return, if, else, while, loop, for, in, break, continue, try, except, null
// - Identifiers, integer and float literals
// - String literals with escape sequences
// - Operators: + - * / % := == != < > <= >= && || !
// - Punctuation: ( ) { } [ ] , ; :
// - Comments starting with # or //

use crate::errors::{AnalysisError, SourceLocation};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Operator(String),
    Punctuation(char),
    Keyword(String),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

const KEYWORDS: &[&str] = &[
    "let", "mut", "func", "return", "if", "else", "while", "loop", "for", "in", "break",
    "continue", "try", "except", "null",
];

/// Character cursor that keeps line/column bookkeeping in one place
struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self { chars: source.chars().peekable(), line: 1, col: 1 }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }
}

/// Tokenizes candidate source code into a vector of tokens.
///
/// Every token records the line and column where it starts. Unknown characters
/// and unterminated strings are reported as parse errors rather than skipped,
/// so a candidate never runs with silently dropped code.
pub fn tokenize(source: &str) -> Result<Vec<Token>, AnalysisError> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor::new(source);

    while let Some(c) = cursor.peek() {
        let (line, column) = (cursor.line, cursor.col);
        let push = |tokens: &mut Vec<Token>, kind: TokenKind| {
            tokens.push(Token { kind, line, column });
        };

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                cursor.bump();
            }
            '#' => cursor.skip_line(),
            '"' => {
                cursor.bump();
                let s = lex_string(&mut cursor)
                    .ok_or_else(|| {
                        AnalysisError::parse_error(
                            "Unterminated string literal",
                            SourceLocation::new(line, column),
                        )
                    })?;
                push(&mut tokens, TokenKind::String(s));
            }
            '0'..='9' => {
                let kind = lex_number(&mut cursor).ok_or_else(|| {
                    AnalysisError::parse_error(
                        "Malformed number literal",
                        SourceLocation::new(line, column),
                    )
                })?;
                push(&mut tokens, kind);
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(ch) = cursor.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        cursor.bump();
                    } else {
                        break;
                    }
                }

                let kind = match ident.as_str() {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    k if KEYWORDS.contains(&k) => TokenKind::Keyword(ident),
                    _ => TokenKind::Identifier(ident),
                };
                push(&mut tokens, kind);
            }
            '/' => {
                cursor.bump();
                if cursor.peek() == Some('/') {
                    cursor.skip_line();
                } else {
                    push(&mut tokens, TokenKind::Operator("/".into()));
                }
            }
            ':' => {
                cursor.bump();
                if cursor.bump_if('=') {
                    push(&mut tokens, TokenKind::Operator(":=".into()));
                } else {
                    push(&mut tokens, TokenKind::Punctuation(':'));
                }
            }
            '=' | '!' | '<' | '>' => {
                cursor.bump();
                let op = if cursor.bump_if('=') { format!("{}=", c) } else { c.to_string() };
                if op == "=" {
                    return Err(AnalysisError::parse_error(
                        "Unexpected '='",
                        SourceLocation::new(line, column),
                    )
                    .with_help("use ':=' to bind or assign and '==' to compare"));
                }
                push(&mut tokens, TokenKind::Operator(op));
            }
            '&' | '|' => {
                cursor.bump();
                if !cursor.bump_if(c) {
                    return Err(AnalysisError::parse_error(
                        format!("Unexpected character '{}'", c),
                        SourceLocation::new(line, column),
                    )
                    .with_help(format!("logical operators are written '{}{}'", c, c)));
                }
                push(&mut tokens, TokenKind::Operator(format!("{}{}", c, c)));
            }
            '+' | '-' | '*' | '%' => {
                cursor.bump();
                push(&mut tokens, TokenKind::Operator(c.to_string()));
            }
            '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' => {
                cursor.bump();
                push(&mut tokens, TokenKind::Punctuation(c));
            }
            _ => {
                return Err(AnalysisError::parse_error(
                    format!("Unexpected character '{}'", c),
                    SourceLocation::new(line, column),
                ));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, line: cursor.line, column: cursor.col });

    Ok(tokens)
}

/// Reads a string body after the opening quote; None when the string never closes
fn lex_string(cursor: &mut Cursor) -> Option<String> {
    let mut s = String::new();
    loop {
        match cursor.bump()? {
            '"' => return Some(s),
            '\\' => match cursor.bump()? {
                'n' => s.push('\n'),
                't' => s.push('\t'),
                '\\' => s.push('\\'),
                '"' => s.push('"'),
                other => s.push(other),
            },
            ch => s.push(ch),
        }
    }
}

fn lex_number(cursor: &mut Cursor) -> Option<TokenKind> {
    let mut num = String::new();
    let mut is_float = false;
    while let Some(ch) = cursor.peek() {
        if ch.is_ascii_digit() || ch == '_' {
            if ch != '_' {
                num.push(ch);
            }
            cursor.bump();
        } else if ch == '.' && !is_float {
            is_float = true;
            num.push(ch);
            cursor.bump();
        } else {
            break;
        }
    }

    if is_float {
        num.parse().ok().map(TokenKind::Float)
    } else {
        // Literals too large for i64 degrade to floats
        match num.parse::<i64>() {
            Ok(n) => Some(TokenKind::Int(n)),
            Err(_) => num.parse().ok().map(TokenKind::Float),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_function_header() {
        assert_eq!(
            kinds("func algoritmo(n) {"),
            vec![
                TokenKind::Keyword("func".into()),
                TokenKind::Identifier("algoritmo".into()),
                TokenKind::Punctuation('('),
                TokenKind::Identifier("n".into()),
                TokenKind::Punctuation(')'),
                TokenKind::Punctuation('{'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("42 3.5 1_000"),
            vec![TokenKind::Int(42), TokenKind::Float(3.5), TokenKind::Int(1000), TokenKind::Eof]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("a := b <= c != d && !e || f % 2"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Operator(":=".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Operator("<=".into()),
                TokenKind::Identifier("c".into()),
                TokenKind::Operator("!=".into()),
                TokenKind::Identifier("d".into()),
                TokenKind::Operator("&&".into()),
                TokenKind::Operator("!".into()),
                TokenKind::Identifier("e".into()),
                TokenKind::Operator("||".into()),
                TokenKind::Identifier("f".into()),
                TokenKind::Operator("%".into()),
                TokenKind::Int(2),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("# heading\nx // trailing\n/ y"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Operator("/".into()),
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\"b\"""#),
            vec![TokenKind::String("a\n\"b\"".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_token_locations() {
        let tokens = tokenize("let x := 1\n  return x").unwrap();
        let ret = tokens.iter().find(|t| t.kind == TokenKind::Keyword("return".into())).unwrap();
        assert_eq!((ret.line, ret.column), (2, 3));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = tokenize("print(\"oops").unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ParseError);
        assert_eq!(err.location, SourceLocation::new(1, 7));
    }

    #[test]
    fn test_unknown_character_is_error() {
        let err = tokenize("let x := 1 @ 2").unwrap_err();
        assert!(err.message.contains('@'));
        assert_eq!(err.location, SourceLocation::new(1, 12));
    }

    #[test]
    fn test_single_equals_is_error() {
        let err = tokenize("x = 1").unwrap_err();
        assert!(err.help.unwrap().contains(":="));
    }
}
