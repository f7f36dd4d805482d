//! Hand-written lexer for the reference frontend
//!
//! Skips whitespace and `//` line comments; tracks line/column for error
//! reporting. String literals are unescaped here, so the token text is the
//! literal's value.

use crate::{RecastError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    KwClass,
    KwConst,
    KwFn,
    KwLet,
    KwReturn,
    Ident,
    Int,
    Str,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Comma,
    Eq,
    Plus,
    Star,
    ColonColon,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub col: u32,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            col,
        }
    }
}

/// Lex the input into a token stream
pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;

    while i < chars.len() {
        let c = chars[i];
        let (tok_line, tok_col) = (line, col);

        let advance = |i: &mut usize, line: &mut u32, col: &mut u32, by: usize| {
            for _ in 0..by {
                if chars[*i] == '\n' {
                    *line += 1;
                    *col = 1;
                } else {
                    *col += 1;
                }
                *i += 1;
            }
        };

        if c.is_whitespace() {
            advance(&mut i, &mut line, &mut col, 1);
            continue;
        }

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                advance(&mut i, &mut line, &mut col, 1);
            }
            continue;
        }

        if c == ':' && chars.get(i + 1) == Some(&':') {
            tokens.push(Token::new(TokenKind::ColonColon, "::", tok_line, tok_col));
            advance(&mut i, &mut line, &mut col, 2);
            continue;
        }

        let single = match c {
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ';' => Some(TokenKind::Semi),
            ',' => Some(TokenKind::Comma),
            '=' => Some(TokenKind::Eq),
            '+' => Some(TokenKind::Plus),
            '*' => Some(TokenKind::Star),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token::new(kind, c, tok_line, tok_col));
            advance(&mut i, &mut line, &mut col, 1);
            continue;
        }

        if c == '"' {
            advance(&mut i, &mut line, &mut col, 1);
            let mut value = String::new();
            let mut closed = false;
            while i < chars.len() {
                let current = chars[i];
                if current == '"' {
                    advance(&mut i, &mut line, &mut col, 1);
                    closed = true;
                    break;
                }
                if current == '\\' {
                    let escaped = chars.get(i + 1).copied().ok_or_else(|| {
                        RecastError::parse_error("unterminated escape sequence", line, col)
                    })?;
                    let replacement = match escaped {
                        '\\' => '\\',
                        '"' => '"',
                        'n' => '\n',
                        't' => '\t',
                        other => {
                            return Err(RecastError::parse_error(
                                format!("unknown escape sequence '\\{other}'"),
                                line,
                                col,
                            ));
                        }
                    };
                    value.push(replacement);
                    advance(&mut i, &mut line, &mut col, 2);
                    continue;
                }
                value.push(current);
                advance(&mut i, &mut line, &mut col, 1);
            }
            if !closed {
                return Err(RecastError::parse_error(
                    "unterminated string literal",
                    tok_line,
                    tok_col,
                ));
            }
            tokens.push(Token::new(TokenKind::Str, value, tok_line, tok_col));
            continue;
        }

        if c.is_ascii_digit() {
            let mut text = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                text.push(chars[i]);
                advance(&mut i, &mut line, &mut col, 1);
            }
            tokens.push(Token::new(TokenKind::Int, text, tok_line, tok_col));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut text = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                text.push(chars[i]);
                advance(&mut i, &mut line, &mut col, 1);
            }
            let kind = match text.as_str() {
                "class" => TokenKind::KwClass,
                "const" => TokenKind::KwConst,
                "fn" => TokenKind::KwFn,
                "let" => TokenKind::KwLet,
                "return" => TokenKind::KwReturn,
                _ => TokenKind::Ident,
            };
            tokens.push(Token::new(kind, text, tok_line, tok_col));
            continue;
        }

        return Err(RecastError::parse_error(
            format!("unexpected character '{c}'"),
            tok_line,
            tok_col,
        ));
    }

    Ok(tokens)
}
