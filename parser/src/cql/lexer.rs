// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Tokenizer for CQL query text.
//!
//! Tokens are produced one at a time; the parser only ever holds the current
//! token, so the lexer keeps no buffer of its own.

use crate::error::{CqlError, Position, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Slash,
    /// Maximal run of `<`, `>` and `=`.
    Comparator,
    /// Single- or double-quoted string, quotes stripped.
    Quoted,
    Bareword,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub lower: String,
    pub position: Position,
    /// Byte offset just past the token.
    pub end: usize,
}

impl Token {
    /// Bareword or quoted string; the only tokens that can name an index,
    /// a relation, a term or a modifier.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Bareword | TokenKind::Quoted)
    }

    pub fn is_boolean_keyword(&self) -> bool {
        self.kind == TokenKind::Bareword
            && matches!(self.lower.as_str(), "and" | "or" | "not" | "prox")
    }

    /// True when `next` starts exactly where this token ends.
    pub fn touches(&self, next: &Token) -> bool {
        self.end == next.position.offset
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn is_comparator(ch: char) -> bool {
    matches!(ch, '<' | '>' | '=')
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '(' | ')' | '/') || is_comparator(ch) || is_whitespace(ch)
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn current_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let (pos, ch) = self.chars.next()?;
        self.pos = pos + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !is_whitespace(ch) {
                break;
            }
            self.advance();
        }
    }

    fn token(&self, kind: TokenKind, value: String, position: Position) -> Token {
        let lower = value.to_lowercase();
        Token {
            kind,
            value,
            lower,
            position,
            end: self.pos,
        }
    }

    fn read_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !keep(ch) {
                break;
            }
            self.advance();
        }
        &input[start..self.pos]
    }

    /// Backslash escapes the next character but is kept in the value.
    fn read_quoted(&mut self, quote: char, start: Position) -> Result<Token> {
        self.advance();
        let mut value = String::new();
        let mut escaped = false;
        loop {
            match self.advance() {
                None => {
                    return Err(CqlError::syntax(
                        "Unterminated string literal",
                        Some(start),
                    ));
                }
                Some(ch) if ch == quote && !escaped => break,
                Some(ch) => {
                    escaped = ch == '\\' && !escaped;
                    value.push(ch);
                }
            }
        }
        Ok(self.token(TokenKind::Quoted, value, start))
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.current_position();

        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, String::new(), start));
        };

        match ch {
            '(' | ')' | '/' => {
                self.advance();
                let kind = match ch {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    _ => TokenKind::Slash,
                };
                Ok(self.token(kind, ch.to_string(), start))
            }
            c if is_comparator(c) => {
                let run = self.read_while(is_comparator).to_string();
                Ok(self.token(TokenKind::Comparator, run, start))
            }
            '"' | '\'' => self.read_quoted(ch, start),
            _ => {
                let word = self.read_while(|c| !is_delimiter(c)).to_string();
                Ok(self.token(TokenKind::Bareword, word, start))
            }
        }
    }

    /// Drain the remaining input. Stops after the end-of-input token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_delimiters_and_words() {
        assert_eq!(
            kinds("(title = foo)/stem"),
            vec![
                TokenKind::LParen,
                TokenKind::Bareword,
                TokenKind::Comparator,
                TokenKind::Bareword,
                TokenKind::RParen,
                TokenKind::Slash,
                TokenKind::Bareword,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comparator_runs_are_greedy() {
        let tokens = Lexer::new("a<=b <> c>=d").tokenize().expect("tokenize");
        let comparators: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comparator)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(comparators, vec!["<=", "<>", ">="]);
    }

    #[test]
    fn test_bareword_keeps_both_cases() {
        let token = Lexer::new("  DC.Title").next_token().expect("token");
        assert_eq!(token.kind, TokenKind::Bareword);
        assert_eq!(token.value, "DC.Title");
        assert_eq!(token.lower, "dc.title");
        assert_eq!(token.position.offset, 2);
        assert_eq!(token.end, 10);
    }

    #[test]
    fn test_quoted_string_retains_escape_marker() {
        let token = Lexer::new(r#""say \"hi\" now""#).next_token().expect("token");
        assert_eq!(token.kind, TokenKind::Quoted);
        assert_eq!(token.value, r#"say \"hi\" now"#);
    }

    #[test]
    fn test_single_quotes_and_trailing_backslash_pair() {
        let token = Lexer::new(r"'a\\' rest").next_token().expect("token");
        assert_eq!(token.value, r"a\\");
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("title = \"open").tokenize().unwrap_err();
        match err {
            CqlError::Syntax { message, position } => {
                assert_eq!(message, "Unterminated string literal");
                assert_eq!(position.map(|p| p.column), Some(9));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = Lexer::new("a\n  and b").tokenize().expect("tokenize");
        assert_eq!(tokens[1].position.line, 2);
        assert_eq!(tokens[1].position.column, 3);
    }

    #[test]
    fn test_boolean_keyword_detection() {
        let tokens = Lexer::new("AND \"and\" prox").tokenize().expect("tokenize");
        assert!(tokens[0].is_boolean_keyword());
        assert!(!tokens[1].is_boolean_keyword());
        assert!(tokens[2].is_boolean_keyword());
    }
}
