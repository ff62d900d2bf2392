// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! CQL Parser - Recursive descent parser for CQL queries.
//!
//! Grammar:
//!   query         = search_clause { boolean modifiers search_clause } ;
//!   search_clause = "(" query ")"
//!                 | ">" word [ "=" word ] query
//!                 | word [ relation modifiers search_clause ] ;
//!   relation      = comparator | word ;
//!   boolean       = "and" | "or" | "not" | "prox" ;
//!   modifiers     = { "/" word [ comparator word ] } ;
//!
//! Booleans fold left to right with no precedence between operators. A word
//! followed by a comparator or another non-boolean word is an index name;
//! otherwise it is the term. Index names, terms, modifier values and prefix
//! identifiers are folded to lower case.
//!
//! Nesting is capped at `MAX_NESTING` levels and tree height at
//! `MAX_TREE_DEPTH`; deeper input is a syntax error.

use super::ast::{BooleanOp, CqlQuery, Modifier, Node, SearchClause};
use super::lexer::{Lexer, Token, TokenKind};
use super::prefixes::PrefixRegistry;
use crate::config::{ServerChoice, DEFAULT_PREFIX_KEY, MAX_NESTING, MAX_TREE_DEPTH};
use crate::error::{CqlError, Result};

const TOO_DEEP: &str = "Query is nested too deeply";

/// Reusable CQL parser. Every call starts from a freshly seeded prefix
/// registry, so one instance can parse any number of queries.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    server_choice: ServerChoice,
}

impl Parser {
    pub fn new(server_choice: ServerChoice) -> Self {
        Self { server_choice }
    }

    pub fn server_choice(&self) -> &ServerChoice {
        &self.server_choice
    }

    pub fn parse(&self, input: &str) -> Result<CqlQuery> {
        if input.trim().is_empty() {
            return Err(CqlError::syntax(
                "The query to be parsed cannot be empty",
                None,
            ));
        }

        let mut session = Session::start(input)?;
        let scope = Scope {
            field: self.server_choice.field.clone(),
            relation: self.server_choice.relation.clone(),
            modifiers: Vec::new(),
        };
        let (root, _) = session.parse_query(&scope)?;

        if session.current.kind != TokenKind::Eof {
            let found = session.current.value.clone();
            return Err(session.error(format!("EOF expected, found '{found}'")));
        }

        tracing::trace!(
            nodes = root.node_count(),
            depth = root.depth(),
            "Parsed CQL query"
        );

        Ok(CqlQuery {
            raw: Some(input.to_string()),
            root,
            prefixes: session.prefixes,
            server_choice: self.server_choice.clone(),
        })
    }
}

/// Index, relation and relation modifiers inherited by the clauses of a
/// (sub)query.
struct Scope {
    field: String,
    relation: String,
    modifiers: Vec<Modifier>,
}

/// Cursor state for a single parse.
struct Session<'a> {
    lexer: Lexer<'a>,
    current: Token,
    prefixes: PrefixRegistry,
    nesting: usize,
}

/// A subtree and its height.
type Parsed = (Node, usize);

impl<'a> Session<'a> {
    fn start(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            prefixes: PrefixRegistry::new(),
            nesting: 0,
        })
    }

    /// Move to the next token, returning the one just consumed.
    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error(&self, message: impl Into<String>) -> CqlError {
        let position = self.current.position;
        tracing::debug!(offset = position.offset, "CQL syntax error");
        CqlError::syntax(message, Some(position))
    }

    fn is_comparator(&self, value: &str) -> bool {
        self.current.kind == TokenKind::Comparator && self.current.value == value
    }

    fn parse_query(&mut self, scope: &Scope) -> Result<Parsed> {
        let (mut left, mut height) = self.parse_search_clause(scope)?;

        while self.current.is_boolean_keyword() {
            let token = self.advance()?;
            let op = BooleanOp::from_keyword(&token.lower).ok_or_else(|| {
                CqlError::syntax("Unknown boolean operator", Some(token.position))
            })?;
            let modifiers = self.parse_modifiers()?;
            let (right, right_height) = self.parse_search_clause(scope)?;

            height = 1 + height.max(right_height);
            if height > MAX_TREE_DEPTH {
                tracing::debug!(offset = token.position.offset, "CQL query too deep");
                return Err(CqlError::syntax(TOO_DEEP, Some(token.position)));
            }
            left = Node::boolean(op, modifiers, left, right);
        }

        Ok((left, height))
    }

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>> {
        let mut modifiers = Vec::new();

        while self.current.kind == TokenKind::Slash {
            self.advance()?;
            if !self.current.is_word() || self.current.value.is_empty() {
                return Err(self.error("Invalid modifier"));
            }
            let name = self.advance()?.lower;

            if self.current.kind == TokenKind::Comparator {
                let relation = self.advance()?.value;
                if !self.current.is_word() {
                    return Err(self.error("Invalid relation within the modifier"));
                }
                let value = self.advance()?.lower;
                modifiers.push(Modifier::new(name, relation, value));
            } else {
                modifiers.push(Modifier::flag(name));
            }
        }

        Ok(modifiers)
    }

    fn parse_search_clause(&mut self, scope: &Scope) -> Result<Parsed> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING {
            return Err(self.error(TOO_DEEP));
        }
        let parsed = self.parse_search_clause_body(scope)?;
        self.nesting -= 1;
        Ok(parsed)
    }

    fn parse_search_clause_body(&mut self, scope: &Scope) -> Result<Parsed> {
        let kind = self.current.kind;
        match kind {
            TokenKind::LParen => {
                self.advance()?;
                let parsed = self.parse_query(scope)?;
                if self.current.kind != TokenKind::RParen {
                    return Err(self.error("Missing closing parenthesis"));
                }
                self.advance()?;
                Ok(parsed)
            }
            TokenKind::Bareword | TokenKind::Quoted => {
                let first = self.advance()?;

                let is_relation = self.current.kind == TokenKind::Comparator
                    || (self.current.is_word() && !self.current.is_boolean_keyword());
                if !is_relation {
                    return Ok((self.search_clause(scope, first.lower), 1));
                }

                let relation = self.advance()?.lower;
                let modifiers = self.parse_modifiers()?;
                let inner = Scope {
                    field: first.lower,
                    relation,
                    modifiers,
                };
                self.parse_search_clause(&inner)
            }
            TokenKind::Comparator if self.is_comparator(">") => {
                self.advance()?;
                self.parse_prefix_declaration()?;
                self.parse_query(scope)
            }
            TokenKind::Eof => Err(self.error("Invalid search clause: unexpected end of query")),
            _ => {
                let found = self.current.value.clone();
                Err(self.error(format!("Invalid search clause: unexpected '{found}'")))
            }
        }
    }

    /// `>identifier` or `>prefix=identifier`, after the `>`.
    fn parse_prefix_declaration(&mut self) -> Result<()> {
        if !self.current.is_word() {
            return Err(self.error("Expecting string or a quoted expression"));
        }

        if self.current.kind == TokenKind::Quoted {
            let first = self.advance()?;
            if !self.is_comparator("=") {
                self.register(DEFAULT_PREFIX_KEY.to_string(), first.lower);
                return Ok(());
            }
            return self.finish_prefix_declaration(first.lower);
        }

        let first = self.advance()?;
        if self.is_comparator("=") {
            return self.finish_prefix_declaration(first.lower);
        }
        let identifier = self.read_adjacent(first, false)?;
        self.register(DEFAULT_PREFIX_KEY.to_string(), identifier);
        Ok(())
    }

    fn finish_prefix_declaration(&mut self, prefix: String) -> Result<()> {
        self.advance()?;
        if !self.current.is_word() {
            return Err(self.error("Expecting string or a quoted expression"));
        }
        let first = self.advance()?;
        let identifier = if first.kind == TokenKind::Quoted {
            first.lower
        } else {
            self.read_adjacent(first, true)?
        };
        self.register(prefix, identifier);
        Ok(())
    }

    /// Glue an unquoted identifier such as `http://example.com/` back
    /// together from the tokens that touch `first` with no whitespace.
    fn read_adjacent(&mut self, first: Token, allow_comparators: bool) -> Result<String> {
        let mut value = first.lower.clone();
        let mut last = first;
        loop {
            let glues = match self.current.kind {
                TokenKind::Slash | TokenKind::Bareword => true,
                TokenKind::Comparator => allow_comparators,
                _ => false,
            };
            if !glues || !last.touches(&self.current) {
                break;
            }
            last = self.advance()?;
            value.push_str(&last.lower);
        }
        Ok(value)
    }

    fn register(&mut self, prefix: String, identifier: String) {
        tracing::debug!(prefix = %prefix, identifier = %identifier, "Registered CQL prefix");
        self.prefixes.register(prefix, identifier);
    }

    fn search_clause(&self, scope: &Scope, term: String) -> Node {
        Node::SearchClause(SearchClause::resolve(
            &scope.field,
            &scope.relation,
            scope.modifiers.clone(),
            term,
            &self.prefixes,
        ))
    }
}

/// Parse a CQL query string using the default server-choice index and
/// relation.
pub fn parse(input: &str) -> Result<CqlQuery> {
    Parser::default().parse(input)
}

/// Parse with an explicit server-choice index and relation.
pub fn parse_with(input: &str, field: &str, relation: &str) -> Result<CqlQuery> {
    Parser::new(ServerChoice::new(field, relation)).parse(input)
}
