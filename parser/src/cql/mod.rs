// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! CQL (Contextual Query Language) Module
//!
//! Parses CQL text into a query tree and renders the tree back out as CQL
//! text, XCQL or FQ. FQ can also be read back into a tree.
//!
//! # Syntax
//!
//! ```text
//! cat
//! dc.title = "the fish"
//! title any fish and dc.creator = smith
//! (a or b) not c
//! cat prox/distance<3/unit=word dog
//! title =/stem/lang=en fishing
//! >dc="info:srw/cql-context-set/1/dc-v1.1" dc.title = fish
//! ```
//!
//! # Booleans
//!
//! | Operator | Example |
//! |----------|---------|
//! | `and` | `cat and dog` |
//! | `or` | `cat or dog` |
//! | `not` | `cat not dog` |
//! | `prox` | `cat prox/distance<3 dog` |
//!
//! Operators are case-insensitive and group left to right with equal
//! precedence: `a or b and c` is `(a or b) and c`.
//!
//! # Relations
//!
//! | Relation | FQ mnemonic |
//! |----------|-------------|
//! | `<` | `lt` |
//! | `>` | `gt` |
//! | `=` | `eq` |
//! | `<>` | `ne` |
//! | `>=` | `ge` |
//! | `<=` | `le` |
//!
//! Named relations (`any`, `all`, `exact`, `within`, `rel.relevant`, ...)
//! pass through unchanged. A bare term uses the server-choice index and
//! relation (`cql.serverChoice` and `scr` unless configured otherwise).

pub mod ast;
pub mod fq;
pub mod lexer;
pub mod parser;
pub mod prefixes;
pub mod text;
pub mod xcql;

pub use ast::{BooleanNode, BooleanOp, CqlQuery, Modifier, Node, SearchClause};
pub use fq::{mnemonic_to_relation, parse_fq, parse_fq_value, parse_fq_with, relation_to_mnemonic};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, parse_with, Parser};
pub use prefixes::PrefixRegistry;
