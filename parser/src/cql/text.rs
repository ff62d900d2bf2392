// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! CQL text rendering.

use std::fmt;

use super::ast::{BooleanOp, CqlQuery, Modifier, Node, SearchClause};
use super::prefixes::PrefixRegistry;
use crate::config::ServerChoice;

impl CqlQuery {
    /// Canonical CQL text for the tree. Re-parsing the output yields an
    /// equivalent tree.
    pub fn to_cql(&self) -> String {
        let mut out = String::new();
        write_node(&mut out, &self.root, &self.prefixes, &self.server_choice);
        out
    }
}

impl fmt::Display for CqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cql())
    }
}

fn write_node(out: &mut String, node: &Node, prefixes: &PrefixRegistry, sc: &ServerChoice) {
    match node {
        Node::SearchClause(clause) => write_clause(out, clause, prefixes, sc),
        Node::Boolean(b) => {
            write_operand(out, &b.left, prefixes, sc);
            out.push(' ');
            out.push_str(b.op.as_str());
            write_modifiers(out, &b.modifiers);
            out.push(' ');
            write_operand(out, &b.right, prefixes, sc);
        }
    }
}

fn write_operand(out: &mut String, node: &Node, prefixes: &PrefixRegistry, sc: &ServerChoice) {
    if node.is_boolean() {
        out.push('(');
        write_node(out, node, prefixes, sc);
        out.push(')');
    } else {
        write_node(out, node, prefixes, sc);
    }
}

fn write_clause(
    out: &mut String,
    clause: &SearchClause,
    prefixes: &PrefixRegistry,
    sc: &ServerChoice,
) {
    // Relation modifiers need a relation to hang off.
    let implied = clause.modifiers.is_empty()
        && clause.has_server_choice_field(prefixes, sc)
        && clause.has_server_choice_relation(prefixes, sc);

    if !implied {
        out.push_str(&word(&clause.qualified_field(prefixes)));
        out.push(' ');
        out.push_str(&relation(&clause.display_relation(prefixes)));
        write_modifiers(out, &clause.modifiers);
        out.push(' ');
    }
    out.push_str(&quote(&clause.term));
}

fn write_modifiers(out: &mut String, modifiers: &[Modifier]) {
    for m in modifiers {
        out.push('/');
        out.push_str(&word(&m.name));
        if !m.is_flag() {
            out.push_str(&m.relation);
            out.push_str(&word(&m.value));
        }
    }
}

fn relation(s: &str) -> String {
    if !s.is_empty() && s.chars().all(|c| matches!(c, '<' | '>' | '=')) {
        s.to_string()
    } else {
        word(s)
    }
}

/// Bare when the lexer would read `s` back as one non-keyword bareword,
/// quoted otherwise.
fn word(s: &str) -> String {
    let bare = !s.is_empty()
        && BooleanOp::from_keyword(s).is_none()
        && !s.chars().any(|c| {
            c.is_whitespace() || matches!(c, '(' | ')' | '/' | '<' | '>' | '=' | '"' | '\'')
        });
    if bare {
        s.to_string()
    } else {
        quote(s)
    }
}

/// Double-quote `s`, escaping bare `"` and a dangling trailing backslash.
/// Escape pairs already in the value are kept as they are.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut escaped = false;
    for ch in s.chars() {
        if ch == '"' && !escaped {
            out.push('\\');
        }
        escaped = ch == '\\' && !escaped;
        out.push(ch);
    }
    if escaped {
        out.push('\\');
    }
    out.push('"');
    out
}
