// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! CQL query tree types.
//!
//! The serde form is a plain JSON dump of the tree for hosts; it is not FQ.

use serde::{Deserialize, Serialize};

use super::prefixes::PrefixRegistry;
use crate::config::{ServerChoice, DEFAULT_PREFIX};

/// A `/name`, `/name=value` or `/name<value` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    /// Comparator, or empty when the modifier is a bare flag.
    pub relation: String,
    pub value: String,
}

impl Modifier {
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            relation: relation.into(),
            value: value.into(),
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }

    pub fn is_flag(&self) -> bool {
        self.relation.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchClause {
    pub field: String,
    pub field_namespace: Option<String>,
    pub relation: String,
    pub relation_namespace: Option<String>,
    pub modifiers: Vec<Modifier>,
    pub term: String,
}

impl SearchClause {
    /// Build a clause from index and relation names as written, resolving
    /// their context-set prefixes against `prefixes`.
    pub fn resolve(
        field: &str,
        relation: &str,
        modifiers: Vec<Modifier>,
        term: impl Into<String>,
        prefixes: &PrefixRegistry,
    ) -> Self {
        let (field, field_namespace) = prefixes.split_qualified(field);
        let (relation, relation_namespace) = prefixes.split_relation(relation);
        Self {
            field: field.to_string(),
            field_namespace: field_namespace.map(str::to_string),
            relation: relation.to_string(),
            relation_namespace: relation_namespace.map(str::to_string),
            modifiers,
            term: term.into(),
        }
    }

    /// Field with its context-set prefix restored, e.g. `dc.title`.
    pub fn qualified_field(&self, prefixes: &PrefixRegistry) -> String {
        prefixes.qualify(&self.field, self.field_namespace.as_deref())
    }

    pub fn qualified_relation(&self, prefixes: &PrefixRegistry) -> String {
        prefixes.qualify(&self.relation, self.relation_namespace.as_deref())
    }

    /// Relation as written back out. The default `cql` prefix is implied
    /// and never rendered.
    pub fn display_relation(&self, prefixes: &PrefixRegistry) -> String {
        let prefix = self
            .relation_namespace
            .as_deref()
            .and_then(|id| prefixes.prefix_for(id));
        match prefix {
            Some(prefix) if prefix != DEFAULT_PREFIX => format!("{prefix}.{}", self.relation),
            _ => self.relation.clone(),
        }
    }

    pub fn has_server_choice_field(
        &self,
        prefixes: &PrefixRegistry,
        server_choice: &ServerChoice,
    ) -> bool {
        self.field.eq_ignore_ascii_case(&server_choice.field)
            || self
                .qualified_field(prefixes)
                .eq_ignore_ascii_case(&server_choice.field)
    }

    pub fn has_server_choice_relation(
        &self,
        prefixes: &PrefixRegistry,
        server_choice: &ServerChoice,
    ) -> bool {
        self.relation.eq_ignore_ascii_case(&server_choice.relation)
            || self
                .qualified_relation(prefixes)
                .eq_ignore_ascii_case(&server_choice.relation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    And,
    Or,
    Not,
    Prox,
}

impl BooleanOp {
    /// Case-insensitive keyword lookup.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "prox" => Some(Self::Prox),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Prox => "prox",
        }
    }
}

impl std::fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanNode {
    pub op: BooleanOp,
    /// Proximity parameters and other operator modifiers, in input order.
    pub modifiers: Vec<Modifier>,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    SearchClause(SearchClause),
    Boolean(BooleanNode),
}

impl Node {
    pub fn boolean(op: BooleanOp, modifiers: Vec<Modifier>, left: Node, right: Node) -> Self {
        Node::Boolean(BooleanNode {
            op,
            modifiers,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Node::Boolean(_))
    }

    pub fn as_search_clause(&self) -> Option<&SearchClause> {
        match self {
            Node::SearchClause(sc) => Some(sc),
            Node::Boolean(_) => None,
        }
    }

    pub fn as_boolean(&self) -> Option<&BooleanNode> {
        match self {
            Node::Boolean(b) => Some(b),
            Node::SearchClause(_) => None,
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Node::SearchClause(_) => 1,
            Node::Boolean(b) => 1 + b.left.node_count() + b.right.node_count(),
        }
    }

    /// Height of the tree; a lone search clause has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Node::SearchClause(_) => 1,
            Node::Boolean(b) => 1 + b.left.depth().max(b.right.depth()),
        }
    }
}

/// A parsed query: the tree plus the prefixes and server-choice defaults the
/// serializers need to render it.
#[derive(Debug, Clone, Serialize)]
pub struct CqlQuery {
    /// Original query text; `None` when built from FQ.
    pub raw: Option<String>,
    pub root: Node,
    #[serde(skip)]
    pub prefixes: PrefixRegistry,
    #[serde(skip)]
    pub server_choice: ServerChoice,
}
