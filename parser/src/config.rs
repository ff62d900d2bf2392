// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

use std::env;

pub const DEFAULT_SERVER_CHOICE_FIELD: &str = "cql.serverChoice";
pub const DEFAULT_SERVER_CHOICE_RELATION: &str = "scr";

/// Context-set prefix implied by relations written without one.
pub const DEFAULT_PREFIX: &str = "cql";

/// Registry key used by `>identifier` declarations that name no prefix.
pub const DEFAULT_PREFIX_KEY: &str = "default";

/// Deepest run of parentheses, index scopes and prefix declarations the
/// text parser descends into.
pub const MAX_NESTING: usize = 128;

/// Tallest query tree either parser builds. Serializers and drop walk the
/// tree recursively.
pub const MAX_TREE_DEPTH: usize = 1024;

/// Index and relation a search clause falls back to when the query text
/// names neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerChoice {
    pub field: String,
    pub relation: String,
}

impl ServerChoice {
    pub fn new(field: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            relation: relation.into(),
        }
    }

    pub fn from_env() -> Self {
        let field = env::var("CQL_SERVER_CHOICE_FIELD")
            .unwrap_or_else(|_| DEFAULT_SERVER_CHOICE_FIELD.to_string());
        let relation = env::var("CQL_SERVER_CHOICE_RELATION")
            .unwrap_or_else(|_| DEFAULT_SERVER_CHOICE_RELATION.to_string());
        Self { field, relation }
    }
}

impl Default for ServerChoice {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_CHOICE_FIELD, DEFAULT_SERVER_CHOICE_RELATION)
    }
}

/// XCQL rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcqlOptions {
    /// Repeated once per nesting level.
    pub indent: String,
}

impl Default for XcqlOptions {
    fn default() -> Self {
        Self {
            indent: " ".to_string(),
        }
    }
}

/// FQ rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FqOptions {
    pub indent: String,
    pub newline: String,
}

impl Default for FqOptions {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
            newline: "\n".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cql_server_choice() {
        let sc = ServerChoice::default();
        assert_eq!(sc.field, "cql.serverChoice");
        assert_eq!(sc.relation, "scr");
        assert_eq!(XcqlOptions::default().indent, " ");
        assert_eq!(FqOptions::default().newline, "\n");
    }

    #[test]
    fn from_env_reads_overrides() {
        env::set_var("CQL_SERVER_CHOICE_FIELD", "dc.title");
        env::set_var("CQL_SERVER_CHOICE_RELATION", "any");
        let sc = ServerChoice::from_env();
        env::remove_var("CQL_SERVER_CHOICE_FIELD");
        env::remove_var("CQL_SERVER_CHOICE_RELATION");
        assert_eq!(sc, ServerChoice::new("dc.title", "any"));
    }
}
