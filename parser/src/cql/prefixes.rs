// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Context-set prefix registry.
//!
//! Seeded from the list of registered CQL context sets and extended by inline
//! `>prefix=identifier` declarations while a query is parsed. One registry
//! belongs to one parse; nothing here is shared between parses.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::DEFAULT_PREFIX;

/// (prefix, identifier) pairs resolvable by prefix.
const CONTEXT_SETS: &[(&str, &str)] = &[
    ("cql", "info:srw/cql-context-set/1/cql-v1.2"),
    ("dc", "info:srw/cql-context-set/1/dc-v1.1"),
    ("bath", "http://zing.z3950.org/cql/bath/2.0/"),
    ("rec", "info:srw/cql-context-set/2/rec-1.1"),
    ("net", "info:srw/cql-context-set/2/net-1.0"),
    ("music", "info:srw/cql-context-set/3/music-1.0"),
    ("zthes", "http://zthes.z3950.org/cql/1.0/"),
    ("ccg", "http://srw.cheshire3.org/contextSets/ccg/1.1/"),
    ("zeerex", "info:srw/cql-context-set/2/zeerex-1.1"),
    ("marc", "info:srw/cql-context-set/1/marc-1.1"),
    ("rel", "info:srw/cql-context-set/2/relevance-1.0"),
    ("sort", "info:srw/cql-context-set/1/sort-v1.0"),
    ("gils", "info:srw/cql-context-set/14/gils-v1.0"),
    ("norzig", "info:srw/cql-context-set/15/norzig-1.0"),
    ("prism", "info:srw/cql-context-set/11/prism-v2.1"),
    ("bib", "info:srw/cql-context-set/1/bib-v1"),
    ("jamas", "info:srw/cql-context-set/16/jamas-v1.0"),
];

/// Older identifiers that still reverse-resolve to their prefix.
const ALIASES: &[(&str, &str)] = &[
    ("cql", "info:srw/cql-context-set/1/cql-v1.1"),
    ("prism", "info:srw/cql-context-set/11/prism-v2.0"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRegistry {
    identifiers: HashMap<String, String>,
    prefixes: HashMap<String, String>,
}

fn reverse_key(identifier: &str) -> String {
    STANDARD.encode(identifier.as_bytes())
}

impl PrefixRegistry {
    /// Registry holding the well-known context sets.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for (prefix, identifier) in ALIASES {
            registry
                .prefixes
                .insert(reverse_key(identifier), prefix.to_string());
        }
        for (prefix, identifier) in CONTEXT_SETS {
            registry.register(*prefix, *identifier);
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            identifiers: HashMap::new(),
            prefixes: HashMap::new(),
        }
    }

    /// Namespace identifier for `prefix`, if registered.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.identifiers.get(prefix).map(String::as_str)
    }

    /// Prefix that `identifier` was last registered under.
    pub fn prefix_for(&self, identifier: &str) -> Option<&str> {
        self.prefixes
            .get(&reverse_key(identifier))
            .map(String::as_str)
    }

    /// Map `prefix` to `identifier`, replacing any earlier mapping in both
    /// directions.
    pub fn register(&mut self, prefix: impl Into<String>, identifier: impl Into<String>) {
        let prefix = prefix.into();
        let identifier = identifier.into();
        self.prefixes.insert(reverse_key(&identifier), prefix.clone());
        self.identifiers.insert(prefix, identifier);
    }

    /// Split `name` on its first `.` and resolve the prefix, ignoring its
    /// case. Returns the unprefixed name and the identifier, or `name`
    /// untouched when the prefix is unknown.
    pub fn split_qualified<'n>(&self, name: &'n str) -> (&'n str, Option<&str>) {
        match name.split_once('.') {
            Some((prefix, rest)) => match self.resolve(&prefix.to_lowercase()) {
                Some(identifier) => (rest, Some(identifier)),
                None => (name, None),
            },
            None => (name, None),
        }
    }

    /// Like [`split_qualified`](Self::split_qualified), except that a
    /// relation with no prefix belongs to the default `cql` context set.
    pub fn split_relation<'n>(&self, relation: &'n str) -> (&'n str, Option<&str>) {
        if relation.contains('.') {
            self.split_qualified(relation)
        } else {
            (relation, self.resolve(DEFAULT_PREFIX))
        }
    }

    /// Inverse of [`split_qualified`](Self::split_qualified): prepend the
    /// prefix known for `identifier`, if any.
    pub fn qualify(&self, name: &str, identifier: Option<&str>) -> String {
        match identifier.and_then(|id| self.prefix_for(id)) {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl Default for PrefixRegistry {
    fn default() -> Self {
        Self::new()
    }
}
