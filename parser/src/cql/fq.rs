// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! FQ: the nested JSON-object form of a query.
//!
//! ```text
//! {"op": "and",
//!  "s1": {"term": "fish", "field": "dc.title", "relation": "eq"},
//!  "s2": {"term": "frog"}
//! }
//! ```
//!
//! Search clauses are objects with a `term` key; booleans carry `op`, `s1`
//! and `s2`. Any other key is a modifier. Reading FQ back is the one place
//! where node kinds are told apart by shape.

use serde_json::{Map, Value as JsonValue};

use super::ast::{BooleanOp, CqlQuery, Modifier, Node, SearchClause};
use super::parser::Parser;
use super::prefixes::PrefixRegistry;
use crate::config::{FqOptions, ServerChoice, MAX_TREE_DEPTH};
use crate::error::{CqlError, Result};

const RELATION_MNEMONICS: &[(&str, &str)] = &[
    ("<", "lt"),
    (">", "gt"),
    ("=", "eq"),
    ("<>", "ne"),
    (">=", "ge"),
    ("<=", "le"),
];

const CLAUSE_KEYS: &[&str] = &["term", "field", "relation"];
const BOOLEAN_KEYS: &[&str] = &["op", "s1", "s2"];

/// `<=` becomes `le`; relations outside the table pass through.
pub fn relation_to_mnemonic(relation: &str) -> &str {
    RELATION_MNEMONICS
        .iter()
        .find(|(symbol, _)| *symbol == relation)
        .map_or(relation, |(_, mnemonic)| *mnemonic)
}

pub fn mnemonic_to_relation(mnemonic: &str) -> &str {
    RELATION_MNEMONICS
        .iter()
        .find(|(_, m)| *m == mnemonic)
        .map_or(mnemonic, |(symbol, _)| *symbol)
}

impl CqlQuery {
    pub fn to_fq(&self) -> String {
        self.to_fq_with(&FqOptions::default())
    }

    pub fn to_fq_with(&self, options: &FqOptions) -> String {
        let printer = FqPrinter {
            query: self,
            options,
        };
        let mut out = String::new();
        printer.node(&mut out, &self.root, 0);
        out
    }
}

struct FqPrinter<'a> {
    query: &'a CqlQuery,
    options: &'a FqOptions,
}

impl FqPrinter<'_> {
    fn indent(&self, out: &mut String, n: usize) {
        for _ in 0..n {
            out.push_str(&self.options.indent);
        }
    }

    fn node(&self, out: &mut String, node: &Node, n: usize) {
        match node {
            Node::SearchClause(sc) => self.search_clause(out, sc),
            Node::Boolean(b) => {
                out.push_str("{\"op\": ");
                out.push_str(&json_string(b.op.as_str()));
                pairs(out, &b.modifiers, BOOLEAN_KEYS);
                for (key, operand) in [("s1", &b.left), ("s2", &b.right)] {
                    out.push(',');
                    out.push_str(&self.options.newline);
                    self.indent(out, n);
                    out.push_str(&format!(" \"{key}\": "));
                    self.node(out, operand, n + 1);
                }
                out.push_str(&self.options.newline);
                self.indent(out, n.saturating_sub(1));
                if n > 0 && !self.options.indent.is_empty() {
                    out.push(' ');
                }
                out.push('}');
            }
        }
    }

    fn search_clause(&self, out: &mut String, sc: &SearchClause) {
        let prefixes = &self.query.prefixes;
        let server_choice = &self.query.server_choice;

        out.push_str("{\"term\": ");
        out.push_str(&json_string(&sc.term));
        if !sc.field.is_empty() && !sc.has_server_choice_field(prefixes, server_choice) {
            out.push_str(", \"field\": ");
            out.push_str(&json_string(&sc.qualified_field(prefixes)));
        }
        if !sc.relation.is_empty() && !sc.has_server_choice_relation(prefixes, server_choice) {
            let relation = sc.display_relation(prefixes);
            out.push_str(", \"relation\": ");
            out.push_str(&json_string(relation_to_mnemonic(&relation)));
        }
        pairs(out, &sc.modifiers, CLAUSE_KEYS);
        out.push('}');
    }
}

/// Modifiers as `"name": "value"` pairs; flags read as `"true"` and names
/// colliding with the node's own keys are dropped.
fn pairs(out: &mut String, modifiers: &[Modifier], reserved: &[&str]) {
    for m in modifiers {
        if reserved.contains(&m.name.as_str()) {
            continue;
        }
        let value = if m.value.is_empty() { "true" } else { &m.value };
        out.push_str(", ");
        out.push_str(&json_string(&m.name));
        out.push_str(": ");
        out.push_str(&json_string(value));
    }
}

fn json_string(s: &str) -> String {
    JsonValue::from(s).to_string()
}

impl Parser {
    /// Parse FQ text.
    pub fn parse_fq(&self, input: &str) -> Result<CqlQuery> {
        if input.trim().is_empty() {
            return Err(CqlError::format("The query to be parsed cannot be empty"));
        }
        let value: JsonValue = serde_json::from_str(input)?;
        self.parse_fq_value(&value)
    }

    /// Build a query from already-decoded FQ.
    pub fn parse_fq_value(&self, value: &JsonValue) -> Result<CqlQuery> {
        let prefixes = PrefixRegistry::new();
        let root = FqReader {
            prefixes: &prefixes,
            server_choice: self.server_choice(),
        }
        .node(value, 1)?;

        tracing::trace!(
            nodes = root.node_count(),
            depth = root.depth(),
            "Parsed FQ query"
        );

        Ok(CqlQuery {
            raw: None,
            root,
            prefixes,
            server_choice: self.server_choice().clone(),
        })
    }
}

struct FqReader<'a> {
    prefixes: &'a PrefixRegistry,
    server_choice: &'a ServerChoice,
}

impl FqReader<'_> {
    fn node(&self, value: &JsonValue, depth: usize) -> Result<Node> {
        if depth > MAX_TREE_DEPTH {
            return Err(CqlError::format("FQ query is nested too deeply"));
        }
        let object = match value.as_object() {
            Some(object) => object,
            None => return Err(unknown(value)),
        };

        if BOOLEAN_KEYS.iter().all(|key| object.contains_key(*key)) {
            return self.boolean(object, depth);
        }
        if object.contains_key("term") {
            return self.search_clause(object);
        }
        Err(unknown(value))
    }

    fn boolean(&self, object: &Map<String, JsonValue>, depth: usize) -> Result<Node> {
        let keyword = text(object, "op")?;
        let op = BooleanOp::from_keyword(&keyword)
            .ok_or_else(|| CqlError::format(format!("unknown boolean operator '{keyword}'")))?;
        let left = self.node(&object["s1"], depth + 1)?;
        let right = self.node(&object["s2"], depth + 1)?;
        Ok(Node::boolean(op, modifiers(object, BOOLEAN_KEYS)?, left, right))
    }

    fn search_clause(&self, object: &Map<String, JsonValue>) -> Result<Node> {
        let term = text(object, "term")?;
        let field = match object.get("field") {
            Some(_) => text(object, "field")?,
            None => self.server_choice.field.clone(),
        };
        let relation = match object.get("relation") {
            Some(_) => mnemonic_to_relation(&text(object, "relation")?).to_string(),
            None => self.server_choice.relation.clone(),
        };
        Ok(Node::SearchClause(SearchClause::resolve(
            &field,
            &relation,
            modifiers(object, CLAUSE_KEYS)?,
            term,
            self.prefixes,
        )))
    }
}

/// Every non-structural key becomes an equality modifier, in key order.
fn modifiers(object: &Map<String, JsonValue>, reserved: &[&str]) -> Result<Vec<Modifier>> {
    let mut modifiers = Vec::new();
    for key in object.keys() {
        if reserved.contains(&key.as_str()) {
            continue;
        }
        if key.is_empty() {
            return Err(CqlError::format("modifier name cannot be empty"));
        }
        modifiers.push(Modifier::new(key.clone(), "=", text(object, key)?));
    }
    Ok(modifiers)
}

/// Scalar member rendered as text.
fn text(object: &Map<String, JsonValue>, key: &str) -> Result<String> {
    match object.get(key) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(JsonValue::Bool(b)) => Ok(b.to_string()),
        Some(other) => Err(CqlError::format(format!(
            "expected a string for '{key}', found {other}"
        ))),
        None => Err(CqlError::format(format!("missing '{key}'"))),
    }
}

fn unknown(value: &JsonValue) -> CqlError {
    CqlError::UnknownNodeType {
        node: value.to_string(),
    }
}

/// Parse FQ text using the default server-choice index and relation.
pub fn parse_fq(input: &str) -> Result<CqlQuery> {
    Parser::default().parse_fq(input)
}

pub fn parse_fq_value(value: &JsonValue) -> Result<CqlQuery> {
    Parser::default().parse_fq_value(value)
}

pub fn parse_fq_with(input: &str, field: &str, relation: &str) -> Result<CqlQuery> {
    Parser::new(ServerChoice::new(field, relation)).parse_fq(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql::parser::parse;
    use serde_json::json;

    #[test]
    fn test_mnemonics_are_a_bijection() {
        for (symbol, mnemonic) in RELATION_MNEMONICS {
            assert_eq!(relation_to_mnemonic(symbol), *mnemonic);
            assert_eq!(mnemonic_to_relation(mnemonic), *symbol);
        }
        assert_eq!(relation_to_mnemonic("exact"), "exact");
        assert_eq!(mnemonic_to_relation("within"), "within");
    }

    #[test]
    fn test_server_choice_clause_omits_field_and_relation() {
        let fq = parse("fish").expect("parse").to_fq();
        assert_eq!(fq, r#"{"term": "fish"}"#);
    }

    #[test]
    fn test_clause_with_field_relation_and_modifiers() {
        let fq = parse("dc.title <=/stem/lang=en fish").expect("parse").to_fq();
        assert_eq!(
            fq,
            r#"{"term": "fish", "field": "dc.title", "relation": "le", "stem": "true", "lang": "en"}"#
        );
    }

    #[test]
    fn test_reserved_modifier_names_dropped() {
        let fq = parse("title =/term=x/field/ok=1 fish").expect("parse").to_fq();
        assert_eq!(
            fq,
            r#"{"term": "fish", "field": "title", "relation": "eq", "ok": "1"}"#
        );
    }

    #[test]
    fn test_boolean_layout() {
        let fq = parse("(a or b) and c").expect("parse").to_fq();
        let expected = "\
{\"op\": \"and\",
 \"s1\": {\"op\": \"or\",
   \"s1\": {\"term\": \"a\"},
   \"s2\": {\"term\": \"b\"}
 },
 \"s2\": {\"term\": \"c\"}
}";
        assert_eq!(fq, expected);
    }

    #[test]
    fn test_boolean_on_one_line() {
        let query = parse("a prox/distance<2 b").expect("parse");
        let fq = query.to_fq_with(&FqOptions {
            indent: String::new(),
            newline: String::new(),
        });
        assert_eq!(
            fq,
            r#"{"op": "prox", "distance": "2", "s1": {"term": "a"}, "s2": {"term": "b"}}"#
        );
    }

    #[test]
    fn test_strings_are_json_escaped() {
        let fq = parse(r#"'say "hi"'"#).expect("parse").to_fq();
        assert_eq!(fq, r#"{"term": "say \"hi\""}"#);
    }

    #[test]
    fn test_parse_clause_defaults() {
        let query = parse_fq(r#"{"term": "fish"}"#).expect("parse");
        let sc = query.root.as_search_clause().expect("clause");
        assert_eq!(sc.term, "fish");
        assert_eq!(sc.field, "serverChoice");
        assert_eq!(sc.relation, "scr");
        assert!(query.raw.is_none());
    }

    #[test]
    fn test_parse_clause_maps_mnemonic_and_modifiers() {
        let value = json!({"term": "fish", "field": "dc.title", "relation": "ge", "stem": "true", "boost": 2});
        let query = parse_fq_value(&value).expect("parse");
        let sc = query.root.as_search_clause().expect("clause");
        assert_eq!(sc.field, "title");
        assert_eq!(sc.relation, ">=");
        assert_eq!(
            sc.modifiers,
            vec![Modifier::new("stem", "=", "true"), Modifier::new("boost", "=", "2")]
        );
    }

    #[test]
    fn test_parse_boolean_with_modifiers() {
        let query = parse_fq(
            r#"{"op": "PROX", "unit": "word", "s1": {"term": "a"}, "s2": {"term": "b", "field": "title"}}"#,
        )
        .expect("parse");
        let b = query.root.as_boolean().expect("boolean");
        assert_eq!(b.op, BooleanOp::Prox);
        assert_eq!(b.modifiers, vec![Modifier::new("unit", "=", "word")]);
        assert_eq!(query.to_cql(), r#""a" prox/unit=word title scr "b""#);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_fq("{not json"), Err(CqlError::Format { .. })));
        assert!(matches!(parse_fq(""), Err(CqlError::Format { .. })));
        assert!(matches!(
            parse_fq(r#"{"op": "xor", "s1": {"term": "a"}, "s2": {"term": "b"}}"#),
            Err(CqlError::Format { .. })
        ));
        assert!(matches!(
            parse_fq(r#"{"term": {"nested": true}}"#),
            Err(CqlError::Format { .. })
        ));
        match parse_fq(r#"{"foo": "bar"}"#) {
            Err(CqlError::UnknownNodeType { node }) => assert_eq!(node, r#"{"foo":"bar"}"#),
            other => panic!("expected unknown node type, got {other:?}"),
        }
        assert!(matches!(
            parse_fq(r#"{"op": "and", "s1": {"term": "a"}, "s2": [1]}"#),
            Err(CqlError::UnknownNodeType { .. })
        ));
    }

    #[test]
    fn test_empty_modifier_key_rejected() {
        assert!(matches!(
            parse_fq(r#"{"term": "fish", "": "x"}"#),
            Err(CqlError::Format { .. })
        ));
        assert!(matches!(
            parse_fq(r#"{"op": "and", "": "x", "s1": {"term": "a"}, "s2": {"term": "b"}}"#),
            Err(CqlError::Format { .. })
        ));
    }

    #[test]
    fn test_deep_fq_rejected() {
        let mut value = json!({"term": "a"});
        for _ in 0..MAX_TREE_DEPTH {
            let mut object = Map::new();
            object.insert("op".to_string(), json!("and"));
            object.insert("s1".to_string(), value);
            object.insert("s2".to_string(), json!({"term": "b"}));
            value = JsonValue::Object(object);
        }
        match parse_fq_value(&value) {
            Err(CqlError::Format { message }) => assert!(message.contains("too deeply")),
            other => panic!("expected format error, got {other:?}"),
        }

        let open = r#"{"op": "and", "s2": {"term": "b"}, "s1": "#;
        let text = format!("{}{{\"term\": \"a\"}}{}", open.repeat(5_000), "}".repeat(5_000));
        assert!(matches!(parse_fq(&text), Err(CqlError::Format { .. })));
    }

    #[test]
    fn test_parse_with_custom_server_choice() {
        let query = parse_fq_with(r#"{"term": "fish"}"#, "dc.subject", "=").expect("parse");
        let sc = query.root.as_search_clause().expect("clause");
        assert_eq!(sc.field, "subject");
        assert_eq!(sc.relation, "=");
        assert_eq!(query.to_cql(), r#""fish""#);
    }
}
