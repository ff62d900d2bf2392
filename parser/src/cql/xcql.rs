// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! XCQL rendering.
//!
//! Output is line-oriented: one element per line, indented by one unit per
//! nesting level, every line terminated by `\n`. Golden files depend on this
//! layout staying byte-for-byte stable.

use super::ast::{BooleanNode, CqlQuery, Modifier, Node, SearchClause};
use crate::config::XcqlOptions;

impl CqlQuery {
    pub fn to_xcql(&self) -> String {
        self.to_xcql_with(&XcqlOptions::default())
    }

    pub fn to_xcql_with(&self, options: &XcqlOptions) -> String {
        let mut printer = XcqlPrinter {
            unit: &options.indent,
            out: String::new(),
        };
        printer.node(&self.root, 0);
        printer.out
    }
}

struct XcqlPrinter<'a> {
    unit: &'a str,
    out: String,
}

impl XcqlPrinter<'_> {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(self.unit);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn element(&mut self, depth: usize, name: &str, text: &str) {
        self.line(depth, &format!("<{name}>{}</{name}>", escape(text)));
    }

    fn node(&mut self, node: &Node, depth: usize) {
        match node {
            Node::SearchClause(sc) => self.search_clause(sc, depth),
            Node::Boolean(b) => self.triple(b, depth),
        }
    }

    fn search_clause(&mut self, sc: &SearchClause, n: usize) {
        self.line(n, "<searchClause>");
        if let Some(identifier) = &sc.field_namespace {
            self.line(n + 1, "<prefixes>");
            self.line(n + 2, "<prefix>");
            self.element(n + 3, "identifier", identifier);
            self.line(n + 2, "</prefix>");
            self.line(n + 1, "</prefixes>");
        }
        self.element(n + 1, "index", &sc.field);
        self.line(n + 1, "<relation>");
        if let Some(identifier) = &sc.relation_namespace {
            self.element(n + 2, "identifier", identifier);
        }
        self.element(n + 2, "value", &sc.relation);
        self.modifiers(&sc.modifiers, n + 2);
        self.line(n + 1, "</relation>");
        self.element(n + 1, "term", &sc.term);
        self.line(n, "</searchClause>");
    }

    fn triple(&mut self, b: &BooleanNode, n: usize) {
        self.line(n, "<triple>");
        self.line(n + 1, "<boolean>");
        self.element(n + 2, "value", b.op.as_str());
        self.modifiers(&b.modifiers, n + 2);
        self.line(n + 1, "</boolean>");
        self.line(n + 1, "<leftOperand>");
        self.node(&b.left, n + 2);
        self.line(n + 1, "</leftOperand>");
        self.line(n + 1, "<rightOperand>");
        self.node(&b.right, n + 2);
        self.line(n + 1, "</rightOperand>");
        self.line(n, "</triple>");
    }

    fn modifiers(&mut self, modifiers: &[Modifier], n: usize) {
        if modifiers.is_empty() {
            return;
        }
        self.line(n, "<modifiers>");
        for m in modifiers {
            self.line(n + 1, "<modifier>");
            self.element(n + 2, "name", &m.name);
            self.element(n + 2, "relation", &m.relation);
            self.element(n + 2, "value", &m.value);
            self.line(n + 1, "</modifier>");
        }
        self.line(n, "</modifiers>");
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql::parser::parse;

    #[test]
    fn test_search_clause_layout() {
        let xcql = parse("dc.title = bar").expect("parse").to_xcql();
        let expected = "\
<searchClause>
 <prefixes>
  <prefix>
   <identifier>info:srw/cql-context-set/1/dc-v1.1</identifier>
  </prefix>
 </prefixes>
 <index>title</index>
 <relation>
  <identifier>info:srw/cql-context-set/1/cql-v1.2</identifier>
  <value>=</value>
 </relation>
 <term>bar</term>
</searchClause>
";
        assert_eq!(xcql, expected);
    }

    #[test]
    fn test_no_prefixes_block_without_namespace() {
        let xcql = parse("title < 5").expect("parse").to_xcql();
        assert!(!xcql.contains("<prefixes>"));
        assert!(xcql.contains(" <index>title</index>\n"));
        assert!(xcql.contains("  <value>&lt;</value>\n"));
    }

    #[test]
    fn test_custom_indent_unit() {
        let query = parse("a prox/distance<3 b").expect("parse");
        let xcql = query.to_xcql_with(&XcqlOptions {
            indent: "\t".to_string(),
        });
        assert!(xcql.starts_with("<triple>\n\t<boolean>\n\t\t<value>prox</value>\n\t\t<modifiers>\n"));
        assert!(xcql.contains("\t\t\t<modifier>\n\t\t\t\t<name>distance</name>\n\t\t\t\t<relation>&lt;</relation>\n\t\t\t\t<value>3</value>\n\t\t\t</modifier>\n"));
        assert!(xcql.contains("\t<leftOperand>\n\t\t<searchClause>\n"));
        assert!(xcql.ends_with("\t</rightOperand>\n</triple>\n"));
    }

    #[test]
    fn test_flag_modifier_has_empty_relation_and_value() {
        let xcql = parse("title =/stem fish").expect("parse").to_xcql();
        assert!(xcql.contains(
            "   <modifier>\n    <name>stem</name>\n    <relation></relation>\n    <value></value>\n   </modifier>\n"
        ));
    }
}
