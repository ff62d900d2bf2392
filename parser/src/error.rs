// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location in the query text (1-based line/column, byte offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CqlError {
    #[error("syntax error: {}{}", .message, at(.position))]
    Syntax {
        message: String,
        position: Option<Position>,
    },
    #[error("format error: {message}")]
    Format { message: String },
    #[error("unknown node type: {node}")]
    UnknownNodeType { node: String },
}

impl CqlError {
    pub fn syntax(message: impl Into<String>, position: Option<Position>) -> Self {
        CqlError::Syntax {
            message: message.into(),
            position,
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        CqlError::Format {
            message: message.into(),
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            CqlError::Syntax { position, .. } => *position,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CqlError {
    fn from(err: serde_json::Error) -> Self {
        CqlError::format(format!("invalid json: {err}"))
    }
}

fn at(position: &Option<Position>) -> String {
    match position {
        Some(pos) => format!(" (line {}, column {})", pos.line, pos.column),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, CqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_includes_position() {
        let err = CqlError::syntax(
            "Missing closing parenthesis",
            Some(Position {
                line: 1,
                column: 7,
                offset: 6,
            }),
        );
        assert_eq!(
            err.to_string(),
            "syntax error: Missing closing parenthesis (line 1, column 7)"
        );
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = CqlError::UnknownNodeType {
            node: r#"{"foo":"bar"}"#.into(),
        };
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["type"], "unknown_node_type");
        assert_eq!(json["node"], r#"{"foo":"bar"}"#);
    }
}
