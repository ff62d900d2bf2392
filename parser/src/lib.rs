// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Library crate for parsing and rendering CQL queries.

pub mod config;
pub mod cql;
pub mod error;

pub use config::{FqOptions, ServerChoice, XcqlOptions};
pub use cql::{parse, parse_fq, parse_with, CqlQuery, Node, Parser};
pub use error::{CqlError, Position, Result};
