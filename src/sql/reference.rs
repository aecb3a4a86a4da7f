//! Table references and USE statements
//!
//! Pulls the (possibly partial) table name after `FROM` and the catalog or
//! schema named by `USE` statements out of raw query text. Inputs that do
//! not match simply produce `None`.

use regex::Regex;
use std::sync::LazyLock;

static FROM_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfrom\s+([\w.]+)").expect("valid regex"));

static USE_CATALOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\buse\s+catalog\s+(\w+)").expect("valid regex"));

static USE_SCHEMA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\buse\s+(?:(?:schema|database)\s+)?([\w.]+)").expect("valid regex")
});

/// Dot-separated table reference, as typed so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableReference {
    /// `name`: a table in the current schema, or a catalog or schema being typed
    Bare(String),
    /// `a.b`: `schema.table`, or `catalog.schema` with the table still missing
    Pair(String, String),
    /// `catalog.schema.table`
    Qualified {
        catalog: String,
        schema: String,
        table: String,
    },
}

impl TableReference {
    /// Split a dotted token. Components may be empty (`main.`); more than
    /// three components is not a table reference.
    pub fn parse(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        match parts.as_slice() {
            [name] => Some(Self::Bare(name.to_string())),
            [first, second] => Some(Self::Pair(first.to_string(), second.to_string())),
            [catalog, schema, table] => Some(Self::Qualified {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
                table: table.to_string(),
            }),
            _ => None,
        }
    }
}

/// Find the first `FROM <reference>` at or after byte offset `from`.
pub fn table_reference_after(text: &str, from: usize) -> Option<TableReference> {
    let mut from = from.min(text.len());
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let caps = FROM_REFERENCE.captures(&text[from..])?;
    TableReference::parse(caps.get(1)?.as_str())
}

/// Schema named by `USE [SCHEMA|DATABASE] [catalog.]schema`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUse {
    pub catalog: Option<String>,
    pub schema: String,
}

/// The catalog and schema selected by `USE` statements in a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UseStatements {
    pub catalog: Option<String>,
    pub schema: Option<SchemaUse>,
}

impl UseStatements {
    pub fn is_empty(&self) -> bool {
        self.catalog.is_none() && self.schema.is_none()
    }
}

/// Collect the last `USE CATALOG x` and the last schema `USE` in `text`.
pub fn parse_use(text: &str) -> UseStatements {
    let catalog = USE_CATALOG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .last()
        .map(|m| m.as_str().to_string());

    let schema = USE_SCHEMA
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !is_use_keyword(name))
        .last()
        .map(|name| match name.split_once('.') {
            Some((catalog, rest)) => SchemaUse {
                catalog: Some(catalog.to_string()),
                schema: rest.split('.').next().unwrap_or_default().to_string(),
            },
            None => SchemaUse {
                catalog: None,
                schema: name.to_string(),
            },
        });

    UseStatements { catalog, schema }
}

fn is_use_keyword(word: &str) -> bool {
    ["catalog", "schema", "database"]
        .iter()
        .any(|kw| word.eq_ignore_ascii_case(kw))
}
