//! Clause detection
//!
//! Finds the SQL clause the cursor sits in by looking for the last clause
//! keyword or statement boundary before it. This is a lexical scan over the
//! text typed so far, not a parse: nesting is not tracked, so after a closed
//! subquery the clause is whatever keyword appeared last, and keywords inside
//! string literals or comments are not skipped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Last clause keyword (group 1) or statement boundary. A `(` only counts as a
/// boundary at the start of the text or after whitespace; `count(` is a call.
static CLAUSE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(select|use|from|where|group\s+by|order\s+by)\b|(?:^|\s)\(|;")
        .expect("valid regex")
});

/// SQL clause the cursor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Clause {
    /// Beginning of a (sub)statement
    Start,
    Select,
    Use,
    From,
    Where,
    GroupBy,
    OrderBy,
}

impl Clause {
    pub const COUNT: usize = 7;

    pub const ALL: [Clause; Clause::COUNT] = [
        Clause::Start,
        Clause::Select,
        Clause::Use,
        Clause::From,
        Clause::Where,
        Clause::GroupBy,
        Clause::OrderBy,
    ];

    /// Stable position of this clause in [`Clause::ALL`]
    pub fn index(self) -> usize {
        match self {
            Clause::Start => 0,
            Clause::Select => 1,
            Clause::Use => 2,
            Clause::From => 3,
            Clause::Where => 4,
            Clause::GroupBy => 5,
            Clause::OrderBy => 6,
        }
    }

    /// Map a matched keyword (any case, any inner whitespace) to its clause.
    fn from_keyword(keyword: &str) -> Option<Self> {
        let mut words = keyword.split_whitespace();
        let first = words.next()?.to_ascii_lowercase();
        match first.as_str() {
            "select" => Some(Clause::Select),
            "use" => Some(Clause::Use),
            "from" => Some(Clause::From),
            "where" => Some(Clause::Where),
            "group" => Some(Clause::GroupBy),
            "order" => Some(Clause::OrderBy),
            _ => None,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Clause::Start => "START",
            Clause::Select => "SELECT",
            Clause::Use => "USE",
            Clause::From => "FROM",
            Clause::Where => "WHERE",
            Clause::GroupBy => "GROUP BY",
            Clause::OrderBy => "ORDER BY",
        };
        f.write_str(name)
    }
}

/// Result of [`locate_clause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseLocation {
    pub clause: Clause,
    /// Byte offset where the clause keyword (or boundary) match begins
    pub start: usize,
}

impl ClauseLocation {
    pub const START: ClauseLocation = ClauseLocation {
        clause: Clause::Start,
        start: 0,
    };
}

/// Identify the clause enclosing byte `offset` of `text`.
///
/// Offsets past the end clamp to the end of the text.
pub fn locate_clause(text: &str, offset: usize) -> ClauseLocation {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let Some(caps) = CLAUSE_BOUNDARY.captures_iter(&text[..offset]).last() else {
        return ClauseLocation::START;
    };
    let Some(whole) = caps.get(0) else {
        return ClauseLocation::START;
    };

    let clause = caps
        .get(1)
        .and_then(|keyword| Clause::from_keyword(keyword.as_str()))
        .unwrap_or(Clause::Start);

    ClauseLocation {
        clause,
        start: whole.start(),
    }
}
