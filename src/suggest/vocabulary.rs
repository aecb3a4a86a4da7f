//! Static suggestion vocabulary
//!
//! Keywords, built-in functions, and dashboard template variables, plus the
//! policy deciding which of those categories (and which metadata categories)
//! each clause offers.

use crate::sql::Clause;
use crate::suggest::item::SuggestionItem;

/// Built-in aggregate and scalar functions
pub const FUNCTIONS: &[&str] = &[
    "avg",
    "count",
    "min",
    "max",
    "sum",
    "round",
    "ceil",
    "floor",
    "coalesce",
    "date_trunc",
    "lower",
    "upper",
    "concat",
];

/// Template variables inserted verbatim
pub const TEMPLATE_VARIABLES: &[&str] = &[
    "$__timeFrom()",
    "$__timeTo()",
    "${__from}",
    "${__from:date}",
    "${__from:date:iso}",
    "${__from:date:seconds}",
    "${__to}",
    "${__to:date}",
    "${__to:date:iso}",
    "${__to:date:seconds}",
    "${__interval}",
    "${__interval_ms}",
];

/// Macros taking a time column: (label, snippet)
pub const TIME_MACROS: &[(&str, &str)] = &[
    ("$__timeFilter(timeColumn)", r"\$__timeFilter(${0:timeColumn})"),
    ("$__timeWindow(timeColumn)", r"\$__timeWindow(${1:timeColumn})"),
    ("$__time(timeColumn)", r"\$__time(${0:timeColumn})"),
];

/// Which suggestion categories a clause offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClausePolicy {
    pub keywords: Vec<String>,
    pub template_variables: bool,
    pub functions: bool,
    pub tables: bool,
    pub columns: bool,
}

impl ClausePolicy {
    fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
            template_variables: false,
            functions: false,
            tables: false,
            columns: false,
        }
    }

    /// Template variables, functions and columns: the expression clauses
    fn expressions(mut self) -> Self {
        self.template_variables = true;
        self.functions = true;
        self.columns = true;
        self
    }

    fn tables(mut self) -> Self {
        self.tables = true;
        self
    }
}

/// Total mapping from [`Clause`] to its [`ClausePolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionPolicy {
    clauses: [ClausePolicy; Clause::COUNT],
}

impl SuggestionPolicy {
    pub fn new(clauses: [ClausePolicy; Clause::COUNT]) -> Self {
        Self { clauses }
    }

    pub fn for_clause(&self, clause: Clause) -> &ClausePolicy {
        &self.clauses[clause.index()]
    }
}

impl Default for SuggestionPolicy {
    fn default() -> Self {
        Self::new([
            // START
            ClausePolicy::new(&[
                "SELECT",
                "USE",
                "WITH",
                "SHOW",
                "DESCRIBE",
                "EXPLAIN",
                "ANALYZE TABLE",
                "COMMENT ON",
                "REFRESH",
                "LIST",
            ]),
            // SELECT
            ClausePolicy::new(&["FROM", "AS", "DISTINCT", "CASE", "WHEN", "THEN", "ELSE", "END"])
                .expressions(),
            // USE
            ClausePolicy::new(&["CATALOG", "SCHEMA", "DATABASE"]).tables(),
            // FROM
            ClausePolicy::new(&[
                "WHERE",
                "JOIN",
                "LEFT JOIN",
                "INNER JOIN",
                "ON",
                "AS",
                "GROUP BY",
                "ORDER BY",
                "LIMIT",
            ])
            .tables(),
            // WHERE
            ClausePolicy::new(&[
                "AND",
                "OR",
                "NOT",
                "IN",
                "LIKE",
                "BETWEEN",
                "IS NULL",
                "IS NOT NULL",
                "GROUP BY",
                "ORDER BY",
                "LIMIT",
            ])
            .expressions(),
            // GROUP BY
            ClausePolicy::new(&["HAVING", "ORDER BY", "LIMIT"]).expressions(),
            // ORDER BY
            ClausePolicy::new(&["ASC", "DESC", "NULLS FIRST", "NULLS LAST", "LIMIT"]).expressions(),
        ])
    }
}

/// Function suggestions: the built-ins followed by `extra` names not already present
pub fn function_suggestions(extra: &[String]) -> Vec<SuggestionItem> {
    let mut names: Vec<&str> = FUNCTIONS.to_vec();
    for name in extra {
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name);
        }
    }
    names.into_iter().map(SuggestionItem::function).collect()
}

pub fn template_variable_suggestions() -> Vec<SuggestionItem> {
    TEMPLATE_VARIABLES
        .iter()
        .map(|var| SuggestionItem::template_variable(var))
        .chain(
            TIME_MACROS
                .iter()
                .map(|(label, snippet)| SuggestionItem::template_variable(label).with_insert_text(*snippet)),
        )
        .collect()
}
