//! Per-clause suggestion lists
//!
//! The builder owns the constant suggestions (keywords, functions, template
//! variables) and recomputes every clause list from scratch whenever the
//! metadata contributions change.

use crate::sql::Clause;
use crate::suggest::item::SuggestionItem;
use crate::suggest::vocabulary::{
    SuggestionPolicy, function_suggestions, template_variable_suggestions,
};

/// Builds and holds the suggestion list of every clause
#[derive(Debug, Clone)]
pub struct ClauseSuggestionBuilder {
    policy: SuggestionPolicy,
    template_variables: Vec<SuggestionItem>,
    functions: Vec<SuggestionItem>,
    lists: [Vec<SuggestionItem>; Clause::COUNT],
}

impl ClauseSuggestionBuilder {
    /// Create a builder; lists hold only constant suggestions until the
    /// first [`rebuild`](Self::rebuild) with metadata.
    pub fn new(policy: SuggestionPolicy, extra_functions: &[String]) -> Self {
        let mut builder = Self {
            policy,
            template_variables: template_variable_suggestions(),
            functions: function_suggestions(extra_functions),
            lists: Default::default(),
        };
        builder.rebuild(&[], &[]);
        builder
    }

    /// Recompute all clause lists from the given metadata suggestions.
    ///
    /// Order within a list: keywords, template variables, functions, tables,
    /// columns. Each item gets a zero-padded `sort_rank` matching its position.
    pub fn rebuild(&mut self, tables: &[SuggestionItem], columns: &[SuggestionItem]) {
        for clause in Clause::ALL {
            let policy = self.policy.for_clause(clause);
            let mut list: Vec<SuggestionItem> = policy
                .keywords
                .iter()
                .map(|kw| SuggestionItem::keyword(kw))
                .collect();

            if policy.template_variables {
                list.extend(self.template_variables.iter().cloned());
            }
            if policy.functions {
                list.extend(self.functions.iter().cloned());
            }
            if policy.tables {
                list.extend(tables.iter().cloned());
            }
            if policy.columns {
                list.extend(columns.iter().cloned());
            }

            self.lists[clause.index()] = list
                .into_iter()
                .enumerate()
                .map(|(rank, item)| item.with_sort_rank(format!("{rank:05}")))
                .collect();
        }
    }

    pub fn suggestions(&self, clause: Clause) -> &[SuggestionItem] {
        &self.lists[clause.index()]
    }
}

impl Default for ClauseSuggestionBuilder {
    fn default() -> Self {
        Self::new(SuggestionPolicy::default(), &[])
    }
}
