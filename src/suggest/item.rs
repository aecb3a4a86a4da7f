//! Suggestion records handed to the editor

use serde::{Deserialize, Serialize};

/// Category of a suggestion; drives the editor icon and nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Keyword,
    TemplateVariable,
    Function,
    Catalog,
    Schema,
    Table,
    Column,
}

/// A single completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionItem {
    pub label: String,
    pub kind: SuggestionKind,
    pub detail: String,
    /// Snippet text (`${n:placeholder}`, literal `$` escaped as `\$`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_rank: Option<String>,
}

impl SuggestionItem {
    pub fn new(label: impl Into<String>, kind: SuggestionKind, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: detail.into(),
            insert_text: None,
            sort_rank: None,
        }
    }

    pub fn keyword(keyword: &str) -> Self {
        Self::new(keyword, SuggestionKind::Keyword, "Keyword")
    }

    /// `name()` inserting `name(<cursor>)`
    pub fn function(name: &str) -> Self {
        Self::new(format!("{name}()"), SuggestionKind::Function, "Function")
            .with_insert_text(format!("{name}(${{0}})"))
    }

    pub fn template_variable(label: &str) -> Self {
        Self::new(label, SuggestionKind::TemplateVariable, "Template Variable")
    }

    pub fn catalog(name: &str) -> Self {
        Self::new(name, SuggestionKind::Catalog, "Catalog")
    }

    pub fn schema(label: &str) -> Self {
        Self::new(label, SuggestionKind::Schema, "Schema")
    }

    pub fn table(label: &str) -> Self {
        Self::new(label, SuggestionKind::Table, "Table")
    }

    /// Column suggestion; the detail carries the column type
    pub fn column(name: &str, data_type: &str) -> Self {
        Self::new(name, SuggestionKind::Column, data_type)
    }

    pub fn with_insert_text(mut self, insert_text: impl Into<String>) -> Self {
        self.insert_text = Some(insert_text.into());
        self
    }

    pub fn with_sort_rank(mut self, sort_rank: impl Into<String>) -> Self {
        self.sort_rank = Some(sort_rank.into());
        self
    }

    /// Text the editor should insert when the item is accepted
    pub fn text_to_insert(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.label)
    }
}
