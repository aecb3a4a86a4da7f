//! Suggestion model and clause-scoped list building

pub mod builder;
pub mod item;
pub mod vocabulary;

pub use builder::ClauseSuggestionBuilder;
pub use item::{SuggestionItem, SuggestionKind};
pub use vocabulary::{ClausePolicy, SuggestionPolicy};
