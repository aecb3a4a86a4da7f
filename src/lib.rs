//! sqlhint - Clause-aware SQL completion backed by lazily fetched catalog metadata
//!
//! sqlhint works out which SQL clause the cursor sits in and offers keywords,
//! functions, dashboard template variables, and catalog/schema/table/column
//! names suited to that clause. Metadata is pulled from the data-source
//! backend on demand, one level at a time, as the user types table references.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`sql`]: Cursor positions, clause detection, and table reference parsing
//! - [`metadata`]: Backend resource calls and the metadata cache
//! - [`suggest`]: Suggestion items, the per-clause policy, and list building
//! - [`completer`]: The suggestion engine tying everything together
//! - [`config`]: User settings
//! - [`error`]: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use sqlhint::completer::SuggestionEngine;
//! use sqlhint::config::Settings;
//! use sqlhint::sql::end_position;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SuggestionEngine::from_fixture("metadata.toml".as_ref(), &Settings::default())?;
//!
//! let query = "SELECT * FROM main.default.";
//! engine.refresh(query, end_position(query)).await;
//! for item in engine.get_suggestions() {
//!     println!("{} ({})", item.label, item.detail);
//! }
//! # Ok(())
//! # }
//! ```

pub mod completer;
pub mod config;
pub mod error;
pub mod metadata;
pub mod sql;
pub mod suggest;

pub use completer::SuggestionEngine;
pub use error::{ConfigError, ResourceError, Result, SqlhintError};
