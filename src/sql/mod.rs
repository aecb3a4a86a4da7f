//! SQL text utilities
//!
//! Cursor coordinates, clause detection, and table-reference extraction for
//! partially typed queries.

pub mod clause;
pub mod position;
pub mod reference;

pub use clause::{Clause, ClauseLocation, locate_clause};
pub use position::{CursorPosition, end_position, offset_to_position, position_to_offset};
pub use reference::{TableReference, UseStatements, parse_use, table_reference_after};
