//! Schema index for sheetfold.
//!
//! A schema here is advisory: it decides shapes (array vs object), value
//! coercion targets, title-to-fieldname mappings, rollup lists, and sub-sheet
//! names. Fields that are not declared simply pass through untouched.

mod index;
mod node;

pub use index::{SchemaError, SchemaIndex};
pub use node::{SchemaNode, SchemaType};
