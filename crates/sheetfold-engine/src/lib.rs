//! The sheetfold transformation engine.
//!
//! Two tightly coupled halves share one schema index and one warning sink:
//!
//! - [`Unflattener`] folds sheets of path-named columns back into nested JSON
//!   documents, joining sub-sheet rows onto main-sheet objects by identity.
//! - [`Flattener`] walks a JSON document and emits a main sheet plus one
//!   sub-sheet per array field, with the back-reference columns that make the
//!   trip reversible.
//!
//! Physical spreadsheet I/O stays outside: callers hand the engine ordered
//! rows of [`CellValue`]s and receive [`Sheet`]s or `serde_json::Value`s back.

mod coerce;
mod error;
mod flatten;
mod fold;
mod input;
mod join;
mod sheet;
mod unflatten;

pub use error::EngineError;
pub use flatten::{FlattenOptions, Flattener, ROLLUP_SENTINEL};
pub use input::{InputRow, InputSheets, JsonInput};
pub use sheet::Sheet;
pub use unflatten::{UnflattenOptions, Unflattener};

// Re-export the boundary types callers need alongside the engine.
pub use sheetfold_common::{CellValue, ShapeKind, Warning, WarningSink, display_json};
