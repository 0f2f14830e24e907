//! Column-name lexing for sheetfold.
//!
//! Spreadsheet column names encode JSON paths: `testO/testB` walks two object
//! fields, `testL/0/id` indexes into an array, and a heading in title mode
//! (`B title:C title`) uses `:` between steps. This crate turns a column name
//! into a sequence of [`PathStep`]s; resolving titles against a schema is the
//! job of `sheetfold-spec`.

pub mod lexer;
pub mod path;

pub use lexer::{ColumnPathError, integer_step, parse_field_path, split_title_steps};
pub use path::{Path, PathStep, render_path};
