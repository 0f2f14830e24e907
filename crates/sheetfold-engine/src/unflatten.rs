//! Unflatten orchestration: sheets of rows in, top-level JSON objects out.

use crate::coerce::coerce_cell;
use crate::error::EngineError;
use crate::flatten::ROLLUP_SENTINEL;
use crate::fold::RowTreeBuilder;
use crate::input::{InputRow, InputSheets};
use crate::join::{MergeContext, merge_object};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use sheetfold_common::{CellValue, Warning, WarningSink, display_json};
use sheetfold_parse::{Path, PathStep, parse_field_path};
use sheetfold_spec::SchemaIndex;

/// Options recognised by [`Unflattener`].
#[derive(Debug, Clone)]
pub struct UnflattenOptions {
    /// Field tying rows of different sheets to the same top-level object.
    /// Empty means no root id.
    pub root_id: String,
    /// Resolve column headings through schema titles before lexing.
    pub convert_titles: bool,
}

impl Default for UnflattenOptions {
    fn default() -> Self {
        Self {
            root_id: "ocid".to_string(),
            convert_titles: false,
        }
    }
}

/// Drives lexing, title resolution, coercion, per-row folding, and the
/// cross-sheet identity join.
pub struct Unflattener<'s> {
    options: UnflattenOptions,
    schema: Option<&'s SchemaIndex>,
    warnings: WarningSink,
}

struct ParsedCell<'r> {
    column: &'r str,
    path: Path,
    cell: &'r CellValue,
}

/// `main/id`, `main/<path>/id`, `main/<path>[]/id`: identity columns written
/// by the flatten side.
fn is_back_ref(path: &[PathStep]) -> bool {
    path.len() >= 2
        && path.first().and_then(PathStep::field_name) == Some("main")
        && path.last().and_then(PathStep::field_name) == Some("id")
}

fn main_sheet_name(sheets: &InputSheets) -> Option<&str> {
    sheets
        .keys()
        .map(String::as_str)
        .find(|name| *name == "main" || name.ends_with("_main"))
        .or_else(|| sheets.keys().next().map(String::as_str))
}

impl<'s> Unflattener<'s> {
    pub fn new(options: UnflattenOptions) -> Self {
        Self {
            options,
            schema: None,
            warnings: WarningSink::new(),
        }
    }

    pub fn with_schema(mut self, schema: &'s SchemaIndex) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn warnings(&self) -> &WarningSink {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings.into_inner()
    }

    /// Unflatten all sheets into top-level objects: main-sheet objects in row
    /// order first, then sub-sheet rows that matched nothing.
    pub fn unflatten(&mut self, sheets: &InputSheets) -> Result<Vec<Value>, EngineError> {
        let Some(main_name) = main_sheet_name(sheets).map(str::to_string) else {
            return Ok(Vec::new());
        };

        let mut objects: Vec<Map<String, Value>> = Vec::new();
        let mut index: FxHashMap<(Option<String>, String), usize> = FxHashMap::default();

        for row in sheets.get(main_name.as_str()).into_iter().flatten() {
            let Some(tree) = self.row_tree(&main_name, row, true)? else {
                continue;
            };
            self.place(tree, &main_name, &mut objects, &mut index);
        }
        for (name, rows) in sheets {
            if *name == main_name {
                continue;
            }
            for row in rows {
                let Some(tree) = self.row_tree(name, row, false)? else {
                    continue;
                };
                self.place(tree, name, &mut objects, &mut index);
            }
        }

        Ok(objects
            .into_iter()
            .map(|object| Value::Object(self.root_id_first(object)))
            .collect())
    }

    fn parse_row<'r>(&self, row: &'r InputRow) -> Result<Vec<ParsedCell<'r>>, EngineError> {
        let mut cells = Vec::with_capacity(row.len());
        for (column, cell) in row {
            if cell.is_missing() {
                continue;
            }
            let heading = if self.options.convert_titles {
                match self.schema {
                    Some(schema) => schema.convert_title_column(column)?,
                    None => column.clone(),
                }
            } else {
                column.clone()
            };
            // Schema-driven flatten names string-array columns with a type
            // suffix (`tags:array`); the suffix is not part of the path.
            let heading = heading
                .strip_suffix(":array")
                .filter(|stripped| !stripped.is_empty())
                .map_or(heading.as_str(), |stripped| stripped)
                .to_string();
            cells.push(ParsedCell {
                column,
                path: parse_field_path(&heading)?,
                cell,
            });
        }
        Ok(cells)
    }

    /// Fold one row into a tree, or `None` when nothing non-missing remains.
    fn row_tree(
        &mut self,
        sheet: &str,
        row: &InputRow,
        is_main: bool,
    ) -> Result<Option<Map<String, Value>>, EngineError> {
        let cells = self.parse_row(row)?;
        if cells.is_empty() {
            return Ok(None);
        }

        // A sub-sheet row written by the flatten side carries `main/...`
        // identity columns and item-relative field columns; rebuild the full
        // path from the object root before folding.
        let back_ref_mode = !is_main && cells.iter().any(|cell| is_back_ref(&cell.path));
        let item_prefix = back_ref_mode.then(|| {
            let mut deepest: Path = Path::new();
            for cell in &cells {
                if is_back_ref(&cell.path) && cell.path.len() - 2 > deepest.len() {
                    deepest = cell.path[1..cell.path.len() - 1].iter().cloned().collect();
                }
            }
            let field = self
                .schema
                .and_then(|schema| schema.field_for_sub_sheet(sheet))
                .unwrap_or(sheet);
            deepest.push(PathStep::Field(field.to_string()));
            deepest.push(PathStep::Anonymous);
            deepest
        });

        let root_id = self.options.root_id.clone();
        let mut builder = RowTreeBuilder::new();
        for cell in &cells {
            let full: Path = match &item_prefix {
                None => cell.path.clone(),
                Some(prefix) => {
                    if is_back_ref(&cell.path) {
                        cell.path[1..].iter().cloned().collect()
                    } else if !root_id.is_empty()
                        && cell.path.len() == 1
                        && cell.path[0].field_name() == Some(root_id.as_str())
                    {
                        cell.path.clone()
                    } else {
                        prefix.iter().chain(cell.path.iter()).cloned().collect()
                    }
                }
            };
            let full = match self.schema {
                Some(schema) => schema.expand_anonymous(&full),
                None => full,
            };
            let leaf = self.schema.and_then(|schema| schema.resolve(&full));
            let Some(value) = coerce_cell(cell.cell, leaf) else {
                continue;
            };
            if matches!(&value, Value::String(s) if s == ROLLUP_SENTINEL) {
                continue;
            }
            builder.insert(cell.column, &full, value, &mut self.warnings);
        }

        if builder.is_empty() {
            Ok(None)
        } else {
            Ok(Some(builder.finish()))
        }
    }

    /// Register a row tree: merge it into the object sharing its identity,
    /// or start a new top-level object.
    fn place(
        &mut self,
        tree: Map<String, Value>,
        sheet: &str,
        objects: &mut Vec<Map<String, Value>>,
        index: &mut FxHashMap<(Option<String>, String), usize>,
    ) {
        let Unflattener {
            options, warnings, ..
        } = self;
        let root_id = options.root_id.as_str();
        let root_value = if root_id.is_empty() {
            None
        } else {
            tree.get(root_id)
        };

        let Some(id_value) = tree.get("id") else {
            // No id: nothing to join on; the row stands alone.
            objects.push(tree);
            return;
        };

        let key = (root_value.map(Value::to_string), id_value.to_string());
        if let Some(&pos) = index.get(&key) {
            let ctx = MergeContext {
                root_id: root_value.map(|value| (root_id, display_json(value))),
                id: display_json(id_value),
                sheet,
            };
            merge_object(&mut objects[pos], tree, &ctx, warnings);
        } else {
            index.insert(key, objects.len());
            objects.push(tree);
        }
    }

    /// The root-id field leads every emitted object.
    fn root_id_first(&self, mut object: Map<String, Value>) -> Map<String, Value> {
        let root_id = self.options.root_id.as_str();
        if root_id.is_empty()
            || object.keys().next().map(String::as_str) == Some(root_id)
        {
            return object;
        }
        let Some(root_value) = object.shift_remove(root_id) else {
            return object;
        };
        let mut reordered = Map::new();
        reordered.insert(root_id.to_string(), root_value);
        reordered.extend(object);
        reordered
    }
}
