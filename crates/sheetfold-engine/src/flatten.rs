//! Flatten walker: one JSON document in, a main sheet plus sub-sheets out.

use crate::coerce::STRING_ARRAY_DELIMITER;
use crate::error::EngineError;
use crate::input::{InputSheets, JsonInput};
use crate::sheet::Sheet;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use sheetfold_common::{Warning, WarningSink, display_json};
use sheetfold_parse::{Path, PathStep};
use sheetfold_spec::{SchemaIndex, SchemaNode};

/// Literal written into rollup columns when the array has more than one item.
pub const ROLLUP_SENTINEL: &str =
    "WARNING: More than one value supplied, consult the relevant sub-sheet for the data.";

/// Options recognised by [`Flattener`].
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Identifier field carried onto every sub-sheet. Empty means none.
    pub root_id: String,
    /// Key under which the record list lives when the document root is an
    /// object rather than an array.
    pub root_list_path: String,
    /// Copy schema-listed fields of single-item arrays onto the main sheet.
    pub rollup: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            root_id: "ocid".to_string(),
            root_list_path: "main".to_string(),
            rollup: false,
        }
    }
}

/// Walks an array of records and splits array-valued fields into sub-sheets,
/// carrying identity back-columns down so the output can be unflattened.
pub struct Flattener<'s> {
    options: FlattenOptions,
    schema: Option<&'s SchemaIndex>,
    warnings: WarningSink,
    main_sheet: Sheet,
    sub_sheets: IndexMap<String, Sheet>,
}

impl<'s> Flattener<'s> {
    pub fn new(options: FlattenOptions) -> Self {
        Self {
            options,
            schema: None,
            warnings: WarningSink::new(),
            main_sheet: Sheet::new("main"),
            sub_sheets: IndexMap::new(),
        }
    }

    pub fn with_schema(mut self, schema: &'s SchemaIndex) -> Self {
        self.schema = Some(schema);
        if let Some(index) = self.schema {
            seed_columns(&mut self.main_sheet, index.root(), "", self.options.rollup);
        }
        self
    }

    pub fn main_sheet(&self) -> &Sheet {
        &self.main_sheet
    }

    pub fn sub_sheets(&self) -> &IndexMap<String, Sheet> {
        &self.sub_sheets
    }

    pub fn sub_sheet(&self, name: &str) -> Option<&Sheet> {
        self.sub_sheets.get(name)
    }

    pub fn warnings(&self) -> &WarningSink {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings.into_inner()
    }

    /// All sheets re-presented as unflatten input, main sheet first.
    pub fn to_input_sheets(&self) -> InputSheets {
        let mut sheets = InputSheets::new();
        sheets.insert("main".to_string(), self.main_sheet.to_input_rows());
        for (name, sheet) in &self.sub_sheets {
            sheets.insert(name.clone(), sheet.to_input_rows());
        }
        sheets
    }

    /// Resolve and flatten a JSON document.
    pub fn flatten(&mut self, input: JsonInput) -> Result<(), EngineError> {
        let root = input.resolve()?;
        self.flatten_value(&root)
    }

    /// Flatten an already-loaded document: either an array of records or an
    /// object holding one under `root_list_path`.
    pub fn flatten_value(&mut self, root: &Value) -> Result<(), EngineError> {
        let records = match root {
            Value::Array(items) => items,
            Value::Object(map) => map
                .get(&self.options.root_list_path)
                .and_then(Value::as_array)
                .ok_or_else(|| EngineError::RootListMissing {
                    path: self.options.root_list_path.clone(),
                })?,
            _ => {
                return Err(EngineError::RootListMissing {
                    path: self.options.root_list_path.clone(),
                });
            }
        };
        for record in records {
            if let Value::Object(object) = record {
                self.flatten_record(object);
            }
        }
        Ok(())
    }

    fn flatten_record(&mut self, record: &Map<String, Value>) {
        let mut chain: Vec<(String, Value)> = Vec::new();
        let root_id = self.options.root_id.clone();
        if !root_id.is_empty() {
            if let Some(value) = record.get(&root_id) {
                chain.push((root_id.clone(), value.clone()));
            }
        }
        if let Some(id) = record.get("id") {
            chain.push(("main/id".to_string(), id.clone()));
        }
        let mut row = Map::new();
        self.walk_object(record, "", &Path::new(), &mut row, &chain, "");
        self.main_sheet.append_line(row);
    }

    fn walk_object(
        &mut self,
        object: &Map<String, Value>,
        prefix: &str,
        schema_path: &Path,
        row: &mut Map<String, Value>,
        chain: &[(String, Value)],
        ref_path: &str,
    ) {
        for (key, value) in object {
            let col = format!("{prefix}{key}");
            let mut child_path = schema_path.clone();
            child_path.push(PathStep::Field(key.clone()));
            match value {
                Value::Object(child) => {
                    let child_ref = extend_ref(ref_path, key, false);
                    let mut child_chain = chain.to_vec();
                    if let Some(id) = child.get("id") {
                        child_chain.push((format!("main/{child_ref}/id"), id.clone()));
                    }
                    self.walk_object(
                        child,
                        &format!("{col}/"),
                        &child_path,
                        row,
                        &child_chain,
                        &child_ref,
                    );
                }
                Value::Array(items) => {
                    self.walk_array(key, items, &col, &child_path, row, chain, ref_path);
                }
                leaf => {
                    row.insert(col, leaf.clone());
                }
            }
        }
    }

    fn walk_array(
        &mut self,
        key: &str,
        items: &[Value],
        col: &str,
        child_path: &Path,
        row: &mut Map<String, Value>,
        chain: &[(String, Value)],
        ref_path: &str,
    ) {
        if items.is_empty() {
            return;
        }

        let declared_string_array = self
            .schema
            .is_some_and(|schema| schema.is_string_array(child_path));
        let declared = self
            .schema
            .is_some_and(|schema| schema.resolve(child_path).is_some());
        let string_array = if declared {
            declared_string_array
        } else {
            items.iter().all(Value::is_string)
        };
        if string_array {
            let joined = items
                .iter()
                .map(display_json)
                .collect::<Vec<_>>()
                .join(STRING_ARRAY_DELIMITER);
            let column = if declared_string_array {
                format!("{col}:array")
            } else {
                col.to_string()
            };
            row.insert(column, Value::String(joined));
            return;
        }

        if self.options.rollup {
            if let Some(schema) = self.schema {
                let rolled = schema.rollup_fields(child_path);
                if !rolled.is_empty() {
                    if let [item] = items {
                        if let Some(object) = item.as_object() {
                            for field in &rolled {
                                if let Some(value) = object.get(*field) {
                                    row.insert(format!("{col}[]/{field}"), value.clone());
                                }
                            }
                        }
                    } else {
                        for field in &rolled {
                            row.insert(
                                format!("{col}[]/{field}"),
                                Value::String(ROLLUP_SENTINEL.to_string()),
                            );
                        }
                        self.warnings.push(Warning::RollupTooManyValues {
                            field: col.to_string(),
                        });
                    }
                }
            }
        }

        let sheet_name = self
            .schema
            .and_then(|schema| schema.sub_sheet_name(child_path))
            .unwrap_or(key)
            .to_string();
        let item_ref = extend_ref(ref_path, key, true);
        let mut item_path = child_path.clone();
        item_path.push(PathStep::Anonymous);

        for item in items {
            let Value::Object(item_object) = item else {
                continue;
            };
            let mut line = Map::new();
            for (column, value) in chain {
                line.insert(column.clone(), value.clone());
            }
            let mut item_chain = chain.to_vec();
            if let Some(id) = item_object.get("id") {
                item_chain.push((format!("main/{item_ref}/id"), id.clone()));
            }
            self.walk_object(item_object, "", &item_path, &mut line, &item_chain, &item_ref);
            self.sub_sheet_line(&sheet_name, &item_path, line);
        }
    }

    fn sub_sheet_line(&mut self, name: &str, item_path: &Path, line: Map<String, Value>) {
        if !self.sub_sheets.contains_key(name) {
            let mut sheet = Sheet::with_root_id(name, &self.options.root_id);
            if let Some(item_node) = self.schema.and_then(|schema| schema.resolve(item_path)) {
                seed_columns(&mut sheet, item_node, "", false);
            }
            self.sub_sheets.insert(name.to_string(), sheet);
        }
        if let Some(sheet) = self.sub_sheets.get_mut(name) {
            sheet.append_line(line);
        }
    }
}

fn extend_ref(ref_path: &str, key: &str, array: bool) -> String {
    let segment = if array {
        format!("{key}[]")
    } else {
        key.to_string()
    };
    if ref_path.is_empty() {
        segment
    } else {
        format!("{ref_path}/{segment}")
    }
}

/// Pre-seed a sheet with the columns the schema declares, in declaration
/// order: scalars by path, string arrays with their `:array` suffix, rollup
/// columns when enabled. Object arrays become sub-sheets, not columns.
fn seed_columns(sheet: &mut Sheet, node: &SchemaNode, prefix: &str, rollup: bool) {
    for (name, child) in &node.properties {
        let path = format!("{prefix}{name}");
        if child.is_string_array() {
            sheet.add_column(format!("{path}:array"));
        } else if child.is_array() {
            if rollup {
                for field in child.rollup_columns() {
                    sheet.add_column(format!("{path}[]/{field}"));
                }
            }
        } else if !child.properties.is_empty() {
            seed_columns(sheet, child, &format!("{path}/"), rollup);
        } else {
            sheet.add_column(path);
        }
    }
}
