use crate::input::InputRow;
use indexmap::IndexSet;
use serde_json::{Map, Value};
use sheetfold_common::CellValue;

/// A flattened output sheet: an ordered column set plus rows. Columns appear
/// in first-encounter order across rows; sub-sheets pre-seed the root-id
/// column so it leads even when no row carries a value for it.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    columns: IndexSet<String>,
    lines: Vec<Map<String, Value>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexSet::new(),
            lines: Vec::new(),
        }
    }

    pub(crate) fn with_root_id(name: impl Into<String>, root_id: &str) -> Self {
        let mut sheet = Self::new(name);
        if !root_id.is_empty() {
            sheet.columns.insert(root_id.to_string());
        }
        sheet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn add_column(&mut self, column: String) {
        self.columns.insert(column);
    }

    pub fn append_line(&mut self, line: Map<String, Value>) {
        for column in line.keys() {
            if !self.columns.contains(column.as_str()) {
                self.columns.insert(column.clone());
            }
        }
        self.lines.push(line);
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn lines(&self) -> &[Map<String, Value>] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Re-present this sheet as unflatten input, e.g. for round-tripping.
    pub fn to_input_rows(&self) -> Vec<InputRow> {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|(column, value)| (column.clone(), CellValue::from_json(value)))
                    .collect()
            })
            .collect()
    }
}
