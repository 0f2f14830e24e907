use crate::error::EngineError;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sheetfold_common::CellValue;
use std::path::PathBuf;

/// One sheet row: column name to raw cell, in column order. Column order is
/// significant — shape-conflict resolution is first-column-wins.
pub type InputRow = IndexMap<String, CellValue>;

/// Named sheets in input order. The first sheet named `main` or `*_main`
/// (else simply the first) is the main sheet.
pub type InputSheets = IndexMap<String, Vec<InputRow>>;

/// A JSON document supplied either as a file or as an in-memory value.
/// Exactly one of the two must be set.
#[derive(Debug, Default)]
pub struct JsonInput {
    pub file: Option<PathBuf>,
    pub inline: Option<JsonValue>,
}

impl JsonInput {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            inline: None,
        }
    }

    pub fn from_value(value: JsonValue) -> Self {
        Self {
            file: None,
            inline: Some(value),
        }
    }

    /// Load the document, enforcing the exactly-one-source contract.
    pub fn resolve(self) -> Result<JsonValue, EngineError> {
        match (self.file, self.inline) {
            (Some(_), Some(_)) => Err(EngineError::ConflictingInputs),
            (None, None) => Err(EngineError::MissingInput),
            (None, Some(value)) => Ok(value),
            (Some(path), None) => {
                let text = std::fs::read_to_string(&path).map_err(|source| EngineError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text)
                    .map_err(|source| EngineError::BadJson { path, source })
            }
        }
    }
}
