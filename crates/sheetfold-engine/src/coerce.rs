//! Schema-hinted cell coercion.

use serde_json::Value as JsonValue;
use sheetfold_common::CellValue;
use sheetfold_parse::integer_step;
use sheetfold_spec::{SchemaNode, SchemaType};

/// Delimiter for string-array leaves. There is no escape mechanism: values
/// containing `;` cannot round-trip.
pub(crate) const STRING_ARRAY_DELIMITER: &str = ";";

/// Turn a raw cell into a JSON leaf, guided by the schema node at its path
/// (if any). `None` means the cell is missing and contributes nothing.
pub(crate) fn coerce_cell(cell: &CellValue, leaf: Option<&SchemaNode>) -> Option<JsonValue> {
    if cell.is_missing() {
        return None;
    }
    if matches!(cell, CellValue::Null) {
        return Some(JsonValue::Null);
    }
    if let Some(node) = leaf {
        if node.is_string_array() {
            let text = render_text(cell);
            return Some(JsonValue::Array(
                text.split(STRING_ARRAY_DELIMITER)
                    .map(|item| JsonValue::String(item.to_string()))
                    .collect(),
            ));
        }
        match node.schema_type {
            Some(SchemaType::String) => return Some(JsonValue::String(render_text(cell))),
            Some(SchemaType::Integer) => return Some(coerce_integer(cell)),
            Some(SchemaType::Number) => return Some(coerce_number(cell)),
            _ => {}
        }
    }
    cell.to_json()
}

fn render_text(cell: &CellValue) -> String {
    match cell.to_json() {
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn coerce_integer(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::Text(s) => match integer_step(s.trim()) {
            Some(n) => JsonValue::from(n),
            None => JsonValue::String(s.clone()),
        },
        other => other.to_json().unwrap_or(JsonValue::Null),
    }
}

fn coerce_number(cell: &CellValue) -> JsonValue {
    match cell {
        CellValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map_or_else(|| JsonValue::String(s.clone()), JsonValue::Number),
            Err(_) => JsonValue::String(s.clone()),
        },
        other => other.to_json().unwrap_or(JsonValue::Null),
    }
}
