use sheetfold_engine::{CellValue, InputRow, InputSheets};

/// Build one input row, preserving cell order.
pub fn row<const N: usize>(cells: [(&str, CellValue); N]) -> InputRow {
    cells
        .into_iter()
        .map(|(column, cell)| (column.to_string(), cell))
        .collect()
}

/// Build a sheet set, preserving sheet order.
pub fn sheets<const N: usize>(entries: [(&str, Vec<InputRow>); N]) -> InputSheets {
    entries
        .into_iter()
        .map(|(name, rows)| (name.to_string(), rows))
        .collect()
}
